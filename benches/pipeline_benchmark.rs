//! End-to-end timing for the full pipeline: parallel append → seal
//! (truncate + sort + key table) → probe. Prints throughput per phase.
//!
//!   $ cargo bench --bench pipeline_benchmark

use rand::{Rng, rng};
use runmap::{MultiMap, StoreOptions};
use std::time::Instant;
use tempfile::tempdir;
use thousands::Separable;

// ---------------------------------------------------------------------------
// Tunables
// ---------------------------------------------------------------------------

const NUM_RECORDS: u64 = 1_000_000;
const MAX_KEY: u64 = 100_000;
const NUM_PROBES: u64 = 100_000;
const WRITER_THREADS: u64 = 8;

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("pipeline.run");

    println!(
        "Running pipeline benchmark: {} records, {} producer threads…",
        NUM_RECORDS.separate_with_commas(),
        WRITER_THREADS
    );

    let mut mm: MultiMap<u64> =
        MultiMap::create_with(&path, StoreOptions::new()).expect("Failed to create container");

    // -- append ------------------------------------------------------------
    let start = Instant::now();
    std::thread::scope(|scope| {
        for _ in 0..WRITER_THREADS {
            let mm = &mm;
            scope.spawn(move || {
                let mut rng = rng();
                let mut writer = mm.writer().unwrap();
                for _ in 0..NUM_RECORDS / WRITER_THREADS {
                    writer
                        .append(rng.random_range(1..=MAX_KEY), rng.random_range(1..=MAX_KEY))
                        .unwrap();
                }
            });
        }
    });
    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "append: {:.3}s ({} records/s)",
        elapsed,
        ((mm.len() as f64 / elapsed) as u64).separate_with_commas()
    );

    // -- seal --------------------------------------------------------------
    let start = Instant::now();
    mm.index(Some(MAX_KEY)).expect("Failed to seal container");
    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "seal:   {:.3}s ({} records/s)",
        elapsed,
        ((mm.len() as f64 / elapsed) as u64).separate_with_commas()
    );

    // -- probe -------------------------------------------------------------
    let start = Instant::now();
    let mut rng = rng();
    let mut distinct = 0u64;
    for _ in 0..NUM_PROBES {
        let key = rng.random_range(1..=MAX_KEY);
        mm.for_unique_values_of(key, |_| distinct += 1).unwrap();
    }
    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "probe:  {:.3}s ({} probes/s, {} values touched)",
        elapsed,
        ((NUM_PROBES as f64 / elapsed) as u64).separate_with_commas(),
        distinct.separate_with_commas()
    );
}
