use bytemuck::{Pod, Zeroable};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use runmap::{MultiMap, MultiSet, StoreOptions, Value};
use std::time::Instant;
use tracing::info;

mod cli;
use cli::Cli;

/// Two-field payload for the complex-value mode.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Pod, Zeroable)]
struct WidePair {
    a: u64,
    b: u64,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();

    let outcome = if cli.multiset {
        run_multiset(&cli)
    } else if cli.complex {
        run_map(&cli, |rng: &mut StdRng, max: u64| WidePair {
            a: rng.random_range(1..=max),
            b: rng.random_range(1..=max),
        })
    } else {
        run_map(&cli, |rng: &mut StdRng, max: u64| rng.random_range(1..=max))
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn options_for(cli: &Cli) -> StoreOptions {
    match cli.threads {
        Some(threads) => StoreOptions::new().sort_threads(threads),
        None => StoreOptions::new(),
    }
}

fn producer_threads(cli: &Cli) -> usize {
    cli.threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|threads| threads.get())
            .unwrap_or(1)
    })
}

/// Records the worker contributes so every worker's share differs by at
/// most one.
fn share(total: u64, workers: usize, worker: usize) -> u64 {
    total / workers as u64 + u64::from((worker as u64) < total % workers as u64)
}

fn run_map<V: Value>(cli: &Cli, make_value: fn(&mut StdRng, u64) -> V) -> runmap::Result<()> {
    let mut mm: MultiMap<V> = MultiMap::create_with(&cli.test_file, options_for(cli))?;
    let max_key = cli.max_value;
    let workers = producer_threads(cli);
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());

    let append_start = Instant::now();
    std::thread::scope(|scope| -> runmap::Result<()> {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let mm = &mm;
                let count = share(cli.test_size, workers, worker);
                scope.spawn(move || -> runmap::Result<()> {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(worker as u64));
                    let mut writer = mm.writer()?;
                    for _ in 0..count {
                        let key = rng.random_range(1..=max_key);
                        writer.append(key, make_value(&mut rng, max_key))?;
                    }
                    writer.flush()
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("producer thread panicked")?;
        }
        Ok(())
    })?;
    info!(
        records = cli.test_size,
        workers,
        elapsed_ms = append_start.elapsed().as_millis() as u64,
        "append phase done"
    );

    let seal_start = Instant::now();
    mm.index(if cli.unpadded { None } else { Some(max_key) })?;
    info!(
        elapsed_ms = seal_start.elapsed().as_millis() as u64,
        unpadded = cli.unpadded,
        "sealed"
    );

    let mut value_count = 0u64;
    let mut distinct_keys = Vec::new();
    mm.for_each_pair(|key, _| {
        if distinct_keys.last() != Some(&key) {
            distinct_keys.push(key);
        }
        value_count += 1;
    })?;

    eprintln!("{} keys", distinct_keys.len());
    eprintln!("{value_count} values");

    if cli.unpadded {
        eprintln!("unique pairs unavailable without a key table");
    } else {
        let mut unique_pairs = 0u64;
        for &key in &distinct_keys {
            mm.for_unique_values_of(key, |_| unique_pairs += 1)?;
        }
        eprintln!("{unique_pairs} unique pairs");

        if cli.unique_value_tests > 0 {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(0x9e37_79b9_7f4a_7c15));
            let mut touched = 0u64;
            let probe_start = Instant::now();
            for _ in 0..cli.unique_value_tests {
                let key = rng.random_range(1..=max_key);
                mm.for_unique_values_of(key, |_| touched += 1)?;
            }
            eprintln!(
                "{:.9}s per unique value call ({touched} values touched)",
                probe_start.elapsed().as_secs_f64() / cli.unique_value_tests as f64
            );
        }
    }

    mm.close()
}

fn run_multiset(cli: &Cli) -> runmap::Result<()> {
    let mut ms = MultiSet::create_with(&cli.test_file, options_for(cli))?;
    let max_value = cli.max_value;
    let workers = producer_threads(cli);
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());

    std::thread::scope(|scope| -> runmap::Result<()> {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let ms = &ms;
                let count = share(cli.test_size, workers, worker);
                scope.spawn(move || -> runmap::Result<()> {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(worker as u64));
                    let mut writer = ms.writer()?;
                    for _ in 0..count {
                        writer.append(rng.random_range(1..=max_value))?;
                    }
                    writer.flush()
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("producer thread panicked")?;
        }
        Ok(())
    })?;

    ms.index()?;

    let mut value_count = 0u64;
    let mut unique_values = 0u64;
    let mut counted_sum = 0u64;
    ms.for_each_value_count(|value, count| {
        unique_values += 1;
        value_count += count;
        counted_sum += count * value;
    })?;

    let mut walked_count = 0u64;
    let mut walked_sum = 0u64;
    for value in ms.iter()? {
        walked_count += 1;
        walked_sum += value;
    }

    eprintln!("{value_count} values, expected {}", cli.test_size);
    eprintln!("{unique_values} unique values");
    eprintln!("sums {counted_sum} {walked_sum} (walked {walked_count})");

    ms.close()
}
