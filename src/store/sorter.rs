use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

use crate::store::error::Result;
use crate::store::record::{Record, Value};

/// Sorts the mapped record array in place, lexicographically by
/// `(key, value)`.
///
/// The sort runs directly on the mapping; for files larger than RAM the
/// OS pages record ranges in and out as the workers touch them, so no
/// temporary file is needed. Records with identical `(key, value)` are
/// indistinguishable, so an unstable sort suffices.
///
/// `threads` bounds the parallelism with a dedicated pool scoped to this
/// call; `None` uses the global pool.
pub(crate) fn sort_records<V: Value>(
    records: &mut [Record<V>],
    threads: Option<usize>,
) -> Result<()> {
    let start = Instant::now();
    match threads {
        Some(threads) => ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(|| records.par_sort_unstable()),
        None => records.par_sort_unstable(),
    }
    debug!(
        records = records.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "sorted record file"
    );
    Ok(())
}
