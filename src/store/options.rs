use crate::store::constants::{DEFAULT_APPEND_BUFFER_RECORDS, MIN_FILE_CAPACITY};

/// Tuning knobs for a container, passed to `create_with`.
///
/// The defaults suit the common case: per-producer buffers small enough to
/// stay cache-resident, a 1 MiB initial file, and the global rayon pool
/// for the sort.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub(crate) append_buffer_records: usize,
    pub(crate) initial_capacity: u64,
    pub(crate) sort_threads: Option<usize>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            append_buffer_records: DEFAULT_APPEND_BUFFER_RECORDS,
            initial_capacity: MIN_FILE_CAPACITY,
            sort_threads: None,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records each producer stages before hitting the shared tail.
    pub fn append_buffer_records(mut self, records: usize) -> Self {
        self.append_buffer_records = records.max(1);
        self
    }

    /// Bytes to pre-allocate when the backing file is created.
    pub fn initial_capacity(mut self, bytes: u64) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Worker threads for the seal-time sort; a dedicated pool is built
    /// for the call instead of touching process-wide state.
    pub fn sort_threads(mut self, threads: usize) -> Self {
        self.sort_threads = Some(threads);
        self
    }
}
