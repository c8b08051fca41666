// Reserved key: the engine uses the maximum representable key as its
// absent/end-of-run marker, so user records may never carry it.
pub const SENTINEL_KEY: u64 = u64::MAX;

// Records staged per producer before one tail reservation + bulk copy.
// Sized so a buffer of 16-byte records stays well under L2.
pub const DEFAULT_APPEND_BUFFER_RECORDS: usize = 4096;

// File growth: double from the floor until the step cap, then grow
// linearly in cap-sized chunks.
pub const MIN_FILE_CAPACITY: u64 = 1024 * 1024; // 1 MiB
pub const MAX_GROWTH_STEP: u64 = 1024 * 1024 * 1024; // 1 GiB
