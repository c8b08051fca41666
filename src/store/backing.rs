use memmap2::{MmapMut, MmapOptions, MmapRaw};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::store::constants::{MAX_GROWTH_STEP, MIN_FILE_CAPACITY};
use crate::store::error::{Result, StoreError};

/// Owns the record file and the writer-phase capacity mapping.
///
/// The mapping always covers the full pre-allocated capacity, not just the
/// committed records; the appender hands out shared handles to it so bulk
/// copies can proceed outside the tail lock. The layer never interprets
/// record contents.
pub(crate) struct BackingFile {
    path: PathBuf,
    file: File,
    map: Arc<MmapRaw>,
    capacity: u64,
}

impl BackingFile {
    /// Creates (or clobbers) the file at `path`, pre-allocates
    /// `initial_capacity` bytes, and maps them read/write.
    pub(crate) fn create(path: &Path, initial_capacity: u64) -> Result<Self> {
        let capacity = initial_capacity.max(MIN_FILE_CAPACITY);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        file.set_len(capacity).map_err(|source| StoreError::Extend {
            bytes: capacity,
            source,
        })?;
        let map = map_capacity(&file)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            map: Arc::new(map),
            capacity,
        })
    }

    pub(crate) fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Shared handle to the current mapping.
    ///
    /// Clones are cheap. A handle taken before a growth keeps the
    /// superseded mapping object alive until its last holder drops it; both
    /// mappings cover the same file pages, so a bulk copy through a stale
    /// handle still lands in the file.
    pub(crate) fn map(&self) -> Arc<MmapRaw> {
        Arc::clone(&self.map)
    }

    /// Extends the file until at least `bytes` are mapped, then remaps.
    ///
    /// The caller must hold the tail lock: the capacity bump and the
    /// mapping swap have to be observed atomically by the next reservation.
    pub(crate) fn grow_to(&mut self, bytes: u64) -> Result<()> {
        let mut capacity = self.capacity;
        while capacity < bytes {
            capacity = grown_capacity(capacity);
        }
        self.file.set_len(capacity).map_err(|source| StoreError::Extend {
            bytes: capacity,
            source,
        })?;
        self.map = Arc::new(map_capacity(&self.file)?);
        debug!(
            path = %self.path.display(),
            old_capacity = self.capacity,
            new_capacity = capacity,
            "grew backing file"
        );
        self.capacity = capacity;
        Ok(())
    }

    /// Writer-phase shutdown: flushes dirty pages, drops the capacity
    /// mapping, and cuts the pre-allocated slop so the file holds exactly
    /// `bytes` of committed records before the sorter maps it.
    pub(crate) fn finish(self, bytes: u64) -> Result<File> {
        self.map.flush().map_err(StoreError::Map)?;
        drop(self.map);
        self.file.set_len(bytes).map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })?;
        self.file.sync_all().map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), bytes, "truncated backing file to committed tail");
        Ok(self.file)
    }
}

fn map_capacity(file: &File) -> Result<MmapRaw> {
    MmapOptions::new().map_raw(file).map_err(StoreError::Map)
}

/// Maps the finished, exactly-sized record file for the reader phase.
pub(crate) fn map_readable(file: &File) -> Result<MmapMut> {
    // SAFETY: the engine holds the only open handle to the file and never
    // resizes it while this mapping is live; the reader phase is immutable
    // apart from the one-shot in-place sort behind `&mut`.
    unsafe { MmapOptions::new().map_mut(file).map_err(StoreError::Map) }
}

/// Next capacity step: geometric until the step cap, then linear.
fn grown_capacity(capacity: u64) -> u64 {
    if capacity >= MAX_GROWTH_STEP {
        capacity + MAX_GROWTH_STEP
    } else {
        (capacity * 2).max(MIN_FILE_CAPACITY)
    }
}
