use std::path::Path;

use crate::store::appender::AppendWriter;
use crate::store::error::{Phase, Result};
use crate::store::iter::{Elements, ValueCounts};
use crate::store::multi_map::MultiMap;
use crate::store::options::StoreOptions;

/// Disk-backed multiset of `u64` values: a [`MultiMap`] with no payload.
///
/// Elements are stored as bare record keys, so the appender, the sorter,
/// and the mapping layer are reused unchanged; a record is just 8 bytes.
/// No key table is ever built; after sealing, iteration is linear over
/// the sorted file and aggregation groups adjacent equal elements.
///
/// ## Example
///
/// ```rust
/// use runmap::MultiSet;
/// use tempfile::tempdir;
///
/// let dir = tempdir().unwrap();
/// let mut ms = MultiSet::create(dir.path().join("values.run")).unwrap();
///
/// for value in [3, 1, 4, 1, 5] {
///     ms.append(value).unwrap();
/// }
/// ms.index().unwrap();
///
/// let counts: Vec<(u64, u64)> = ms.value_counts().unwrap().collect();
/// assert_eq!(counts, [(1, 2), (3, 1), (4, 1), (5, 1)]);
/// ```
pub struct MultiSet {
    inner: MultiMap<()>,
}

impl MultiSet {
    /// Creates a multiset at `path` with default options, clobbering any
    /// existing file there.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            inner: MultiMap::create(path)?,
        })
    }

    /// Creates a multiset at `path` with explicit [`StoreOptions`].
    pub fn create_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        Ok(Self {
            inner: MultiMap::create_with(path, options)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase()
    }

    /// Elements appended (writing phase) or stored (ready phase).
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// One-shot append of a single element.
    pub fn append(&self, value: u64) -> Result<()> {
        self.inner.append(value, ())
    }

    /// Hands out a buffered per-producer append handle.
    pub fn writer(&self) -> Result<SetWriter<'_>> {
        Ok(SetWriter {
            inner: self.inner.writer()?,
        })
    }

    /// Seals the multiset: truncate, sort, flush. No key table is built.
    pub fn index(&mut self) -> Result<()> {
        self.inner.index(None)
    }

    /// Elements in sorted order, duplicates included.
    pub fn iter(&self) -> Result<Elements<'_>> {
        Ok(Elements::new(self.inner.sorted_records()?))
    }

    /// One `(value, count)` pair per distinct element, in sorted order.
    pub fn value_counts(&self) -> Result<ValueCounts<'_>> {
        Ok(ValueCounts::new(self.inner.sorted_records()?))
    }

    /// Invokes `f(value, count)` once per distinct element.
    pub fn for_each_value_count(&self, mut f: impl FnMut(u64, u64)) -> Result<()> {
        for (value, count) in self.value_counts()? {
            f(value, count);
        }
        Ok(())
    }

    /// Bounds-checked random access into the sorted element array.
    pub fn at(&self, slot: u64) -> Result<u64> {
        self.inner.at(slot).map(|(value, ())| value)
    }

    /// Flushes and releases. Idempotent; the file persists on disk.
    pub fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

/// Buffered per-producer append handle for a [`MultiSet`].
pub struct SetWriter<'a> {
    inner: AppendWriter<'a, ()>,
}

impl SetWriter<'_> {
    /// Stages one element, flushing when the buffer fills.
    pub fn append(&mut self, value: u64) -> Result<()> {
        self.inner.append(value, ())
    }

    /// Pushes all staged elements to the file tail.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}
