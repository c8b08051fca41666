use std::fs::File;
use std::marker::PhantomData;
use std::mem;
use std::path::{Path, PathBuf};
use std::slice;

use memmap2::MmapMut;
use tracing::info;

use crate::store::appender::{AppendWriter, Appender};
use crate::store::backing::{self, BackingFile};
use crate::store::constants::SENTINEL_KEY;
use crate::store::error::{Phase, Result, StoreError};
use crate::store::iter::{Pairs, UniqueValues, Values};
use crate::store::key_index::KeyIndex;
use crate::store::options::StoreOptions;
use crate::store::record::{self, Record, Value};
use crate::store::sorter;

/// Disk-backed multimap from `u64` keys to fixed-size Pod values.
///
/// The backing file *is* the data structure: records are appended raw
/// during the writer phase, the whole file is sorted in place when the
/// container is sealed, and every query after that reads the mapping
/// directly. Duplicate keys, and duplicate `(key, value)` pairs, are
/// kept; after sealing they sit in contiguous sorted runs.
///
/// ## Lifecycle
///
/// - **Writing**: any number of producers append concurrently, either
///   one-shot through [`append`](MultiMap::append) or buffered through
///   [`writer`](MultiMap::writer) handles. No ordering guarantees, no
///   reads.
/// - **Ready**: [`index`](MultiMap::index) seals the container. The file
///   is truncated to its committed tail, sorted, and (when a maximum key
///   is declared) covered by a dense key→run table giving O(1) point
///   lookups. Read operators are then safe from any number of threads.
/// - **Closed**: [`close`](MultiMap::close) (or drop) flushes and
///   releases everything; the sorted file persists at the original path.
///
/// Transitions never go backwards, and wrong-phase calls return
/// [`StoreError::Phase`].
///
/// ## Example
///
/// ```rust
/// use runmap::MultiMap;
/// use tempfile::tempdir;
///
/// let dir = tempdir().unwrap();
/// let mut mm: MultiMap<u64> = MultiMap::create(dir.path().join("pairs.run")).unwrap();
///
/// {
///     let mut writer = mm.writer().unwrap();
///     writer.append(2, 20).unwrap();
///     writer.append(1, 30).unwrap();
///     writer.append(1, 10).unwrap();
/// }
/// mm.index(Some(2)).unwrap();
///
/// let pairs: Vec<(u64, u64)> = mm.iter().unwrap().map(|(k, v)| (k, *v)).collect();
/// assert_eq!(pairs, [(1, 10), (1, 30), (2, 20)]);
///
/// let values: Vec<u64> = mm.values_of(1).unwrap().copied().collect();
/// assert_eq!(values, [10, 30]);
/// ```
pub struct MultiMap<V: Value = u64> {
    path: PathBuf,
    options: StoreOptions,
    state: State<V>,
}

enum State<V: Value> {
    Writing(Appender),
    Ready(Sorted<V>),
    Closed,
}

/// Reader-phase view: the exactly-sized sorted mapping plus the optional
/// key table. A zero-record container holds no mapping at all (the OS
/// refuses zero-length maps) and serves every operator from an empty
/// slice.
struct Sorted<V: Value> {
    _file: File,
    map: Option<MmapMut>,
    records: u64,
    index: Option<KeyIndex>,
    _values: PhantomData<fn() -> V>,
}

impl<V: Value> Sorted<V> {
    fn records(&self) -> &[Record<V>] {
        match &self.map {
            Some(map) => record::records(&map[..]),
            None => &[],
        }
    }
}

impl<V: Value> MultiMap<V> {
    /// Creates a container at `path` with default options, clobbering any
    /// existing file there. The container starts in the writing phase.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with(path, StoreOptions::default())
    }

    /// Creates a container at `path` with explicit [`StoreOptions`].
    pub fn create_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let () = Record::<V>::PACKED;
        let path = path.as_ref().to_path_buf();
        let file = BackingFile::create(&path, options.initial_capacity)?;
        Ok(Self {
            state: State::Writing(Appender::new(file, Record::<V>::SIZE)),
            path,
            options,
        })
    }

    /// Path of the backing file; the sorted file persists there after the
    /// container is dropped.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn phase(&self) -> Phase {
        match &self.state {
            State::Writing(_) => Phase::Writing,
            State::Ready(_) => Phase::Ready,
            State::Closed => Phase::Closed,
        }
    }

    /// Records appended (writing phase) or stored (ready phase). A closed
    /// container reports zero.
    pub fn len(&self) -> u64 {
        match &self.state {
            State::Writing(appender) => appender.record_count(),
            State::Ready(sorted) => sorted.records,
            State::Closed => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn appender(&self) -> Result<&Appender> {
        match &self.state {
            State::Writing(appender) => Ok(appender),
            _ => Err(StoreError::Phase {
                required: Phase::Writing,
                actual: self.phase(),
            }),
        }
    }

    fn sorted(&self) -> Result<&Sorted<V>> {
        match &self.state {
            State::Ready(sorted) => Ok(sorted),
            _ => Err(StoreError::Phase {
                required: Phase::Ready,
                actual: self.phase(),
            }),
        }
    }

    /// One-shot append of a single record.
    ///
    /// Takes the tail lock once per call; producers with any volume should
    /// prefer a buffered [`writer`](MultiMap::writer) handle, which only
    /// locks once per few thousand records.
    pub fn append(&self, key: u64, value: V) -> Result<()> {
        if key == SENTINEL_KEY {
            return Err(StoreError::ReservedKey(key));
        }
        let staged = Record { key, value };
        self.appender()?
            .push_bytes(record::record_bytes(slice::from_ref(&staged)))
    }

    /// Hands out a buffered per-producer append handle.
    ///
    /// Any number of handles may be live at once; each stages records
    /// privately and flushes whole buffers to the shared tail. The handle
    /// borrows the container, so [`index`](MultiMap::index), which needs
    /// `&mut self`, cannot be reached until every producer has finished.
    pub fn writer(&self) -> Result<AppendWriter<'_, V>> {
        Ok(AppendWriter::new(
            self.appender()?,
            self.options.append_buffer_records,
        ))
    }

    /// Seals the container: writer → ready, irreversibly.
    ///
    /// The backing file is truncated to exactly the committed records,
    /// sorted in place (parallel, paged by the OS for files larger than
    /// RAM), and flushed. With `max_key` supplied, a dense key table over
    /// `[0, max_key]` is built so point lookups cost O(1); without it the
    /// container stays unindexed and point lookups binary-search.
    ///
    /// Every producer must have quiesced: outstanding writer handles
    /// borrow the container and make this call unreachable.
    ///
    /// A failed seal leaves the container closed: the records written so
    /// far stay on disk, but the in-memory container is done.
    pub fn index(&mut self, max_key: Option<u64>) -> Result<()> {
        let appender = match mem::replace(&mut self.state, State::Closed) {
            State::Writing(appender) => appender,
            other => {
                let actual = match other {
                    State::Ready(_) => Phase::Ready,
                    _ => Phase::Closed,
                };
                self.state = other;
                return Err(StoreError::Phase {
                    required: Phase::Writing,
                    actual,
                });
            }
        };

        let (file, records) = appender.finish()?;
        let mut map = if records == 0 {
            None
        } else {
            Some(backing::map_readable(&file)?)
        };
        if let Some(map) = map.as_mut() {
            sorter::sort_records(
                record::records_mut::<V>(&mut map[..]),
                self.options.sort_threads,
            )?;
            map.flush().map_err(StoreError::Map)?;
        }

        let index = match max_key {
            Some(max_key) => {
                let sorted = map
                    .as_ref()
                    .map(|map| record::records::<V>(&map[..]))
                    .unwrap_or(&[]);
                Some(KeyIndex::build(sorted, max_key)?)
            }
            None => None,
        };

        info!(
            path = %self.path.display(),
            records,
            indexed = index.is_some(),
            "sealed container"
        );

        self.state = State::Ready(Sorted {
            _file: file,
            map,
            records,
            index,
            _values: PhantomData,
        });
        Ok(())
    }

    pub(crate) fn sorted_records(&self) -> Result<&[Record<V>]> {
        Ok(self.sorted()?.records())
    }

    /// Restartable ordered iteration over every `(key, value)` pair.
    pub fn iter(&self) -> Result<Pairs<'_, V>> {
        Ok(Pairs::new(self.sorted_records()?))
    }

    /// Invokes `f(key, &value)` on every record in sorted order.
    pub fn for_each_pair(&self, mut f: impl FnMut(u64, &V)) -> Result<()> {
        for (key, value) in self.iter()? {
            f(key, value);
        }
        Ok(())
    }

    /// The contiguous sorted run holding every record for `key`.
    ///
    /// Indexed containers resolve the run through the key table; unindexed
    /// ones binary-search the lower and upper bounds of the key.
    fn run_of(&self, key: u64) -> Result<&[Record<V>]> {
        let sorted = self.sorted()?;
        let records = sorted.records();
        match &sorted.index {
            Some(index) => {
                let run = index.run(key).ok_or(StoreError::KeyAboveMax {
                    key,
                    max_key: index.max_key(),
                })?;
                Ok(&records[run])
            }
            None => {
                let lo = records.partition_point(|record| record.key < key);
                let hi = records.partition_point(|record| record.key <= key);
                Ok(&records[lo..hi])
            }
        }
    }

    /// Values stored under `key`, sorted, duplicates included.
    pub fn values_of(&self, key: u64) -> Result<Values<'_, V>> {
        Ok(Values::new(self.run_of(key)?))
    }

    /// Invokes `f(&value)` on every value stored under `key`.
    pub fn for_values_of(&self, key: u64, mut f: impl FnMut(&V)) -> Result<()> {
        for value in self.values_of(key)? {
            f(value);
        }
        Ok(())
    }

    /// Distinct values stored under `key`, sorted, each exactly once.
    ///
    /// Requires the key table: on a container sealed without `max_key`
    /// this returns [`StoreError::Unindexed`].
    pub fn unique_values_of(&self, key: u64) -> Result<UniqueValues<'_, V>> {
        if self.sorted()?.index.is_none() {
            return Err(StoreError::Unindexed);
        }
        Ok(UniqueValues::new(self.run_of(key)?))
    }

    /// Invokes `f(&value)` once per distinct value stored under `key`.
    pub fn for_unique_values_of(&self, key: u64, mut f: impl FnMut(&V)) -> Result<()> {
        for value in self.unique_values_of(key)? {
            f(value);
        }
        Ok(())
    }

    /// Bounds-checked random access into the sorted record array.
    pub fn at(&self, slot: u64) -> Result<(u64, V)> {
        let sorted = self.sorted()?;
        let record = sorted
            .records()
            .get(slot as usize)
            .ok_or(StoreError::OutOfBounds {
                index: slot,
                len: sorted.records,
            })?;
        Ok((record.key, record.value))
    }

    /// Flushes and releases mapping, table, and descriptor. Idempotent.
    ///
    /// Closing a still-writing container commits and truncates whatever
    /// was appended, leaving a valid (unsorted) record file behind. The
    /// file itself is never deleted; it is the persistent artifact.
    pub fn close(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, State::Closed) {
            State::Writing(appender) => {
                appender.finish()?;
            }
            State::Ready(sorted) => {
                if let Some(map) = &sorted.map {
                    map.flush().map_err(StoreError::Map)?;
                }
            }
            State::Closed => {}
        }
        Ok(())
    }
}

impl<V: Value> Drop for MultiMap<V> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(path = %self.path.display(), "close on drop failed: {err}");
        }
    }
}
