use std::fs::File;
use std::ptr;
use std::sync::{Arc, Mutex};
use tracing::warn;

use memmap2::MmapRaw;

use crate::store::backing::BackingFile;
use crate::store::constants::SENTINEL_KEY;
use crate::store::error::{Result, StoreError};
use crate::store::record::{self, Record, Value};

/// Writer-phase tail of the record file.
///
/// A single mutex guards the committed record count and the capacity
/// mapping; it is held for O(1) bookkeeping per buffer flush (plus the
/// occasional growth), never per record and never during a bulk copy.
pub(crate) struct Appender {
    record_size: usize,
    tail: Mutex<Tail>,
}

struct Tail {
    file: BackingFile,
    records: u64,
}

impl Appender {
    pub(crate) fn new(file: BackingFile, record_size: usize) -> Self {
        Self {
            record_size,
            tail: Mutex::new(Tail { file, records: 0 }),
        }
    }

    /// Records committed so far (reserved ranges count as committed).
    pub(crate) fn record_count(&self) -> u64 {
        self.tail.lock().unwrap().records
    }

    /// Reserves `n` record slots at the tail, growing the file if the
    /// reservation overruns the mapped capacity.
    ///
    /// Returns the mapping to copy through and the first reserved slot.
    /// Ranges handed out by successive reservations are disjoint, so the
    /// copies themselves can race freely.
    fn reserve(&self, n: u64) -> Result<(Arc<MmapRaw>, u64)> {
        let mut tail = self.tail.lock().unwrap();
        let first = tail.records;
        let needed = (first + n) * self.record_size as u64;
        if needed > tail.file.capacity() {
            tail.file.grow_to(needed)?;
        }
        tail.records = first + n;
        Ok((tail.file.map(), first))
    }

    /// Copies whole staged records into freshly reserved tail slots.
    pub(crate) fn push_bytes(&self, src: &[u8]) -> Result<()> {
        debug_assert_eq!(src.len() % self.record_size, 0);
        let n = (src.len() / self.record_size) as u64;
        if n == 0 {
            return Ok(());
        }
        let (map, first) = self.reserve(n)?;
        let offset = first as usize * self.record_size;
        // SAFETY:
        // - `reserve` handed out `[offset, offset + src.len())` exclusively
        //   and the range lies inside the mapped capacity.
        // - Concurrent flushes write disjoint reserved ranges.
        // - `map` keeps this mapping object alive even if another producer
        //   grows the file and swaps in a new one mid-copy; both views
        //   cover the same file pages.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), map.as_mut_ptr().add(offset), src.len());
        }
        Ok(())
    }

    /// Ends the writer phase: truncates the pre-allocated slop to exactly
    /// the committed records and syncs. The caller must have quiesced all
    /// producers first.
    pub(crate) fn finish(self) -> Result<(File, u64)> {
        let tail = self.tail.into_inner().unwrap();
        let records = tail.records;
        let file = tail.file.finish(records * self.record_size as u64)?;
        Ok((file, records))
    }
}

/// Buffered per-producer append handle.
///
/// Each producer stages records in a private buffer and hits the shared
/// tail only when the buffer fills, so the common append path touches no
/// shared state at all. Handles borrow the container, which is what lets
/// `index(..)` demand (at compile time) that every producer has quiesced.
///
/// Dropping the handle flushes whatever is still staged; a flush failure
/// at that point is logged rather than panicked, so producers that want
/// the error must call [`AppendWriter::flush`] themselves.
pub struct AppendWriter<'a, V: Value> {
    appender: &'a Appender,
    buf: Vec<Record<V>>,
}

impl<'a, V: Value> AppendWriter<'a, V> {
    pub(crate) fn new(appender: &'a Appender, buffer_records: usize) -> Self {
        Self {
            appender,
            buf: Vec::with_capacity(buffer_records.max(1)),
        }
    }

    /// Stages one record, flushing to the file tail when the buffer fills.
    ///
    /// The reserved sentinel key is rejected up front; letting it into the
    /// file would corrupt the index's end-of-run bookkeeping later.
    pub fn append(&mut self, key: u64, value: V) -> Result<()> {
        if key == SENTINEL_KEY {
            return Err(StoreError::ReservedKey(key));
        }
        self.buf.push(Record { key, value });
        if self.buf.len() == self.buf.capacity() {
            self.flush()?;
        }
        Ok(())
    }

    /// Pushes all staged records to the file tail.
    pub fn flush(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.appender.push_bytes(record::record_bytes(&self.buf))?;
        self.buf.clear();
        Ok(())
    }
}

impl<V: Value> Drop for AppendWriter<'_, V> {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!(staged = self.buf.len(), "append buffer lost on drop: {err}");
        }
    }
}
