//! # runmap
//!
//! Disk-backed, memory-mapped associative containers for workloads that
//! build a large static index from a stream of unordered insertions and
//! then query it repeatedly:
//! - [`MultiMap`]: `u64` keys to arbitrary fixed-size Pod values,
//!   duplicates allowed (including duplicate pairs).
//! - [`MultiSet`]: bare `u64` values with count aggregation.
//!
//! Both follow a two-phase lifecycle: a **writer** phase in which any
//! number of producers append in parallel with no ordering guarantees,
//! then an irreversible **reader** phase entered by sealing the container,
//! which sorts the whole backing file in place and (for the multimap,
//! optionally) builds a dense key table for O(1) point lookups. The file
//! *is* the data structure: it may be far larger than RAM, and every
//! query runs directly on memory-mapped pages.
//!
//! ## Features
//! - **Parallel write path**: per-producer staging buffers, one short
//!   tail-lock window per buffer flush, geometric file growth.
//! - **In-place parallel sort** at the writer→reader transition; no
//!   temporary file, the OS pages the working set.
//! - **O(1) key runs**: a padded offset table over a dense key domain
//!   turns every point query into one table read plus a contiguous scan.
//! - **Zero-copy reads**: iterators hand out references straight into the
//!   mapping.
//!
//! ## Example
//!
//! ```rust
//! use runmap::MultiMap;
//! use tempfile::tempdir;
//!
//! let dir = tempdir().unwrap();
//! let mut mm: MultiMap<u64> = MultiMap::create(dir.path().join("pairs.run")).unwrap();
//!
//! // Writer phase: producers append in any order, from any thread.
//! std::thread::scope(|scope| {
//!     for producer in 0..4u64 {
//!         let mm = &mm;
//!         scope.spawn(move || {
//!             let mut writer = mm.writer().unwrap();
//!             for i in 0..1000 {
//!                 writer.append(i % 10 + 1, producer * 1000 + i).unwrap();
//!             }
//!         });
//!     }
//! });
//!
//! // Seal: truncate, sort, build the key table over [0, 10].
//! mm.index(Some(10)).unwrap();
//!
//! // Reader phase: ordered iteration and O(1) per-key runs.
//! assert_eq!(mm.len(), 4000);
//! assert_eq!(mm.values_of(3).unwrap().len(), 400);
//! let mut distinct = 0;
//! mm.for_unique_values_of(3, |_| distinct += 1).unwrap();
//! assert_eq!(distinct, 400);
//! ```
//!
//! ## Concurrency contract
//!
//! Writer phase: many writers, zero readers. `append` and writer handles
//! are the only legal operations. Reader phase: zero writers, many
//! readers, and every operator is `&self` and thread-safe. The transition
//! itself takes `&mut self`, and writer handles borrow the container, so
//! the borrow checker enforces producer quiescence before sealing.
//!
//! ## On-disk format
//!
//! A raw array of fixed-size records in host byte order, with no header,
//! footer, or padding. The file is meaningful only to a reader that knows
//! the record layout it was written with; it is not a cross-architecture
//! interchange format.

pub mod store;

pub use store::*;
