pub mod constants;

mod error;
pub use error::{Phase, Result, StoreError};

mod record;
pub use record::{Record, Value};

mod backing;

mod appender;
pub use appender::AppendWriter;

mod sorter;

mod key_index;

mod iter;
pub use iter::{Elements, Pairs, UniqueValues, ValueCounts, Values};

mod options;
pub use options::StoreOptions;

mod multi_map;
pub use multi_map::MultiMap;

mod multi_set;
pub use multi_set::{MultiSet, SetWriter};
