use clap::Parser;
use indoc::indoc;
use std::path::PathBuf;

const AFTER_HELP: &str = indoc! {"
    Examples:
      # 10M random pairs, keys in [1, 1M], padded key table, 8 threads
      %BIN% --test-file /tmp/pairs.run -s 10000000 -M 1000000 -t 8 -u 1000

      # the same data without a key table (point queries binary-search)
      %BIN% --test-file /tmp/pairs.run -s 10000000 -M 1000000 -P

      # multiset of 10M values with count aggregation
      %BIN% --test-file /tmp/values.run -s 10000000 -M 1000000 -m
"};

/// Random-data exerciser for the disk-backed containers.
///
/// Appends records from producer threads, seals the container, walks the
/// sorted pairs, and reports key / value / unique-pair counts plus probe
/// timings on stderr.
#[derive(Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
#[command(after_help = AFTER_HELP.replace("%BIN%", env!("CARGO_PKG_NAME")))]
pub struct Cli {
    /// Exercise a container backed by this file (clobbered if present).
    #[arg(short = 'T', long = "test-file", value_name = "FILE")]
    pub test_file: PathBuf,

    /// Number of records to append.
    #[arg(short = 's', long = "test-size", value_name = "N", default_value_t = 1_000_000)]
    pub test_size: u64,

    /// Draw keys and values uniformly from [1, N].
    #[arg(short = 'M', long = "max-value", value_name = "N", default_value_t = 1_000)]
    pub max_value: u64,

    /// Producer threads; also bounds the seal-time sort. Defaults to the
    /// available parallelism.
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Timed unique-value probes to run after the walk.
    #[arg(short = 'u', long = "unique-vals", value_name = "N", default_value_t = 0)]
    pub unique_value_tests: u64,

    /// Exercise the multiset instead of the multimap.
    #[arg(short = 'm', long = "test-multiset", conflicts_with_all = ["complex", "unpadded"])]
    pub multiset: bool,

    /// Store a two-field payload instead of a bare u64 value.
    #[arg(short = 'c', long = "test-complex-values")]
    pub complex: bool,

    /// Seal without a key table; point queries binary-search instead.
    #[arg(short = 'P', long = "test-unpadded")]
    pub unpadded: bool,

    /// Seed for the record generator (random when omitted).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}
