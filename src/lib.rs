//! # barpep
//!
//! Extraction of variable inserts (barcodes or peptide-coding sequences)
//! embedded between two constant flanking sequences in short sequencing reads.
//!
//! The insert may sit on either strand of the read. Every read is first
//! searched for the forward flanks and then for their reverse complements,
//! optionally restricted to a positional window around the expected insert
//! start. Matching is exact; no mismatches or indels are tolerated.
//!
//! ## Usage
//!
//! ```rust
//! use barpep::{aggregate, FlankSpecBuilder, InsertScanner};
//!
//! let spec = FlankSpecBuilder::new()
//!     .left(b"GATC")
//!     .right(b"CCGG")
//!     .insert_size(4)
//!     .build()
//!     .unwrap();
//! let scanner = InsertScanner::new(spec);
//!
//! let reads = ["GATCAAAACCGG", "gatcttttccgg", "TTTTTTTTTTTT"];
//! let report = aggregate(reads, &scanner);
//!
//! assert_eq!(report.read_count(), 3);
//! assert_eq!(report.miss_count(), 1);
//! assert_eq!(report.extracted(), &[b"AAAA".to_vec(), b"TTTT".to_vec()]);
//! ```

mod aggregate;
mod error;
mod fastq;
mod parallel;
mod report;
mod scanner;
mod search;
mod spec;
mod utils;

pub use aggregate::{aggregate, Aggregator, PROGRESS_INTERVAL};
pub use error::{Error, FlankSide, ReadError, Result, SpecError};
pub use fastq::{FastqSource, CHUNK_SIZE};
pub use parallel::{
    process_parallel, resolve_threads, scan_parallel, ParallelProcessor, ScanProcessor,
    BATCH_SIZE,
};
pub use report::ScanReport;
pub use scanner::{scan, scan_windowed, InsertScanner, MatchOutcome, ReadScanner, Strand};
pub use search::{find_from, rfind_within, FlankFinder, Span};
pub use spec::{FlankSpec, FlankSpecBuilder, SearchMode, Window, DEFAULT_MARGIN};
pub use utils::reverse_complement;
