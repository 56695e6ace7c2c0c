/// Custom Result type for barpep operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the barpep library, encompassing all possible error cases
/// that can occur while configuring a scan or feeding reads to it.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors related to the flank specification
    SpecError(#[from] SpecError),
    /// Errors that occur while reading input records
    ReadError(#[from] ReadError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
}

/// Which of the two constant flanks an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlankSide {
    Left,
    Right,
}
impl std::fmt::Display for FlankSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Setup-time misconfiguration of a flank specification.
///
/// These are always raised before the first read is scanned.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SpecError {
    /// One of the constant flanks is an empty string
    #[error("The {side} flank sequence is empty")]
    EmptyFlank { side: FlankSide },

    /// The expected insert length is zero
    #[error("Insert size must be greater than zero")]
    ZeroInsertSize,

    /// The insert size plus a flank length overflows the address space
    ///
    /// # Arguments
    /// * `usize` - The requested insert size
    #[error("Insert size {0} is too large")]
    InsertTooLarge(usize),

    /// A flank contains a byte that is not a nucleotide
    ///
    /// # Fields
    /// * `side` - The flank containing the invalid byte
    /// * `base` - The offending byte (as a char)
    #[error("Invalid nucleotide '{base}' in the {side} flank")]
    InvalidNucleotide { side: FlankSide, base: char },

    /// Windowed mode was requested but a window field is missing
    ///
    /// # Arguments
    /// * `&'static str` - Name of the first missing field
    #[error("Windowed search requested but `{0}` was not provided")]
    IncompleteWindow(&'static str),
}

/// Errors that can occur while reading sequencing records
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The compression layer could not be opened
    #[error("Unable to open input stream: {0}")]
    Decompression(#[from] niffler::Error),

    /// A FASTQ record could not be parsed
    ///
    /// # Fields
    /// * `record` - Number of records successfully read before the failure
    /// * `source` - The underlying parser error
    #[error("Invalid FASTQ record after {record} records: {source}")]
    Fastq {
        record: usize,
        source: seq_io::fastq::Error,
    },

    /// A worker thread panicked while scanning its shard
    ///
    /// # Arguments
    /// * `usize` - The thread id of the failed shard
    #[error("Scan worker {0} panicked")]
    WorkerPanic(usize),
}
