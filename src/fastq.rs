//! FASTQ input
//!
//! Opens plain or compressed (gzip, bzip2, xz, zstd) FASTQ streams and hands
//! the nucleotide sequence of every record to the caller. Headers and quality
//! strings are not interpreted here.

use std::{io::Read, path::Path};

use seq_io::fastq::{Reader, Record};
use tracing::{debug, info};

use crate::{
    aggregate::PROGRESS_INTERVAL,
    error::{ReadError, Result},
    parallel::scan_parallel,
    report::ScanReport,
    scanner::ReadScanner,
};

/// Default number of records held in memory by [`FastqSource::scan_chunked`]
pub const CHUNK_SIZE: usize = 1 << 18;

/// A stream of FASTQ records
pub struct FastqSource {
    reader: Reader<Box<dyn Read>>,
    n_processed: usize,
}
impl FastqSource {
    /// Wraps an arbitrary byte stream, detecting compression from its first bytes
    pub fn new<R: Read + 'static>(inner: R) -> Result<Self> {
        let (handle, format) = niffler::get_reader(Box::new(inner)).map_err(ReadError::from)?;
        debug!(?format, "opened FASTQ stream");
        Ok(Self {
            reader: Reader::new(handle),
            n_processed: 0,
        })
    }

    /// Opens a FASTQ file from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (handle, format) = niffler::from_path(path.as_ref()).map_err(ReadError::from)?;
        debug!(path = %path.as_ref().display(), ?format, "opened FASTQ file");
        Ok(Self {
            reader: Reader::new(handle),
            n_processed: 0,
        })
    }

    /// Number of records read so far
    #[must_use]
    pub fn n_processed(&self) -> usize {
        self.n_processed
    }

    /// Calls `f` with the sequence of every remaining record
    pub fn for_each_read<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8]),
    {
        while let Some(record) = self.reader.next() {
            let record = record.map_err(|source| ReadError::Fastq {
                record: self.n_processed,
                source,
            })?;
            f(record.seq());
            self.n_processed += 1;
        }
        Ok(())
    }

    /// Replaces the contents of `chunk` with up to `size` of the next sequences
    ///
    /// Returns the number of sequences read, `0` once the stream is exhausted.
    pub fn fill_chunk(&mut self, chunk: &mut Vec<Vec<u8>>, size: usize) -> Result<usize> {
        chunk.clear();
        while chunk.len() < size {
            let Some(record) = self.reader.next() else {
                break;
            };
            let record = record.map_err(|source| ReadError::Fastq {
                record: self.n_processed,
                source,
            })?;
            chunk.push(record.seq().to_vec());
            self.n_processed += 1;
        }
        Ok(chunk.len())
    }

    /// Scans the remaining records on `num_threads` threads
    ///
    /// At most `chunk_size` records are held in memory at once. Chunks are
    /// scanned one after another and merged in stream order, so the result
    /// equals a sequential pass over the same records.
    pub fn scan_chunked<S>(
        &mut self,
        scanner: S,
        num_threads: usize,
        chunk_size: usize,
    ) -> Result<ScanReport>
    where
        S: ReadScanner + Sync,
    {
        let chunk_size = chunk_size.max(1);
        let mut report = ScanReport::new();
        let mut chunk = Vec::with_capacity(chunk_size);
        while self.fill_chunk(&mut chunk, chunk_size)? > 0 {
            let before = report.read_count() / PROGRESS_INTERVAL;
            report.merge(scan_parallel(&chunk, &scanner, num_threads)?);
            if report.read_count() / PROGRESS_INTERVAL > before {
                info!(
                    "{} mio reads checked",
                    report.read_count() / PROGRESS_INTERVAL * PROGRESS_INTERVAL / 1_000_000
                );
            }
        }
        debug!(
            reads = report.read_count(),
            missed = report.miss_count(),
            "chunked scan complete"
        );
        Ok(report)
    }

    /// Reads all remaining sequences into memory
    pub fn collect_sequences(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut sequences = Vec::new();
        self.for_each_read(|seq| sequences.push(seq.to_vec()))?;
        Ok(sequences)
    }
}
