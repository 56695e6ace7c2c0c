use tracing::{debug, info};

use crate::{report::ScanReport, scanner::ReadScanner};

/// Number of reads between two progress messages
pub const PROGRESS_INTERVAL: usize = 10_000_000;

/// Feeds reads through a scanner and accumulates a [`ScanReport`]
///
/// Each read is upper-cased into an internal buffer that is reused across
/// calls, so a full pass allocates only for the extracted inserts.
#[derive(Debug, Clone)]
pub struct Aggregator<S: ReadScanner> {
    scanner: S,
    report: ScanReport,
    sbuf: Vec<u8>,
}
impl<S: ReadScanner> Aggregator<S> {
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            report: ScanReport::new(),
            sbuf: Vec::new(),
        }
    }

    /// Scans a single read and records its outcome
    pub fn push(&mut self, read: &[u8]) {
        self.report.scan_read(&self.scanner, read, &mut self.sbuf);
        if self.report.read_count() % PROGRESS_INTERVAL == 0 {
            info!(
                "{} mio reads checked",
                self.report.read_count() / 1_000_000
            );
        }
    }

    /// Scans every read in the stream
    pub fn extend<I, R>(&mut self, reads: I)
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        for read in reads {
            self.push(read.as_ref());
        }
    }

    /// Current state of the report
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// Consumes the aggregator and returns the accumulated report
    pub fn finish(self) -> ScanReport {
        debug!(
            reads = self.report.read_count(),
            missed = self.report.miss_count(),
            "scan pass complete"
        );
        self.report
    }
}

/// Scans a whole read stream sequentially
///
/// # Examples
///
/// ```
/// # use barpep::{aggregate, FlankSpec, InsertScanner};
/// let scanner = InsertScanner::new(FlankSpec::new(b"GATC", b"CCGG", 4).unwrap());
/// let report = aggregate(["GATCAAAACCGG", "TTTTTTTT"], &scanner);
/// assert_eq!(report.read_count(), 2);
/// assert_eq!(report.miss_count(), 1);
/// ```
pub fn aggregate<I, R, S>(reads: I, scanner: S) -> ScanReport
where
    I: IntoIterator<Item = R>,
    R: AsRef<[u8]>,
    S: ReadScanner,
{
    let mut aggregator = Aggregator::new(scanner);
    aggregator.extend(reads);
    aggregator.finish()
}
