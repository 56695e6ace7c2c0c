use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    error::{ReadError, Result},
    report::ScanReport,
    scanner::ReadScanner,
};

/// Number of reads a worker processes between two `on_batch_complete` calls
pub const BATCH_SIZE: usize = 1024;

/// Trait for types that can process reads in parallel.
///
/// Every worker thread receives its own clone of the processor and feeds it a
/// contiguous shard of the input. Shared state should live behind an `Arc` and
/// be updated in [`ParallelProcessor::on_batch_complete`].
pub trait ParallelProcessor: Send + Clone {
    /// Process a single read
    fn process_read(&mut self, read: &[u8]) -> Result<()>;

    /// Called after every [`BATCH_SIZE`] reads and once at the end of a shard
    /// Default implementation does nothing
    fn on_batch_complete(&mut self) -> Result<()> {
        Ok(())
    }

    /// Set the thread ID for this processor
    ///
    /// Each thread calls this method with its own unique ID, which is also the
    /// index of its shard in stream order.
    fn set_tid(&mut self, _tid: usize) {
        // Default implementation does nothing
    }

    /// Get the thread ID for this processor
    fn get_tid(&self) -> Option<usize> {
        None
    }
}

/// Resolves a requested thread count, `0` meaning all logical CPUs
#[must_use]
pub fn resolve_threads(num_threads: usize) -> usize {
    if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads
    }
}

/// Splits `reads` into contiguous shards and processes each on its own thread
///
/// Shard `tid` covers `reads[tid * n .. (tid + 1) * n]` with
/// `n = ceil(len / num_threads)`.
pub fn process_parallel<R, P>(reads: &[R], processor: P, num_threads: usize) -> Result<()>
where
    R: AsRef<[u8]> + Sync,
    P: ParallelProcessor,
{
    let num_threads = resolve_threads(num_threads);
    let num_reads = reads.len();
    let reads_per_thread = num_reads.div_ceil(num_threads);

    std::thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(num_threads);
        for tid in 0..num_threads {
            let mut processor = processor.clone();
            processor.set_tid(tid);

            let start_idx = (tid * reads_per_thread).min(num_reads);
            let end_idx = (start_idx + reads_per_thread).min(num_reads);
            let shard = &reads[start_idx..end_idx];

            let handle = scope.spawn(move || -> Result<()> {
                for (batch_idx, read) in shard.iter().enumerate() {
                    processor.process_read(read.as_ref())?;
                    if (batch_idx + 1) % BATCH_SIZE == 0 {
                        processor.on_batch_complete()?;
                    }
                }
                processor.on_batch_complete()?;
                debug!(tid, reads = shard.len(), "shard complete");
                Ok(())
            });
            handles.push(handle);
        }

        for (tid, handle) in handles.into_iter().enumerate() {
            handle.join().map_err(|_| ReadError::WorkerPanic(tid))??;
        }
        Ok(())
    })
}

/// Parallel processor that scans reads and collects per-shard reports
///
/// The local report is flushed into the shared shard table at every batch
/// boundary. [`ScanProcessor::take_report`] merges the shards in thread order,
/// which is stream order for [`process_parallel`].
#[derive(Clone)]
pub struct ScanProcessor<S: ReadScanner + Clone + Send> {
    // (thread) local variables
    tid: Option<usize>,
    sbuf: Vec<u8>,
    local: ScanReport,

    scanner: S,

    // global variables
    shards: Arc<Mutex<BTreeMap<usize, ScanReport>>>,
}
impl<S: ReadScanner + Clone + Send> ScanProcessor<S> {
    pub fn new(scanner: S) -> Self {
        Self {
            tid: None,
            sbuf: Vec::new(),
            local: ScanReport::new(),
            scanner,
            shards: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Drains the shared shard table into a single report
    pub fn take_report(&self) -> ScanReport {
        let shards = std::mem::take(&mut *self.shards.lock());
        shards
            .into_values()
            .fold(ScanReport::new(), |mut acc, shard| {
                acc.merge(shard);
                acc
            })
    }
}
impl<S: ReadScanner + Clone + Send> ParallelProcessor for ScanProcessor<S> {
    fn process_read(&mut self, read: &[u8]) -> Result<()> {
        self.local.scan_read(&self.scanner, read, &mut self.sbuf);
        Ok(())
    }

    fn on_batch_complete(&mut self) -> Result<()> {
        let tid = self.tid.unwrap_or(0);
        self.shards
            .lock()
            .entry(tid)
            .or_default()
            .merge(self.local.take());
        Ok(())
    }

    fn set_tid(&mut self, tid: usize) {
        self.tid = Some(tid);
    }

    fn get_tid(&self) -> Option<usize> {
        self.tid
    }
}

/// Scans `reads` on `num_threads` threads, preserving stream order
///
/// # Examples
///
/// ```
/// # use barpep::{scan_parallel, FlankSpec, InsertScanner, Result};
/// # fn main() -> Result<()> {
/// let scanner = InsertScanner::new(FlankSpec::new(b"GATC", b"CCGG", 4)?);
/// let reads = vec!["GATCAAAACCGG"; 100];
/// let report = scan_parallel(&reads, &scanner, 4)?;
/// assert_eq!(report.read_count(), 100);
/// assert_eq!(report.miss_count(), 0);
/// # Ok(())
/// # }
/// ```
pub fn scan_parallel<R, S>(reads: &[R], scanner: S, num_threads: usize) -> Result<ScanReport>
where
    R: AsRef<[u8]> + Sync,
    S: ReadScanner + Clone + Send,
{
    let processor = ScanProcessor::new(scanner);
    process_parallel(reads, processor.clone(), num_threads)?;
    Ok(processor.take_report())
}

#[cfg(test)]
mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{aggregate, FlankSpec, InsertScanner};

    fn reads(n: usize) -> Vec<String> {
        const INSERTS: [&str; 4] = ["AAAA", "CCCC", "GGTT", "ACGT"];
        (0..n)
            .map(|i| match i % 3 {
                0 => format!("GATC{}CCGG", INSERTS[i % 4]),
                1 => "TTTTTTTTTTTT".to_string(),
                _ => "ccggTTTTgatc".to_string(),
            })
            .collect()
    }

    #[derive(Clone, Default)]
    struct CountingProcessor {
        local: usize,
        total: Arc<AtomicUsize>,
        flushes: Arc<AtomicUsize>,
    }
    impl ParallelProcessor for CountingProcessor {
        fn process_read(&mut self, _read: &[u8]) -> Result<()> {
            self.local += 1;
            Ok(())
        }
        fn on_batch_complete(&mut self) -> Result<()> {
            self.total.fetch_add(self.local, Ordering::Relaxed);
            self.flushes.fetch_add(1, Ordering::Relaxed);
            self.local = 0;
            Ok(())
        }
    }

    #[test]
    fn test_every_read_processed_once() -> anyhow::Result<()> {
        let reads = reads(5000);
        let processor = CountingProcessor::default();
        process_parallel(&reads, processor.clone(), 3)?;
        assert_eq!(processor.total.load(Ordering::Relaxed), 5000);
        // shards of 1667, 1667, 1666 reads: one full batch plus the final flush each
        assert_eq!(processor.flushes.load(Ordering::Relaxed), 6);
        Ok(())
    }

    #[test]
    fn test_more_threads_than_reads() -> anyhow::Result<()> {
        let reads = reads(5);
        let processor = CountingProcessor::default();
        process_parallel(&reads, processor.clone(), 4)?;
        assert_eq!(processor.total.load(Ordering::Relaxed), 5);
        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> anyhow::Result<()> {
        let scanner = InsertScanner::new(FlankSpec::new(b"GATC", b"CCGG", 4)?);
        let reads = reads(10_000);
        let sequential = aggregate(&reads, &scanner);
        for num_threads in [1, 2, 3, 7] {
            let parallel = scan_parallel(&reads, &scanner, num_threads)?;
            assert_eq!(parallel, sequential);
        }
        Ok(())
    }

    #[test]
    fn test_parallel_empty_stream() -> anyhow::Result<()> {
        let scanner = InsertScanner::new(FlankSpec::new(b"GATC", b"CCGG", 4)?);
        let reads: Vec<Vec<u8>> = Vec::new();
        let report = scan_parallel(&reads, &scanner, 4)?;
        assert_eq!(report.read_count(), 0);
        assert_eq!(report.miss_count(), 0);
        assert!(report.extracted().is_empty());
        Ok(())
    }

    #[test]
    fn test_processor_tid() {
        let mut processor = ScanProcessor::new(InsertScanner::new(
            FlankSpec::new(b"GATC", b"CCGG", 4).unwrap(),
        ));
        assert_eq!(processor.get_tid(), None);
        processor.set_tid(3);
        assert_eq!(processor.get_tid(), Some(3));
    }

    #[test]
    fn test_resolve_threads() {
        assert_eq!(resolve_threads(3), 3);
        assert!(resolve_threads(0) >= 1);
    }
}
