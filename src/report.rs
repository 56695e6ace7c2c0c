use std::collections::HashMap;

use crate::{
    scanner::{MatchOutcome, ReadScanner, Strand},
    utils::uppercase_into,
};

/// Accumulated outcome of scanning a read stream
///
/// Invariant: `extracted().len() + miss_count() == read_count()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Extracted inserts in read encounter order
    extracted: Vec<Vec<u8>>,
    /// Length of every read in encounter order
    lengths: Vec<usize>,
    read_count: usize,
    miss_count: usize,
    forward_count: usize,
    reverse_count: usize,
}
impl ScanReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a single read of length `read_len`
    pub fn record(&mut self, read_len: usize, outcome: &MatchOutcome) {
        self.read_count += 1;
        self.lengths.push(read_len);
        match outcome {
            MatchOutcome::Found { insert, strand } => {
                self.extracted.push(insert.to_vec());
                match strand {
                    Strand::Forward => self.forward_count += 1,
                    Strand::Reverse => self.reverse_count += 1,
                }
            }
            MatchOutcome::Missed => self.miss_count += 1,
        }
    }

    /// Upper-cases `read` into `sbuf`, scans it and records the outcome
    pub(crate) fn scan_read<S: ReadScanner>(
        &mut self,
        scanner: &S,
        read: &[u8],
        sbuf: &mut Vec<u8>,
    ) {
        uppercase_into(read, sbuf);
        let outcome = scanner.scan(sbuf.as_slice());
        self.record(read.len(), &outcome);
    }

    /// Appends `other` after the reads already recorded
    ///
    /// Counters add; the ordered lists are concatenated, so merging shard
    /// reports in shard order reproduces the stream order.
    pub fn merge(&mut self, other: ScanReport) {
        self.extracted.extend(other.extracted);
        self.lengths.extend(other.lengths);
        self.read_count += other.read_count;
        self.miss_count += other.miss_count;
        self.forward_count += other.forward_count;
        self.reverse_count += other.reverse_count;
    }

    /// Moves the contents out, leaving an empty report behind
    pub fn take(&mut self) -> ScanReport {
        std::mem::take(self)
    }

    #[must_use]
    pub fn extracted(&self) -> &[Vec<u8>] {
        &self.extracted
    }

    #[must_use]
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    #[must_use]
    pub fn read_count(&self) -> usize {
        self.read_count
    }

    /// Reads in which no flank pair of the expected spacing was found
    #[must_use]
    pub fn miss_count(&self) -> usize {
        self.miss_count
    }

    #[must_use]
    pub fn recovered(&self) -> usize {
        self.read_count - self.miss_count
    }

    #[must_use]
    pub fn strand_counts(&self) -> (usize, usize) {
        (self.forward_count, self.reverse_count)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_count == 0
    }

    /// Percentage of reads with an extracted insert, `0.0` for an empty report
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn recovery_rate(&self) -> f64 {
        if self.read_count == 0 {
            0.0
        } else {
            self.recovered() as f64 / self.read_count as f64 * 100.0
        }
    }

    /// Mean read length, truncated to whole bases
    #[must_use]
    pub fn mean_length(&self) -> Option<usize> {
        if self.lengths.is_empty() {
            return None;
        }
        let total: usize = self.lengths.iter().sum();
        Some(total / self.lengths.len())
    }

    /// Frequency table of the extracted inserts
    ///
    /// Sorted by descending count, ties broken by the insert sequence.
    #[must_use]
    pub fn counts(&self) -> Vec<(&[u8], usize)> {
        let mut table: HashMap<&[u8], usize> = HashMap::new();
        for insert in &self.extracted {
            *table.entry(insert.as_slice()).or_default() += 1;
        }
        let mut counts: Vec<_> = table.into_iter().collect();
        counts.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts
    }
}
