//! Bounded exact substring search
//!
//! All searches report absence as `None`. Callers never see a sentinel index,
//! so a missing flank can not take part in any position arithmetic.

use memchr::memmem::{Finder, FinderRev};

/// A half-open range of read positions `[start, end)` to search within
///
/// `end` may exceed the read length, in which case it is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}
impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span from `start` to the end of any read
    #[must_use]
    pub fn starting_at(start: usize) -> Self {
        Self::new(start, usize::MAX)
    }

    /// Span covering any read completely
    #[must_use]
    pub fn full() -> Self {
        Self::starting_at(0)
    }

    /// Resolves the span against a read of length `len`
    ///
    /// Returns `None` when the start lies beyond the read.
    #[inline]
    fn clamp(self, len: usize) -> Option<(usize, usize)> {
        let end = self.end.min(len);
        if self.start > end {
            None
        } else {
            Some((self.start, end))
        }
    }
}

/// Pre-compiled forward and reverse searchers for a single flank
#[derive(Clone, Debug)]
pub struct FlankFinder {
    forward: Finder<'static>,
    reverse: FinderRev<'static>,
    len: usize,
}
impl FlankFinder {
    pub fn new(flank: &[u8]) -> Self {
        Self {
            forward: Finder::new(flank).into_owned(),
            reverse: FinderRev::new(flank).into_owned(),
            len: flank.len(),
        }
    }

    /// Length of the flank being searched for
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First occurrence lying fully within `span`
    #[inline]
    pub fn find(&self, hay: &[u8], span: Span) -> Option<usize> {
        let (start, end) = span.clamp(hay.len())?;
        self.forward.find(&hay[start..end]).map(|pos| pos + start)
    }

    /// Last occurrence lying fully within `span`
    #[inline]
    pub fn rfind(&self, hay: &[u8], span: Span) -> Option<usize> {
        let (start, end) = span.clamp(hay.len())?;
        self.reverse.rfind(&hay[start..end]).map(|pos| pos + start)
    }
}

/// First occurrence of `needle` in `hay` starting at or after `start`
pub fn find_from(hay: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    let (start, end) = Span::starting_at(start).clamp(hay.len())?;
    memchr::memmem::find(&hay[start..end], needle).map(|pos| pos + start)
}

/// Last occurrence of `needle` lying fully within `hay[start..end]`
pub fn rfind_within(hay: &[u8], needle: &[u8], start: usize, end: usize) -> Option<usize> {
    let (start, end) = Span::new(start, end).clamp(hay.len())?;
    memchr::memmem::rfind(&hay[start..end], needle).map(|pos| pos + start)
}
