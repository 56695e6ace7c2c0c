//! Insert detection between constant flanks
//!
//! Each strand is tried with the same precedence:
//!
//! 1. first occurrence of the right flank against the first left flank
//! 2. last occurrence of the right flank against the same left flank
//!
//! The forward strand is tried before the reverse-complement strand and the
//! first branch whose flank distance equals `insert_size + len(left)` wins.
//! Both branches of a strand reuse the *first* left-flank occurrence, so a
//! read with a recurring left flank only ever pairs the leftmost one.
//!
//! In windowed mode every search is bounded by a range derived from the
//! expected insert start (`loc` / `loc_rc`) and the margin. Both strands size
//! their window with the forward flank lengths, so on the reverse strand the
//! left search starts at `loc_rc - margin - len(left)`. Window starts that
//! would fall before the read are clamped to position 0; starts beyond the
//! read simply find nothing.

use auto_impl::auto_impl;

use crate::{
    search::{find_from, rfind_within, FlankFinder, Span},
    spec::{FlankSpec, SearchMode, Window},
};

/// Which orientation of the construct the insert was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// Flanked by `left` ... `right`
    Forward,
    /// Flanked by `left_rc` ... `right_rc`
    Reverse,
}

/// Result of scanning a single read
///
/// The insert borrows from the scanned read and is reported exactly as it
/// appears there (it is not reverse-complemented for [`Strand::Reverse`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    Found { insert: &'a [u8], strand: Strand },
    Missed,
}
impl<'a> MatchOutcome<'a> {
    #[must_use]
    pub fn insert(&self) -> Option<&'a [u8]> {
        match self {
            Self::Found { insert, .. } => Some(insert),
            Self::Missed => None,
        }
    }

    #[must_use]
    pub fn strand(&self) -> Option<Strand> {
        match self {
            Self::Found { strand, .. } => Some(*strand),
            Self::Missed => None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Trait for types that can extract an insert from an uppercase read
#[auto_impl(&, Box, Arc)]
pub trait ReadScanner {
    /// Scan a single (already upper-cased) read
    fn scan<'a>(&self, read: &'a [u8]) -> MatchOutcome<'a>;

    /// The specification this scanner searches for
    fn spec(&self) -> &FlankSpec;
}

/// Exact-match search over one flank
trait FlankSearch {
    fn flank_len(&self) -> usize;
    fn find_in(&self, hay: &[u8], span: Span) -> Option<usize>;
    fn rfind_in(&self, hay: &[u8], span: Span) -> Option<usize>;
}
impl FlankSearch for FlankFinder {
    #[inline]
    fn flank_len(&self) -> usize {
        self.len()
    }
    #[inline]
    fn find_in(&self, hay: &[u8], span: Span) -> Option<usize> {
        self.find(hay, span)
    }
    #[inline]
    fn rfind_in(&self, hay: &[u8], span: Span) -> Option<usize> {
        self.rfind(hay, span)
    }
}
impl FlankSearch for [u8] {
    #[inline]
    fn flank_len(&self) -> usize {
        self.len()
    }
    #[inline]
    fn find_in(&self, hay: &[u8], span: Span) -> Option<usize> {
        find_from(hay, self, span.start)
    }
    #[inline]
    fn rfind_in(&self, hay: &[u8], span: Span) -> Option<usize> {
        rfind_within(hay, self, span.start, span.end)
    }
}

/// Search ranges for the three flank lookups on one strand
#[derive(Debug, Clone, Copy)]
struct StrandBounds {
    left: Span,
    right_first: Span,
    right_last: Span,
}
impl StrandBounds {
    fn unbounded() -> Self {
        Self {
            left: Span::full(),
            right_first: Span::full(),
            right_last: Span::full(),
        }
    }

    /// Ranges around an expected insert start `loc`
    fn around(
        loc: usize,
        margin: usize,
        insert_size: usize,
        left_len: usize,
        right_len: usize,
    ) -> Self {
        let right_start = loc.saturating_add(insert_size).saturating_sub(margin);
        let right_end = loc
            .saturating_add(margin)
            .saturating_add(insert_size)
            .saturating_add(right_len);
        Self {
            left: Span::starting_at(loc.saturating_sub(margin.saturating_add(left_len))),
            right_first: Span::starting_at(right_start),
            right_last: Span::new(right_start, right_end),
        }
    }
}

/// Two-branch precedence on a single strand
///
/// `span` is the required distance between the left and right flank starts.
/// Returns `None` as soon as the left flank is absent: no branch can match
/// without a left boundary.
#[inline]
fn scan_strand<'a, F: FlankSearch + ?Sized>(
    read: &'a [u8],
    left: &F,
    right: &F,
    span: usize,
    bounds: StrandBounds,
) -> Option<&'a [u8]> {
    let lpos = left.find_in(read, bounds.left)?;
    let istart = lpos + left.flank_len();
    let fits = |rpos: &usize| rpos.checked_sub(lpos) == Some(span);

    if let Some(rpos) = right.find_in(read, bounds.right_first).filter(fits) {
        return Some(&read[istart..rpos]);
    }
    if let Some(rpos) = right.rfind_in(read, bounds.right_last).filter(fits) {
        return Some(&read[istart..rpos]);
    }
    None
}

#[inline]
fn scan_both<'a, F: FlankSearch + ?Sized>(
    read: &'a [u8],
    flanks: [&F; 4],
    spec: &FlankSpec,
    forward: StrandBounds,
    reverse: StrandBounds,
) -> MatchOutcome<'a> {
    let [left, right, left_rc, right_rc] = flanks;
    if let Some(insert) = scan_strand(read, left, right, spec.forward_span(), forward) {
        return MatchOutcome::Found {
            insert,
            strand: Strand::Forward,
        };
    }
    if let Some(insert) = scan_strand(read, left_rc, right_rc, spec.reverse_span(), reverse) {
        return MatchOutcome::Found {
            insert,
            strand: Strand::Reverse,
        };
    }
    MatchOutcome::Missed
}

fn window_bounds(spec: &FlankSpec, window: Window) -> (StrandBounds, StrandBounds) {
    // forward flank lengths on both strands
    let around = |loc| {
        StrandBounds::around(
            loc,
            window.margin,
            spec.insert_size(),
            spec.left().len(),
            spec.right().len(),
        )
    };
    (around(window.loc), around(window.loc_rc))
}

/// Finds the insert anywhere in the read, on either strand
///
/// The read is expected to be upper-case already.
///
/// # Examples
///
/// ```
/// # use barpep::{scan, FlankSpec};
/// let spec = FlankSpec::new(b"GATC", b"CCGG", 4).unwrap();
/// let outcome = scan(b"GATCAAAACCGG", &spec);
/// assert_eq!(outcome.insert(), Some(&b"AAAA"[..]));
/// ```
#[must_use]
pub fn scan<'a>(read: &'a [u8], spec: &FlankSpec) -> MatchOutcome<'a> {
    scan_both::<[u8]>(
        read,
        [spec.left(), spec.right(), spec.left_rc(), spec.right_rc()],
        spec,
        StrandBounds::unbounded(),
        StrandBounds::unbounded(),
    )
}

/// Finds the insert on either strand, restricting each search to `window`
///
/// The window is passed explicitly, so this ignores the search mode stored in
/// `spec`.
#[must_use]
pub fn scan_windowed<'a>(read: &'a [u8], spec: &FlankSpec, window: Window) -> MatchOutcome<'a> {
    let (forward, reverse) = window_bounds(spec, window);
    scan_both::<[u8]>(
        read,
        [spec.left(), spec.right(), spec.left_rc(), spec.right_rc()],
        spec,
        forward,
        reverse,
    )
}

/// Scanner with pre-compiled flank searchers
///
/// The search mode is taken from the [`FlankSpec`] once, at construction.
#[derive(Debug, Clone)]
pub struct InsertScanner {
    spec: FlankSpec,
    finders: [FlankFinder; 4],
    forward: StrandBounds,
    reverse: StrandBounds,
}
impl InsertScanner {
    #[must_use]
    pub fn new(spec: FlankSpec) -> Self {
        let finders = [
            FlankFinder::new(spec.left()),
            FlankFinder::new(spec.right()),
            FlankFinder::new(spec.left_rc()),
            FlankFinder::new(spec.right_rc()),
        ];
        let (forward, reverse) = match spec.mode() {
            SearchMode::Unwindowed => (StrandBounds::unbounded(), StrandBounds::unbounded()),
            SearchMode::Windowed(window) => window_bounds(&spec, window),
        };
        Self {
            spec,
            finders,
            forward,
            reverse,
        }
    }
}
impl ReadScanner for InsertScanner {
    #[inline]
    fn scan<'a>(&self, read: &'a [u8]) -> MatchOutcome<'a> {
        let [left, right, left_rc, right_rc] = &self.finders;
        scan_both(
            read,
            [left, right, left_rc, right_rc],
            &self.spec,
            self.forward,
            self.reverse,
        )
    }

    fn spec(&self) -> &FlankSpec {
        &self.spec
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::utils::reverse_complement;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    fn spec() -> FlankSpec {
        FlankSpec::new(b"GATC", b"CCGG", 4).unwrap()
    }

    fn random_seq(rng: &mut SmallRng, len: usize) -> Vec<u8> {
        (0..len).map(|_| b"ACGT"[rng.random_range(0..4)]).collect()
    }

    #[test]
    fn test_forward_match() {
        let outcome = scan(b"GATCAAAACCGG", &spec());
        assert_eq!(
            outcome,
            MatchOutcome::Found {
                insert: b"AAAA",
                strand: Strand::Forward
            }
        );
    }

    #[test]
    fn test_recurring_right_flank() {
        // first-occurrence branch already fits
        let read = b"GATCAAAACCGGTTTTGATCAAAACCGG";
        assert_eq!(scan(read, &spec()).insert(), Some(&b"AAAA"[..]));

        // right flank inside the insert comes first, the last occurrence fits
        let read = b"GATCCCGGCCGG";
        let outcome = scan(read, &spec());
        assert_eq!(outcome.insert(), Some(&b"CCGG"[..]));
        assert_eq!(outcome.strand(), Some(Strand::Forward));
    }

    #[test]
    fn test_last_occurrence_pairs_first_left_flank() {
        // the only fitting pair uses the second left flank, which neither
        // branch considers
        let read = b"GATCTTGATCAAAACCGGAA";
        assert_eq!(scan(read, &spec()), MatchOutcome::Missed);
    }

    #[test]
    fn test_absent_flanks_never_match() {
        assert_eq!(scan(b"TTTTTTTTTTTT", &spec()), MatchOutcome::Missed);
        assert_eq!(scan(b"", &spec()), MatchOutcome::Missed);
        // right flank without any left flank
        assert_eq!(scan(b"AAAACCGGAAAA", &spec()), MatchOutcome::Missed);
        // left flank without any right flank
        assert_eq!(scan(b"GATCAAAATTTT", &spec()), MatchOutcome::Missed);
    }

    #[test]
    fn test_right_before_left_is_missed() {
        let spec = FlankSpec::new(b"AAGG", b"TTCC", 4).unwrap();
        assert_eq!(scan(b"TTCCACGTAAGG", &spec), MatchOutcome::Missed);
    }

    #[test]
    fn test_reverse_strand_match() {
        let spec = FlankSpec::new(b"AAAC", b"TTGG", 4).unwrap();
        let read = reverse_complement(b"AAACGTCATTGG");
        assert_eq!(read, b"CCAATGACGTTT");
        let outcome = scan(&read, &spec);
        assert_eq!(
            outcome,
            MatchOutcome::Found {
                insert: b"TGAC",
                strand: Strand::Reverse
            }
        );
    }

    #[test]
    fn test_reverse_strand_unequal_flanks() {
        let spec = FlankSpec::new(b"AC", b"TTTGG", 3).unwrap();
        let read = reverse_complement(b"GGACGGGTTTGGAA");
        let outcome = scan(&read, &spec);
        assert_eq!(outcome.strand(), Some(Strand::Reverse));
        assert_eq!(outcome.insert(), Some(&b"CCC"[..]));
    }

    #[test]
    fn test_windowed_forward_match() {
        let window = Window::new(4, 4, 2);
        let outcome = scan_windowed(b"GATCAAAACCGG", &spec(), window);
        assert_eq!(outcome.insert(), Some(&b"AAAA"[..]));
    }

    #[test]
    fn test_window_rejects_flanks_before_it() {
        let read = b"GATCAAAACCGGTTTTTTTTTT";
        assert!(scan(read, &spec()).is_found());
        assert_eq!(
            scan_windowed(read, &spec(), Window::new(14, 14, 2)),
            MatchOutcome::Missed
        );
        assert!(scan_windowed(read, &spec(), Window::new(4, 4, 0)).is_found());
    }

    #[test]
    fn test_window_skips_decoy_flank() {
        // a decoy left flank at 0 fools the unwindowed search
        let read = b"GATCTTTTTTGATCAAAACCGG";
        assert_eq!(scan(read, &spec()), MatchOutcome::Missed);
        let outcome = scan_windowed(read, &spec(), Window::new(14, 0, 1));
        assert_eq!(outcome.insert(), Some(&b"AAAA"[..]));
    }

    #[test]
    fn test_window_start_past_read_end() {
        let outcome = scan_windowed(b"GATCAAAACCGG", &spec(), Window::new(500, 500, 5));
        assert_eq!(outcome, MatchOutcome::Missed);
    }

    #[test]
    fn test_window_near_read_start_is_clamped() {
        let outcome = scan_windowed(b"GATCAAAACCGG", &spec(), Window::new(4, 0, 10));
        assert_eq!(outcome.insert(), Some(&b"AAAA"[..]));
    }

    #[test]
    fn test_windowed_last_occurrence_is_bounded() {
        // the right flank occurs inside the insert, at the fitting position,
        // and once more past the window end
        let read = b"GATCCCGGCCGGTTCCGG";
        assert_eq!(scan(read, &spec()), MatchOutcome::Missed);
        let outcome = scan_windowed(read, &spec(), Window::new(4, 4, 4));
        assert_eq!(outcome.insert(), Some(&b"CCGG"[..]));
        assert_eq!(outcome.strand(), Some(Strand::Forward));
    }

    #[test]
    fn test_windowed_reverse_match() {
        let spec = FlankSpec::new(b"AAAC", b"TTGG", 4).unwrap();
        let read = b"TTCCAATGACGTTT";
        let outcome = scan_windowed(read, &spec, Window::new(20, 6, 1));
        assert_eq!(outcome.insert(), Some(&b"TGAC"[..]));
        assert_eq!(outcome.strand(), Some(Strand::Reverse));
    }

    #[test]
    fn test_windowed_reverse_unequal_flanks() {
        // left_rc = CCAAA at 2, insert CCC at 7, right_rc = GT at 10
        let spec = FlankSpec::new(b"AC", b"TTTGG", 3).unwrap();
        let read = b"TTCCAAACCCGTTT";
        assert_eq!(scan(read, &spec).insert(), Some(&b"CCC"[..]));

        // the left_rc search starts at loc_rc - margin - len(left) = 5
        let outcome = scan_windowed(read, &spec, Window::new(100, 7, 0));
        assert_eq!(outcome, MatchOutcome::Missed);

        // a margin of 3 moves the start back to 2
        let outcome = scan_windowed(read, &spec, Window::new(100, 7, 3));
        assert_eq!(outcome.insert(), Some(&b"CCC"[..]));
        assert_eq!(outcome.strand(), Some(Strand::Reverse));

        let windowed = InsertScanner::new(spec.with_window(Window::new(100, 7, 0)));
        assert_eq!(windowed.scan(read), MatchOutcome::Missed);
    }

    #[test]
    fn test_compiled_scanner_agrees() {
        let mut rng = SmallRng::seed_from_u64(42);
        let spec = spec();
        let window = Window::new(12, 12, 3);
        let scanner = InsertScanner::new(spec.clone());
        let windowed = InsertScanner::new(spec.clone().with_window(window));
        for _ in 0..2000 {
            let mut read = random_seq(&mut rng, 8);
            read.extend_from_slice(b"GATC");
            read.extend(random_seq(&mut rng, 4));
            read.extend_from_slice(b"CCGG");
            read.extend(random_seq(&mut rng, 12));
            if rng.random_bool(0.5) {
                read = reverse_complement(&read);
            }
            assert_eq!(scanner.scan(&read), scan(&read, &spec));
            assert_eq!(windowed.scan(&read), scan_windowed(&read, &spec, window));
        }
    }

    #[test]
    fn test_found_insert_has_expected_size() {
        let mut rng = SmallRng::seed_from_u64(7);
        let scanner = InsertScanner::new(FlankSpec::new(b"ACG", b"TGCA", 6).unwrap());
        let mut found = 0;
        for _ in 0..20_000 {
            let read = random_seq(&mut rng, 40);
            if let Some(insert) = scanner.scan(&read).insert() {
                assert_eq!(insert.len(), 6);
                found += 1;
            }
        }
        assert!(found > 0);
    }

    #[test]
    fn test_window_covering_flanks_agrees_with_unwindowed() {
        let mut rng = SmallRng::seed_from_u64(11);
        let spec = FlankSpec::new(b"GGATCC", b"AAGCTT", 5).unwrap();
        for _ in 0..500 {
            let mut read = random_seq(&mut rng, 10);
            read.extend_from_slice(b"GGATCC");
            read.extend(random_seq(&mut rng, 5));
            read.extend_from_slice(b"AAGCTT");
            read.extend(random_seq(&mut rng, 10));

            let windowed = scan_windowed(&read, &spec, Window::new(16, 16, 0));
            assert!(windowed.is_found());
            assert_eq!(windowed.insert(), Some(&read[16..21]));

            let unwindowed = scan(&read, &spec);
            if find_from(&read, b"GGATCC", 0) == Some(10)
                && unwindowed.strand() == Some(Strand::Forward)
            {
                assert_eq!(windowed, unwindowed);
            }
        }
    }
}
