//! Flank specification module
//!
//! This module describes the constant sequences surrounding the insert, the
//! expected insert length, and the optional positional window used to restrict
//! the search. A [`FlankSpec`] is validated once, before any read is scanned,
//! and is read-only afterwards so it can be shared freely across threads.

use tracing::debug;

use crate::{
    error::{FlankSide, Result, SpecError},
    utils::{first_invalid_nucleotide, reverse_complement},
};

/// Default search-window radius (in bases) around the expected insert start
pub const DEFAULT_MARGIN: usize = 5;

/// Positional window for the insert on both strands
///
/// All offsets are 0-based positions of the first insert base in the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Expected insert start on the forward strand
    pub loc: usize,

    /// Expected insert start when the read carries the reverse-complement strand
    pub loc_rc: usize,

    /// Symmetric search radius around `loc` and `loc_rc`
    pub margin: usize,
}
impl Window {
    #[must_use]
    pub fn new(loc: usize, loc_rc: usize, margin: usize) -> Self {
        Self {
            loc,
            loc_rc,
            margin,
        }
    }
}

/// How reads are searched for the flanks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Search the whole read
    #[default]
    Unwindowed,

    /// Restrict every flank search to a range derived from the window
    Windowed(Window),
}
impl SearchMode {
    #[must_use]
    pub fn window(&self) -> Option<Window> {
        match self {
            Self::Unwindowed => None,
            Self::Windowed(window) => Some(*window),
        }
    }

    #[must_use]
    pub fn is_windowed(&self) -> bool {
        matches!(self, Self::Windowed(_))
    }
}

/// Immutable description of the constant regions flanking the insert
///
/// The reverse-complement flanks are derived at construction time. Note the
/// swap: on the opposite strand the flank preceding the insert is the reverse
/// complement of the forward *right* flank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlankSpec {
    left: Vec<u8>,
    right: Vec<u8>,
    left_rc: Vec<u8>,
    right_rc: Vec<u8>,
    insert_size: usize,
    mode: SearchMode,
}
impl FlankSpec {
    /// Creates an unwindowed specification
    ///
    /// Flanks are upper-cased before validation.
    ///
    /// # Examples
    ///
    /// ```
    /// # use barpep::FlankSpec;
    /// let spec = FlankSpec::new(b"gatc", b"AAGG", 4).unwrap();
    /// assert_eq!(spec.left(), b"GATC");
    /// assert_eq!(spec.left_rc(), b"CCTT");
    /// assert_eq!(spec.right_rc(), b"GATC");
    /// ```
    pub fn new(left: &[u8], right: &[u8], insert_size: usize) -> Result<Self> {
        let left = left.to_ascii_uppercase();
        let right = right.to_ascii_uppercase();
        Self::validate_flank(&left, FlankSide::Left)?;
        Self::validate_flank(&right, FlankSide::Right)?;
        if insert_size == 0 {
            return Err(SpecError::ZeroInsertSize.into());
        }
        if insert_size.checked_add(left.len().max(right.len())).is_none() {
            return Err(SpecError::InsertTooLarge(insert_size).into());
        }
        Ok(Self {
            left_rc: reverse_complement(&right),
            right_rc: reverse_complement(&left),
            left,
            right,
            insert_size,
            mode: SearchMode::Unwindowed,
        })
    }

    /// Switches the specification to windowed search
    #[must_use]
    pub fn with_window(mut self, window: Window) -> Self {
        self.mode = SearchMode::Windowed(window);
        self
    }

    fn validate_flank(flank: &[u8], side: FlankSide) -> Result<()> {
        if flank.is_empty() {
            return Err(SpecError::EmptyFlank { side }.into());
        }
        if let Some(base) = first_invalid_nucleotide(flank) {
            return Err(SpecError::InvalidNucleotide {
                side,
                base: base as char,
            }
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub fn left(&self) -> &[u8] {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &[u8] {
        &self.right
    }

    /// Reverse complement of the right flank
    #[must_use]
    pub fn left_rc(&self) -> &[u8] {
        &self.left_rc
    }

    /// Reverse complement of the left flank
    #[must_use]
    pub fn right_rc(&self) -> &[u8] {
        &self.right_rc
    }

    #[must_use]
    pub fn insert_size(&self) -> usize {
        self.insert_size
    }

    #[must_use]
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Distance between the start of the left flank and the start of the right
    /// flank when the insert is present on the forward strand
    ///
    /// Never overflows: [`FlankSpec::new`] rejects insert sizes for which it would.
    #[must_use]
    pub fn forward_span(&self) -> usize {
        self.insert_size + self.left.len()
    }

    /// Same as [`FlankSpec::forward_span`] for the reverse-complement strand
    #[must_use]
    pub fn reverse_span(&self) -> usize {
        self.insert_size + self.left_rc.len()
    }
}

/// Builder for [`FlankSpec`] from loosely specified run options
///
/// Window fields are optional. The resulting search is windowed only when the
/// forward location, the reverse-complement location, and the margin are all
/// present; otherwise the builder falls back to an unwindowed search unless
/// [`FlankSpecBuilder::require_window`] was set.
///
/// # Examples
///
/// ```
/// # use barpep::{FlankSpecBuilder, Result};
/// # fn main() -> Result<()> {
/// let spec = FlankSpecBuilder::new()
///     .left(b"GATC")
///     .right(b"CCGG")
///     .insert_size(4)
///     .loc(Some(4))
///     .loc_rc(Some(4))
///     .build()?;
/// assert!(spec.mode().is_windowed());
///
/// // Missing reverse-complement location falls back to an unwindowed search
/// let spec = FlankSpecBuilder::new()
///     .left(b"GATC")
///     .right(b"CCGG")
///     .insert_size(4)
///     .loc(Some(4))
///     .build()?;
/// assert!(!spec.mode().is_windowed());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FlankSpecBuilder {
    left: Option<Vec<u8>>,
    right: Option<Vec<u8>>,
    insert_size: Option<usize>,
    loc: Option<usize>,
    loc_rc: Option<usize>,
    margin: Option<usize>,
    require_window: bool,
}
impl Default for FlankSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}
impl FlankSpecBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            left: None,
            right: None,
            insert_size: None,
            loc: None,
            loc_rc: None,
            margin: Some(DEFAULT_MARGIN),
            require_window: false,
        }
    }
    #[must_use]
    pub fn left(mut self, left: &[u8]) -> Self {
        self.left = Some(left.to_vec());
        self
    }
    #[must_use]
    pub fn right(mut self, right: &[u8]) -> Self {
        self.right = Some(right.to_vec());
        self
    }
    #[must_use]
    pub fn insert_size(mut self, insert_size: usize) -> Self {
        self.insert_size = Some(insert_size);
        self
    }
    #[must_use]
    pub fn loc(mut self, loc: Option<usize>) -> Self {
        self.loc = loc;
        self
    }
    #[must_use]
    pub fn loc_rc(mut self, loc_rc: Option<usize>) -> Self {
        self.loc_rc = loc_rc;
        self
    }
    /// Overrides the default margin of [`DEFAULT_MARGIN`] bases
    #[must_use]
    pub fn margin(mut self, margin: Option<usize>) -> Self {
        self.margin = margin;
        self
    }
    /// Treat a missing window field as an error instead of falling back
    #[must_use]
    pub fn require_window(mut self, require_window: bool) -> Self {
        self.require_window = require_window;
        self
    }

    fn resolve_window(&self) -> Result<Option<Window>> {
        match (self.loc, self.loc_rc, self.margin) {
            (Some(loc), Some(loc_rc), Some(margin)) => Ok(Some(Window::new(loc, loc_rc, margin))),
            (loc, loc_rc, margin) => {
                let missing = if loc.is_none() {
                    "loc"
                } else if loc_rc.is_none() {
                    "loc_rc"
                } else {
                    "margin"
                };
                if self.require_window {
                    return Err(SpecError::IncompleteWindow(missing).into());
                }
                if loc.is_some() || loc_rc.is_some() {
                    debug!(
                        missing,
                        ?margin,
                        "incomplete search window, falling back to unwindowed search"
                    );
                }
                Ok(None)
            }
        }
    }

    pub fn build(self) -> Result<FlankSpec> {
        let window = self.resolve_window()?;
        let spec = FlankSpec::new(
            self.left.as_deref().unwrap_or_default(),
            self.right.as_deref().unwrap_or_default(),
            self.insert_size.unwrap_or(0),
        )?;
        let spec = match window {
            Some(window) => spec.with_window(window),
            None => spec,
        };
        debug!(mode = ?spec.mode(), insert_size = spec.insert_size(), "flank specification ready");
        Ok(spec)
    }
}
