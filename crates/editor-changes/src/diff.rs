//! Changed-range computation.
//!
//! [`DiffEngine`] turns two versions of a document into the spans of the **current** version that
//! are not covered by any [`MatchBlock`]. Offsets are character offsets (Unicode scalar values),
//! half-open, the same convention as the rest of the crate.

use crate::error::DiffError;
use crate::matcher::{MatchBlock, MatcherOptions, SequenceMatcher};

/// A half-open character-offset range (`start..end`) in the current document.
///
/// Engine output is never empty. A range with `start == end` only appears as a point marker
/// produced by [`HighlightMode::Points`](crate::HighlightMode::Points) projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangedRange {
    /// Range start offset (inclusive).
    pub start: usize,
    /// Range end offset (exclusive).
    pub end: usize,
}

impl ChangedRange {
    /// Create a new changed range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width range at `offset`.
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Length of the range in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Pure diff engine over two text snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffEngine {
    options: MatcherOptions,
}

impl DiffEngine {
    /// Create an engine with the given matcher options.
    pub fn new(options: MatcherOptions) -> Self {
        Self { options }
    }

    /// Matcher options in use.
    pub fn options(&self) -> MatcherOptions {
        self.options
    }

    /// Spans of `current` that differ from `original`, in ascending order.
    pub fn changed_ranges(
        &self,
        original: &str,
        current: &str,
    ) -> Result<Vec<ChangedRange>, DiffError> {
        let original: Vec<char> = original.chars().collect();
        let current: Vec<char> = current.chars().collect();
        let blocks =
            SequenceMatcher::with_options(&original, &current, self.options).matching_blocks();
        changed_ranges_from_blocks(&blocks)
    }
}

/// [`DiffEngine::changed_ranges`] with default matcher options.
pub fn compute_changed_ranges(
    original: &str,
    current: &str,
) -> Result<Vec<ChangedRange>, DiffError> {
    DiffEngine::default().changed_ranges(original, current)
}

/// Convert ordered match blocks into the gaps between them, in current-document coordinates.
///
/// A zero-length anchor at `(0, 0)` is assumed before the first block, so content inserted
/// ahead of the first matched run is reported too. Empty gaps are skipped. An empty block list
/// yields no ranges.
pub fn changed_ranges_from_blocks(blocks: &[MatchBlock]) -> Result<Vec<ChangedRange>, DiffError> {
    let mut ranges = Vec::new();
    let mut previous_end = 0;
    let mut previous_original_end = 0;

    for (index, block) in blocks.iter().enumerate() {
        if block.current_start < previous_end || block.original_start < previous_original_end {
            return Err(DiffError::UnorderedBlocks { index });
        }
        if block.current_start > previous_end {
            ranges.push(ChangedRange::new(previous_end, block.current_start));
        }
        previous_end = block.current_end();
        previous_original_end = block.original_end();
    }

    Ok(ranges)
}
