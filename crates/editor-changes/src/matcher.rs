//! Longest-common-substring block matcher.
//!
//! [`SequenceMatcher`] finds the longest run shared by two sequences, then recurses into the
//! regions to the left and right of it (Ratcliff/Obershelp). The result is an ordered list of
//! [`MatchBlock`]s terminated by a zero-length sentinel at the end of both sequences.
//!
//! The matcher is generic over the element type; the tracker runs it over `char` slices so that
//! every offset it reports is a character offset.

use std::collections::HashMap;
use std::hash::Hash;

/// Minimum length of the `current` sequence before popular elements are dropped from the index.
pub const AUTOJUNK_MIN_LEN: usize = 200;

/// Options that control how matching is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherOptions {
    /// If `true` and `current` has at least [`AUTOJUNK_MIN_LEN`] elements, elements that occur
    /// in more than 1% of `current` are not used to seed matches. They can still extend one.
    pub autojunk: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self { autojunk: true }
    }
}

/// A run of elements common to both sequences.
///
/// Field order matters: the derived `Ord` sorts by `original_start` first, which is the order
/// blocks are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchBlock {
    /// Start offset of the run in the original sequence.
    pub original_start: usize,
    /// Start offset of the run in the current sequence.
    pub current_start: usize,
    /// Run length in elements.
    pub len: usize,
}

impl MatchBlock {
    /// Create a new match block.
    pub fn new(original_start: usize, current_start: usize, len: usize) -> Self {
        Self {
            original_start,
            current_start,
            len,
        }
    }

    /// Exclusive end offset in the original sequence.
    pub fn original_end(&self) -> usize {
        self.original_start + self.len
    }

    /// Exclusive end offset in the current sequence.
    pub fn current_end(&self) -> usize {
        self.current_start + self.len
    }

    /// Returns `true` for zero-length blocks (the trailing sentinel).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Block matcher over an `original` and a `current` sequence.
#[derive(Debug)]
pub struct SequenceMatcher<'a, T> {
    original: &'a [T],
    current: &'a [T],
    // element -> ascending positions in `current`
    index: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    /// Create a matcher with default options.
    pub fn new(original: &'a [T], current: &'a [T]) -> Self {
        Self::with_options(original, current, MatcherOptions::default())
    }

    /// Create a matcher with explicit options.
    pub fn with_options(original: &'a [T], current: &'a [T], options: MatcherOptions) -> Self {
        let mut index: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (position, element) in current.iter().enumerate() {
            index.entry(element).or_default().push(position);
        }

        if options.autojunk && current.len() >= AUTOJUNK_MIN_LEN {
            let limit = current.len() / 100 + 1;
            index.retain(|_, positions| positions.len() <= limit);
        }

        Self {
            original,
            current,
            index,
        }
    }

    /// Find the longest common run inside `original[alo..ahi]` and `current[blo..bhi]`.
    ///
    /// Ties resolve to the run starting earliest in `original`, then earliest in `current`.
    /// Returns a zero-length block at `(alo, blo)` when nothing matches. Upper bounds past the
    /// end of a sequence are clamped to its length.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let a = self.original;
        let b = self.current;
        let ahi = ahi.min(a.len());
        let bhi = bhi.min(b.len());

        let mut best_i = alo;
        let mut best_j = blo;
        let mut best_len = 0;

        // run_lengths[j] = length of the common run ending at (i - 1, j)
        let mut run_lengths: HashMap<usize, usize> = HashMap::new();
        for (i, element) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next_run_lengths = HashMap::new();
            if let Some(positions) = self.index.get(element) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let previous = j
                        .checked_sub(1)
                        .and_then(|p| run_lengths.get(&p))
                        .copied()
                        .unwrap_or(0);
                    let len = previous + 1;
                    next_run_lengths.insert(j, len);
                    if len > best_len {
                        best_i = i + 1 - len;
                        best_j = j + 1 - len;
                        best_len = len;
                    }
                }
            }
            run_lengths = next_run_lengths;
        }

        // Elements dropped from the index may still border the best run.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ahi
            && best_j + best_len < bhi
            && a[best_i + best_len] == b[best_j + best_len]
        {
            best_len += 1;
        }

        MatchBlock::new(best_i, best_j, best_len)
    }

    /// All maximal matching blocks, ordered, with adjacent blocks merged.
    ///
    /// The last element is always the sentinel `(original.len(), current.len(), 0)`.
    pub fn matching_blocks(&self) -> Vec<MatchBlock> {
        let original_len = self.original.len();
        let current_len = self.current.len();

        let mut queue = vec![(0, original_len, 0, current_len)];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.is_empty() {
                continue;
            }
            if alo < block.original_start && blo < block.current_start {
                queue.push((alo, block.original_start, blo, block.current_start));
            }
            if block.original_end() < ahi && block.current_end() < bhi {
                queue.push((block.original_end(), ahi, block.current_end(), bhi));
            }
            blocks.push(block);
        }
        blocks.sort_unstable();

        let mut merged = Vec::with_capacity(blocks.len() + 1);
        let mut run = MatchBlock::new(0, 0, 0);
        for block in blocks {
            if run.original_end() == block.original_start && run.current_end() == block.current_start
            {
                run.len += block.len;
            } else {
                if !run.is_empty() {
                    merged.push(run);
                }
                run = block;
            }
        }
        if !run.is_empty() {
            merged.push(run);
        }

        merged.push(MatchBlock::new(original_len, current_len, 0));
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    fn blocks(original: &str, current: &str) -> Vec<(usize, usize, usize)> {
        let a = chars(original);
        let b = chars(current);
        SequenceMatcher::new(&a, &b)
            .matching_blocks()
            .into_iter()
            .map(|m| (m.original_start, m.current_start, m.len))
            .collect()
    }

    #[test]
    fn test_insertion_in_the_middle() {
        assert_eq!(
            blocks("hello world", "hello brave world"),
            vec![(0, 0, 6), (6, 12, 5), (11, 17, 0)]
        );
    }

    #[test]
    fn test_multiple_blocks() {
        assert_eq!(
            blocks("the quick brown fox", "the quick red fox jumps"),
            vec![(0, 0, 10), (11, 10, 1), (15, 13, 4), (19, 23, 0)]
        );
    }

    #[test]
    fn test_nothing_in_common_is_sentinel_only() {
        assert_eq!(blocks("abc", "xyz"), vec![(3, 3, 0)]);
        assert_eq!(blocks("", ""), vec![(0, 0, 0)]);
        assert_eq!(blocks("", "abc"), vec![(0, 3, 0)]);
        assert_eq!(blocks("abc", ""), vec![(3, 0, 0)]);
    }

    #[test]
    fn test_longest_match_prefers_earliest() {
        let a = chars("abxab");
        let b = chars("ab");
        let matcher = SequenceMatcher::new(&a, &b);
        assert_eq!(matcher.find_longest_match(0, 5, 0, 2), MatchBlock::new(0, 0, 2));

        let a = chars(" abcd");
        let b = chars("abcd abcd");
        let matcher = SequenceMatcher::new(&a, &b);
        assert_eq!(matcher.find_longest_match(0, 5, 0, 9), MatchBlock::new(0, 4, 5));
    }

    #[test]
    fn test_longest_match_clamps_bounds() {
        let a = chars("abcd");
        let b = chars("xbcd");
        let matcher = SequenceMatcher::new(&a, &b);
        assert_eq!(matcher.find_longest_match(0, 100, 0, 100), MatchBlock::new(1, 1, 3));
        assert_eq!(matcher.find_longest_match(0, 100, 0, 2), MatchBlock::new(1, 1, 1));
        assert_eq!(matcher.find_longest_match(9, 100, 9, 100), MatchBlock::new(9, 9, 0));
    }

    #[test]
    fn test_non_ascii_offsets_are_chars() {
        assert_eq!(
            blocks("héllo wörld", "héllo wörld!"),
            vec![(0, 0, 11), (11, 12, 0)]
        );
    }

    #[test]
    fn test_autojunk_drops_popular_elements() {
        let original = format!("{}{}", "x".repeat(10), "abc".repeat(100));
        let current = format!("{}Q{}", &original[..150], &original[150..]);

        assert_eq!(
            blocks(&original, &current),
            vec![(0, 0, 150), (310, 311, 0)]
        );

        let a = chars(&original);
        let b = chars(&current);
        let matcher = SequenceMatcher::with_options(&a, &b, MatcherOptions { autojunk: false });
        assert_eq!(
            matcher.matching_blocks(),
            vec![
                MatchBlock::new(0, 0, 12),
                MatchBlock::new(12, 151, 160),
                MatchBlock::new(310, 311, 0),
            ]
        );
    }
}
