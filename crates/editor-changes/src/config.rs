//! Tracker configuration.
//!
//! [`TrackerConfig`] is plain data: it is handed to [`ChangeTracker::new`](crate::ChangeTracker::new)
//! (or swapped later via [`ChangeTracker::set_config`](crate::ChangeTracker::set_config)) and read
//! whenever an edit is scheduled or a recomputation starts.
//!
//! Settings files are JSON objects. Every key is optional:
//!
//! ```json
//! {
//!     "highlight_as_you_type": true,
//!     "highlight_delay": 2000,
//!     "highlight_mode": "dots",
//!     "max_allowed_file_size": 256
//! }
//! ```

use crate::diff::ChangedRange;
use crate::error::ConfigError;
use crate::matcher::MatcherOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How changed ranges are sent to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    /// A zero-width marker per changed range.
    #[default]
    #[serde(alias = "dots")]
    Points,
    /// The full span of every changed range.
    #[serde(alias = "text")]
    Spans,
}

/// Which end of a changed range carries the marker in [`HighlightMode::Points`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointAnchor {
    /// Marker at the first changed character.
    #[default]
    Start,
    /// Marker just past the last changed character.
    End,
}

impl HighlightMode {
    /// Project stored spans into the ranges handed to the renderer.
    pub fn project(self, ranges: &[ChangedRange], anchor: PointAnchor) -> Vec<ChangedRange> {
        match self {
            Self::Spans => ranges.to_vec(),
            Self::Points => ranges
                .iter()
                .map(|range| match anchor {
                    PointAnchor::Start => ChangedRange::point(range.start),
                    PointAnchor::End => ChangedRange::point(range.end),
                })
                .collect(),
        }
    }
}

/// Where recomputations run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// On the calling (host) thread.
    Inline,
    /// On a worker thread; results are applied by [`ChangeTracker::poll`](crate::ChangeTracker::poll).
    Background,
}

/// Metadata used by the eligibility gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Size of the saved file in bytes, or `None` if the document has no backing file.
    pub file_size_bytes: Option<u64>,
}

/// Why a document is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    /// The document was never saved to disk.
    NoBackingFile,
    /// The saved file is larger than the configured maximum.
    TooLarge {
        /// Saved file size in bytes.
        size_bytes: u64,
        /// Configured maximum in bytes.
        max_bytes: u64,
    },
}

/// Change tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Schedule a recomputation after every edit.
    pub highlight_as_you_type: bool,
    /// Debounce delay in milliseconds.
    #[serde(rename = "highlight_delay")]
    pub highlight_delay_ms: u64,
    /// Render mode.
    pub highlight_mode: HighlightMode,
    /// Marker position in [`HighlightMode::Points`].
    pub point_anchor: PointAnchor,
    /// Largest saved file (in KiB) that is still diffed.
    #[serde(rename = "max_allowed_file_size")]
    pub max_file_size_kib: u64,
    /// Style/scope tag passed to the renderer.
    pub style_tag: String,
    /// See [`MatcherOptions::autojunk`].
    pub diff_autojunk: bool,
    /// Convert CRLF in the saved text to LF when the buffer itself contains no `\r`.
    pub normalize_line_endings: bool,
    /// Run recomputations on a worker thread.
    pub background: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            highlight_as_you_type: true,
            highlight_delay_ms: 2000,
            highlight_mode: HighlightMode::Points,
            point_anchor: PointAnchor::Start,
            max_file_size_kib: 256,
            style_tag: "comment".to_string(),
            diff_autojunk: true,
            normalize_line_endings: true,
            background: true,
        }
    }
}

impl TrackerConfig {
    /// Parse a JSON settings object.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Set the render mode.
    pub fn with_highlight_mode(mut self, mode: HighlightMode) -> Self {
        self.highlight_mode = mode;
        self
    }

    /// Set the points-mode marker position.
    pub fn with_point_anchor(mut self, anchor: PointAnchor) -> Self {
        self.point_anchor = anchor;
        self
    }

    /// Set the debounce delay.
    pub fn with_highlight_delay(mut self, delay: Duration) -> Self {
        self.highlight_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable recomputation on edit.
    pub fn with_highlight_as_you_type(mut self, enabled: bool) -> Self {
        self.highlight_as_you_type = enabled;
        self
    }

    /// Set the file size limit in KiB.
    pub fn with_max_file_size_kib(mut self, kib: u64) -> Self {
        self.max_file_size_kib = kib;
        self
    }

    /// Choose inline or background execution.
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.background = mode == ExecutionMode::Background;
        self
    }

    /// Debounce delay.
    pub fn highlight_delay(&self) -> Duration {
        Duration::from_millis(self.highlight_delay_ms)
    }

    /// File size limit in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kib.saturating_mul(1024)
    }

    /// Execution mode derived from [`TrackerConfig::background`].
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.background {
            ExecutionMode::Background
        } else {
            ExecutionMode::Inline
        }
    }

    /// Matcher options derived from this configuration.
    pub fn matcher_options(&self) -> MatcherOptions {
        MatcherOptions {
            autojunk: self.diff_autojunk,
        }
    }

    /// Check the size/existence gate for a document.
    pub fn check_eligibility(&self, meta: &DocumentMeta) -> Result<(), IneligibleReason> {
        let Some(size_bytes) = meta.file_size_bytes else {
            return Err(IneligibleReason::NoBackingFile);
        };
        let max_bytes = self.max_file_size_bytes();
        if size_bytes > max_bytes {
            return Err(IneligibleReason::TooLarge {
                size_bytes,
                max_bytes,
            });
        }
        Ok(())
    }

    /// Returns `true` if a document with `meta` should be diffed.
    pub fn is_eligible(&self, meta: &DocumentMeta) -> bool {
        self.check_eligibility(meta).is_ok()
    }

    /// Returns `true` if switching from `self` to `other` changes what gets rendered for the
    /// same stored ranges.
    pub(crate) fn render_differs(&self, other: &Self) -> bool {
        self.highlight_mode != other.highlight_mode
            || self.point_anchor != other.point_anchor
            || self.style_tag != other.style_tag
    }
}
