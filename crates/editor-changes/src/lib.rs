#![warn(missing_docs)]
//! Editor Changes - Unsaved-Change Tracking for Headless Editors
//!
//! # Overview
//!
//! `editor-changes` compares the live content of a document with its last-saved copy and
//! reports which parts of the live buffer differ, so that a host editor can mark them
//! (gutter dots or full-span highlights). It does not render anything itself: the host
//! supplies text through [`DocumentSource`] and receives regions through [`EditorHost`].
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ChangeTracker (host events, background)    │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  TrackerSession (debounce, cursor, flight)  │  ← Per-document state
//! ├─────────────────────────────────────────────┤
//! │  DiffEngine (match blocks -> ranges)        │  ← Changed ranges
//! ├─────────────────────────────────────────────┤
//! │  SequenceMatcher (longest common runs)      │  ← Matching
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Diffing two snapshots
//!
//! ```rust
//! use editor_changes::{ChangedRange, compute_changed_ranges};
//!
//! let ranges = compute_changed_ranges("hello world", "hello brave world").unwrap();
//! assert_eq!(ranges, vec![ChangedRange::new(6, 12)]);
//! ```
//!
//! ## Tracking a document
//!
//! ```rust
//! use editor_changes::{
//!     ChangeTracker, ChangedRange, DocumentId, DocumentSource, EditorHost, ExecutionMode,
//!     HighlightMode, TrackerConfig, TrackerError,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Texts;
//!
//! impl DocumentSource for Texts {
//!     fn current_text(&self, _: DocumentId) -> Result<String, TrackerError> {
//!         Ok("fn main() { run(); }".to_string())
//!     }
//!     fn saved_text(&self, _: DocumentId) -> Result<String, TrackerError> {
//!         Ok("fn main() {}".to_string())
//!     }
//!     fn file_size_bytes(&self, _: DocumentId) -> Option<u64> {
//!         Some(12)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct View {
//!     regions: Vec<ChangedRange>,
//! }
//!
//! impl EditorHost for View {
//!     fn render_regions(&mut self, _: DocumentId, ranges: &[ChangedRange], _: &str) {
//!         self.regions = ranges.to_vec();
//!     }
//!     fn clear_regions(&mut self, _: DocumentId) {
//!         self.regions.clear();
//!     }
//!     fn schedule_after(&mut self, _: DocumentId, _: Duration) {}
//!     fn reveal_range(&mut self, _: DocumentId, _: ChangedRange) {}
//! }
//!
//! let config = TrackerConfig::default()
//!     .with_highlight_mode(HighlightMode::Spans)
//!     .with_execution_mode(ExecutionMode::Inline);
//! let mut tracker = ChangeTracker::new(Arc::new(Texts), config);
//! let mut view = View::default();
//! let doc = DocumentId::new(1);
//!
//! tracker.on_highlight_requested(doc, &mut view).unwrap();
//! assert_eq!(view.regions, vec![ChangedRange::new(11, 19)]);
//!
//! tracker.on_document_saved(doc, &mut view);
//! assert!(view.regions.is_empty());
//! ```
//!
//! # Module Description
//!
//! - [`matcher`] - longest-common-run block matcher
//! - [`diff`] - match blocks to changed ranges
//! - [`config`] - tracker configuration and settings loading
//! - [`host`] - host integration traits
//! - [`session`] - per-document state
//! - [`tracker`] - event handling and background recomputation
//!
//! # Offsets
//!
//! All ranges are half-open **character** offsets (Unicode scalar values) into the live buffer.

pub mod config;
pub mod diff;
pub mod error;
pub mod host;
pub mod matcher;
pub mod session;
pub mod tracker;

pub use config::{
    DocumentMeta, ExecutionMode, HighlightMode, IneligibleReason, PointAnchor, TrackerConfig,
};
pub use diff::{ChangedRange, DiffEngine, changed_ranges_from_blocks, compute_changed_ranges};
pub use error::{ConfigError, DiffError, TrackerError};
pub use host::{DocumentId, DocumentSource, EditorHost, file_size, read_saved_file};
pub use matcher::{MatchBlock, MatcherOptions, SequenceMatcher};
pub use session::{SessionState, TrackerSession};
pub use tracker::{ChangeTracker, CompletedRecompute, RecomputeOutcome};
