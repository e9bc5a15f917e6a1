//! Host integration traits.
//!
//! The tracker never touches editor internals directly. Instead the host provides:
//!
//! - a [`DocumentSource`] for reading the live buffer and the saved file. It must be
//!   `Send + Sync` because background recomputations call it from worker threads.
//! - an [`EditorHost`] for everything that mutates the UI (region rendering, reveal, timers).
//!   It is only ever called from the thread that calls into [`ChangeTracker`](crate::ChangeTracker).

use crate::diff::ChangedRange;
use crate::error::TrackerError;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Host-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Wrap a host document handle.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Read access to document content.
pub trait DocumentSource: Send + Sync {
    /// Current content of the live buffer.
    fn current_text(&self, document: DocumentId) -> Result<String, TrackerError>;

    /// Last-saved content of the document's backing file.
    ///
    /// See [`read_saved_file`] for a disk-backed implementation.
    fn saved_text(&self, document: DocumentId) -> Result<String, TrackerError>;

    /// Size in bytes of the backing file, or `None` if the document has never been saved.
    fn file_size_bytes(&self, document: DocumentId) -> Option<u64>;
}

/// UI-side callbacks.
pub trait EditorHost {
    /// Replace the change regions shown for `document`.
    ///
    /// In points mode every range is empty (`start == end`).
    fn render_regions(&mut self, document: DocumentId, ranges: &[ChangedRange], style_tag: &str);

    /// Remove all change regions shown for `document`.
    fn clear_regions(&mut self, document: DocumentId);

    /// Arrange a one-shot call to
    /// [`ChangeTracker::on_timer_elapsed`](crate::ChangeTracker::on_timer_elapsed) for
    /// `document` after `delay`.
    fn schedule_after(&mut self, document: DocumentId, delay: Duration);

    /// Scroll so that `range` is visible.
    fn reveal_range(&mut self, document: DocumentId, range: ChangedRange);
}

/// Read a saved file as UTF-8 text.
///
/// A missing file maps to [`TrackerError::NotFound`] and invalid UTF-8 to
/// [`TrackerError::Decode`].
pub fn read_saved_file(path: impl AsRef<Path>) -> Result<String, TrackerError> {
    let path = path.as_ref();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(TrackerError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    String::from_utf8(bytes).map_err(|err| TrackerError::Decode(err.to_string()))
}

/// Size of a regular file in bytes, or `None` if it does not exist.
pub fn file_size(path: impl AsRef<Path>) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
}
