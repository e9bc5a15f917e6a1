//! Error types for the diff engine, the tracker and settings loading.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by the diff engine.
pub enum DiffError {
    #[error("match block {index} starts before the previous block ends")]
    /// The matcher produced blocks that are not strictly ordered.
    UnorderedBlocks {
        /// Position of the offending block in the block list.
        index: usize,
    },
}

#[derive(Debug, Error)]
/// Errors that abandon a single recomputation.
///
/// None of these are fatal: the tracker keeps the previously rendered regions and waits for the
/// next trigger.
pub enum TrackerError {
    #[error("saved file not found: {}", .0.display())]
    /// The document has no saved copy at the expected path.
    NotFound(PathBuf),

    #[error("saved file is not valid UTF-8: {0}")]
    /// The saved copy could not be decoded as text.
    Decode(String),

    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("current buffer text is unavailable")]
    /// The host could not provide the live buffer text.
    BufferUnavailable,

    #[error("diff engine error: {0}")]
    /// The diff engine rejected its own matcher output.
    Engine(#[from] DiffError),

    #[error("background recompute ended without a result")]
    /// A worker thread exited (panicked) before reporting.
    WorkerLost,
}

impl TrackerError {
    /// Returns `true` for errors caused by reading document content.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Decode(_) | Self::Io(_) | Self::BufferUnavailable
        )
    }
}

#[derive(Debug, Error)]
/// Errors produced while loading a settings file.
pub enum ConfigError {
    #[error("I/O error: {0}")]
    /// Reading the settings file failed.
    Io(#[from] std::io::Error),

    #[error("settings parse error: {0}")]
    /// The settings file is not valid JSON for [`TrackerConfig`](crate::TrackerConfig).
    Parse(#[from] serde_json::Error),
}
