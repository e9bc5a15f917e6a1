//! Print the unsaved changes between a saved file and an edited copy.
//!
//! ```text
//! RUST_LOG=editor_changes=debug cargo run -p editor-changes --example highlight_file -- saved.rs edited.rs
//! ```

use editor_changes::{
    ChangeTracker, ChangedRange, DocumentId, DocumentSource, EditorHost, HighlightMode,
    TrackerConfig, TrackerError, file_size, read_saved_file,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

struct FileSource {
    saved: PathBuf,
    edited: PathBuf,
}

impl DocumentSource for FileSource {
    fn current_text(&self, _: DocumentId) -> Result<String, TrackerError> {
        read_saved_file(&self.edited)
    }

    fn saved_text(&self, _: DocumentId) -> Result<String, TrackerError> {
        read_saved_file(&self.saved)
    }

    fn file_size_bytes(&self, _: DocumentId) -> Option<u64> {
        file_size(&self.saved)
    }
}

struct ConsoleHost {
    text: Vec<char>,
}

impl ConsoleHost {
    fn line_col(&self, offset: usize) -> (usize, usize) {
        let before = &self.text[..offset.min(self.text.len())];
        let line = before.iter().filter(|&&c| c == '\n').count();
        let col = before.iter().rev().take_while(|&&c| c != '\n').count();
        (line + 1, col + 1)
    }
}

impl EditorHost for ConsoleHost {
    fn render_regions(&mut self, _: DocumentId, ranges: &[ChangedRange], style_tag: &str) {
        println!("{} changed range(s) [{style_tag}]", ranges.len());
        for range in ranges {
            let (line, col) = self.line_col(range.start);
            let snippet: String = self.text[range.start..range.end]
                .iter()
                .collect::<String>()
                .escape_debug()
                .to_string();
            println!("  {line}:{col}  [{}, {})  {snippet}", range.start, range.end);
        }
    }

    fn clear_regions(&mut self, _: DocumentId) {
        println!("cleared");
    }

    fn schedule_after(&mut self, _: DocumentId, _: Duration) {}

    fn reveal_range(&mut self, _: DocumentId, range: ChangedRange) {
        let (line, col) = self.line_col(range.start);
        println!("reveal {line}:{col}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(saved), Some(edited)) = (args.next(), args.next()) else {
        eprintln!("usage: highlight_file <saved-file> <edited-file>");
        std::process::exit(2);
    };

    let source = Arc::new(FileSource {
        saved: saved.into(),
        edited: edited.into(),
    });
    let text = match source.current_text(DocumentId::new(0)) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let config = TrackerConfig::default().with_highlight_mode(HighlightMode::Spans);
    let mut tracker = ChangeTracker::new(source, config);
    let mut host = ConsoleHost {
        text: text.chars().collect(),
    };
    let doc = DocumentId::new(0);

    match tracker.on_highlight_requested(doc, &mut host) {
        Ok(outcome) => tracing::info!(?outcome, "highlight requested"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
    for completed in tracker.wait_for_completion(&mut host, Duration::from_secs(30)) {
        if let Err(err) = completed.result {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }

    // In background mode the reveal happens once the refreshed ranges are applied.
    if tracker.on_goto_next_change_requested(doc, &mut host).is_none() {
        tracker.wait_for_completion(&mut host, Duration::from_secs(30));
    }
}
