#![allow(dead_code)]

use editor_changes::{
    ChangeTracker, ChangedRange, DocumentId, DocumentSource, EditorHost, TrackerError,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

pub const DOC: DocumentId = DocumentId::new(1);

/// What the saved copy of a document looks like.
#[derive(Debug, Clone)]
pub enum Saved {
    Text(String),
    Missing,
    Undecodable,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    pub current: String,
    pub saved: Saved,
    pub file_size: Option<u64>,
}

/// Blocks readers until opened.
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn close(&self) {
        *self.open.lock().unwrap() = false;
    }
}

/// In-memory [`DocumentSource`] with failure injection.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: Mutex<HashMap<DocumentId, MemoryDocument>>,
    pub gate: Option<Arc<Gate>>,
    pub panic_on_read: bool,
    reads: Mutex<usize>,
    read_threads: Mutex<Vec<Option<String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_read: true,
            ..Self::default()
        }
    }

    pub fn with_document(self, document: DocumentId, saved: &str, current: &str) -> Self {
        self.set(document, saved, current);
        self
    }

    pub fn set(&self, document: DocumentId, saved: &str, current: &str) {
        self.documents.lock().unwrap().insert(
            document,
            MemoryDocument {
                current: current.to_string(),
                saved: Saved::Text(saved.to_string()),
                file_size: Some(saved.len() as u64),
            },
        );
    }

    pub fn set_current(&self, document: DocumentId, current: &str) {
        if let Some(doc) = self.documents.lock().unwrap().get_mut(&document) {
            doc.current = current.to_string();
        }
    }

    pub fn set_saved(&self, document: DocumentId, saved: Saved) {
        if let Some(doc) = self.documents.lock().unwrap().get_mut(&document) {
            doc.saved = saved;
        }
    }

    pub fn set_file_size(&self, document: DocumentId, file_size: Option<u64>) {
        if let Some(doc) = self.documents.lock().unwrap().get_mut(&document) {
            doc.file_size = file_size;
        }
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }

    /// Names of the threads that read the live buffer, in order.
    pub fn read_threads(&self) -> Vec<Option<String>> {
        self.read_threads.lock().unwrap().clone()
    }
}

impl DocumentSource for MemorySource {
    fn current_text(&self, document: DocumentId) -> Result<String, TrackerError> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if self.panic_on_read {
            panic!("buffer read exploded");
        }
        *self.reads.lock().unwrap() += 1;
        self.read_threads
            .lock()
            .unwrap()
            .push(std::thread::current().name().map(str::to_string));
        self.documents
            .lock()
            .unwrap()
            .get(&document)
            .map(|doc| doc.current.clone())
            .ok_or(TrackerError::BufferUnavailable)
    }

    fn saved_text(&self, document: DocumentId) -> Result<String, TrackerError> {
        let documents = self.documents.lock().unwrap();
        match documents.get(&document).map(|doc| &doc.saved) {
            Some(Saved::Text(text)) => Ok(text.clone()),
            Some(Saved::Undecodable) => Err(TrackerError::Decode("invalid utf-8".to_string())),
            Some(Saved::Missing) | None => Err(TrackerError::NotFound(PathBuf::from(format!(
                "/tmp/doc-{}.txt",
                document.get()
            )))),
        }
    }

    fn file_size_bytes(&self, document: DocumentId) -> Option<u64> {
        self.documents
            .lock()
            .unwrap()
            .get(&document)
            .and_then(|doc| doc.file_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Render(DocumentId, Vec<ChangedRange>, String),
    Clear(DocumentId),
    Schedule(DocumentId, Duration),
    Reveal(DocumentId, ChangedRange),
}

/// [`EditorHost`] that records every call and simulates a timer wheel.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
    pub now: Duration,
    timers: Vec<(Duration, DocumentId)>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> Vec<(DocumentId, Vec<ChangedRange>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Render(doc, ranges, _) => Some((*doc, ranges.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clears(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, HostCall::Clear(_)))
            .count()
    }

    pub fn schedules(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, HostCall::Schedule(..)))
            .count()
    }

    pub fn reveals(&self) -> Vec<ChangedRange> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Reveal(_, range) => Some(*range),
                _ => None,
            })
            .collect()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Advance the simulated clock to `now`, firing due timers in order.
    pub fn advance_to<S: DocumentSource + ?Sized + 'static>(
        &mut self,
        tracker: &mut ChangeTracker<S>,
        now: Duration,
    ) {
        self.timers.sort_by_key(|(due, _)| *due);
        while let Some(&(due, document)) = self.timers.first() {
            if due > now {
                break;
            }
            self.timers.remove(0);
            self.now = due;
            let _ = tracker.on_timer_elapsed(document, self);
        }
        self.now = now;
    }
}

impl EditorHost for RecordingHost {
    fn render_regions(&mut self, document: DocumentId, ranges: &[ChangedRange], style_tag: &str) {
        self.calls.push(HostCall::Render(
            document,
            ranges.to_vec(),
            style_tag.to_string(),
        ));
    }

    fn clear_regions(&mut self, document: DocumentId) {
        self.calls.push(HostCall::Clear(document));
    }

    fn schedule_after(&mut self, document: DocumentId, delay: Duration) {
        self.calls.push(HostCall::Schedule(document, delay));
        self.timers.push((self.now + delay, document));
    }

    fn reveal_range(&mut self, document: DocumentId, range: ChangedRange) {
        self.calls.push(HostCall::Reveal(document, range));
    }
}
