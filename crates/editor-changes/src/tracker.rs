//! Change tracking sessions driven by host events.
//!
//! [`ChangeTracker`] owns one [`TrackerSession`] per document and reacts to host events:
//!
//! - edits are debounced: every edit schedules a host timer, and only the timer that brings the
//!   pending count back to zero triggers a recomputation
//! - a recomputation reads both texts, diffs them, stores the true spans and renders them in the
//!   configured [`HighlightMode`](crate::HighlightMode)
//! - saves clear everything
//!
//! In [`ExecutionMode::Background`] the read + diff step runs on a worker thread and the result
//! is applied by [`ChangeTracker::poll`], which the host calls from its UI thread. At most one
//! recomputation per document runs at a time; requests arriving meanwhile are dropped.

use crate::config::{DocumentMeta, ExecutionMode, IneligibleReason, TrackerConfig};
use crate::diff::{ChangedRange, DiffEngine};
use crate::error::TrackerError;
use crate::host::{DocumentId, DocumentSource, EditorHost};
use crate::session::{SessionState, TrackerSession};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Result of a request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// Ranges were recomputed, stored and rendered.
    Updated {
        /// Number of changed ranges found.
        ranges: usize,
    },
    /// The recomputation was handed to a worker thread.
    Spawned,
    /// Another recomputation for the document is still running; this request was dropped.
    Busy,
    /// The document is skipped by the eligibility gate.
    Ineligible(IneligibleReason),
    /// Highlight-as-you-type is turned off.
    Disabled,
    /// Debounce timers are still outstanding.
    Deferred,
    /// The result belongs to a document that was saved or closed meanwhile and was discarded.
    Stale,
}

/// A background recomputation applied by [`ChangeTracker::poll`].
#[derive(Debug)]
pub struct CompletedRecompute {
    /// Document the job ran for.
    pub document: DocumentId,
    /// What happened when the result was applied.
    pub result: Result<RecomputeOutcome, TrackerError>,
}

#[derive(Debug)]
struct JobResult {
    document: DocumentId,
    job: u64,
    generation: u64,
    ranges: Result<Vec<ChangedRange>, TrackerError>,
}

/// Reports a job result exactly once, even if the worker unwinds.
struct JobReporter {
    tx: mpsc::Sender<JobResult>,
    document: DocumentId,
    job: u64,
    generation: u64,
    sent: bool,
}

impl JobReporter {
    fn send(mut self, ranges: Result<Vec<ChangedRange>, TrackerError>) {
        self.sent = true;
        let _ = self.tx.send(JobResult {
            document: self.document,
            job: self.job,
            generation: self.generation,
            ranges,
        });
    }
}

impl Drop for JobReporter {
    fn drop(&mut self) {
        if !self.sent {
            let _ = self.tx.send(JobResult {
                document: self.document,
                job: self.job,
                generation: self.generation,
                ranges: Err(TrackerError::WorkerLost),
            });
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct JobSpec {
    document: DocumentId,
    job: u64,
    generation: u64,
    engine: DiffEngine,
    normalize_line_endings: bool,
}

/// Tracks unsaved changes for a set of open documents.
pub struct ChangeTracker<S: ?Sized = dyn DocumentSource> {
    source: Arc<S>,
    config: TrackerConfig,
    sessions: BTreeMap<DocumentId, TrackerSession>,
    // jobs still running for closed documents
    orphaned: BTreeMap<DocumentId, u64>,
    next_job: u64,
    tx: mpsc::Sender<JobResult>,
    rx: mpsc::Receiver<JobResult>,
}

impl<S: DocumentSource + ?Sized + 'static> ChangeTracker<S> {
    /// Create a tracker reading document content from `source`.
    pub fn new(source: Arc<S>, config: TrackerConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            config,
            sessions: BTreeMap::new(),
            orphaned: BTreeMap::new(),
            next_job: 1,
            tx,
            rx,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replace the configuration.
    ///
    /// If the change affects rendering (mode, point anchor, style tag), every document with
    /// changes is re-rendered from its stored spans. Nothing is re-diffed.
    pub fn set_config<H: EditorHost + ?Sized>(&mut self, config: TrackerConfig, host: &mut H) {
        let rerender = self.config.render_differs(&config);
        self.config = config;
        if !rerender {
            return;
        }
        for (&document, session) in &self.sessions {
            if !session.ranges().is_empty() {
                render_session(document, session, &self.config, host);
            }
        }
    }

    /// Start tracking `document`. Sessions are also created on first use.
    pub fn open_document(&mut self, document: DocumentId) {
        self.sessions.entry(document).or_default();
    }

    /// Stop tracking `document`. Results of in-flight work for it are discarded.
    ///
    /// A job still running for the closed document keeps blocking new recomputations for it
    /// until its result arrives, even if the document is reopened meanwhile.
    pub fn close_document(&mut self, document: DocumentId) -> bool {
        let Some(session) = self.sessions.remove(&document) else {
            return false;
        };
        if let Some(job) = session.in_flight_job() {
            self.orphaned.insert(document, job);
        }
        true
    }

    /// Session state for `document`, if it is tracked.
    pub fn session(&self, document: DocumentId) -> Option<&TrackerSession> {
        self.sessions.get(&document)
    }

    /// Stored changed ranges (true spans) for `document`.
    pub fn ranges(&self, document: DocumentId) -> &[ChangedRange] {
        self.sessions
            .get(&document)
            .map(TrackerSession::ranges)
            .unwrap_or(&[])
    }

    /// Navigation cursor for `document`.
    pub fn cursor(&self, document: DocumentId) -> usize {
        self.sessions
            .get(&document)
            .map(TrackerSession::cursor)
            .unwrap_or(0)
    }

    /// Coarse state for `document`; untracked documents are [`SessionState::Idle`].
    pub fn state(&self, document: DocumentId) -> SessionState {
        if self.orphaned.contains_key(&document) {
            return SessionState::Computing;
        }
        self.sessions
            .get(&document)
            .map(TrackerSession::state)
            .unwrap_or(SessionState::Idle)
    }

    /// Number of recomputations in flight, including those for closed documents.
    pub fn in_flight_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_in_flight()).count() + self.orphaned.len()
    }

    fn is_busy(&self, document: DocumentId) -> bool {
        self.orphaned.contains_key(&document)
            || self
                .sessions
                .get(&document)
                .is_some_and(TrackerSession::is_in_flight)
    }

    /// Returns `true` if `document` passes the size/existence gate.
    pub fn is_eligible(&self, document: DocumentId) -> bool {
        self.config.is_eligible(&self.document_meta(document))
    }

    /// The live buffer of `document` changed.
    ///
    /// Schedules a debounce timer; see [`ChangeTracker::on_timer_elapsed`].
    pub fn on_document_edited<H: EditorHost + ?Sized>(
        &mut self,
        document: DocumentId,
        host: &mut H,
    ) -> RecomputeOutcome {
        if !self.config.highlight_as_you_type {
            return RecomputeOutcome::Disabled;
        }
        let session = self.sessions.entry(document).or_default();
        session.note_edit();
        trace!(
            document = document.get(),
            pending = session.pending(),
            "edit scheduled"
        );
        host.schedule_after(document, self.config.highlight_delay());
        RecomputeOutcome::Deferred
    }

    /// A timer scheduled through [`EditorHost::schedule_after`] fired.
    ///
    /// Only the last outstanding timer of a burst triggers a recomputation.
    pub fn on_timer_elapsed<H: EditorHost + ?Sized>(
        &mut self,
        document: DocumentId,
        host: &mut H,
    ) -> Result<RecomputeOutcome, TrackerError> {
        let Some(session) = self.sessions.get_mut(&document) else {
            return Ok(RecomputeOutcome::Stale);
        };
        if !session.timer_elapsed() {
            trace!(
                document = document.get(),
                pending = session.pending(),
                "debounce still pending"
            );
            return Ok(RecomputeOutcome::Deferred);
        }
        self.recompute(document, host, self.config.execution_mode())
    }

    /// Explicit highlight request; recomputes right away.
    pub fn on_highlight_requested<H: EditorHost + ?Sized>(
        &mut self,
        document: DocumentId,
        host: &mut H,
    ) -> Result<RecomputeOutcome, TrackerError> {
        self.recompute(document, host, self.config.execution_mode())
    }

    /// Reveal the next changed range, wrapping around after the last one.
    ///
    /// Unless a recomputation is already running, the ranges are refreshed first. In
    /// [`ExecutionMode::Inline`] the refresh runs before this call returns. In
    /// [`ExecutionMode::Background`] it is spawned, `None` is returned, and the reveal happens
    /// when [`ChangeTracker::poll`] applies the result. While a recomputation is running the
    /// stored ranges are navigated as they are.
    ///
    /// Returns the range revealed by this call, or `None` if there is none (yet).
    pub fn on_goto_next_change_requested<H: EditorHost + ?Sized>(
        &mut self,
        document: DocumentId,
        host: &mut H,
    ) -> Option<ChangedRange> {
        if !self.is_busy(document) {
            match self.recompute(document, host, self.config.execution_mode()) {
                Ok(RecomputeOutcome::Spawned) => {
                    if let Some(session) = self.sessions.get_mut(&document) {
                        session.defer_reveal();
                    }
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(document = document.get(), error = %err, "refresh before navigation failed");
                }
            }
        }

        let range = self.sessions.get_mut(&document)?.next_change()?;
        host.reveal_range(document, range);
        Some(range)
    }

    /// The document was saved: saved and live content are equal again.
    pub fn on_document_saved<H: EditorHost + ?Sized>(&mut self, document: DocumentId, host: &mut H) {
        self.sessions.entry(document).or_default().clear();
        debug!(document = document.get(), "document saved, clearing changes");
        host.clear_regions(document);
    }

    /// Apply finished background recomputations. Call from the host's UI thread.
    pub fn poll<H: EditorHost + ?Sized>(&mut self, host: &mut H) -> Vec<CompletedRecompute> {
        let mut completed = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            completed.push(self.apply_job_result(result, host));
        }
        completed
    }

    /// Like [`ChangeTracker::poll`], but waits up to `timeout` for the first result if none is
    /// ready yet.
    pub fn wait_for_completion<H: EditorHost + ?Sized>(
        &mut self,
        host: &mut H,
        timeout: Duration,
    ) -> Vec<CompletedRecompute> {
        let mut completed = Vec::new();
        if self.in_flight_count() == 0 {
            return completed;
        }
        if let Ok(result) = self.rx.recv_timeout(timeout) {
            completed.push(self.apply_job_result(result, host));
        }
        completed.extend(self.poll(host));
        completed
    }

    fn document_meta(&self, document: DocumentId) -> DocumentMeta {
        DocumentMeta {
            file_size_bytes: self.source.file_size_bytes(document),
        }
    }

    fn recompute<H: EditorHost + ?Sized>(
        &mut self,
        document: DocumentId,
        host: &mut H,
        mode: ExecutionMode,
    ) -> Result<RecomputeOutcome, TrackerError> {
        if let Err(reason) = self.config.check_eligibility(&self.document_meta(document)) {
            debug!(document = document.get(), ?reason, "document not eligible");
            return Ok(RecomputeOutcome::Ineligible(reason));
        }

        if self.orphaned.contains_key(&document) {
            debug!(
                document = document.get(),
                "recompute for closed document still running, dropping request"
            );
            return Ok(RecomputeOutcome::Busy);
        }

        let job = self.next_job;
        self.next_job += 1;

        let session = self.sessions.entry(document).or_default();
        if !session.try_begin(job) {
            debug!(
                document = document.get(),
                "recompute already in flight, dropping request"
            );
            return Ok(RecomputeOutcome::Busy);
        }

        let spec = JobSpec {
            document,
            job,
            generation: session.generation(),
            engine: DiffEngine::new(self.config.matcher_options()),
            normalize_line_endings: self.config.normalize_line_endings,
        };

        match mode {
            ExecutionMode::Inline => {
                let ranges = compute_ranges(self.source.as_ref(), &spec);
                self.apply_job_result(
                    JobResult {
                        document,
                        job,
                        generation: spec.generation,
                        ranges,
                    },
                    host,
                )
                .result
            }
            ExecutionMode::Background => self.spawn_job(spec),
        }
    }

    fn spawn_job(&mut self, spec: JobSpec) -> Result<RecomputeOutcome, TrackerError> {
        let source = Arc::clone(&self.source);
        let reporter = JobReporter {
            tx: self.tx.clone(),
            document: spec.document,
            job: spec.job,
            generation: spec.generation,
            sent: false,
        };

        let spawned = thread::Builder::new()
            .name(format!("editor-changes-{}", spec.document.get()))
            .spawn(move || {
                let ranges = compute_ranges(source.as_ref(), &spec);
                reporter.send(ranges);
            });

        match spawned {
            Ok(_) => {
                trace!(document = spec.document.get(), job = spec.job, "recompute spawned");
                Ok(RecomputeOutcome::Spawned)
            }
            Err(err) => {
                if let Some(session) = self.sessions.get_mut(&spec.document) {
                    session.finish(spec.job);
                }
                warn!(document = spec.document.get(), error = %err, "failed to spawn recompute worker");
                Err(err.into())
            }
        }
    }

    fn apply_job_result<H: EditorHost + ?Sized>(
        &mut self,
        result: JobResult,
        host: &mut H,
    ) -> CompletedRecompute {
        let JobResult {
            document,
            job,
            generation,
            ranges,
        } = result;

        if self.orphaned.get(&document) == Some(&job) {
            self.orphaned.remove(&document);
        }

        let Some(session) = self.sessions.get_mut(&document) else {
            debug!(document = document.get(), job, "discarding result for closed document");
            return CompletedRecompute {
                document,
                result: Ok(RecomputeOutcome::Stale),
            };
        };

        let outcome = if !session.finish(job) {
            debug!(document = document.get(), job, "discarding result of a superseded job");
            Ok(RecomputeOutcome::Stale)
        } else if session.generation() != generation {
            debug!(document = document.get(), "discarding result computed before save");
            Ok(RecomputeOutcome::Stale)
        } else {
            let outcome = match ranges {
                Ok(ranges) => {
                    let count = ranges.len();
                    session.replace_ranges(ranges);
                    render_session(document, session, &self.config, host);
                    debug!(document = document.get(), ranges = count, "changes updated");
                    Ok(RecomputeOutcome::Updated { ranges: count })
                }
                Err(err) => {
                    if matches!(err, TrackerError::Engine(_) | TrackerError::WorkerLost) {
                        warn!(document = document.get(), error = %err, "recompute failed");
                    } else {
                        debug!(document = document.get(), error = %err, "recompute abandoned");
                    }
                    Err(err)
                }
            };
            // Errors leave the stored ranges in place; navigation still uses them.
            if session.take_deferred_reveal() {
                if let Some(range) = session.next_change() {
                    host.reveal_range(document, range);
                }
            }
            outcome
        };

        CompletedRecompute {
            document,
            result: outcome,
        }
    }
}

fn render_session<H: EditorHost + ?Sized>(
    document: DocumentId,
    session: &TrackerSession,
    config: &TrackerConfig,
    host: &mut H,
) {
    let projected = config
        .highlight_mode
        .project(session.ranges(), config.point_anchor);
    host.render_regions(document, &projected, &config.style_tag);
}

fn compute_ranges<S: DocumentSource + ?Sized>(
    source: &S,
    spec: &JobSpec,
) -> Result<Vec<ChangedRange>, TrackerError> {
    let current = source.current_text(spec.document)?;
    let mut saved = source.saved_text(spec.document)?;
    if spec.normalize_line_endings && saved.contains("\r\n") && !current.contains('\r') {
        saved = saved.replace("\r\n", "\n");
    }
    Ok(spec.engine.changed_ranges(&saved, &current)?)
}
