//! Conversation panes — independent chat loops over their own transcript.
//!
//! DESIGN
//! ======
//! A pane is `Idle` until a non-blank submission flips it to `Submitting`;
//! it returns to `Idle` when the router has appended the reply or the error
//! entry. A submission that arrives while one is in flight is rejected with
//! [`PaneError::Busy`], never queued.
//!
//! Each turn runs on its own task that the pane owns. The caller awaits the
//! task, but dropping that await does not cancel it: the user entry and the
//! reply (or error entry) always land together, and the busy flag is only
//! released when the turn has finished writing.
//!
//! A pane's only coupling to the whiteboard is the injected [`EntrySink`]:
//! finished entries are pushed into it according to the pane's
//! [`ForwardPolicy`], or on demand via [`Pane::send_to_document`]. The pane
//! never reads whiteboard state.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::router::{ContextPolicy, DEFAULT_SYSTEM_PROMPT, InputRouter, Prompting, Submission};
use crate::document::{DocumentError, EntrySink, Sequence};
use crate::entry::{Entry, Mode, Role};

pub const TOOL_GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";
pub const REMIX_SYSTEM_PROMPT: &str = "You are a helpful assistant for remixing and improving content.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PaneError {
    #[error("pane is busy with another submission")]
    Busy,
    #[error("pane has no whiteboard to send to")]
    NoSink,
    #[error("{0} panes cannot be mounted")]
    NotMountable(PaneKind),
    #[error("pane {0} is not mounted")]
    NotMounted(Uuid),
    #[error("pane submission task failed: {0}")]
    TaskFailed(String),
    #[error(transparent)]
    Position(#[from] DocumentError),
}

impl crate::error::ErrorCode for PaneError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Busy => "E_PANE_BUSY",
            Self::NoSink => "E_PANE_NO_SINK",
            Self::NotMountable(_) => "E_PANE_NOT_MOUNTABLE",
            Self::NotMounted(_) => "E_PANE_NOT_MOUNTED",
            Self::TaskFailed(_) => "E_PANE_TASK_FAILED",
            Self::Position(e) => crate::error::ErrorCode::error_code(e),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

/// Which flavour of pane this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneKind {
    /// Side tool chat: greets on mount, single-turn context.
    Tool,
    /// Main chat assistant: full history.
    Assistant,
    /// Whiteboard remix bar: replies land on the whiteboard.
    Remix,
    /// The whiteboard's own input bar; its transcript is the whiteboard.
    Whiteboard,
}

impl fmt::Display for PaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tool => "tool",
            Self::Assistant => "assistant",
            Self::Remix => "remix",
            Self::Whiteboard => "whiteboard",
        })
    }
}

/// Which finished entries a pane pushes into the whiteboard on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardPolicy {
    /// Nothing; the user sends entries explicitly.
    #[default]
    Manual,
    /// The user's entry only.
    User,
    /// The successful reply only.
    Reply,
    /// The user's entry followed by the successful reply.
    Both,
}

/// Behaviour knobs that distinguish pane flavours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneProfile {
    pub prompting: Prompting,
    pub greeting: Option<String>,
    pub forward: ForwardPolicy,
}

impl PaneKind {
    #[must_use]
    pub fn profile(self) -> PaneProfile {
        match self {
            Self::Tool => PaneProfile {
                prompting: Prompting::new(None, ContextPolicy::LatestOnly),
                greeting: Some(TOOL_GREETING.to_string()),
                forward: ForwardPolicy::Manual,
            },
            Self::Assistant | Self::Whiteboard => PaneProfile {
                prompting: Prompting::new(Some(DEFAULT_SYSTEM_PROMPT), ContextPolicy::FullHistory),
                greeting: None,
                forward: ForwardPolicy::Manual,
            },
            Self::Remix => PaneProfile {
                prompting: Prompting::new(Some(REMIX_SYSTEM_PROMPT), ContextPolicy::LatestOnly),
                greeting: None,
                forward: ForwardPolicy::Reply,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneState {
    Idle,
    Submitting,
}

/// How the most recent submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Resolved,
    Failed,
}

/// Resets the busy flag when the turn task ends, including on panic.
struct SubmittingGuard(Arc<PaneCore>);

impl Drop for SubmittingGuard {
    fn drop(&mut self) {
        self.0.submitting.store(false, Ordering::Release);
    }
}

// =============================================================================
// PANE
// =============================================================================

/// The parts of a pane a detached turn needs to finish on its own.
struct PaneCore {
    id: Uuid,
    transcript: Sequence,
    router: InputRouter,
    sink: Option<Arc<dyn EntrySink>>,
    submitting: AtomicBool,
    last: Mutex<Option<Resolution>>,
}

pub struct Pane {
    kind: PaneKind,
    profile: PaneProfile,
    core: Arc<PaneCore>,
}

impl Pane {
    /// Mount a pane with a fresh transcript.
    pub fn new(kind: PaneKind, router: InputRouter, sink: Option<Arc<dyn EntrySink>>) -> Self {
        Self::with_transcript(kind, Sequence::new(), router, sink)
    }

    /// Mount a pane over an existing sequence.
    pub fn with_transcript(
        kind: PaneKind,
        transcript: Sequence,
        router: InputRouter,
        sink: Option<Arc<dyn EntrySink>>,
    ) -> Self {
        Self {
            kind,
            profile: kind.profile(),
            core: Arc::new(PaneCore {
                id: Uuid::new_v4(),
                transcript,
                router,
                sink,
                submitting: AtomicBool::new(false),
                last: Mutex::new(None),
            }),
        }
    }

    /// Replace the default forward policy for this kind.
    #[must_use]
    pub fn with_forward(mut self, forward: ForwardPolicy) -> Self {
        self.profile.forward = forward;
        self
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.core.id
    }

    #[must_use]
    pub fn kind(&self) -> PaneKind {
        self.kind
    }

    #[must_use]
    pub fn profile(&self) -> &PaneProfile {
        &self.profile
    }

    #[must_use]
    pub fn state(&self) -> PaneState {
        if self.core.submitting.load(Ordering::Acquire) { PaneState::Submitting } else { PaneState::Idle }
    }

    #[must_use]
    pub fn last_resolution(&self) -> Option<Resolution> {
        *self.core.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn transcript(&self) -> Vec<Entry> {
        self.core.transcript.snapshot()
    }

    /// Send the configured greeting, if any. Runs through the same busy
    /// gate as user submissions.
    ///
    /// # Errors
    ///
    /// Returns [`PaneError::Busy`] if a submission is already in flight.
    pub async fn greet(&self) -> Result<Submission, PaneError> {
        let Some(greeting) = self.profile.greeting.clone() else {
            return Ok(Submission::Ignored);
        };
        let prompting = self.profile.prompting.clone();
        info!(pane_id = %self.id(), kind = %self.kind, "pane: greeting");
        self.run_turn(move |core| async move {
            let outcome = core
                .router
                .prompt_silently(&core.transcript, &greeting, &prompting)
                .await;
            core.finish(&outcome);
            outcome
        })
        .await
    }

    /// Submit user input through the router.
    ///
    /// Blank input is ignored without touching pane state. Dropping the
    /// returned future does not abandon the turn.
    ///
    /// # Errors
    ///
    /// Returns [`PaneError::Busy`] if a submission is already in flight,
    /// [`PaneError::TaskFailed`] if the turn task panicked.
    pub async fn submit(&self, raw: &str, mode: Mode) -> Result<Submission, PaneError> {
        if raw.trim().is_empty() {
            return Ok(Submission::Ignored);
        }
        let raw = raw.to_owned();
        let prompting = self.profile.prompting.clone();
        let forward = self.profile.forward;
        info!(pane_id = %self.id(), kind = %self.kind, %mode, "pane: submitting");
        self.run_turn(move |core| async move {
            let outcome = core
                .router
                .submit(&core.transcript, &raw, mode, &prompting)
                .await;
            core.finish(&outcome);
            core.forward(forward, &outcome);
            outcome
        })
        .await
    }

    /// Copy the transcript entry at `position` into the whiteboard.
    ///
    /// # Errors
    ///
    /// [`PaneError::NoSink`] when the pane has no whiteboard attached,
    /// [`PaneError::Position`] when `position` is out of range.
    pub fn send_to_document(&self, position: usize) -> Result<Entry, PaneError> {
        let core = &self.core;
        let sink = core.sink.as_ref().ok_or(PaneError::NoSink)?;
        let entry = core
            .transcript
            .get(position)
            .ok_or(DocumentError::OutOfRange { position, len: core.transcript.len() })?;
        sink.insert_entry(entry.clone());
        info!(pane_id = %core.id, position, "pane: sent entry to whiteboard");
        Ok(entry)
    }

    /// Claim the busy flag, then run `turn` on a task that holds it until
    /// the turn is done.
    async fn run_turn<F, Fut>(&self, turn: F) -> Result<Submission, PaneError>
    where
        F: FnOnce(Arc<PaneCore>) -> Fut,
        Fut: Future<Output = Submission> + Send + 'static,
    {
        let guard = self.begin()?;
        let work = turn(Arc::clone(&self.core));
        let task = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });
        task.await.map_err(|e| {
            warn!(pane_id = %self.id(), error = %e, "pane: turn task failed");
            PaneError::TaskFailed(e.to_string())
        })
    }

    fn begin(&self) -> Result<SubmittingGuard, PaneError> {
        self.core
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!(pane_id = %self.id(), "pane: rejected submission while busy");
                PaneError::Busy
            })?;
        Ok(SubmittingGuard(Arc::clone(&self.core)))
    }
}

impl PaneCore {
    fn finish(&self, outcome: &Submission) {
        let resolution = match outcome {
            Submission::Ignored => return,
            Submission::Appended { failed: true, .. } => Resolution::Failed,
            Submission::Appended { failed: false, .. } => Resolution::Resolved,
        };
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(resolution);
    }

    fn forward(&self, policy: ForwardPolicy, outcome: &Submission) {
        let Some(sink) = &self.sink else {
            return;
        };
        let entries = outcome.entries();
        let user = entries.first().filter(|e| e.role == Role::User);
        let reply = outcome.reply().filter(|_| !outcome.is_failed());

        let forwarded: Vec<&Entry> = match policy {
            ForwardPolicy::Manual => Vec::new(),
            ForwardPolicy::User => user.into_iter().collect(),
            ForwardPolicy::Reply => reply.into_iter().collect(),
            ForwardPolicy::Both => user.into_iter().chain(reply).collect(),
        };
        for entry in forwarded {
            sink.insert_entry(entry.clone());
        }
    }
}

#[cfg(test)]
#[path = "pane_test.rs"]
mod tests;
