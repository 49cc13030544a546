//! Input router — raw text + mode → entries in an owning sequence.
//!
//! DESIGN
//! ======
//! Dispatch is an exhaustive `match` on [`Mode`]. Every network-backed path
//! appends the user's entry first, then resolves to exactly one result entry:
//! the reply on success or an error entry on failure. Failures are converted
//! to entries here and never escape to the caller; the returned
//! [`Submission`] is the completion signal input surfaces clear their field
//! on.
//!
//! Credentials are read from the store at the moment of each request and
//! handed to the client, so a key set mid-session applies to the very next
//! call.

use std::sync::Arc;

use tracing::{info, warn};

use crate::credentials::{CredentialStore, Provider};
use crate::document::Sequence;
use crate::entry::{Entry, Mode, Role};
use crate::llm::{ChatCompletion, ChatMessage, ClientError, ImageGeneration};

pub const URL_DIRECTIVE_PREFIX: &str = "Process this URL: ";
pub const ASSISTANT_APOLOGY: &str = "Sorry, I encountered an error while processing your request.";
pub const INPUT_FAILURE_PREFIX: &str = "Failed to process input: ";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// =============================================================================
// TYPES
// =============================================================================

/// How much of the owning sequence goes to the model as context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextPolicy {
    /// Every prior entry, then the new message.
    #[default]
    FullHistory,
    /// Only the new message.
    LatestOnly,
}

/// Prompt shaping for the assistant path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Prompting {
    pub system: Option<String>,
    pub context: ContextPolicy,
}

impl Prompting {
    pub fn new(system: Option<&str>, context: ContextPolicy) -> Self {
        Self { system: system.map(str::to_owned), context }
    }

    /// Default chat assistant: fixed system prompt, full history.
    #[must_use]
    pub fn assistant() -> Self {
        Self::new(Some(DEFAULT_SYSTEM_PROMPT), ContextPolicy::FullHistory)
    }

    fn context(&self, history: &[Entry]) -> Vec<ChatMessage> {
        let mut out = Vec::new();
        if let Some(system) = self.system.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push(ChatMessage::new(Role::System, system));
        }
        if self.context == ContextPolicy::FullHistory {
            out.extend(
                history
                    .iter()
                    .map(|entry| ChatMessage::new(entry.role, entry.content.clone())),
            );
        }
        out
    }
}

/// Result of one submission, returned once the sequence is consistent again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input: nothing appended, no request issued.
    Ignored,
    /// Entries appended, in order. `failed` marks a trailing error entry.
    Appended { entries: Vec<Entry>, failed: bool },
}

impl Submission {
    fn appended(entries: Vec<Entry>) -> Self {
        Self::Appended { entries, failed: false }
    }

    fn failed(entries: Vec<Entry>) -> Self {
        Self::Appended { entries, failed: true }
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        match self {
            Self::Ignored => &[],
            Self::Appended { entries, .. } => entries,
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Appended { failed: true, .. })
    }

    /// The produced entry that is not the user's own, if any.
    #[must_use]
    pub fn reply(&self) -> Option<&Entry> {
        self.entries()
            .last()
            .filter(|entry| entry.role != Role::User)
    }
}

// =============================================================================
// ROUTER
// =============================================================================

#[derive(Clone)]
pub struct InputRouter {
    completion: Arc<dyn ChatCompletion>,
    images: Arc<dyn ImageGeneration>,
    credentials: CredentialStore,
}

impl InputRouter {
    pub fn new(
        completion: Arc<dyn ChatCompletion>,
        images: Arc<dyn ImageGeneration>,
        credentials: CredentialStore,
    ) -> Self {
        Self { completion, images, credentials }
    }

    /// Route `raw` into `target` according to `mode`.
    pub async fn submit(&self, target: &Sequence, raw: &str, mode: Mode, prompting: &Prompting) -> Submission {
        let input = raw.trim();
        if input.is_empty() {
            return Submission::Ignored;
        }
        info!(%mode, input_len = input.len(), "router: submission");

        match mode {
            Mode::Text => {
                let entry = Entry::user_text(input);
                target.append(entry.clone());
                Submission::appended(vec![entry])
            }
            Mode::Image => self.generate_image(target, input).await,
            Mode::Url => {
                let directive = format!("{URL_DIRECTIVE_PREFIX}{input}");
                self.ask_assistant(target, &directive, prompting).await
            }
            Mode::Assistant => self.ask_assistant(target, input, prompting).await,
        }
    }

    /// Ask the assistant without recording a user entry, appending only the
    /// reply (or the apology). Used for pane greetings.
    pub async fn prompt_silently(&self, target: &Sequence, message: &str, prompting: &Prompting) -> Submission {
        let message = message.trim();
        if message.is_empty() {
            return Submission::Ignored;
        }
        let history = target.snapshot();
        let context = prompting.context(&history);
        let (reply, failed) = reply_entry(self.complete(&context, message).await);
        target.append(reply.clone());
        Submission::Appended { entries: vec![reply], failed }
    }

    async fn ask_assistant(&self, target: &Sequence, message: &str, prompting: &Prompting) -> Submission {
        let user = Entry::user_text(message);
        let history = target.append_with_history(user.clone());
        let context = prompting.context(&history);

        let (reply, failed) = reply_entry(self.complete(&context, message).await);
        target.append(reply.clone());
        if failed {
            Submission::failed(vec![user, reply])
        } else {
            Submission::appended(vec![user, reply])
        }
    }

    async fn generate_image(&self, target: &Sequence, prompt: &str) -> Submission {
        let user = Entry::user_text(prompt);
        target.append(user.clone());

        let key = self.credentials.get(Provider::Image);
        match self.images.generate(key.as_deref(), prompt).await {
            Ok(url) => {
                let image = Entry::image(Role::Assistant, url);
                target.append(image.clone());
                Submission::appended(vec![user, image])
            }
            Err(e) => {
                warn!(error = %e, "router: image generation failed");
                let error = Entry::assistant_text(format!("{INPUT_FAILURE_PREFIX}{e}"));
                target.append(error.clone());
                Submission::failed(vec![user, error])
            }
        }
    }

    async fn complete(&self, context: &[ChatMessage], message: &str) -> Result<String, ClientError> {
        let key = self.credentials.get(Provider::Llm);
        self.completion
            .complete(key.as_deref(), context, message)
            .await
    }
}

/// Reply entry for a completion result; `true` marks the apology.
fn reply_entry(result: Result<String, ClientError>) -> (Entry, bool) {
    match result {
        Ok(reply) => (Entry::assistant_text(reply), false),
        Err(e) => {
            warn!(error = %e, "router: completion failed");
            (Entry::assistant_text(format!("{ASSISTANT_APOLOGY} ({e})")), true)
        }
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
