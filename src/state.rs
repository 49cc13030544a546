//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! plays the part of the workspace: it owns the whiteboard, the credential
//! store, the live panes and the outbound client seams. The whiteboard is the
//! only state shared between panes; each pane gets it as an insertion sink.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::WorkspaceConfig;
use crate::credentials::CredentialStore;
use crate::document::{Document, EntrySink};
use crate::entry::{Entry, Mode};
use crate::llm::{ChatCompletion, ClientError, CompletionClient, ImageClient, ImageGeneration};
use crate::services::lookup::{LookupClient, PropertyLookup};
use crate::services::pane::{ForwardPolicy, Pane, PaneError, PaneKind};
use crate::services::publish::{LinkPublisher, Publisher};
use crate::services::router::{InputRouter, Submission};

/// Outbound seams the workspace talks through.
pub struct Clients {
    pub completion: Arc<dyn ChatCompletion>,
    pub images: Arc<dyn ImageGeneration>,
    pub publisher: Arc<dyn Publisher>,
    pub lookup: Arc<dyn PropertyLookup>,
}

/// Shared application state. Clone is required by Axum; every field is
/// `Arc`-backed.
#[derive(Clone)]
pub struct AppState {
    pub document: Document,
    pub credentials: CredentialStore,
    pub router: InputRouter,
    pub panes: Arc<RwLock<HashMap<Uuid, Arc<Pane>>>>,
    /// The whiteboard's own input bar; submissions land in the document.
    pub whiteboard_input: Arc<Pane>,
    pub publisher: Arc<dyn Publisher>,
    pub lookup: Arc<dyn PropertyLookup>,
}

impl AppState {
    #[must_use]
    pub fn new(clients: Clients, credentials: CredentialStore) -> Self {
        let document = Document::new();
        let router = InputRouter::new(clients.completion, clients.images, credentials.clone());
        let whiteboard_input = Arc::new(Pane::with_transcript(
            PaneKind::Whiteboard,
            document.sequence().clone(),
            router.clone(),
            None,
        ));
        Self {
            document,
            credentials,
            router,
            panes: Arc::new(RwLock::new(HashMap::new())),
            whiteboard_input,
            publisher: clients.publisher,
            lookup: clients.lookup,
        }
    }

    /// Build the real provider clients from config and preload any
    /// credentials supplied through the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if an HTTP client fails to build.
    pub fn from_config(config: &WorkspaceConfig) -> Result<Self, ClientError> {
        let completion = CompletionClient::new(config.completion.clone(), config.timeouts)?;
        info!(model = completion.model(), "completion client ready");
        let clients = Clients {
            completion: Arc::new(completion),
            images: Arc::new(ImageClient::new(config.image.clone(), config.timeouts)?),
            publisher: Arc::new(LinkPublisher::new(config.publish.clone())),
            lookup: Arc::new(LookupClient::new(config.lookup.clone(), config.timeouts)?),
        };
        let credentials = CredentialStore::new();
        for (provider, key) in &config.credentials {
            credentials.set(*provider, key.clone());
            info!(%provider, "credential preloaded from environment");
        }
        Ok(Self::new(clients, credentials))
    }

    /// Whiteboard entries as first observed; seeds the greeting once.
    #[must_use]
    pub fn observe_document(&self) -> Vec<Entry> {
        self.document.seed_if_empty();
        self.document.snapshot()
    }

    /// Route a submission straight at the whiteboard.
    ///
    /// # Errors
    ///
    /// Returns [`PaneError::Busy`] while an earlier whiteboard submission is
    /// still resolving.
    pub async fn submit_to_document(&self, raw: &str, mode: Mode) -> Result<Submission, PaneError> {
        self.whiteboard_input.submit(raw, mode).await
    }

    /// Mount a fresh pane. Panes with a greeting send it in the background.
    /// `forward` replaces the kind's default forwarding when given.
    ///
    /// # Errors
    ///
    /// Returns [`PaneError::NotMountable`] for the whiteboard's own input bar.
    pub async fn mount_pane(&self, kind: PaneKind, forward: Option<ForwardPolicy>) -> Result<Arc<Pane>, PaneError> {
        if kind == PaneKind::Whiteboard {
            return Err(PaneError::NotMountable(kind));
        }
        let sink: Arc<dyn EntrySink> = Arc::new(self.document.clone());
        let mut pane = Pane::new(kind, self.router.clone(), Some(sink));
        if let Some(forward) = forward {
            pane = pane.with_forward(forward);
        }
        let pane = Arc::new(pane);
        self.panes.write().await.insert(pane.id(), pane.clone());
        info!(pane_id = %pane.id(), %kind, forward = ?pane.profile().forward, "pane mounted");

        if pane.profile().greeting.is_some() {
            let greeter = pane.clone();
            tokio::spawn(async move {
                if let Err(e) = greeter.greet().await {
                    warn!(pane_id = %greeter.id(), error = %e, "pane greeting skipped");
                }
            });
        }
        Ok(pane)
    }

    /// Drop a pane and its transcript. Returns `false` if it was not mounted.
    pub async fn unmount_pane(&self, id: Uuid) -> bool {
        let removed = self.panes.write().await.remove(&id).is_some();
        if removed {
            info!(pane_id = %id, "pane unmounted");
        }
        removed
    }

    pub async fn pane(&self, id: Uuid) -> Option<Arc<Pane>> {
        self.panes.read().await.get(&id).cloned()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
