//! Mock provider clients shared by service and route tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use crate::credentials::{CredentialStore, Provider};
use crate::llm::{ChatCompletion, ChatMessage, ClientError, ImageGeneration};
use crate::services::lookup::{Listing, PropertyLookup};
use crate::services::router::InputRouter;

// =========================================================================
// MockCompletion
// =========================================================================

#[derive(Default)]
struct CompletionInner {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(Option<String>, Vec<ChatMessage>, String)>>,
    require_key: bool,
    fail_with: Option<String>,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
}

/// Scripted chat completion. Clones share call history.
#[derive(Clone, Default)]
pub struct MockCompletion {
    inner: Arc<CompletionInner>,
}

impl MockCompletion {
    fn build(inner: CompletionInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    fn queue(replies: &[&str]) -> Mutex<VecDeque<String>> {
        Mutex::new(replies.iter().map(|r| (*r).to_string()).collect())
    }

    /// Replies in order, then `"done"` once the script runs out.
    pub fn replying(replies: &[&str]) -> Self {
        Self::build(CompletionInner { replies: Self::queue(replies), ..CompletionInner::default() })
    }

    /// Like `replying`, but fails with `MissingCredential` when no key is passed.
    pub fn requiring_key(replies: &[&str]) -> Self {
        Self::build(CompletionInner { replies: Self::queue(replies), require_key: true, ..CompletionInner::default() })
    }

    /// Always fails with a provider error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self::build(CompletionInner { fail_with: Some(message.to_string()), ..CompletionInner::default() })
    }

    /// Each call waits for one `notify_one` on the returned gate before replying.
    pub fn gated(replies: &[&str]) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mock = Self::build(CompletionInner {
            replies: Self::queue(replies),
            gate: Some(gate.clone()),
            ..CompletionInner::default()
        });
        (mock, gate)
    }

    /// Each call sleeps for `delay` before replying.
    pub fn delayed(replies: &[&str], delay: Duration) -> Self {
        Self::build(CompletionInner { replies: Self::queue(replies), delay: Some(delay), ..CompletionInner::default() })
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<Option<String>> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect()
    }

    pub fn last_call(&self) -> Option<(Vec<ChatMessage>, String)> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, history, message)| (history.clone(), message.clone()))
    }
}

#[async_trait::async_trait]
impl ChatCompletion for MockCompletion {
    async fn complete(
        &self,
        api_key: Option<&str>,
        history: &[ChatMessage],
        new_message: &str,
    ) -> Result<String, ClientError> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .push((api_key.map(str::to_owned), history.to_vec(), new_message.to_string()));

        if let Some(gate) = &self.inner.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.inner.delay {
            tokio::time::sleep(delay).await;
        }
        if self.inner.require_key && api_key.is_none() {
            return Err(ClientError::MissingCredential { provider: Provider::Llm });
        }
        if let Some(message) = &self.inner.fail_with {
            return Err(ClientError::Provider { status: Some(503), message: message.clone() });
        }
        let reply = self.inner.replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or_else(|| "done".to_string()))
    }
}

// =========================================================================
// MockImages
// =========================================================================

#[derive(Default)]
struct ImagesInner {
    urls: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    require_key: bool,
}

#[derive(Clone, Default)]
pub struct MockImages {
    inner: Arc<ImagesInner>,
}

impl MockImages {
    pub fn returning(urls: &[&str]) -> Self {
        let urls = urls.iter().map(|u| (*u).to_string()).collect();
        Self { inner: Arc::new(ImagesInner { urls: Mutex::new(urls), ..ImagesInner::default() }) }
    }

    pub fn requiring_key() -> Self {
        Self { inner: Arc::new(ImagesInner { require_key: true, ..ImagesInner::default() }) }
    }

    pub fn call_count(&self) -> usize {
        self.inner.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.inner.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageGeneration for MockImages {
    async fn generate(&self, api_key: Option<&str>, prompt: &str) -> Result<String, ClientError> {
        self.inner
            .prompts
            .lock()
            .unwrap()
            .push(prompt.to_string());
        if self.inner.require_key && api_key.is_none() {
            return Err(ClientError::MissingCredential { provider: Provider::Image });
        }
        self.inner
            .urls
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::UnexpectedResponse("mock: no image scripted".into()))
    }
}

// =========================================================================
// MockLookup
// =========================================================================

#[derive(Default)]
struct LookupInner {
    listing: Option<Listing>,
    ids: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct MockLookup {
    inner: Arc<LookupInner>,
}

impl MockLookup {
    pub fn returning(listing: Listing) -> Self {
        Self { inner: Arc::new(LookupInner { listing: Some(listing), ..LookupInner::default() }) }
    }

    /// Every lookup fails as if the search came back empty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> Vec<String> {
        self.inner.ids.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PropertyLookup for MockLookup {
    async fn lookup(&self, api_key: Option<&str>, mls_id: &str) -> Result<Listing, ClientError> {
        if api_key.is_none() {
            return Err(ClientError::MissingCredential { provider: Provider::Lookup });
        }
        self.inner.ids.lock().unwrap().push(mls_id.to_string());
        self.inner
            .listing
            .clone()
            .ok_or_else(|| ClientError::UnexpectedResponse("property lookup: no properties found".into()))
    }
}

/// A listing with every field filled.
pub fn sample_listing() -> Listing {
    Listing {
        title: "123 St, Austin, TX".into(),
        price: "$1,234,567".into(),
        description: "Bright corner lot.".into(),
        image_url: Some("https://img.test/house.jpg".into()),
    }
}

/// Router over the given mocks plus the credential store it reads.
pub fn router_with(completion: MockCompletion, images: MockImages) -> (InputRouter, CredentialStore) {
    let credentials = CredentialStore::new();
    let router = InputRouter::new(Arc::new(completion), Arc::new(images), credentials.clone());
    (router, credentials)
}
