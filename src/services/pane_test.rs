use super::*;
use crate::credentials::Provider;
use crate::document::Document;
use crate::services::router::ASSISTANT_APOLOGY;
use crate::services::test_support::{MockCompletion, MockImages, router_with};
use std::time::Duration;

fn pane_over(kind: PaneKind, completion: MockCompletion, document: &Document) -> Pane {
    let (router, creds) = router_with(completion, MockImages::returning(&[]));
    creds.set(Provider::Llm, "gsk");
    Pane::new(kind, router, Some(Arc::new(document.clone())))
}

// =========================================================================
// state machine
// =========================================================================

#[tokio::test]
async fn submit_resolves_and_returns_to_idle() {
    let doc = Document::new();
    let pane = pane_over(PaneKind::Assistant, MockCompletion::replying(&["hello"]), &doc);
    assert_eq!(pane.state(), PaneState::Idle);
    assert!(pane.last_resolution().is_none());

    let outcome = pane.submit("hi", Mode::Assistant).await.unwrap();

    assert_eq!(pane.state(), PaneState::Idle);
    assert_eq!(pane.last_resolution(), Some(Resolution::Resolved));
    assert_eq!(outcome.entries().len(), 2);
    assert_eq!(pane.transcript(), vec![Entry::user_text("hi"), Entry::assistant_text("hello")]);
}

#[tokio::test]
async fn failure_returns_to_idle_with_error_entry() {
    let doc = Document::new();
    let pane = pane_over(PaneKind::Assistant, MockCompletion::failing("boom"), &doc);

    let outcome = pane.submit("hi", Mode::Assistant).await.unwrap();

    assert!(outcome.is_failed());
    assert_eq!(pane.state(), PaneState::Idle);
    assert_eq!(pane.last_resolution(), Some(Resolution::Failed));
    let transcript = pane.transcript();
    assert_eq!(transcript.len(), 2);
    assert!(transcript[1].content.starts_with(ASSISTANT_APOLOGY));
}

#[tokio::test]
async fn blank_submit_is_ignored_without_state_change() {
    let doc = Document::new();
    let completion = MockCompletion::replying(&[]);
    let pane = pane_over(PaneKind::Assistant, completion.clone(), &doc);

    let outcome = pane.submit("   ", Mode::Assistant).await.unwrap();

    assert_eq!(outcome, Submission::Ignored);
    assert!(pane.transcript().is_empty());
    assert!(pane.last_resolution().is_none());
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn submission_while_submitting_is_rejected() {
    let doc = Document::new();
    let (completion, gate) = MockCompletion::gated(&["slow reply"]);
    let pane = Arc::new(pane_over(PaneKind::Assistant, completion.clone(), &doc));

    let first = {
        let pane = pane.clone();
        tokio::spawn(async move { pane.submit("first", Mode::Assistant).await })
    };
    while completion.call_count() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(pane.state(), PaneState::Submitting);

    let second = pane.submit("second", Mode::Assistant).await;
    assert!(matches!(second, Err(PaneError::Busy)));

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert!(!first.is_failed());
    assert_eq!(pane.state(), PaneState::Idle);
    assert_eq!(pane.transcript().len(), 2);
    assert_eq!(completion.call_count(), 1);
}

#[tokio::test]
async fn dropped_caller_still_completes_the_turn() {
    let doc = Document::new();
    let (completion, gate) = MockCompletion::gated(&["late reply"]);
    let pane = pane_over(PaneKind::Remix, completion.clone(), &doc);

    let timed_out = tokio::time::timeout(Duration::from_millis(20), pane.submit("hi", Mode::Assistant)).await;
    assert!(timed_out.is_err());
    assert_eq!(pane.transcript(), vec![Entry::user_text("hi")]);
    assert_eq!(pane.state(), PaneState::Submitting);
    assert!(matches!(pane.submit("again", Mode::Assistant).await, Err(PaneError::Busy)));

    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(1), async {
        while pane.state() == PaneState::Submitting {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    assert_eq!(pane.transcript(), vec![Entry::user_text("hi"), Entry::assistant_text("late reply")]);
    assert_eq!(pane.last_resolution(), Some(Resolution::Resolved));
    assert_eq!(doc.snapshot(), vec![Entry::assistant_text("late reply")]);
    assert_eq!(completion.call_count(), 1);
}

// =========================================================================
// forwarding
// =========================================================================

#[tokio::test]
async fn assistant_pane_does_not_forward_automatically() {
    let doc = Document::new();
    let pane = pane_over(PaneKind::Assistant, MockCompletion::replying(&["reply"]), &doc);
    pane.submit("hi", Mode::Assistant).await.unwrap();
    assert!(doc.is_empty());
}

#[tokio::test]
async fn remix_pane_forwards_successful_reply_only() {
    let doc = Document::new();
    let pane = pane_over(PaneKind::Remix, MockCompletion::replying(&["better words"]), &doc);

    pane.submit("make this punchier", Mode::Assistant)
        .await
        .unwrap();

    assert_eq!(doc.snapshot(), vec![Entry::assistant_text("better words")]);
}

#[tokio::test]
async fn remix_pane_keeps_failures_out_of_whiteboard() {
    let doc = Document::new();
    let pane = pane_over(PaneKind::Remix, MockCompletion::failing("down"), &doc);

    pane.submit("remix", Mode::Assistant).await.unwrap();

    assert!(doc.is_empty());
    assert_eq!(pane.transcript().len(), 2);
}

#[tokio::test]
async fn both_policy_forwards_user_then_reply() {
    let doc = Document::new();
    let pane = pane_over(PaneKind::Assistant, MockCompletion::replying(&["answer"]), &doc)
        .with_forward(ForwardPolicy::Both);

    pane.submit("question", Mode::Assistant)
        .await
        .unwrap();

    assert_eq!(doc.snapshot(), vec![Entry::user_text("question"), Entry::assistant_text("answer")]);
}

#[tokio::test]
async fn user_policy_forwards_text_submissions() {
    let doc = Document::new();
    let pane =
        pane_over(PaneKind::Assistant, MockCompletion::replying(&[]), &doc).with_forward(ForwardPolicy::User);

    pane.submit("note", Mode::Text).await.unwrap();

    assert_eq!(doc.snapshot(), vec![Entry::user_text("note")]);
}

#[tokio::test]
async fn send_to_document_copies_transcript_entry() {
    let doc = Document::new();
    let pane = pane_over(PaneKind::Assistant, MockCompletion::replying(&["keep me"]), &doc);
    pane.submit("hi", Mode::Assistant).await.unwrap();

    let sent = pane.send_to_document(1).unwrap();

    assert_eq!(sent, Entry::assistant_text("keep me"));
    assert_eq!(doc.snapshot(), vec![Entry::assistant_text("keep me")]);
    assert_eq!(pane.transcript().len(), 2);
}

#[tokio::test]
async fn send_to_document_out_of_range_errors() {
    let doc = Document::new();
    let pane = pane_over(PaneKind::Assistant, MockCompletion::replying(&[]), &doc);
    assert!(matches!(
        pane.send_to_document(3),
        Err(PaneError::Position(DocumentError::OutOfRange { position: 3, len: 0 }))
    ));
}

#[test]
fn send_to_document_without_sink_errors() {
    let (router, _) = router_with(MockCompletion::replying(&[]), MockImages::returning(&[]));
    let pane = Pane::new(PaneKind::Tool, router, None);
    assert!(matches!(pane.send_to_document(0), Err(PaneError::NoSink)));
}

// =========================================================================
// greeting
// =========================================================================

#[tokio::test]
async fn tool_pane_greets_without_user_entry() {
    let doc = Document::new();
    let completion = MockCompletion::replying(&["Hi! Ask me anything."]);
    let pane = pane_over(PaneKind::Tool, completion.clone(), &doc);

    pane.greet().await.unwrap();

    assert_eq!(pane.transcript(), vec![Entry::assistant_text("Hi! Ask me anything.")]);
    let (history, message) = completion.last_call().unwrap();
    assert!(history.is_empty());
    assert_eq!(message, TOOL_GREETING);
}

#[tokio::test]
async fn assistant_pane_has_no_greeting() {
    let doc = Document::new();
    let completion = MockCompletion::replying(&[]);
    let pane = pane_over(PaneKind::Assistant, completion.clone(), &doc);
    assert_eq!(pane.greet().await.unwrap(), Submission::Ignored);
    assert_eq!(completion.call_count(), 0);
}

// =========================================================================
// concurrency
// =========================================================================

#[tokio::test]
async fn two_panes_resolving_together_both_land_in_whiteboard() {
    let doc = Document::new();
    doc.seed_if_empty();
    let initial = doc.len();

    let a = pane_over(PaneKind::Remix, MockCompletion::delayed(&["from a"], Duration::from_millis(10)), &doc)
        .with_forward(ForwardPolicy::Both);
    let b = pane_over(PaneKind::Remix, MockCompletion::delayed(&["from b"], Duration::from_millis(10)), &doc)
        .with_forward(ForwardPolicy::Both);

    let (ra, rb) = futures::join!(a.submit("ask a", Mode::Assistant), b.submit("ask b", Mode::Assistant));
    ra.unwrap();
    rb.unwrap();

    let entries = doc.snapshot();
    assert_eq!(entries.len(), initial + 4);
    for content in ["ask a", "from a", "ask b", "from b"] {
        assert!(entries.iter().any(|e| e.content == content), "missing {content}");
    }
    assert_eq!(entries[0].content, "Hello World!");
}

#[tokio::test]
async fn panes_do_not_block_each_other() {
    let doc = Document::new();
    let (slow, gate) = MockCompletion::gated(&["slow"]);
    let slow_pane = Arc::new(pane_over(PaneKind::Assistant, slow.clone(), &doc));
    let fast_pane = pane_over(PaneKind::Assistant, MockCompletion::replying(&["fast"]), &doc);

    let pending = {
        let pane = slow_pane.clone();
        tokio::spawn(async move { pane.submit("wait", Mode::Assistant).await })
    };
    while slow.call_count() == 0 {
        tokio::task::yield_now().await;
    }

    let fast = fast_pane.submit("go", Mode::Assistant).await.unwrap();
    assert_eq!(fast.reply(), Some(&Entry::assistant_text("fast")));
    assert_eq!(slow_pane.state(), PaneState::Submitting);

    gate.notify_one();
    pending.await.unwrap().unwrap();
    assert_eq!(slow_pane.state(), PaneState::Idle);
}

#[test]
fn pane_kind_display_matches_wire_name() {
    for kind in [PaneKind::Tool, PaneKind::Assistant, PaneKind::Remix, PaneKind::Whiteboard] {
        assert_eq!(serde_json::to_value(kind).unwrap(), serde_json::Value::String(kind.to_string()));
        assert_eq!(serde_json::from_value::<PaneKind>(serde_json::Value::String(kind.to_string())).unwrap(), kind);
    }
    assert!(serde_json::from_str::<PaneKind>("\"sidebar\"").is_err());
}

#[test]
fn profiles_match_pane_flavours() {
    assert_eq!(PaneKind::Remix.profile().forward, ForwardPolicy::Reply);
    assert_eq!(PaneKind::Tool.profile().prompting.context, ContextPolicy::LatestOnly);
    assert_eq!(PaneKind::Assistant.profile().prompting.system.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
    assert!(PaneKind::Whiteboard.profile().greeting.is_none());
}

#[test]
fn pane_errors_carry_codes() {
    use crate::error::ErrorCode;
    assert_eq!(PaneError::Busy.error_code(), "E_PANE_BUSY");
    assert!(PaneError::Busy.retryable());
    let crashed = PaneError::TaskFailed("task panicked".into());
    assert_eq!(crashed.error_code(), "E_PANE_TASK_FAILED");
    assert!(!crashed.retryable());
}
