use super::*;
use crate::entry::{Entry, Role};
use crate::services::publish::DEFAULT_DRAFT_TITLE;
use crate::state::test_helpers::replying_state;

#[tokio::test]
async fn draft_renders_current_document() {
    let state = replying_state(&[]);
    state.document.append(Entry::user_text("A"));
    state.document.append(Entry::image(Role::Assistant, "B"));

    let Json(draft) = create_draft(State(state)).await;

    assert_eq!(draft.title, DEFAULT_DRAFT_TITLE);
    assert_eq!(draft.content, "A\n\n![Generated](B)");
}

#[tokio::test]
async fn preview_returns_blocks() {
    let draft = Draft { title: "T".into(), content: "hello\n![Generated](https://img.test/1.png)".into() };
    let Json(response) = preview(Json(draft)).await;
    assert_eq!(response.title, "T");
    assert_eq!(response.blocks.len(), 2);
    assert!(matches!(response.blocks[1], Block::Image { .. }));
}

#[tokio::test]
async fn publish_returns_created_reference() {
    let state = replying_state(&[]);
    let draft = Draft { title: "T".into(), content: "body".into() };
    let (status, Json(published)) = publish(State(state), Json(draft)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert!(published.url.starts_with("https://example.com/published-content-"));
}

#[tokio::test]
async fn publishing_empty_draft_is_unprocessable() {
    let state = replying_state(&[]);
    let draft = Draft { title: "T".into(), content: String::new() };
    let err = publish(State(state), Json(draft)).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.code(), "E_PUBLISH_EMPTY");
}

#[tokio::test]
async fn editing_draft_does_not_touch_document() {
    let state = replying_state(&[]);
    state.document.append(Entry::user_text("keep"));
    let Json(mut draft) = create_draft(State(state.clone())).await;
    draft.content = "changed".into();
    publish(State(state.clone()), Json(draft)).await.unwrap();
    assert_eq!(state.document.snapshot(), vec![Entry::user_text("keep")]);
}
