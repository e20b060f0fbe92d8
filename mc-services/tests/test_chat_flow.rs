//! End-to-end chat flow through a started application.
//!
//! Tests the auth overlay rule, sending messages as the signed-in account,
//! reading the log back in order, and the events the sync context forwards.

mod common;

use mc_core::error::McError;
use mc_models::{CoId, Resolved};
use mc_services::{should_show_auth_overlay, AppEvent, AppRoot, AuthStateKind};

async fn started_app() -> AppRoot {
    let mut app = common::create_test_app(common::hosted_env());
    app.start().await.unwrap();
    app
}

fn texts(entries: Vec<Resolved>) -> Vec<String> {
    entries
        .into_iter()
        .map(|r| r.into_loaded().expect("every entry is loaded locally").text)
        .collect()
}

// ---- Auth overlay ----

#[tokio::test]
async fn overlay_shown_until_signed_in() {
    let app = started_app().await;
    let auth = app.auth();

    let state = auth.read().await.current();
    assert_eq!(state.state, AuthStateKind::Ready);
    assert!(should_show_auth_overlay(&state));

    auth.write().await.sign_up("alice").await.unwrap();
    let state = auth.read().await.current();
    assert_eq!(state.state, AuthStateKind::SignedIn);
    assert!(!should_show_auth_overlay(&state));

    auth.write().await.log_out().await.unwrap();
    assert!(should_show_auth_overlay(&auth.read().await.current()));
}

#[tokio::test]
async fn auth_changes_are_published() {
    let app = started_app().await;
    let mut rx = app.event_bus().subscribe();

    app.auth().write().await.sign_up("bob").await.unwrap();

    let event = common::next_event(&mut rx, |e| matches!(e, AppEvent::AuthStateChanged { .. })).await;
    assert_eq!(
        event,
        AppEvent::AuthStateChanged {
            state: AuthStateKind::SignedIn,
            username: Some("bob".into()),
        }
    );
}

// ---- Sending and reading ----

#[tokio::test]
async fn messages_read_back_in_append_order() {
    let app = started_app().await;
    app.auth().write().await.sign_up("alice").await.unwrap();
    let chats = app.chats().read().await;

    let chat = chats.create_chat().await.unwrap();
    let sent = ["hello", "how are you?", "", "  spaced  "];
    for text in sent {
        chats.send(&chat.id, text).await.unwrap();
    }

    assert_eq!(texts(chats.history(&chat.id).await.unwrap()), sent);
    let first = chats.history(&chat.id).await.unwrap().remove(0);
    assert_eq!(first.as_loaded().map(|m| m.text.as_str()), Some("hello"));
}

#[tokio::test]
async fn send_without_account_is_rejected() {
    let app = started_app().await;
    let chats = app.chats().read().await;
    let chat = chats.create_chat().await.unwrap();

    let err = chats.send(&chat.id, "anyone?").await.unwrap_err();
    assert!(matches!(err, McError::NotSignedIn));
    assert!(chats.history(&chat.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn send_to_unknown_chat_fails() {
    let app = started_app().await;
    app.auth().write().await.sign_up("alice").await.unwrap();
    let chats = app.chats().read().await;

    let err = chats.send(&CoId::new(), "lost").await.unwrap_err();
    assert!(matches!(err, McError::ChatNotFound(_)));
}

#[tokio::test]
async fn appended_messages_are_forwarded_with_index() {
    let app = started_app().await;
    app.auth().write().await.sign_up("alice").await.unwrap();
    let mut rx = app.event_bus().subscribe();
    let chats = app.chats().read().await;

    let chat = chats.create_chat().await.unwrap();
    let first = chats.send(&chat.id, "one").await.unwrap();
    let second = chats.send(&chat.id, "two").await.unwrap();

    let event = common::next_event(&mut rx, |e| matches!(e, AppEvent::ChatCreated { .. })).await;
    assert_eq!(event, AppEvent::ChatCreated { chat_id: chat.id.clone() });

    for (index, message) in [first, second].into_iter().enumerate() {
        let event =
            common::next_event(&mut rx, |e| matches!(e, AppEvent::MessageAppended { .. })).await;
        assert_eq!(
            event,
            AppEvent::MessageAppended {
                chat_id: chat.id.clone(),
                message_id: message.id,
                index,
            }
        );
    }
}

#[tokio::test]
async fn chat_is_unusable_after_shutdown() {
    let mut app = started_app().await;
    app.auth().write().await.sign_up("alice").await.unwrap();
    let chat = app.chats().read().await.create_chat().await.unwrap();

    app.shutdown().await.unwrap();

    let err = app.chats().read().await.open(&chat.id).await.unwrap_err();
    assert!(matches!(err, McError::InvalidState(_)));
}
