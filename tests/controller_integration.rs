//! End-to-end `Controller` behavior against the in-memory `FakeMp` fixture
//! (§8 "Testable properties" / end-to-end scenarios), as opposed to the
//! `#[cfg(test)]` unit tests colocated with each module, which use
//! `src/testutil::NullMp` and never touch a real backend.

mod support;

use std::path::Path;
use std::sync::Arc;

use piper_chat::config::Config;
use piper_chat::controller::{Controller, LinePromptKind};
use piper_chat::mp::ChatAnchor;
use piper_chat::shell::Shell;
use support::FakeMp;

fn new_controller(mp: FakeMp) -> Controller {
    let config = Config::load(Some(Path::new("/nonexistent/piper-chat-test-config.toml")));
    Controller::new(Arc::new(mp), Shell::new("xdg-open".into()), config)
}

#[test]
fn priming_loads_me_and_first_chat_page() {
    let mp = FakeMp::new(
        support::user(1, "Ada"),
        vec![support::chat(100, "Alice", 10), support::chat(101, "Bob", 20)],
    );
    let mut controller = new_controller(mp);

    let me = controller.mp.get_me().wait().unwrap();
    controller.model.users.set_me(me);
    controller.model.chats.load_next(controller.mp.as_ref());

    assert_eq!(controller.model.users.me().unwrap().first_name, "Ada");
    // Highest order sorts first.
    assert_eq!(controller.model.chats.active.iter().map(|c| c.id).collect::<Vec<_>>(), vec![101, 100]);
}

#[test]
fn next_chat_then_prev_chat_round_trips_the_selection() {
    let mp = FakeMp::new(
        support::user(1, "Ada"),
        vec![support::chat(100, "Alice", 10), support::chat(101, "Bob", 20)],
    );
    let mut controller = new_controller(mp);
    controller.model.chats.load_next(controller.mp.as_ref());
    assert_eq!(controller.model.current_chat_index, 0);

    controller.handle_char('j');
    assert_eq!(controller.model.current_chat_id(), Some(100));

    controller.handle_char('k');
    assert_eq!(controller.model.current_chat_id(), Some(101));
}

#[test]
fn write_new_message_round_trips_through_the_fake_backend() {
    let mp = FakeMp::new(support::user(1, "Ada"), vec![support::chat(100, "Alice", 10)]);
    let mut controller = new_controller(mp);
    controller.model.chats.load_next(controller.mp.as_ref());
    controller.model.users.set_me(support::user(1, "Ada"));

    // Enter message mode ("l"), open the write-new prompt ("i"), type, commit.
    controller.handle_char('l');
    controller.handle_char('i');
    assert!(matches!(
        controller.prompt,
        Some(piper_chat::controller::ActivePrompt::Line { kind: LinePromptKind::WriteNew, .. })
    ));
    for ch in "hello there".chars() {
        controller.handle_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Char(ch),
            crossterm::event::KeyModifiers::NONE,
        ));
    }
    controller.handle_key(crossterm::event::KeyEvent::new(
        crossterm::event::KeyCode::Enter,
        crossterm::event::KeyModifiers::NONE,
    ));

    assert!(controller.prompt.is_none());
    let chat_id = 100;
    let ids = controller.model.msgs.index(chat_id);
    assert_eq!(ids.len(), 1);
    let msg = controller.model.msgs.get(chat_id, ids[0]).unwrap();
    match &msg.content {
        piper_chat::mp::types::MessageContent::Text { text } => assert_eq!(text.text, "hello there"),
        other => panic!("expected text content, got {other:?}"),
    }
}

#[test]
fn toggle_mute_flips_notification_settings_on_the_backend() {
    let mp = FakeMp::new(support::user(1, "Ada"), vec![support::chat(100, "Alice", 10)]);
    let mut controller = new_controller(mp);
    controller.model.chats.load_next(controller.mp.as_ref());

    controller.handle_char('m');
    assert!(
        controller
            .model
            .chats
            .get(100)
            .and_then(|c| c.notification_settings.as_ref())
            .map(|s| s.mute_for != 0)
            .unwrap_or(false)
            || controller.status.is_some(),
        "toggle_mute should either mute the chat or report why it couldn't"
    );
}

#[test]
fn delete_chat_history_update_is_reflected_after_confirm() {
    let mp = FakeMp::new(support::user(1, "Ada"), vec![support::chat(100, "Alice", 10)]);
    let mut controller = new_controller(mp);
    controller.model.chats.load_next(controller.mp.as_ref());
    assert_eq!(controller.model.chats.active.len(), 1);

    controller.handle_char('d');
    controller.handle_char('d');
    assert!(matches!(controller.prompt, Some(piper_chat::controller::ActivePrompt::Confirm { .. })));

    // Private chats route through a second "revoke for both sides?"
    // confirmation before the history is actually deleted.
    controller.handle_key(crossterm::event::KeyEvent::new(
        crossterm::event::KeyCode::Char('y'),
        crossterm::event::KeyModifiers::NONE,
    ));
    assert!(matches!(controller.prompt, Some(piper_chat::controller::ActivePrompt::Confirm { .. })));

    controller.handle_key(crossterm::event::KeyEvent::new(
        crossterm::event::KeyCode::Char('y'),
        crossterm::event::KeyModifiers::NONE,
    ));

    assert!(controller.prompt.is_none());
    assert!(controller.status.as_ref().is_some_and(|(_, text)| text.contains("deleted")));
}

#[test]
fn push_update_handlers_apply_a_new_message_to_the_model() {
    use serde_json::json;

    let mp = FakeMp::new(support::user(1, "Ada"), vec![support::chat(100, "Alice", 10)]);
    let mut controller = new_controller(mp);
    controller.model.chats.load_next(controller.mp.as_ref());
    controller.model.users.set_me(support::user(1, "Ada"));

    let handlers = piper_chat::updates::handlers();
    let new_message = handlers
        .iter()
        .find(|(kind, _)| *kind == "updateNewMessage")
        .map(|(_, f)| *f)
        .expect("updateNewMessage handler must be registered");

    new_message(
        &mut controller,
        json!({
            "chat_id": 100,
            "message": {
                "id": 55,
                "chat_id": 100,
                "sender_id": 2,
                "date": 55,
                "content": {"@type": "messageText", "text": {"text": "hi"}},
            }
        }),
    );

    assert_eq!(controller.model.msgs.index(100), &[55]);
}

#[allow(dead_code)]
fn chat_anchor_is_exercised_by_the_fixture(_a: ChatAnchor) {}
