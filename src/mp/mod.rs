//! The **MP** (Messaging Provider) interface (§6 "External interfaces").
//!
//! Everything below is a trait plus a handle type; no concrete backend
//! binding lives in this crate (TDLib C bindings and the auth flow are
//! explicit Non-goals, §1). The shape is grounded in
//! `telegram.client.Telegram`'s request/`AsyncResult` pairing seen
//! throughout `original_source/tg/*.py` (`result = tg.send_message(...);
//! result.wait(); if result.error: ...`): every call returns a handle
//! whose `wait()` blocks the calling thread until the backend responds.

pub mod types;

use std::sync::mpsc;
use std::time::Duration;

pub use types::*;

use crate::error::{AppError, Result};

/// The outcome of one MP request, delivered asynchronously by the backend.
/// `wait()` blocks the caller (any thread may call it, per §5 "Suspension
/// and blocking") until a result arrives.
pub struct AsyncResult<T> {
    rx: mpsc::Receiver<std::result::Result<T, String>>,
}

impl<T> AsyncResult<T> {
    pub fn from_value(value: T) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(Ok(value));
        AsyncResult { rx }
    }

    pub fn from_error(error_info: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(Err(error_info.into()));
        AsyncResult { rx }
    }

    pub fn sender() -> (mpsc::Sender<std::result::Result<T, String>>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, AsyncResult { rx })
    }

    /// Blocks until the backend delivers a result. Mirrors the original's
    /// `AsyncResult.wait()`; a closed channel (backend thread died without
    /// replying) is reported as `BackendRequestFailed`.
    pub fn wait(self) -> Result<T> {
        self.rx
            .recv()
            .map_err(|_| AppError::BackendRequestFailed("no response from backend".into()))?
            .map_err(AppError::BackendRequestFailed)
    }

    /// Same as [`Self::wait`] but gives up after `timeout`, used by tests
    /// so a misbehaving fake never hangs the suite.
    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        self.rx
            .recv_timeout(timeout)
            .map_err(|_| AppError::BackendRequestFailed("timed out waiting for backend".into()))?
            .map_err(AppError::BackendRequestFailed)
    }
}

/// Chat id / order pagination anchor used by [`MessagingProvider::get_chats`]
/// (§4.3 "request the next page ... using the last active chat's `(id,
/// order)` as the pagination anchor").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatAnchor {
    pub offset_chat_id: i64,
    pub offset_order: u64,
}

impl ChatAnchor {
    /// `(0, 2^63 - 1)`, the anchor used for the very first page (§4.3).
    pub fn initial() -> Self {
        ChatAnchor {
            offset_chat_id: 0,
            offset_order: i64::MAX as u64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChatNotificationSettings {
    pub mute_for: i64,
}

/// Variant-specific metadata needed to dispatch a `send_*` file message
/// (§6 "send_doc/audio/photo/video/voice/animation").
#[derive(Debug, Clone, Default)]
pub struct SendFileOptions {
    pub duration: Option<i64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub waveform: Option<Vec<u8>>,
    pub caption: Option<String>,
}

/// The messaging backend interface the core consumes. Object-safe so
/// `Controller` can hold a `Box<dyn MessagingProvider>` — in production
/// that is a TDLib binding, in tests it is `FakeMp` (see `tests/`).
pub trait MessagingProvider: Send {
    fn login(&self) -> AsyncResult<()>;
    fn logout(&self) -> AsyncResult<()>;

    // --- Chats ---
    fn get_chats(&self, anchor: ChatAnchor, limit: i32) -> AsyncResult<Vec<i64>>;
    fn get_chat(&self, id: i64) -> AsyncResult<Chat>;
    fn toggle_chat_is_marked_as_unread(&self, id: i64, marked: bool) -> AsyncResult<()>;
    fn toggle_chat_is_pinned(&self, id: i64, pinned: bool) -> AsyncResult<()>;
    fn set_chat_notification_settings(&self, id: i64, settings: ChatNotificationSettings) -> AsyncResult<()>;
    fn view_messages(&self, chat_id: i64, msg_ids: Vec<i64>, force_read: bool) -> AsyncResult<()>;
    fn leave_chat(&self, id: i64) -> AsyncResult<()>;
    fn join_chat(&self, id: i64) -> AsyncResult<()>;
    fn create_new_secret_chat(&self, user_id: i64) -> AsyncResult<Chat>;
    fn create_new_basic_group_chat(&self, user_ids: Vec<i64>, title: String) -> AsyncResult<Chat>;
    fn close_secret_chat(&self, id: i64) -> AsyncResult<()>;
    fn delete_chat_history(&self, id: i64, remove_from_list: bool, revoke: bool) -> AsyncResult<()>;
    fn search_contacts(&self, query: String, limit: i32) -> AsyncResult<Vec<i64>>;

    // --- Messages ---
    fn get_chat_history(&self, chat_id: i64, from_message_id: i64, limit: i32) -> AsyncResult<Vec<Message>>;
    fn get_message(&self, chat_id: i64, msg_id: i64) -> AsyncResult<Message>;
    fn send_message(&self, chat_id: i64, text: String) -> AsyncResult<Message>;
    fn reply_message(&self, chat_id: i64, reply_to: i64, text: String) -> AsyncResult<Message>;
    fn edit_message_text(&self, chat_id: i64, msg_id: i64, text: String) -> AsyncResult<()>;
    fn delete_messages(&self, chat_id: i64, ids: Vec<i64>, revoke: bool) -> AsyncResult<()>;
    fn forward_messages(&self, to_chat_id: i64, from_chat_id: i64, ids: Vec<i64>) -> AsyncResult<()>;
    fn open_message_content(&self, chat_id: i64, msg_id: i64) -> AsyncResult<()>;
    fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> AsyncResult<()>;
    fn send_doc(&self, chat_id: i64, path: String, opts: SendFileOptions) -> AsyncResult<Message>;
    fn send_audio(&self, chat_id: i64, path: String, opts: SendFileOptions) -> AsyncResult<Message>;
    fn send_photo(&self, chat_id: i64, path: String, opts: SendFileOptions) -> AsyncResult<Message>;
    fn send_video(&self, chat_id: i64, path: String, opts: SendFileOptions) -> AsyncResult<Message>;
    fn send_voice(&self, chat_id: i64, path: String, opts: SendFileOptions) -> AsyncResult<Message>;
    fn send_animation(&self, chat_id: i64, path: String, opts: SendFileOptions) -> AsyncResult<Message>;

    // --- Users ---
    fn get_me(&self) -> AsyncResult<User>;
    fn get_user(&self, id: i64) -> AsyncResult<User>;
    fn get_user_full_info(&self, id: i64) -> AsyncResult<User>;
    fn get_contacts(&self) -> AsyncResult<Vec<i64>>;
    fn get_basic_group(&self, id: i64) -> AsyncResult<BasicGroup>;
    fn get_basic_group_full_info(&self, id: i64) -> AsyncResult<BasicGroup>;
    fn get_supergroup(&self, id: i64) -> AsyncResult<Supergroup>;
    fn get_supergroup_full_info(&self, id: i64) -> AsyncResult<Supergroup>;
    fn get_secret_chat(&self, id: i64) -> AsyncResult<Chat>;

    // --- Files ---
    fn download_file(&self, file_id: i64, priority: i32, offset: i64, limit: i64, synchronous: bool) -> AsyncResult<()>;

    /// Registers a push-update handler. `kind` is the backend's update tag
    /// string (`"updateNewMessage"`, `"updateChatPosition"`, …); the
    /// registry in `updates/mod.rs` looks the callback up by this same key.
    fn add_update_handler(&self, kind: &'static str, handler: Box<dyn Fn(serde_json::Value) + Send>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn async_result_from_value_waits_immediately() {
        let r = AsyncResult::from_value(42);
        assert_eq!(r.wait().unwrap(), 42);
    }

    #[test]
    fn async_result_from_error_propagates() {
        let r: AsyncResult<()> = AsyncResult::from_error("boom");
        let err = r.wait().unwrap_err();
        assert!(matches!(err, AppError::BackendRequestFailed(ref s) if s == "boom"));
    }

    #[test]
    fn chat_anchor_initial_matches_spec_constant() {
        let a = ChatAnchor::initial();
        assert_eq!(a.offset_chat_id, 0);
        assert_eq!(a.offset_order, i64::MAX as u64);
    }
}
