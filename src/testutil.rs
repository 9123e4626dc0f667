//! Minimal `MessagingProvider` double shared by unit tests and integration
//! tests (§8 "testability"). `NullMp` answers every request with
//! `BackendRequestFailed`, which is what command implementations need to
//! exercise their permission/guard logic without a live backend; tests
//! that need real data build a richer fake in `tests/` instead.

use crate::mp::*;

pub struct NullMp;

fn unimplemented<T>() -> AsyncResult<T> {
    AsyncResult::from_error("NullMp has no backend")
}

impl MessagingProvider for NullMp {
    fn login(&self) -> AsyncResult<()> {
        unimplemented()
    }
    fn logout(&self) -> AsyncResult<()> {
        unimplemented()
    }
    fn get_chats(&self, _anchor: ChatAnchor, _limit: i32) -> AsyncResult<Vec<i64>> {
        unimplemented()
    }
    fn get_chat(&self, _id: i64) -> AsyncResult<Chat> {
        unimplemented()
    }
    fn toggle_chat_is_marked_as_unread(&self, _id: i64, _marked: bool) -> AsyncResult<()> {
        unimplemented()
    }
    fn toggle_chat_is_pinned(&self, _id: i64, _pinned: bool) -> AsyncResult<()> {
        unimplemented()
    }
    fn set_chat_notification_settings(&self, _id: i64, _settings: ChatNotificationSettings) -> AsyncResult<()> {
        unimplemented()
    }
    fn view_messages(&self, _chat_id: i64, _msg_ids: Vec<i64>, _force_read: bool) -> AsyncResult<()> {
        unimplemented()
    }
    fn leave_chat(&self, _id: i64) -> AsyncResult<()> {
        unimplemented()
    }
    fn join_chat(&self, _id: i64) -> AsyncResult<()> {
        unimplemented()
    }
    fn create_new_secret_chat(&self, _user_id: i64) -> AsyncResult<Chat> {
        unimplemented()
    }
    fn create_new_basic_group_chat(&self, _user_ids: Vec<i64>, _title: String) -> AsyncResult<Chat> {
        unimplemented()
    }
    fn close_secret_chat(&self, _id: i64) -> AsyncResult<()> {
        unimplemented()
    }
    fn delete_chat_history(&self, _id: i64, _remove_from_list: bool, _revoke: bool) -> AsyncResult<()> {
        unimplemented()
    }
    fn search_contacts(&self, _query: String, _limit: i32) -> AsyncResult<Vec<i64>> {
        unimplemented()
    }
    fn get_chat_history(&self, _chat_id: i64, _from_message_id: i64, _limit: i32) -> AsyncResult<Vec<Message>> {
        unimplemented()
    }
    fn get_message(&self, _chat_id: i64, _msg_id: i64) -> AsyncResult<Message> {
        unimplemented()
    }
    fn send_message(&self, _chat_id: i64, _text: String) -> AsyncResult<Message> {
        unimplemented()
    }
    fn reply_message(&self, _chat_id: i64, _reply_to: i64, _text: String) -> AsyncResult<Message> {
        unimplemented()
    }
    fn edit_message_text(&self, _chat_id: i64, _msg_id: i64, _text: String) -> AsyncResult<()> {
        unimplemented()
    }
    fn delete_messages(&self, _chat_id: i64, _ids: Vec<i64>, _revoke: bool) -> AsyncResult<()> {
        unimplemented()
    }
    fn forward_messages(&self, _to_chat_id: i64, _from_chat_id: i64, _ids: Vec<i64>) -> AsyncResult<()> {
        unimplemented()
    }
    fn open_message_content(&self, _chat_id: i64, _msg_id: i64) -> AsyncResult<()> {
        unimplemented()
    }
    fn send_chat_action(&self, _chat_id: i64, _action: ChatAction) -> AsyncResult<()> {
        unimplemented()
    }
    fn send_doc(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<Message> {
        unimplemented()
    }
    fn send_audio(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<Message> {
        unimplemented()
    }
    fn send_photo(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<Message> {
        unimplemented()
    }
    fn send_video(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<Message> {
        unimplemented()
    }
    fn send_voice(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<Message> {
        unimplemented()
    }
    fn send_animation(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<Message> {
        unimplemented()
    }
    fn get_me(&self) -> AsyncResult<User> {
        unimplemented()
    }
    fn get_user(&self, _id: i64) -> AsyncResult<User> {
        unimplemented()
    }
    fn get_user_full_info(&self, _id: i64) -> AsyncResult<User> {
        unimplemented()
    }
    fn get_contacts(&self) -> AsyncResult<Vec<i64>> {
        unimplemented()
    }
    fn get_basic_group(&self, _id: i64) -> AsyncResult<BasicGroup> {
        unimplemented()
    }
    fn get_basic_group_full_info(&self, _id: i64) -> AsyncResult<BasicGroup> {
        unimplemented()
    }
    fn get_supergroup(&self, _id: i64) -> AsyncResult<Supergroup> {
        unimplemented()
    }
    fn get_supergroup_full_info(&self, _id: i64) -> AsyncResult<Supergroup> {
        unimplemented()
    }
    fn get_secret_chat(&self, _id: i64) -> AsyncResult<Chat> {
        unimplemented()
    }
    fn download_file(&self, _file_id: i64, _priority: i32, _offset: i64, _limit: i64, _synchronous: bool) -> AsyncResult<()> {
        unimplemented()
    }
    fn add_update_handler(&self, _kind: &'static str, _handler: Box<dyn Fn(serde_json::Value) + Send>) {}
}
