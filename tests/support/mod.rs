//! `FakeMp` — an in-memory `MessagingProvider` fixture for the integration
//! tests in this directory (§6 "a `FakeMp` test double lives under `tests/`
//! implementing the same trait over an in-memory fixture"). Unlike
//! `src/testutil::NullMp` (which answers every call with an error so unit
//! tests can exercise guard/permission logic), this one actually stores
//! chats/messages/users so a whole command round-trip can be observed.

use std::sync::Mutex;

use piper_chat::mp::types::{Chat, MessageContent, TextContent, User, UserStatus};
use piper_chat::mp::{
    AsyncResult, ChatAnchor, ChatNotificationSettings, MessagingProvider, SendFileOptions,
};

struct State {
    me: User,
    chats: Vec<Chat>,
    messages: Vec<(i64, piper_chat::mp::types::Message)>,
    next_msg_id: i64,
}

pub struct FakeMp(Mutex<State>);

impl FakeMp {
    pub fn new(me: User, chats: Vec<Chat>) -> Self {
        FakeMp(Mutex::new(State {
            me,
            chats,
            messages: Vec::new(),
            next_msg_id: 1000,
        }))
    }

    /// Seeds `chat_id`'s history with a pre-existing message, so
    /// `get_chat_history` has something to page in from the start.
    pub fn seed_message(&self, chat_id: i64, msg: piper_chat::mp::types::Message) {
        self.0.lock().unwrap().messages.push((chat_id, msg));
    }
}

fn text_message(id: i64, chat_id: i64, sender_id: i64, text: &str) -> piper_chat::mp::types::Message {
    piper_chat::mp::types::Message {
        id,
        chat_id,
        sender_id,
        date: id,
        edit_date: 0,
        content: MessageContent::Text {
            text: TextContent { text: text.to_string(), entities: vec![] },
        },
        can_be_edited: true,
        can_be_forwarded: true,
        can_be_deleted_for_all_users: true,
        can_be_deleted_only_for_self: true,
        reply_to_message_id: None,
        sending_state: None,
        raw: serde_json::Value::Null,
    }
}

pub fn user(id: i64, first_name: &str) -> User {
    User {
        id,
        first_name: first_name.to_string(),
        last_name: String::new(),
        username: String::new(),
        phone_number: String::new(),
        is_bot: false,
        status: UserStatus::Empty,
    }
}

pub fn chat(id: i64, title: &str, order: u64) -> Chat {
    Chat {
        id,
        chat_type: piper_chat::mp::types::ChatType::Private { user_id: id },
        title: title.to_string(),
        order,
        is_pinned: false,
        is_marked_as_unread: false,
        unread_count: 0,
        last_message: None,
        notification_settings: None,
        permissions: Default::default(),
        member_count: None,
        raw: serde_json::Value::Null,
    }
}

impl MessagingProvider for FakeMp {
    fn login(&self) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn logout(&self) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn get_chats(&self, anchor: ChatAnchor, limit: i32) -> AsyncResult<Vec<i64>> {
        let state = self.0.lock().unwrap();
        let ids: Vec<i64> = state
            .chats
            .iter()
            .filter(|c| (c.order as i64) <= anchor.offset_order as i64 && c.id != anchor.offset_chat_id)
            .take(limit.max(0) as usize)
            .map(|c| c.id)
            .collect();
        AsyncResult::from_value(ids)
    }

    fn get_chat(&self, id: i64) -> AsyncResult<Chat> {
        let state = self.0.lock().unwrap();
        match state.chats.iter().find(|c| c.id == id) {
            Some(c) => AsyncResult::from_value(c.clone()),
            None => AsyncResult::from_error("unknown chat"),
        }
    }

    fn toggle_chat_is_marked_as_unread(&self, id: i64, marked: bool) -> AsyncResult<()> {
        let mut state = self.0.lock().unwrap();
        if let Some(c) = state.chats.iter_mut().find(|c| c.id == id) {
            c.is_marked_as_unread = marked;
        }
        AsyncResult::from_value(())
    }

    fn toggle_chat_is_pinned(&self, id: i64, pinned: bool) -> AsyncResult<()> {
        let mut state = self.0.lock().unwrap();
        if let Some(c) = state.chats.iter_mut().find(|c| c.id == id) {
            c.is_pinned = pinned;
        }
        AsyncResult::from_value(())
    }

    fn set_chat_notification_settings(&self, id: i64, settings: ChatNotificationSettings) -> AsyncResult<()> {
        let mut state = self.0.lock().unwrap();
        if let Some(c) = state.chats.iter_mut().find(|c| c.id == id) {
            c.notification_settings = Some(piper_chat::mp::types::NotificationSettings { mute_for: settings.mute_for });
        }
        AsyncResult::from_value(())
    }

    fn view_messages(&self, _chat_id: i64, _msg_ids: Vec<i64>, _force_read: bool) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn leave_chat(&self, _id: i64) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn join_chat(&self, _id: i64) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn create_new_secret_chat(&self, _user_id: i64) -> AsyncResult<Chat> {
        AsyncResult::from_error("fixture does not support creating chats")
    }

    fn create_new_basic_group_chat(&self, _user_ids: Vec<i64>, _title: String) -> AsyncResult<Chat> {
        AsyncResult::from_error("fixture does not support creating chats")
    }

    fn close_secret_chat(&self, _id: i64) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn delete_chat_history(&self, id: i64, remove_from_list: bool, _revoke: bool) -> AsyncResult<()> {
        let mut state = self.0.lock().unwrap();
        if remove_from_list {
            state.chats.retain(|c| c.id != id);
        }
        AsyncResult::from_value(())
    }

    fn search_contacts(&self, _query: String, _limit: i32) -> AsyncResult<Vec<i64>> {
        AsyncResult::from_value(Vec::new())
    }

    fn get_chat_history(&self, chat_id: i64, from_message_id: i64, limit: i32) -> AsyncResult<Vec<piper_chat::mp::types::Message>> {
        let state = self.0.lock().unwrap();
        let mut msgs: Vec<_> = state
            .messages
            .iter()
            .filter(|(cid, m)| *cid == chat_id && (from_message_id == 0 || m.id < from_message_id))
            .map(|(_, m)| m.clone())
            .collect();
        msgs.sort_unstable_by(|a, b| b.id.cmp(&a.id));
        msgs.truncate(limit.max(0) as usize);
        AsyncResult::from_value(msgs)
    }

    fn get_message(&self, chat_id: i64, msg_id: i64) -> AsyncResult<piper_chat::mp::types::Message> {
        let state = self.0.lock().unwrap();
        match state.messages.iter().find(|(cid, m)| *cid == chat_id && m.id == msg_id) {
            Some((_, m)) => AsyncResult::from_value(m.clone()),
            None => AsyncResult::from_error("unknown message"),
        }
    }

    fn send_message(&self, chat_id: i64, text: String) -> AsyncResult<piper_chat::mp::types::Message> {
        let mut state = self.0.lock().unwrap();
        let id = state.next_msg_id;
        state.next_msg_id += 1;
        let me_id = state.me.id;
        let msg = text_message(id, chat_id, me_id, &text);
        state.messages.push((chat_id, msg.clone()));
        AsyncResult::from_value(msg)
    }

    fn reply_message(&self, chat_id: i64, reply_to: i64, text: String) -> AsyncResult<piper_chat::mp::types::Message> {
        let mut state = self.0.lock().unwrap();
        let id = state.next_msg_id;
        state.next_msg_id += 1;
        let me_id = state.me.id;
        let mut msg = text_message(id, chat_id, me_id, &text);
        msg.reply_to_message_id = Some(reply_to);
        state.messages.push((chat_id, msg.clone()));
        AsyncResult::from_value(msg)
    }

    fn edit_message_text(&self, chat_id: i64, msg_id: i64, text: String) -> AsyncResult<()> {
        let mut state = self.0.lock().unwrap();
        match state.messages.iter_mut().find(|(cid, m)| *cid == chat_id && m.id == msg_id) {
            Some((_, m)) => {
                m.content = MessageContent::Text { text: TextContent { text, entities: vec![] } };
                m.edit_date = 1;
                AsyncResult::from_value(())
            }
            None => AsyncResult::from_error("unknown message"),
        }
    }

    fn delete_messages(&self, chat_id: i64, ids: Vec<i64>, _revoke: bool) -> AsyncResult<()> {
        let mut state = self.0.lock().unwrap();
        state.messages.retain(|(cid, m)| !(*cid == chat_id && ids.contains(&m.id)));
        AsyncResult::from_value(())
    }

    fn forward_messages(&self, to_chat_id: i64, from_chat_id: i64, ids: Vec<i64>) -> AsyncResult<()> {
        let mut state = self.0.lock().unwrap();
        let mut to_add = Vec::new();
        for (cid, m) in state.messages.iter() {
            if *cid == from_chat_id && ids.contains(&m.id) {
                let id = state.next_msg_id;
                let mut copy = m.clone();
                copy.id = id;
                copy.chat_id = to_chat_id;
                to_add.push((id, copy));
            }
        }
        for (id, copy) in to_add {
            state.next_msg_id = state.next_msg_id.max(id) + 1;
            state.messages.push((to_chat_id, copy));
        }
        AsyncResult::from_value(())
    }

    fn open_message_content(&self, _chat_id: i64, _msg_id: i64) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn send_chat_action(&self, _chat_id: i64, _action: piper_chat::mp::types::ChatAction) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn send_doc(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<piper_chat::mp::types::Message> {
        AsyncResult::from_error("fixture does not support file transfer")
    }

    fn send_audio(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<piper_chat::mp::types::Message> {
        AsyncResult::from_error("fixture does not support file transfer")
    }

    fn send_photo(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<piper_chat::mp::types::Message> {
        AsyncResult::from_error("fixture does not support file transfer")
    }

    fn send_video(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<piper_chat::mp::types::Message> {
        AsyncResult::from_error("fixture does not support file transfer")
    }

    fn send_voice(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<piper_chat::mp::types::Message> {
        AsyncResult::from_error("fixture does not support file transfer")
    }

    fn send_animation(&self, _chat_id: i64, _path: String, _opts: SendFileOptions) -> AsyncResult<piper_chat::mp::types::Message> {
        AsyncResult::from_error("fixture does not support file transfer")
    }

    fn get_me(&self) -> AsyncResult<User> {
        AsyncResult::from_value(self.0.lock().unwrap().me.clone())
    }

    fn get_user(&self, _id: i64) -> AsyncResult<User> {
        AsyncResult::from_error("fixture has no contact directory")
    }

    fn get_user_full_info(&self, _id: i64) -> AsyncResult<User> {
        AsyncResult::from_error("fixture has no contact directory")
    }

    fn get_contacts(&self) -> AsyncResult<Vec<i64>> {
        AsyncResult::from_value(Vec::new())
    }

    fn get_basic_group(&self, _id: i64) -> AsyncResult<piper_chat::mp::types::BasicGroup> {
        AsyncResult::from_error("fixture has no groups")
    }

    fn get_basic_group_full_info(&self, _id: i64) -> AsyncResult<piper_chat::mp::types::BasicGroup> {
        AsyncResult::from_error("fixture has no groups")
    }

    fn get_supergroup(&self, _id: i64) -> AsyncResult<piper_chat::mp::types::Supergroup> {
        AsyncResult::from_error("fixture has no groups")
    }

    fn get_supergroup_full_info(&self, _id: i64) -> AsyncResult<piper_chat::mp::types::Supergroup> {
        AsyncResult::from_error("fixture has no groups")
    }

    fn get_secret_chat(&self, _id: i64) -> AsyncResult<Chat> {
        AsyncResult::from_error("fixture has no secret chats")
    }

    fn download_file(&self, _file_id: i64, _priority: i32, _offset: i64, _limit: i64, _synchronous: bool) -> AsyncResult<()> {
        AsyncResult::from_value(())
    }

    fn add_update_handler(&self, _kind: &'static str, _handler: Box<dyn Fn(serde_json::Value) + Send>) {}
}
