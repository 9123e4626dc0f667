//! `Model` — aggregate of the three stores plus global scalar state (§3
//! "Model scalar state").
//!
//! `Model` exclusively owns `ChatStore`/`MessageStore`/`UserStore` (§3
//! "Ownership"). Everything that isn't per-store state — the selected
//! chat index, in-flight downloads, multi-select, the yank buffer — lives
//! here as flat fields, mirroring the original's single `Model` object
//! that every controller method reaches through.

use std::collections::HashMap;

use crate::mp::types::ConnectionState;
use crate::store::{ChatStore, MessageStore, UserStore};

pub struct Model {
    pub chats: ChatStore,
    pub msgs: MessageStore,
    pub users: UserStore,

    pub current_chat_index: usize,
    /// `file_id → (chat_id, msg_id)`, the auto-download tracking table
    /// (§8 scenario 5).
    pub downloads: HashMap<i64, (i64, i64)>,
    /// `chat_id → ordered list of msg_id`, multi-select state per chat.
    pub selected: HashMap<i64, Vec<i64>>,
    /// Yanked selection, carried across chats for forward/paste.
    pub copied_msgs: Option<(i64, Vec<i64>)>,
    pub chat_list_title: String,
    pub connection_state: ConnectionState,
}

impl Default for Model {
    fn default() -> Self {
        Model::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Model {
            chats: ChatStore::new(),
            msgs: MessageStore::new(),
            users: UserStore::new(),
            current_chat_index: 0,
            downloads: HashMap::new(),
            selected: HashMap::new(),
            copied_msgs: None,
            chat_list_title: String::new(),
            connection_state: ConnectionState::Connecting,
        }
    }

    pub fn current_chat_id(&self) -> Option<i64> {
        self.chats.id_by_index(self.current_chat_index)
    }

    /// The original's guard is `0 < chat_idx < len(...)` (strict zero),
    /// forbidding selection of the first chat through this API — an Open
    /// Question in §9. Decision (see `DESIGN.md`): reproduce it verbatim
    /// rather than "fix" it, since the distilled spec calls this out as
    /// possibly-buggy-but-intentional source behavior to preserve.
    pub fn set_current_chat_index(&mut self, idx: usize) -> bool {
        if idx > 0 && idx < self.chats.active.len() {
            self.current_chat_index = idx;
            true
        } else {
            false
        }
    }

    /// Relocates `current_chat_index` to wherever `chat_id` now sits in
    /// `active` after a re-sort (§4.6 "Refresh-current-chat discipline").
    pub fn relocate_current_chat(&mut self, chat_id: i64) {
        if let Some(idx) = self.chats.index_of_id(chat_id) {
            self.current_chat_index = idx;
        }
    }

    pub fn selected_in(&self, chat_id: i64) -> &[i64] {
        self.selected.get(&chat_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Toggle-select a message: add if absent (advances selection
    /// forward), remove if present (ctrl-space retreats), per §4.5
    /// "toggle-select (space advances, ctrl-space retreats)".
    pub fn toggle_select(&mut self, chat_id: i64, msg_id: i64) {
        let list = self.selected.entry(chat_id).or_default();
        if let Some(pos) = list.iter().position(|id| *id == msg_id) {
            list.remove(pos);
        } else {
            list.push(msg_id);
        }
    }

    pub fn discard_selection(&mut self, chat_id: i64) {
        self.selected.remove(&chat_id);
    }

    pub fn set_copied(&mut self, chat_id: i64, msg_ids: Vec<i64>) {
        self.copied_msgs = Some((chat_id, msg_ids));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp::types::{Chat, ChatType};

    fn chat(id: i64, order: u64) -> Chat {
        Chat {
            id,
            chat_type: ChatType::Private { user_id: id },
            title: format!("chat {id}"),
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

    #[test]
    fn set_current_chat_index_forbids_index_zero() {
        let mut model = Model::new();
        model.chats.add(chat(1, 10));
        model.chats.add(chat(2, 5));
        assert!(!model.set_current_chat_index(0));
        assert!(model.set_current_chat_index(1));
        assert_eq!(model.current_chat_index, 1);
    }

    #[test]
    fn relocate_current_chat_follows_id_after_resort() {
        let mut model = Model::new();
        model.chats.add(chat(1, 10));
        model.chats.add(chat(2, 5));
        model.current_chat_index = 0; // chat 1
        model.chats.update(2, |c| c.order = 99);
        model.relocate_current_chat(1);
        assert_eq!(model.current_chat_index, 1);
    }

    #[test]
    fn toggle_select_adds_then_removes() {
        let mut model = Model::new();
        model.toggle_select(7, 101);
        assert_eq!(model.selected_in(7), &[101]);
        model.toggle_select(7, 101);
        assert!(model.selected_in(7).is_empty());
    }
}
