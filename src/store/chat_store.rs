//! `ChatStore` — ordered, partially materialized chat list (§4.3).
//!
//! Grounded in `tg/models/__init__.py`'s `ChatModel.fetch_chats`/
//! `fetch_chat_ids` pagination (anchor on the last chat's id, bounded
//! retries) and `update_last_message`'s re-sort-on-mutate pattern. The
//! active/inactive split, `(order, id)` sort key, and fuzzy search
//! (`found`/`found_cursor`) are supplements `spec.md` describes more fully;
//! they're grounded on that same re-sort-after-mutate idiom.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::warn;

use crate::mp::types::Chat;
use crate::mp::{ChatAnchor, MessagingProvider};

#[derive(Default)]
pub struct ChatStore {
    pub active: Vec<Chat>,
    inactive: HashMap<i64, Chat>,
    ids: HashSet<i64>,
    have_full_list: bool,
    pub title: String,
    pub found: Vec<i64>,
    pub found_cursor: usize,
}

fn sort_key(chat: &Chat) -> (u64, i64) {
    (chat.order, chat.id)
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `active[offset..offset+limit]`, fetching the next page
    /// first if the window runs past what's loaded and the backend hasn't
    /// signaled an exhausted list.
    pub fn fetch(&mut self, mp: &dyn MessagingProvider, offset: usize, limit: usize) -> Vec<Chat> {
        if offset + limit > self.active.len() && !self.have_full_list {
            self.load_next(mp);
        }
        self.active
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Requests the next page using the last active chat's `(id, order)`
    /// as the pagination anchor, or `ChatAnchor::initial()` for the first
    /// call. An empty result sets `have_full_list = true` (§8 "pagination
    /// terminates").
    pub fn load_next(&mut self, mp: &dyn MessagingProvider) {
        if self.have_full_list {
            return;
        }
        let anchor = match self.active.last() {
            Some(chat) => ChatAnchor {
                offset_chat_id: chat.id,
                offset_order: chat.order,
            },
            None => ChatAnchor::initial(),
        };
        let Ok(chat_ids) = mp.get_chats(anchor, 30).wait() else {
            return;
        };
        if chat_ids.is_empty() {
            self.have_full_list = true;
            return;
        }
        for id in chat_ids {
            if let Ok(chat) = mp.get_chat(id).wait() {
                self.add(chat);
            }
        }
    }

    /// Dedups by id; parks zero-order chats in `inactive`, otherwise pushes
    /// to `active` and re-sorts descending by `(order, id)`.
    pub fn add(&mut self, chat: Chat) {
        if self.ids.contains(&chat.id) {
            if let Some(pos) = self.active.iter().position(|c| c.id == chat.id) {
                self.active[pos] = chat;
                self.active.sort_unstable_by(|a, b| sort_key(b).cmp(&sort_key(a)));
            } else {
                self.inactive.insert(chat.id, chat);
            }
            return;
        }
        if chat.order == 0 {
            self.inactive.insert(chat.id, chat);
        } else {
            self.ids.insert(chat.id);
            self.active.push(chat);
            self.active.sort_unstable_by(|a, b| sort_key(b).cmp(&sort_key(a)));
        }
    }

    /// Merges `patch` into the chat and re-files it between active and
    /// inactive depending on the resulting order. Returns `false` (with a
    /// warning) for an unknown chat id.
    pub fn update<F: FnOnce(&mut Chat)>(&mut self, chat_id: i64, patch: F) -> bool {
        if let Some(pos) = self.active.iter().position(|c| c.id == chat_id) {
            patch(&mut self.active[pos]);
            if self.active[pos].order == 0 {
                let chat = self.active.remove(pos);
                self.ids.remove(&chat_id);
                self.inactive.insert(chat_id, chat);
            } else {
                self.active.sort_unstable_by(|a, b| sort_key(b).cmp(&sort_key(a)));
            }
            return true;
        }
        if let Some(mut chat) = self.inactive.remove(&chat_id) {
            patch(&mut chat);
            if chat.order == 0 {
                self.inactive.insert(chat_id, chat);
            } else {
                self.ids.insert(chat_id);
                self.active.push(chat);
                self.active.sort_unstable_by(|a, b| sort_key(b).cmp(&sort_key(a)));
            }
            return true;
        }
        warn!(chat_id, "update on unknown chat id");
        false
    }

    pub fn update_json(&mut self, chat_id: i64, patch: Value) -> bool {
        self.update(chat_id, |chat| {
            if let Some(order) = patch.get("order").and_then(Value::as_u64) {
                chat.order = order;
            }
            if let Some(title) = patch.get("title").and_then(Value::as_str) {
                chat.title = title.to_string();
            }
            if let Some(pinned) = patch.get("is_pinned").and_then(Value::as_bool) {
                chat.is_pinned = pinned;
            }
            if let Some(unread) = patch.get("is_marked_as_unread").and_then(Value::as_bool) {
                chat.is_marked_as_unread = unread;
            }
            if let Some(count) = patch.get("unread_count").and_then(Value::as_i64) {
                chat.unread_count = count;
            }
        })
    }

    pub fn id_by_index(&self, i: usize) -> Option<i64> {
        self.active.get(i).map(|c| c.id)
    }

    pub fn index_of_id(&self, chat_id: i64) -> Option<usize> {
        self.active.iter().position(|c| c.id == chat_id)
    }

    pub fn get(&self, chat_id: i64) -> Option<&Chat> {
        self.active
            .iter()
            .find(|c| c.id == chat_id)
            .or_else(|| self.inactive.get(&chat_id))
    }

    pub fn get_mut(&mut self, chat_id: i64) -> Option<&mut Chat> {
        if let Some(pos) = self.active.iter().position(|c| c.id == chat_id) {
            return self.active.get_mut(pos);
        }
        self.inactive.get_mut(&chat_id)
    }

    /// Fuzzy, case-insensitive substring search over loaded active chats;
    /// records the hit list and resets the rotation cursor.
    pub fn search(&mut self, query: &str) {
        let needle = query.to_lowercase();
        self.found = self
            .active
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .map(|c| c.id)
            .collect();
        self.found_cursor = 0;
    }

    /// Rotates through `found` with wrap-around; `backwards` moves toward
    /// the previous hit.
    pub fn next_found(&mut self, backwards: bool) -> Option<i64> {
        if self.found.is_empty() {
            return None;
        }
        let len = self.found.len();
        self.found_cursor = if backwards {
            (self.found_cursor + len - 1) % len
        } else {
            (self.found_cursor + 1) % len
        };
        self.found.get(self.found_cursor).copied()
    }

    pub fn have_full_list(&self) -> bool {
        self.have_full_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp::types::ChatType;

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
    fn add_sorts_active_descending_by_order_then_id() {
        let mut store = ChatStore::new();
        store.add(chat(1, 5));
        store.add(chat(2, 10));
        store.add(chat(3, 10));
        assert_eq!(store.active.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn zero_order_chat_is_parked_inactive() {
        let mut store = ChatStore::new();
        store.add(chat(1, 0));
        assert!(store.active.is_empty());
        assert_eq!(store.get(1).unwrap().id, 1);
    }

    #[test]
    fn update_to_zero_order_moves_chat_to_inactive() {
        let mut store = ChatStore::new();
        store.add(chat(1, 5));
        assert!(store.update(1, |c| c.order = 0));
        assert!(store.active.is_empty());
        assert!(store.get(1).is_some());
    }

    #[test]
    fn update_unknown_chat_returns_false() {
        let mut store = ChatStore::new();
        assert!(!store.update(999, |c| c.order = 1));
    }

    #[test]
    fn next_found_wraps_around() {
        let mut store = ChatStore::new();
        store.add(chat(1, 5));
        store.add(chat(2, 6));
        store.search("chat");
        assert_eq!(store.found.len(), 2);
        let first = store.next_found(false).unwrap();
        let _second = store.next_found(false).unwrap();
        let back_to_first = store.next_found(false).unwrap();
        assert_eq!(first, back_to_first);
    }
}
