//! `MessageStore` — per-chat message cache (§4.2).
//!
//! Grounded in `tg/models/__init__.py`'s `MsgModel`: `add_message`'s
//! dedup-by-id via a side set, `_fetch_msgs_until_limit`'s three-round
//! retry loop (`range(3)`) against a backend that doesn't guarantee a full
//! page, and `next_msg`/`prev_msg` cursor clamping. `jump_to`, `edit`,
//! `update_content_opened`, and `update_fields` are supplements `spec.md`
//! names beyond that snapshot — implemented with the same cache-first,
//! mutate-in-place style as `add`/`remove`.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::warn;

use crate::mp::types::{LocalFile, Message, MessageContent};
use crate::mp::MessagingProvider;

#[derive(Default)]
struct ChatMessages {
    by_id: HashMap<i64, Message>,
    /// Strictly descending, most-recent first (§3 "ids in the insertion
    /// index are strictly decreasing").
    index: Vec<i64>,
    cursor: usize,
}

/// Per-chat message cache with a cursor, pagination against the MP, and a
/// global not-found memo.
#[derive(Default)]
pub struct MessageStore {
    chats: HashMap<i64, ChatMessages>,
    /// Global — a message id that came back empty from one chat is
    /// assumed gone everywhere, matching the single `not_found: set`
    /// named in §4.2 (the original backend never reuses message ids
    /// across chats).
    not_found: HashSet<i64>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn chat_mut(&mut self, chat_id: i64) -> &mut ChatMessages {
        self.chats.entry(chat_id).or_default()
    }

    /// Inserts `msg` at the front if unseen. Dedup: a duplicate id is
    /// ignored with a warn (§4.2, §8 "`add(m)` is idempotent").
    pub fn add(&mut self, chat_id: i64, msg: Message) {
        let id = msg.id;
        let chat = self.chat_mut(chat_id);
        if chat.by_id.contains_key(&id) {
            warn!(chat_id, msg_id = id, "duplicate add ignored");
            return;
        }
        chat.by_id.insert(id, msg);
        chat.index.insert(0, id);
        // Normally new messages have the largest id, so position 0 is
        // already correct; re-sort only if that invariant was violated
        // (e.g. an out-of-order backfill), per §4.2 "if inserted id is
        // less than the second element, re-sort the index descending".
        if chat.index.len() > 1 && chat.index[0] < chat.index[1] {
            chat.index.sort_unstable_by(|a, b| b.cmp(a));
        }
    }

    /// Removes `ids` from the index and mapping; unknown ids are
    /// tolerated.
    pub fn remove(&mut self, chat_id: i64, ids: &[i64]) {
        let Some(chat) = self.chats.get_mut(&chat_id) else {
            return;
        };
        for id in ids {
            chat.by_id.remove(id);
        }
        chat.index.retain(|id| !ids.contains(id));
        chat.cursor = chat.cursor.min(chat.index.len().saturating_sub(1));
    }

    pub fn get(&self, chat_id: i64, msg_id: i64) -> Option<&Message> {
        self.chats.get(&chat_id)?.by_id.get(&msg_id)
    }

    /// Cache-first lookup; on a miss, calls `MP.get_message` and either
    /// caches the result or records `msg_id` in the not-found memo (§4.2
    /// "get(msg_id): cache-first; on miss, call MP.get_message; cache the
    /// result or record not_found"). A previously memoized id is not
    /// retried.
    pub fn get_or_fetch(&mut self, mp: &dyn MessagingProvider, chat_id: i64, msg_id: i64) -> Option<Message> {
        if let Some(msg) = self.get(chat_id, msg_id) {
            return Some(msg.clone());
        }
        if self.is_not_found(msg_id) {
            return None;
        }
        match mp.get_message(chat_id, msg_id).wait() {
            Ok(msg) => {
                self.add(chat_id, msg.clone());
                Some(msg)
            }
            Err(_) => {
                self.mark_not_found(msg_id);
                None
            }
        }
    }

    pub fn get_mut(&mut self, chat_id: i64, msg_id: i64) -> Option<&mut Message> {
        self.chats.get_mut(&chat_id)?.by_id.get_mut(&msg_id)
    }

    pub fn is_not_found(&self, msg_id: i64) -> bool {
        self.not_found.contains(&msg_id)
    }

    pub fn mark_not_found(&mut self, msg_id: i64) {
        self.not_found.insert(msg_id);
    }

    pub fn len(&self, chat_id: i64) -> usize {
        self.chats.get(&chat_id).map(|c| c.index.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, chat_id: i64) -> bool {
        self.len(chat_id) == 0
    }

    pub fn cursor(&self, chat_id: i64) -> usize {
        self.chats.get(&chat_id).map(|c| c.cursor).unwrap_or(0)
    }

    /// Index-ordered ids, strictly descending by id (§3, §8 invariant).
    pub fn index(&self, chat_id: i64) -> &[i64] {
        self.chats
            .get(&chat_id)
            .map(|c| c.index.as_slice())
            .unwrap_or(&[])
    }

    /// Advances the cursor toward older messages, bounded by `len - 1`.
    /// Returns whether it moved.
    pub fn cursor_next(&mut self, chat_id: i64, step: usize) -> bool {
        let chat = self.chat_mut(chat_id);
        let max = chat.index.len().saturating_sub(1);
        let new_cursor = (chat.cursor + step).min(max);
        let moved = new_cursor != chat.cursor;
        chat.cursor = new_cursor;
        moved
    }

    /// Moves the cursor toward newer messages, bounded by 0.
    pub fn cursor_prev(&mut self, chat_id: i64, step: usize) -> bool {
        let chat = self.chat_mut(chat_id);
        let new_cursor = chat.cursor.saturating_sub(step);
        let moved = new_cursor != chat.cursor;
        chat.cursor = new_cursor;
        moved
    }

    pub fn jump_bottom(&mut self, chat_id: i64) {
        self.chat_mut(chat_id).cursor = 0;
    }

    /// Moves the cursor to `msg_id` if present in the index. Returns
    /// whether the jump succeeded.
    pub fn jump_to(&mut self, chat_id: i64, msg_id: i64) -> bool {
        let chat = self.chat_mut(chat_id);
        if let Some(pos) = chat.index.iter().position(|id| *id == msg_id) {
            chat.cursor = pos;
            true
        } else {
            false
        }
    }

    /// Fetches history so that `index[chat_id]` covers
    /// `[offset, offset+limit)`, issuing up to three sequential paged
    /// requests against the MP when the cache is short (§4.2, §8
    /// "pagination retry bound"). Returns the requested window as
    /// `(display_index, &Message)` pairs.
    pub fn fetch(
        &mut self,
        mp: &dyn MessagingProvider,
        chat_id: i64,
        offset: usize,
        limit: usize,
    ) -> Vec<(usize, Message)> {
        let needed = offset + limit;
        if needed > self.len(chat_id) {
            let mut from_message_id = self
                .chats
                .get(&chat_id)
                .and_then(|c| c.index.last().copied())
                .unwrap_or(0);
            for _ in 0..3 {
                if self.len(chat_id) >= needed {
                    break;
                }
                let page_limit = (needed - self.len(chat_id)).max(1) as i32;
                match mp.get_chat_history(chat_id, from_message_id, page_limit).wait() {
                    Ok(messages) if !messages.is_empty() => {
                        let last_id = messages.last().map(|m| m.id);
                        for msg in messages {
                            self.add(chat_id, msg);
                        }
                        if let Some(id) = last_id {
                            from_message_id = id;
                        }
                    }
                    _ => break,
                }
            }
        }
        let chat = match self.chats.get(&chat_id) {
            Some(c) => c,
            None => return Vec::new(),
        };
        chat.index
            .iter()
            .enumerate()
            .skip(offset)
            .take(limit)
            .filter_map(|(i, id)| chat.by_id.get(id).map(|m| (i, m.clone())))
            .collect()
    }

    pub fn edit(&mut self, mp: &dyn MessagingProvider, chat_id: i64, msg_id: i64, text: String) -> bool {
        mp.edit_message_text(chat_id, msg_id, text).wait().is_ok()
    }

    pub fn send(&mut self, mp: &dyn MessagingProvider, chat_id: i64, text: String) -> crate::error::Result<Message> {
        mp.send_message(chat_id, text).wait()
    }

    /// Replaces the `content` subtree of the stored record (§4.6
    /// `MessageContent` handler).
    pub fn update_content(&mut self, chat_id: i64, msg_id: i64, new_content: MessageContent) -> bool {
        if let Some(msg) = self.get_mut(chat_id, msg_id) {
            msg.content = new_content;
            true
        } else {
            false
        }
    }

    /// Marks voice as listened / video-note as viewed (§4.6
    /// `MessageContentOpened`).
    pub fn update_content_opened(&mut self, chat_id: i64, msg_id: i64) -> bool {
        let Some(msg) = self.get_mut(chat_id, msg_id) else {
            return false;
        };
        let mut proxy = super::msg_proxy::MsgProxy::new(msg);
        match proxy.kind() {
            super::msg_proxy::Variant::Voice => proxy.set_listened(true),
            super::msg_proxy::Variant::VideoNote => proxy.set_viewed(true),
            _ => {}
        }
        true
    }

    /// Shallow merge into the stored record's raw passthrough, used by
    /// "edited" updates for fields the typed struct models directly
    /// (`edit_date`) plus anything only carried in `raw`.
    pub fn update_fields(&mut self, chat_id: i64, msg_id: i64, patch: Value) -> bool {
        let Some(msg) = self.get_mut(chat_id, msg_id) else {
            return false;
        };
        if let Some(edit_date) = patch.get("edit_date").and_then(Value::as_i64) {
            msg.edit_date = edit_date;
        }
        if let (Value::Object(raw_map), Value::Object(patch_map)) = (&mut msg.raw, &patch) {
            for (k, v) in patch_map {
                raw_map.insert(k.clone(), v.clone());
            }
        }
        true
    }

    pub fn set_local(&mut self, chat_id: i64, msg_id: i64, local: LocalFile) -> bool {
        let Some(msg) = self.get_mut(chat_id, msg_id) else {
            return false;
        };
        super::msg_proxy::MsgProxy::new(msg).set_local(local);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp::types::TextContent;
    use serde_json::json;

    fn msg(id: i64) -> Message {
        Message {
            id,
            chat_id: 7,
            sender_id: 1,
            date: id,
            edit_date: 0,
            content: MessageContent::Text {
                text: TextContent {
                    text: format!("msg {id}"),
                    entities: vec![],
                },
            },
            can_be_edited: true,
            can_be_forwarded: true,
            can_be_deleted_for_all_users: true,
            can_be_deleted_only_for_self: true,
            reply_to_message_id: None,
            sending_state: None,
            raw: json!({}),
        }
    }

    #[test]
    fn add_keeps_index_strictly_descending() {
        let mut store = MessageStore::new();
        store.add(7, msg(10));
        store.add(7, msg(12));
        store.add(7, msg(11));
        assert_eq!(store.index(7), &[12, 11, 10]);
    }

    #[test]
    fn add_is_idempotent_on_duplicate_id() {
        let mut store = MessageStore::new();
        store.add(7, msg(10));
        store.add(7, msg(10));
        assert_eq!(store.index(7), &[10]);
        assert_eq!(store.len(7), 1);
    }

    #[test]
    fn cursor_next_and_prev_are_clamped() {
        let mut store = MessageStore::new();
        store.add(7, msg(3));
        store.add(7, msg(2));
        store.add(7, msg(1));
        assert!(store.cursor_next(7, 5));
        assert_eq!(store.cursor(7), 2);
        assert!(!store.cursor_next(7, 1));
        assert!(store.cursor_prev(7, 10));
        assert_eq!(store.cursor(7), 0);
    }

    #[test]
    fn jump_to_moves_cursor_to_known_id() {
        let mut store = MessageStore::new();
        store.add(7, msg(3));
        store.add(7, msg(2));
        store.add(7, msg(1));
        assert!(store.jump_to(7, 2));
        assert_eq!(store.cursor(7), 1);
        assert!(!store.jump_to(7, 999));
    }

    #[test]
    fn remove_tolerates_unknown_ids() {
        let mut store = MessageStore::new();
        store.add(7, msg(1));
        store.remove(7, &[1, 999]);
        assert_eq!(store.len(7), 0);
    }
}
