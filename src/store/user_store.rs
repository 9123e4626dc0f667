//! `UserStore` — user/group cache, status derivation, typing-action
//! tracking (§4.4).
//!
//! Grounded in `tg/models/__init__.py`'s `UserModel` (lazy `get_me`/
//! `get_user` caching with a `not_found` memo). Status-label/order
//! derivation, the online predicate, and per-chat typing-action tracking
//! are supplements `spec.md` names beyond that snapshot; they're grounded
//! on the same lazy-cache-with-memo shape.

use std::collections::{HashMap, HashSet};

use crate::mp::types::{BasicGroup, ChatAction, Supergroup, User, UserStatus};
use crate::mp::MessagingProvider;

#[derive(Default)]
pub struct UserStore {
    me: Option<User>,
    users: HashMap<i64, User>,
    groups: HashMap<i64, BasicGroup>,
    supergroups: HashMap<i64, Supergroup>,
    contacts: Vec<i64>,
    actions: HashMap<i64, ChatAction>,
    not_found: HashSet<i64>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn me(&self) -> Option<&User> {
        self.me.as_ref()
    }

    pub fn set_me(&mut self, user: User) {
        self.me = Some(user);
    }

    /// Cache-first user lookup; falls back to `MP.get_user` and memoizes a
    /// miss so the same id isn't refetched.
    pub fn get_user(&mut self, mp: &dyn MessagingProvider, user_id: i64) -> Option<&User> {
        if self.not_found.contains(&user_id) {
            return None;
        }
        if !self.users.contains_key(&user_id) {
            match mp.get_user(user_id).wait() {
                Ok(user) => {
                    self.users.insert(user_id, user);
                }
                Err(_) => {
                    self.not_found.insert(user_id);
                    return None;
                }
            }
        }
        self.users.get(&user_id)
    }

    pub fn cache_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn cache_basic_group(&mut self, group: BasicGroup) {
        self.groups.insert(group.id, group);
    }

    pub fn cache_supergroup(&mut self, group: Supergroup) {
        self.supergroups.insert(group.id, group);
    }

    pub fn basic_group(&self, id: i64) -> Option<&BasicGroup> {
        self.groups.get(&id)
    }

    pub fn supergroup(&self, id: i64) -> Option<&Supergroup> {
        self.supergroups.get(&id)
    }

    pub fn set_contacts(&mut self, ids: Vec<i64>) {
        self.contacts = ids;
    }

    pub fn contacts(&self) -> &[i64] {
        &self.contacts
    }

    pub fn set_status(&mut self, user_id: i64, status: UserStatus) {
        if let Some(user) = self.users.get_mut(&user_id) {
            user.status = status;
        }
    }

    /// Human label for a user's status, clearing a stale "online" claim
    /// whose `expires` has passed (§4.4).
    pub fn status_label(&self, user_id: i64, now: i64) -> String {
        let Some(user) = self.users.get(&user_id) else {
            return String::new();
        };
        match &user.status {
            UserStatus::Online { expires } if *expires > now => "online".to_string(),
            UserStatus::Online { .. } => String::new(),
            UserStatus::Offline { was_online } => {
                let ago = (now - was_online).max(0);
                format!("last seen {} seconds ago", ago)
            }
            UserStatus::Recently => "last seen recently".to_string(),
            UserStatus::LastWeek => "last seen within a week".to_string(),
            UserStatus::LastMonth => "last seen within a month".to_string(),
            UserStatus::Empty | UserStatus::Unknown => String::new(),
        }
    }

    /// Numeric sort key: online first, then offline by recency, then
    /// recently/week/month, then `INT_MAX`.
    pub fn status_order(&self, user_id: i64, now: i64) -> i64 {
        let Some(user) = self.users.get(&user_id) else {
            return i64::MAX;
        };
        match &user.status {
            UserStatus::Online { expires } if *expires > now => -1,
            UserStatus::Offline { was_online } => now - was_online,
            UserStatus::Recently => i64::MAX - 3,
            UserStatus::LastWeek => i64::MAX - 2,
            UserStatus::LastMonth => i64::MAX - 1,
            UserStatus::Online { .. } | UserStatus::Empty | UserStatus::Unknown => i64::MAX,
        }
    }

    /// True only if not a bot, status is online, and not yet expired.
    pub fn is_online(&self, user_id: i64, now: i64) -> bool {
        let Some(user) = self.users.get(&user_id) else {
            return false;
        };
        !user.is_bot && matches!(&user.status, UserStatus::Online { expires } if *expires > now)
    }

    /// First+last name trimmed to 20 chars, else first name, else
    /// `@username`, else a placeholder.
    pub fn label(&self, user_id: i64) -> String {
        let Some(user) = self.users.get(&user_id) else {
            return format!("user#{user_id}");
        };
        let full = format!("{} {}", user.first_name, user.last_name).trim().to_string();
        if !full.is_empty() {
            return crate::util::truncate_to_len(&full, 20);
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
        if !user.username.is_empty() {
            return format!("@{}", user.username);
        }
        format!("user#{user_id}")
    }

    pub fn set_action(&mut self, chat_id: i64, action: ChatAction) {
        if action == ChatAction::Cancel {
            self.actions.remove(&chat_id);
        } else {
            self.actions.insert(chat_id, action);
        }
    }

    pub fn clear_action(&mut self, chat_id: i64) {
        self.actions.remove(&chat_id);
    }

    pub fn action(&self, chat_id: i64) -> Option<&ChatAction> {
        self.actions.get(&chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, status: UserStatus) -> User {
        User {
            id,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            username: "ada".into(),
            phone_number: String::new(),
            is_bot: false,
            status,
        }
    }

    #[test]
    fn status_label_clears_expired_online() {
        let mut store = UserStore::new();
        store.cache_user(user(1, UserStatus::Online { expires: 10 }));
        assert_eq!(store.status_label(1, 20), "");
        assert_eq!(store.status_order(1, 20), i64::MAX);
    }

    #[test]
    fn status_label_reports_fresh_online() {
        let mut store = UserStore::new();
        store.cache_user(user(1, UserStatus::Online { expires: 100 }));
        assert_eq!(store.status_label(1, 20), "online");
        assert!(store.is_online(1, 20));
    }

    #[test]
    fn label_prefers_full_name_then_username_then_placeholder() {
        let mut store = UserStore::new();
        store.cache_user(user(1, UserStatus::Empty));
        assert_eq!(store.label(1), "Ada Lovelace");
        assert_eq!(store.label(2), "user#2");
    }

    #[test]
    fn set_action_cancel_clears_entry() {
        let mut store = UserStore::new();
        store.set_action(7, ChatAction::Typing);
        assert!(store.action(7).is_some());
        store.set_action(7, ChatAction::Cancel);
        assert!(store.action(7).is_none());
    }
}
