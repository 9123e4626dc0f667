//! Message pane: the per-chat scroll-back view (§4.7 "Message pane").
//!
//! Grounded in `tg/views/__init__.py`'s `MsgView.draw` line-budget
//! windowing (`needed_lines` computed from the wrapped width, stopping
//! once the running line count would overflow the pane) and its title
//! line (`chat title : status`, centered). Reply-quote prefixes, URL
//! preview blocks, and inline-keyboard rows are supplements named
//! explicitly in §4.7.

use crossterm::style::Color;

use crate::config::MsgFlags;
use crate::mp::types::{Message, TextEntityType};
use crate::store::msg_proxy::MsgProxy;
use crate::util::truncate_to_len;
use crate::view::theme::Attrs;
use crate::view::{Surface, MIN_MSG_PADDING};

/// One fully-formatted display line plus the originating message index
/// and the sender's deterministic color, kept separate from drawing so
/// window selection is unit-testable.
pub struct RenderedLine {
    pub msg_index: usize,
    pub text: String,
    pub color: Color,
}

/// Centered `chat title : status` title line.
pub fn title_line(chat_title: &str, status: &str, width: usize) -> String {
    let combined = if status.is_empty() {
        chat_title.to_string()
    } else {
        format!("{chat_title} : {status}")
    };
    let truncated = truncate_to_len(&combined, width);
    let pad = width.saturating_sub(truncated.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), truncated)
}

/// Formats one message as its full set of display lines: an optional
/// reply-quote line (`reply_quote`, resolved by the caller since it needs
/// the replied-to message's own sender label), the wrapped body with
/// sender label and flags, an optional URL preview block, and any
/// inline-keyboard rows (§4.7 "reply-quote prefix", "optional URL preview
/// block", "inline-keyboard rows").
pub fn format_message_line(
    msg: &mut Message,
    sender_label: &str,
    flags: &MsgFlags,
    was_edited: bool,
    wrap_width: usize,
    reply_quote: Option<(&str, &str)>,
) -> Vec<String> {
    let proxy = MsgProxy::new(msg);
    let body = proxy
        .text_content()
        .map(str::to_string)
        .or_else(|| proxy.caption().map(str::to_string))
        .unwrap_or_else(|| format!("[{}]", kind_label(&proxy)));
    let edited_suffix = if was_edited { format!(" {}", flags.edited) } else { String::new() };
    let prefix = format!("{sender_label}: ");

    let mut lines = Vec::new();
    if let Some((quoted_sender, quoted_text)) = reply_quote {
        lines.push(reply_quote_line(quoted_sender, quoted_text, wrap_width));
    }
    lines.extend(wrap_text(&format!("{prefix}{body}{edited_suffix}"), wrap_width));
    if let Some(preview) = proxy.web_page_preview() {
        let summary = if preview.description.is_empty() {
            format!("| {}: {}", preview.site, preview.title)
        } else {
            format!("| {}: {} — {}", preview.site, preview.title, preview.description)
        };
        lines.push(truncate_to_len(&summary, wrap_width));
    }
    for row in proxy.reply_markup_rows() {
        let row_text = row
            .buttons
            .iter()
            .map(|b| match &b.url {
                Some(url) => format!("| {} ({url}) ", b.text),
                None => format!("| {} ", b.text),
            })
            .collect::<String>();
        if !row_text.is_empty() {
            lines.push(truncate_to_len(&row_text, wrap_width));
        }
    }
    lines
}

fn kind_label(proxy: &MsgProxy) -> &'static str {
    use crate::store::msg_proxy::Variant;
    match proxy.kind() {
        Variant::Text => "text",
        Variant::Document => "document",
        Variant::Photo => "photo",
        Variant::Audio => "audio",
        Variant::Voice => "voice",
        Variant::Video => "video",
        Variant::VideoNote => "video_note",
        Variant::Animation => "animation",
        Variant::Sticker => "sticker",
        Variant::Poll => "poll",
        Variant::SystemEvent => "system_event",
        Variant::Unknown => "unknown",
    }
}

fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Builds a reply-quote prefix line (`"> sender: text"`, truncated to
/// fit) for a message that replies to another.
pub fn reply_quote_line(sender_label: &str, replied_text: &str, width: usize) -> String {
    let quote = format!("> {sender_label}: {replied_text}");
    truncate_to_len(&quote, width)
}

/// Extracts URL entities for the preview block (`"| site: title"` plus
/// description is left to a future fetch step — here we only recover the
/// URL itself, per §4.7's "optional URL preview block").
pub fn message_urls(msg: &Message) -> Vec<String> {
    let crate::mp::types::MessageContent::Text { text } = &msg.content else {
        return Vec::new();
    };
    text.entities
        .iter()
        .filter_map(|e| match &e.entity_type {
            TextEntityType::Url => text.text.get(e.offset..e.offset + e.length).map(str::to_string),
            TextEntityType::TextUrl { url } => Some(url.clone()),
            TextEntityType::Unknown => None,
        })
        .collect()
}

/// Selects the window of rendered lines that fits in `pane_height` while
/// keeping `selected_msg_row` at least [`MIN_MSG_PADDING`] rows above the
/// bottom (§4.7 "when a long message pushes the selection off-screen, the
/// pane re-collects by dropping from the top until the selection is
/// visible").
pub fn select_window(lines: &[RenderedLine], selected_msg_index: usize, pane_height: u16) -> &[RenderedLine] {
    let height = pane_height as usize;
    if lines.len() <= height {
        return lines;
    }
    let selected_row = lines
        .iter()
        .rposition(|l| l.msg_index == selected_msg_index)
        .unwrap_or(lines.len() - 1);
    let min_padding = MIN_MSG_PADDING as usize;
    let end = (selected_row + min_padding + 1).min(lines.len());
    let start = end.saturating_sub(height);
    &lines[start..end]
}

pub fn draw(
    surface: &mut dyn Surface,
    chat_title: &str,
    status: &str,
    lines: &[RenderedLine],
    top: u16,
    left: u16,
    height: u16,
    width: u16,
) -> crate::error::Result<()> {
    surface.addstr(top, left, &title_line(chat_title, status, width as usize), None, Attrs::NORMAL)?;
    for (i, line) in lines.iter().take(height.saturating_sub(1) as usize).enumerate() {
        surface.addstr(top + 1 + i as u16, left, &line.text, Some(line.color), Attrs::NORMAL)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_line_centers_combined_title_and_status() {
        let t = title_line("Ada", "typing", 20);
        assert!(t.contains("Ada : typing"));
    }

    #[test]
    fn title_line_without_status_shows_bare_title() {
        let t = title_line("Ada", "", 20);
        assert_eq!(t.trim(), "Ada");
    }

    #[test]
    fn wrap_text_breaks_on_word_boundaries() {
        let wrapped = wrap_text("one two three four", 7);
        assert!(wrapped.iter().all(|l| l.chars().count() <= 7 || !l.contains(' ')));
    }

    #[test]
    fn select_window_keeps_padding_below_selection() {
        let lines: Vec<RenderedLine> = (0..20)
            .map(|i| RenderedLine {
                msg_index: i,
                text: format!("line {i}"),
                color: Color::White,
            })
            .collect();
        let window = select_window(&lines, 5, 8);
        assert!(window.iter().any(|l| l.msg_index == 5));
        assert!(window.len() <= 8);
    }

    #[test]
    fn reply_quote_line_prefixes_with_gt() {
        let line = reply_quote_line("Ada", "hello there", 40);
        assert!(line.starts_with("> Ada:"));
    }
}
