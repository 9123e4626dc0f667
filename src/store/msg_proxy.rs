//! `MsgProxy` — typed accessor over a [`Message`] (§4.1).
//!
//! Grounded directly in `tg/msg.py`'s `MsgProxy`: the Python version walks
//! a `fields_mapping`/`types` dict by content-kind string to find the
//! nested "file" sub-record. Here the content variant is already a typed
//! enum (`MessageContent`), so the walk collapses into one `match` per
//! accessor instead of a generic dict-path traversal.

use tracing::debug;

use crate::mp::types::{FileDescriptor, Message, MessageContent, ReplyMarkupRow};
use crate::util::{humanize_duration, humanize_size};

/// Content-kind classification returned by [`MsgProxy::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Text,
    Document,
    Photo,
    Audio,
    Voice,
    Video,
    VideoNote,
    Animation,
    Sticker,
    Poll,
    SystemEvent,
    Unknown,
}

/// `| site: title` plus description, read from a message's `web_page`
/// raw passthrough field (§4.7 "optional URL preview block").
#[derive(Debug, Clone)]
pub struct WebPagePreview {
    pub site: String,
    pub title: String,
    pub description: String,
}

/// Borrows a [`Message`] and exposes typed read accessors and a small set
/// of in-place mutators. Never restructures the underlying record.
pub struct MsgProxy<'a> {
    msg: &'a mut Message,
}

impl<'a> MsgProxy<'a> {
    pub fn new(msg: &'a mut Message) -> Self {
        MsgProxy { msg }
    }

    pub fn kind(&self) -> Variant {
        match &self.msg.content {
            MessageContent::Text { .. } => Variant::Text,
            MessageContent::Document(_) => Variant::Document,
            MessageContent::Photo(_) => Variant::Photo,
            MessageContent::Audio(_) => Variant::Audio,
            MessageContent::Voice(_) => Variant::Voice,
            MessageContent::Video(_) => Variant::Video,
            MessageContent::VideoNote(_) => Variant::VideoNote,
            MessageContent::Animation(_) => Variant::Animation,
            MessageContent::Sticker(_) => Variant::Sticker,
            MessageContent::Poll(_) => Variant::Poll,
            MessageContent::SystemEvent(_) => Variant::SystemEvent,
            MessageContent::Unknown => Variant::Unknown,
        }
    }

    /// Resolves the variant-specific path to the "file" sub-record. For
    /// photo, picks the last (largest) size (§4.1 "tie-breaks"). Unknown
    /// content yields `None` and emits a debug log rather than panicking.
    pub fn file(&self) -> Option<&FileDescriptor> {
        match &self.msg.content {
            MessageContent::Document(d) => Some(&d.document),
            MessageContent::Photo(p) => p.sizes.last().map(|s| &s.photo),
            MessageContent::Audio(a) => Some(&a.audio),
            MessageContent::Voice(v) => Some(&v.voice),
            MessageContent::Video(v) => Some(&v.video),
            MessageContent::VideoNote(v) => Some(&v.video_note),
            MessageContent::Animation(a) => Some(&a.animation),
            MessageContent::Sticker(s) => Some(&s.sticker),
            other => {
                debug!(kind = ?other, "no file sub-record for this content variant");
                None
            }
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.msg.content {
            MessageContent::Text { text } => Some(text.text.as_str()),
            _ => None,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match &self.msg.content {
            MessageContent::Photo(p) => Some(p.caption.as_str()),
            MessageContent::Video(v) => Some(v.caption.as_str()),
            MessageContent::Animation(a) => Some(a.caption.as_str()),
            _ => None,
        }
    }

    pub fn size(&self) -> Option<u64> {
        self.file().map(|f| f.size)
    }

    pub fn human_size(&self) -> Option<String> {
        self.size().map(humanize_size)
    }

    /// Duration formatted `M:SS`/`H:MM:SS`; applies to audio/voice/video/
    /// video-note only.
    pub fn duration(&self) -> Option<String> {
        let seconds = match &self.msg.content {
            MessageContent::Audio(a) => Some(a.duration),
            MessageContent::Voice(v) => Some(v.duration),
            MessageContent::Video(v) => Some(v.duration),
            MessageContent::VideoNote(v) => Some(v.duration),
            _ => None,
        }?;
        Some(humanize_duration(seconds))
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.msg.content {
            MessageContent::Document(d) => Some(d.file_name.as_str()),
            MessageContent::Audio(a) => Some(a.file_name.as_str()),
            _ => None,
        }
    }

    pub fn file_id(&self) -> Option<i64> {
        self.file().map(|f| f.id)
    }

    pub fn local_path(&self) -> Option<&str> {
        self.file().map(|f| f.local.path.as_str())
    }

    pub fn is_downloaded(&self) -> bool {
        self.file().is_some_and(|f| f.local.is_downloading_completed)
    }

    pub fn is_listened(&self) -> Option<bool> {
        match &self.msg.content {
            MessageContent::Voice(v) => Some(v.is_listened),
            _ => None,
        }
    }

    pub fn is_viewed(&self) -> Option<bool> {
        match &self.msg.content {
            MessageContent::VideoNote(v) => Some(v.is_viewed),
            _ => None,
        }
    }

    pub fn msg_id(&self) -> i64 {
        self.msg.id
    }

    pub fn chat_id(&self) -> i64 {
        self.msg.chat_id
    }

    pub fn sender_id(&self) -> i64 {
        self.msg.sender_id
    }

    pub fn date(&self) -> i64 {
        self.msg.date
    }

    pub fn reply_msg_id(&self) -> Option<i64> {
        self.msg.reply_to_message_id
    }

    pub fn can_be_edited(&self) -> bool {
        self.msg.can_be_edited
    }

    pub fn forward(&self) -> bool {
        self.msg.can_be_forwarded
    }

    /// Requires `kind() == Variant::Poll` per the caller contract in §4.1.
    pub fn poll_question(&self) -> Option<&str> {
        match &self.msg.content {
            MessageContent::Poll(p) => Some(p.question.as_str()),
            _ => None,
        }
    }

    pub fn poll_options(&self) -> Option<&[crate::mp::types::PollOption]> {
        match &self.msg.content {
            MessageContent::Poll(p) => Some(&p.options),
            _ => None,
        }
    }

    pub fn is_closed_poll(&self) -> Option<bool> {
        match &self.msg.content {
            MessageContent::Poll(p) => Some(p.is_closed),
            _ => None,
        }
    }

    pub fn sticker_emoji(&self) -> Option<&str> {
        match &self.msg.content {
            MessageContent::Sticker(s) => Some(s.emoji.as_str()),
            _ => None,
        }
    }

    pub fn is_animated(&self) -> Option<bool> {
        match &self.msg.content {
            MessageContent::Sticker(s) => Some(s.is_animated),
            _ => None,
        }
    }

    /// Reply-markup keyboard rows, read from the raw passthrough since the
    /// typed `Message` struct doesn't model inline keyboards directly —
    /// they ride along in `raw.reply_markup.rows` the same way the backend
    /// sends them.
    pub fn reply_markup_rows(&self) -> Vec<ReplyMarkupRow> {
        self.msg
            .raw
            .get("reply_markup")
            .and_then(|rm| rm.get("rows"))
            .and_then(|rows| serde_json::from_value(rows.clone()).ok())
            .unwrap_or_default()
    }

    /// URL preview (`raw.web_page`), read the same raw-passthrough way as
    /// [`Self::reply_markup_rows`] since the typed `Message` struct doesn't
    /// model link previews directly (§4.7 "optional URL preview block").
    pub fn web_page_preview(&self) -> Option<WebPagePreview> {
        let wp = self.msg.raw.get("web_page")?;
        let site = wp
            .get("site_name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| wp.get("title").and_then(|v| v.as_str()))?
            .to_string();
        let title = wp.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let description = wp.get("description").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        Some(WebPagePreview { site, title, description })
    }

    /// Sets the local-file sub-record; no-op (with a debug log) if the
    /// content variant carries no file.
    pub fn set_local(&mut self, local: crate::mp::types::LocalFile) {
        match &mut self.msg.content {
            MessageContent::Document(d) => d.document.local = local,
            MessageContent::Photo(p) => {
                if let Some(last) = p.sizes.last_mut() {
                    last.photo.local = local;
                }
            }
            MessageContent::Audio(a) => a.audio.local = local,
            MessageContent::Voice(v) => v.voice.local = local,
            MessageContent::Video(v) => v.video.local = local,
            MessageContent::VideoNote(v) => v.video_note.local = local,
            MessageContent::Animation(a) => a.animation.local = local,
            MessageContent::Sticker(s) => s.sticker.local = local,
            other => debug!(kind = ?other, "set_local on a variant with no file"),
        }
    }

    pub fn set_listened(&mut self, listened: bool) {
        match &mut self.msg.content {
            MessageContent::Voice(v) => v.is_listened = listened,
            other => debug!(kind = ?other, "set_listened on a non-voice variant"),
        }
    }

    pub fn set_viewed(&mut self, viewed: bool) {
        match &mut self.msg.content {
            MessageContent::VideoNote(v) => v.is_viewed = viewed,
            other => debug!(kind = ?other, "set_viewed on a non-video-note variant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp::types::{Photo, PhotoSize, TextContent};
    use serde_json::json;

    fn text_message(id: i64) -> Message {
        Message {
            id,
            chat_id: 7,
            sender_id: 1,
            date: 0,
            edit_date: 0,
            content: MessageContent::Text {
                text: TextContent {
                    text: "hello".into(),
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
    fn text_message_has_no_file() {
        let mut msg = text_message(1);
        let proxy = MsgProxy::new(&mut msg);
        assert_eq!(proxy.kind(), Variant::Text);
        assert_eq!(proxy.text_content(), Some("hello"));
        assert!(proxy.file().is_none());
    }

    #[test]
    fn photo_resolves_last_size_as_file() {
        let mut msg = text_message(2);
        msg.content = MessageContent::Photo(Photo {
            sizes: vec![
                PhotoSize {
                    photo: FileDescriptor {
                        id: 1,
                        size: 100,
                        expected_size: 100,
                        local: Default::default(),
                    },
                },
                PhotoSize {
                    photo: FileDescriptor {
                        id: 2,
                        size: 900,
                        expected_size: 900,
                        local: Default::default(),
                    },
                },
            ],
            caption: "pic".into(),
        });
        let proxy = MsgProxy::new(&mut msg);
        assert_eq!(proxy.file().unwrap().id, 2);
        assert_eq!(proxy.human_size(), Some("900B".to_string()));
    }

    #[test]
    fn set_listened_is_a_no_op_on_text() {
        let mut msg = text_message(3);
        let mut proxy = MsgProxy::new(&mut msg);
        proxy.set_listened(true);
        assert_eq!(proxy.is_listened(), None);
    }
}
