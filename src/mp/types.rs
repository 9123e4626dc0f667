//! Typed representations of the records the messaging backend hands us.
//!
//! The backend's wire format tags every record with a `@type` string and
//! otherwise stuffs fields into a loosely-structured JSON object (this is
//! the "dynamic records" shape `tg/models/__init__.py` and `tg/msg.py`
//! operate on directly). Here each entity gets a real Rust type instead —
//! a tagged enum per sum type, a struct per record — so the rest of the
//! crate can `match` instead of string-comparing dict keys. A `raw` field
//! on [`Chat`] and [`Message`] keeps the original JSON around so fields
//! this build doesn't model yet aren't silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_raw() -> Value {
    Value::Null
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub title: String,
    #[serde(default)]
    pub order: u64,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_marked_as_unread: bool,
    #[serde(default)]
    pub unread_count: i64,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub notification_settings: Option<NotificationSettings>,
    #[serde(default)]
    pub permissions: ChatPermissions,
    #[serde(default)]
    pub member_count: Option<i64>,
    #[serde(default = "default_raw")]
    #[serde(skip_serializing)]
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "@type")]
pub enum ChatType {
    #[serde(rename = "chatTypePrivate")]
    Private { user_id: i64 },
    #[serde(rename = "chatTypeBasicGroup")]
    BasicGroup { basic_group_id: i64 },
    #[serde(rename = "chatTypeSupergroup")]
    Supergroup { supergroup_id: i64, is_channel: bool },
    #[serde(rename = "chatTypeSecret")]
    Secret { secret_chat_id: i64, user_id: i64 },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatPermissions {
    #[serde(default = "default_true")]
    pub can_send_messages: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Seconds until notifications are un-muted; `i32::MAX` means "muted
    /// indefinitely", `0` means "not muted" (§4.5 "toggle mute").
    pub mute_for: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub date: i64,
    #[serde(default)]
    pub edit_date: i64,
    pub content: MessageContent,
    #[serde(default)]
    pub can_be_edited: bool,
    #[serde(default)]
    pub can_be_forwarded: bool,
    #[serde(default)]
    pub can_be_deleted_for_all_users: bool,
    #[serde(default)]
    pub can_be_deleted_only_for_self: bool,
    #[serde(default)]
    pub reply_to_message_id: Option<i64>,
    #[serde(default)]
    pub sending_state: Option<SendingState>,
    #[serde(default = "default_raw")]
    #[serde(skip_serializing)]
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "@type")]
pub enum SendingState {
    #[serde(rename = "messageSendingStatePending")]
    Pending,
    #[serde(rename = "messageSendingStateFailed")]
    Failed,
}

/// File sub-record, resolved from a content variant by [`crate::store::msg_proxy::MsgProxy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: i64,
    pub size: u64,
    #[serde(default)]
    pub expected_size: u64,
    pub local: LocalFile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalFile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub is_downloading_active: bool,
    #[serde(default)]
    pub is_downloading_completed: bool,
    #[serde(default)]
    pub downloaded_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub file_name: String,
    pub document: FileDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    /// Sizes are listed smallest-first in the wire format; the proxy picks
    /// the last (largest) one per §4.1 "for photo, select the last size".
    pub sizes: Vec<PhotoSize>,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSize {
    pub photo: FileDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audio {
    pub audio: FileDescriptor,
    pub duration: i64,
    #[serde(default)]
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub voice: FileDescriptor,
    pub duration: i64,
    #[serde(default)]
    pub is_listened: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub video: FileDescriptor,
    pub duration: i64,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoNote {
    pub video_note: FileDescriptor,
    pub duration: i64,
    #[serde(default)]
    pub is_viewed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animation {
    pub animation: FileDescriptor,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sticker {
    pub sticker: FileDescriptor,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub is_animated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    pub voter_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SystemEventKind {
    GroupCreate,
    AddMember,
    RemoveMember,
    TitleChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEvent {
    pub kind: SystemEventKind,
    #[serde(default)]
    pub text: String,
}

/// The "what kind of content is this message" sum type (§3 "Message
/// content variants"). `Unknown` preserves the raw `@type` tag so
/// rendering can fall back to `"[{kind}]"` the way the original's
/// `parse_content` does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum MessageContent {
    #[serde(rename = "messageText")]
    Text { text: TextContent },
    #[serde(rename = "messageDocument")]
    Document(Document),
    #[serde(rename = "messagePhoto")]
    Photo(Photo),
    #[serde(rename = "messageAudio")]
    Audio(Audio),
    #[serde(rename = "messageVoiceNote")]
    Voice(Voice),
    #[serde(rename = "messageVideo")]
    Video(Video),
    #[serde(rename = "messageVideoNote")]
    VideoNote(VideoNote),
    #[serde(rename = "messageAnimation")]
    Animation(Animation),
    #[serde(rename = "messageSticker")]
    Sticker(Sticker),
    #[serde(rename = "messagePoll")]
    Poll(Poll),
    #[serde(rename = "messageChatEvent")]
    SystemEvent(SystemEvent),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<TextEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEntity {
    pub offset: usize,
    pub length: usize,
    #[serde(rename = "type")]
    pub entity_type: TextEntityType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "@type")]
pub enum TextEntityType {
    #[serde(rename = "textEntityTypeUrl")]
    Url,
    #[serde(rename = "textEntityTypeTextUrl")]
    TextUrl { url: String },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyMarkupRow {
    pub buttons: Vec<ReplyMarkupButton>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyMarkupButton {
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub is_bot: bool,
    pub status: UserStatus,
}

/// §3 "a `status` sum-type". Timestamps are unix seconds, matching TDLib's
/// own convention (carried forward unchanged from `original_source`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "@type")]
pub enum UserStatus {
    #[serde(rename = "userStatusEmpty")]
    Empty,
    #[serde(rename = "userStatusOnline")]
    Online { expires: i64 },
    #[serde(rename = "userStatusOffline")]
    Offline { was_online: i64 },
    #[serde(rename = "userStatusRecently")]
    Recently,
    #[serde(rename = "userStatusLastWeek")]
    LastWeek,
    #[serde(rename = "userStatusLastMonth")]
    LastMonth,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicGroup {
    pub id: i64,
    pub member_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supergroup {
    pub id: i64,
    #[serde(default)]
    pub member_count: i64,
    #[serde(default)]
    pub is_channel: bool,
}

/// Per-chat transient "X is typing" fact (§3 "ChatAction").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "@type")]
pub enum ChatAction {
    #[serde(rename = "chatActionTyping")]
    Typing,
    #[serde(rename = "chatActionRecordingVoiceNote")]
    RecordingVoiceNote,
    #[serde(rename = "chatActionUploadingDocument")]
    UploadingDocument { progress: i32 },
    #[serde(rename = "chatActionUploadingPhoto")]
    UploadingPhoto { progress: i32 },
    #[serde(rename = "chatActionCancel")]
    Cancel,
    #[serde(other)]
    Unknown,
}

impl ChatAction {
    /// Status-line label for the message pane's title row (§4.7 "status =
    /// typing-action, or user presence ..."). `Cancel`/`Unknown` render as
    /// empty so the caller falls through to the next status source.
    pub fn label(&self) -> String {
        match self {
            ChatAction::Typing => "typing...".to_string(),
            ChatAction::RecordingVoiceNote => "recording voice...".to_string(),
            ChatAction::UploadingDocument { progress } => format!("uploading document {progress}%"),
            ChatAction::UploadingPhoto { progress } => format!("uploading photo {progress}%"),
            ChatAction::Cancel | ChatAction::Unknown => String::new(),
        }
    }
}

/// Backend connectivity state, surfaced in the chat-pane title (§4.6
/// `ConnectionState`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "@type")]
pub enum ConnectionState {
    #[serde(rename = "connectionStateWaitingForNetwork")]
    WaitingForNetwork,
    #[serde(rename = "connectionStateConnectingToProxy")]
    ConnectingToProxy,
    #[serde(rename = "connectionStateConnecting")]
    Connecting,
    #[serde(rename = "connectionStateUpdating")]
    Updating,
    #[serde(rename = "connectionStateReady")]
    Ready,
    #[serde(other)]
    Unknown,
}

impl ConnectionState {
    /// Label used for the chat-pane title (§4.6 "set the chat-pane title
    /// from a map of connection-state enums").
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::WaitingForNetwork => "Waiting for network…",
            ConnectionState::ConnectingToProxy => "Connecting to proxy…",
            ConnectionState::Connecting => "Connecting…",
            ConnectionState::Updating => "Updating…",
            ConnectionState::Ready => "",
            ConnectionState::Unknown => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_content_unknown_falls_back() {
        let v: MessageContent = serde_json::from_str(r#"{"@type":"messageSomethingNew"}"#).unwrap();
        assert!(matches!(v, MessageContent::Unknown));
    }

    #[test]
    fn user_status_round_trips() {
        let v: UserStatus = serde_json::from_str(r#"{"@type":"userStatusOnline","expires":123}"#).unwrap();
        assert_eq!(v, UserStatus::Online { expires: 123 });
    }

    #[test]
    fn connection_state_ready_has_empty_label() {
        assert_eq!(ConnectionState::Ready.label(), "");
        assert_eq!(ConnectionState::Connecting.label(), "Connecting…");
    }
}
