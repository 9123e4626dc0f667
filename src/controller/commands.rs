//! Command implementations (§4.5 "Commands").
//!
//! Grounded in `tg/controllers/__init__.py`'s per-key handler bodies
//! (`handle_chats`/`handle_msgs`), each of which calls straight through to
//! an MP method and either updates the model or reports a status message.
//! The larger command set §4.5 names beyond that early snapshot (chat
//! admin actions, file send/receive, voice recording, URL handling,
//! reply-markup) is grounded on the corresponding MP call named in §6 and
//! dispatched through the same table.

use std::path::PathBuf;

use rand::Rng;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::mp::types::{ChatAction, ChatType, Message, TextEntityType};
use crate::mp::SendFileOptions;
use crate::shell::shell_quote;
use crate::store::MsgProxy;
use crate::view::Suspend;

use super::{CommandOutcome, ConfirmKind, Controller, LinePromptKind};

/// Chat-mode commands (§4.5 "Commands … Navigation (chat-mode) … Chat
/// actions").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    NextChat,
    PrevChat,
    FirstChat,
    JumpDown10,
    JumpUp10,
    EnterMessageMode,
    ToggleUnread,
    TogglePin,
    ToggleMute,
    MarkAllRead,
    DeleteChat,
    SearchContacts,
    JumpNextFound,
    JumpPrevFound,
    ShowHelp,
    NewSecretChat,
    NewGroup,
    Quit,
}

/// Message-mode commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgCommand {
    NextMsg,
    PrevMsg,
    JumpDown10,
    JumpUp10,
    Bottom,
    BackToChatMode,
    Reply,
    ReplyLong,
    WriteNew,
    WriteNewLong,
    EditOwn,
    DeleteSelected,
    ForwardYanked,
    Yank,
    ToggleSelect,
    ToggleSelectBack,
    DiscardSelection,
    SaveFiles,
    OpenMsg,
    OpenWith,
    OpenUrl,
    DownloadCurrentFile,
    JumpToReply,
    RecordVoice,
    SendFileByPath,
    SendChosenFile,
    ShowChatInfo,
    ShowUserInfo,
}

/// `2^31 - 1`, the `mute_for` value that mutes a chat indefinitely (§4.5
/// "toggle mute").
pub const MUTE_FOREVER: i64 = i32::MAX as i64;

/// Marks a quoted line in a long-editor reply's scratch file, grounded in
/// `original_source`'s `tg/controllers.py::REPLY_MSG_PREFIX`.
pub const REPLY_MSG_PREFIX: &str = "# >";

/// Quotes `text` line-by-line with [`REPLY_MSG_PREFIX`] and appends a
/// blank line so the editor opens with the cursor past the quote,
/// mirroring `original_source`'s `insert_replied_msg`.
pub fn insert_replied_msg(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let quoted: Vec<String> = text.lines().map(|line| format!("{REPLY_MSG_PREFIX} {line}")).collect();
    format!("{}\n \n", quoted.join("\n"))
}

/// Drops every line starting with [`REPLY_MSG_PREFIX`], the inverse of
/// [`insert_replied_msg`] applied to the editor's saved file — whatever
/// the user typed below the quote survives unchanged.
pub fn strip_replied_msg(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with(REPLY_MSG_PREFIX))
        .collect::<Vec<_>>()
        .join("\n")
}

fn current_chat(controller: &Controller) -> Result<i64> {
    controller
        .model
        .current_chat_id()
        .ok_or_else(|| AppError::CommandPermission("no chat selected"))
}

pub fn next_chat(controller: &mut Controller, repeat: u32) -> CommandOutcome {
    let wanted = controller.model.current_chat_index + repeat as usize;
    // Page the backend before clamping so scrolling past what's loaded so
    // far actually reaches further chats instead of stalling at whatever
    // `load_next` happened to prime on startup (§4.3 "fetch(offset,
    // limit)").
    controller.model.chats.fetch(controller.mp.as_ref(), 0, wanted + 1);
    let len = controller.model.chats.active.len();
    if len == 0 {
        return CommandOutcome::Continue;
    }
    let target = wanted.min(len.saturating_sub(1));
    if target > 0 {
        controller.model.current_chat_index = target;
    }
    CommandOutcome::Continue
}

pub fn prev_chat(controller: &mut Controller, repeat: u32) -> CommandOutcome {
    controller.model.current_chat_index = controller.model.current_chat_index.saturating_sub(repeat as usize);
    CommandOutcome::Continue
}

pub fn toggle_mute(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let chat = controller
        .model
        .chats
        .get(chat_id)
        .ok_or(AppError::CommandPermission("unknown chat"))?;
    if let crate::mp::types::ChatType::Private { user_id } = chat.chat_type {
        if controller.model.users.me().map(|m| m.id) == Some(user_id) {
            return Err(AppError::CommandPermission("Can't mute yourself"));
        }
    }
    let currently_muted = chat
        .notification_settings
        .as_ref()
        .map(|s| s.mute_for != 0)
        .unwrap_or(false);
    let mute_for = if currently_muted { 0 } else { MUTE_FOREVER };
    controller
        .mp
        .set_chat_notification_settings(chat_id, crate::mp::ChatNotificationSettings { mute_for })
        .wait()?;
    controller.model.chats.update(chat_id, |c| {
        c.notification_settings = Some(crate::mp::types::NotificationSettings { mute_for });
    });
    Ok(CommandOutcome::Continue)
}

pub fn delete_selected_msgs(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let ids: Vec<i64> = controller.model.selected_in(chat_id).to_vec();
    let ids = if ids.is_empty() {
        vec![controller
            .model
            .msgs
            .index(chat_id)
            .get(controller.model.msgs.cursor(chat_id))
            .copied()
            .ok_or(AppError::CommandPermission("no message selected"))?]
    } else {
        ids
    };
    for id in &ids {
        let allowed = controller
            .model
            .msgs
            .get(chat_id, *id)
            .map(|m| can_be_deleted(chat_id, m))
            .unwrap_or(false);
        if !allowed {
            return Err(AppError::CommandPermission("Can't delete msg(s)"));
        }
    }
    controller.mp.delete_messages(chat_id, ids.clone(), true).wait()?;
    controller.model.msgs.remove(chat_id, &ids);
    controller.model.discard_selection(chat_id);
    controller.report_info("Message deleted");
    Ok(CommandOutcome::Continue)
}

/// Mirrors `original_source`'s `can_be_deleted` (`tg/models.py`): in the
/// self-chat (Saved Messages, where the chat id equals the sender's own
/// user id), only `can_be_deleted_only_for_self` governs; everywhere else
/// it's `can_be_deleted_for_all_users`.
fn can_be_deleted(chat_id: i64, msg: &Message) -> bool {
    if chat_id == msg.sender_id {
        msg.can_be_deleted_only_for_self
    } else {
        msg.can_be_deleted_for_all_users
    }
}

pub fn forward_yanked(controller: &mut Controller) -> Result<CommandOutcome> {
    let (from_chat_id, ids) = controller
        .model
        .copied_msgs
        .clone()
        .ok_or(AppError::CommandPermission("nothing copied"))?;
    for id in &ids {
        let allowed = controller
            .model
            .msgs
            .get(from_chat_id, *id)
            .map(|m| m.can_be_forwarded)
            .unwrap_or(false);
        if !allowed {
            return Err(AppError::CommandPermission("Can't forward msg(s)"));
        }
    }
    let to_chat_id = current_chat(controller)?;
    controller.mp.forward_messages(to_chat_id, from_chat_id, ids).wait()?;
    Ok(CommandOutcome::Continue)
}

pub fn yank(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let selected = controller.model.selected_in(chat_id).to_vec();
    let ids = if selected.is_empty() {
        let cursor = controller.model.msgs.cursor(chat_id);
        vec![*controller
            .model
            .msgs
            .index(chat_id)
            .get(cursor)
            .ok_or(AppError::CommandPermission("no message to yank"))?]
    } else {
        selected
    };
    let mut pieces = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(msg) = controller.model.msgs.get_mut(chat_id, *id) {
            let proxy = MsgProxy::new(msg);
            if let Some(text) = proxy.text_content().or_else(|| proxy.caption()) {
                pieces.push(text.to_string());
            } else if let Some(path) = proxy.local_path() {
                pieces.push(path.to_string());
            }
        }
    }
    controller.model.set_copied(chat_id, ids);
    if !pieces.is_empty() {
        let copy_cmd = controller.config.copy_cmd.clone();
        if let Err(e) = controller.shell.copy_to_clipboard(&pieces.join("\n"), copy_cmd.as_deref()) {
            warn!(error = %e, "clipboard copy failed");
        }
    }
    Ok(CommandOutcome::Continue)
}

/// Send-message discipline: `view_all_msgs` is called immediately before
/// sending so the unread boundary advances, per §4.5 "Send-message
/// discipline".
pub fn send_text(controller: &mut Controller, text: String) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    view_all_msgs(controller, chat_id)?;
    controller.mp.send_chat_action(chat_id, ChatAction::Cancel).wait()?;
    let msg = controller.model.msgs.send(controller.mp.as_ref(), chat_id, text)?;
    controller.model.msgs.add(chat_id, msg);
    controller.report_info("Message sent");
    Ok(CommandOutcome::Continue)
}

pub fn view_all_msgs(controller: &mut Controller, chat_id: i64) -> Result<()> {
    let Some(last_id) = controller.model.msgs.index(chat_id).first().copied() else {
        return Ok(());
    };
    controller.mp.view_messages(chat_id, vec![last_id], true).wait()
}

pub fn download_current_file(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let cursor = controller.model.msgs.cursor(chat_id);
    let msg_id = *controller
        .model
        .msgs
        .index(chat_id)
        .get(cursor)
        .ok_or(AppError::CommandPermission("no message selected"))?;
    let msg = controller
        .model
        .msgs
        .get_mut(chat_id, msg_id)
        .ok_or(AppError::NotFound { msg_id })?;
    let proxy = crate::store::MsgProxy::new(msg);
    let file_id = proxy.file_id().ok_or(AppError::CommandPermission("message has no file"))?;
    controller.model.downloads.insert(file_id, (chat_id, msg_id));
    controller.mp.download_file(file_id, 1, 0, 0, false).wait()?;
    Ok(CommandOutcome::Continue)
}

pub fn send_file(
    controller: &mut Controller,
    kind: FileKind,
    path: String,
    opts: SendFileOptions,
) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg = match kind {
        FileKind::Document => controller.mp.send_doc(chat_id, path, opts),
        FileKind::Audio => controller.mp.send_audio(chat_id, path, opts),
        FileKind::Photo => controller.mp.send_photo(chat_id, path, opts),
        FileKind::Video => controller.mp.send_video(chat_id, path, opts),
        FileKind::Voice => controller.mp.send_voice(chat_id, path, opts),
        FileKind::Animation => controller.mp.send_animation(chat_id, path, opts),
    }
    .wait()?;
    controller.model.msgs.add(chat_id, msg);
    Ok(CommandOutcome::Continue)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Document,
    Audio,
    Photo,
    Video,
    Voice,
    Animation,
}

pub fn toggle_unread(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let marked = controller
        .model
        .chats
        .get(chat_id)
        .map(|c| !c.is_marked_as_unread)
        .ok_or(AppError::CommandPermission("unknown chat"))?;
    controller.mp.toggle_chat_is_marked_as_unread(chat_id, marked).wait()?;
    controller.model.chats.update(chat_id, |c| c.is_marked_as_unread = marked);
    Ok(CommandOutcome::Continue)
}

pub fn toggle_pin(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let pinned = controller
        .model
        .chats
        .get(chat_id)
        .map(|c| !c.is_pinned)
        .ok_or(AppError::CommandPermission("unknown chat"))?;
    controller.mp.toggle_chat_is_pinned(chat_id, pinned).wait()?;
    controller.model.chats.update(chat_id, |c| c.is_pinned = pinned);
    Ok(CommandOutcome::Continue)
}

pub fn mark_all_read(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    view_all_msgs(controller, chat_id)?;
    controller.model.chats.update(chat_id, |c| {
        c.unread_count = 0;
        c.is_marked_as_unread = false;
    });
    Ok(CommandOutcome::Continue)
}

pub fn delete_chat(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    Ok(controller.begin_confirm(ConfirmKind::DeleteChat { chat_id }))
}

/// Rotates to the next/previous chat-title search hit and relocates the
/// cursor directly, bypassing `set_current_chat_index`'s zero-forbidding
/// guard the same way `ChatCommand::FirstChat` does — both are explicit
/// jump commands, not the ordinary up/down walk that guard is meant to
/// bound.
pub fn jump_found(controller: &mut Controller, backwards: bool) -> CommandOutcome {
    match controller.model.chats.next_found(backwards) {
        Some(chat_id) => {
            if let Some(idx) = controller.model.chats.index_of_id(chat_id) {
                controller.model.current_chat_index = idx;
            }
        }
        None => controller.report_error("No matches"),
    }
    CommandOutcome::Continue
}

/// No dedicated help overlay exists in this build; `?` surfaces the
/// command summary on the status line instead.
pub fn show_help(controller: &mut Controller) -> CommandOutcome {
    controller.report_info(
        "j/k move  gg top  l/Enter open  u unread  p pin  m mute  r read-all  \
         dd delete  / search  n/N cycle  gs secret chat  gc group  q quit",
    );
    CommandOutcome::Continue
}

pub fn begin_reply(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg_id = current_msg_id(controller, chat_id)?;
    Ok(controller.begin_line_prompt(LinePromptKind::Reply { reply_to: msg_id }))
}

/// Long-editor reply variant (§4.5 "reply (short or long-editor)"):
/// quotes the current message into a scratch file (`insert_replied_msg`),
/// suspends the TUI to edit it, then strips the quote back out
/// (`strip_replied_msg`) before sending whatever the user wrote below it.
pub fn begin_reply_long(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg_id = current_msg_id(controller, chat_id)?;
    let quoted = controller
        .model
        .msgs
        .get_mut(chat_id, msg_id)
        .map(|msg| {
            let proxy = MsgProxy::new(msg);
            proxy
                .text_content()
                .map(str::to_string)
                .or_else(|| proxy.caption().map(str::to_string))
                .unwrap_or_default()
        })
        .ok_or(AppError::NotFound { msg_id })?;
    let prefill = insert_replied_msg(&quoted);
    let path = spawn_long_editor(controller, Some(&prefill))?;
    let contents = std::fs::read_to_string(&path).unwrap_or_default();
    let _ = std::fs::remove_file(&path);
    let text = strip_replied_msg(&contents).trim().to_string();
    if text.is_empty() {
        controller.mp.send_chat_action(chat_id, ChatAction::Cancel).wait()?;
        controller.report_info("Message wasn't sent");
        return Ok(CommandOutcome::Continue);
    }
    view_all_msgs(controller, chat_id)?;
    controller.mp.send_chat_action(chat_id, ChatAction::Cancel).wait()?;
    let msg = controller.mp.reply_message(chat_id, msg_id, text).wait()?;
    controller.model.msgs.add(chat_id, msg);
    controller.report_info("Message sent");
    Ok(CommandOutcome::Continue)
}

pub fn begin_edit_own(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg_id = current_msg_id(controller, chat_id)?;
    let msg = controller
        .model
        .msgs
        .get_mut(chat_id, msg_id)
        .ok_or(AppError::NotFound { msg_id })?;
    let proxy = MsgProxy::new(msg);
    if !proxy.can_be_edited() {
        return Err(AppError::CommandPermission("Can't edit this message"));
    }
    let text = proxy
        .text_content()
        .ok_or(AppError::CommandPermission("Only text messages can be edited"))?
        .to_string();
    Ok(controller.begin_line_prompt_prefilled(LinePromptKind::EditOwn { msg_id }, &text))
}

/// Writes `prefill` (if any) to a fresh temp file, suspends the TUI to run
/// `long_msg_cmd` against it, and hands back the path for the caller to
/// read back and clean up. The unique suffix is `rand`-derived rather than
/// pid/timestamp-based so two editors opened back to back never collide.
fn spawn_long_editor(controller: &Controller, prefill: Option<&str>) -> Result<PathBuf> {
    let unique: u64 = rand::rng().random();
    let path = std::env::temp_dir().join(format!("piper-chat-{unique:x}.txt"));
    if let Some(text) = prefill {
        std::fs::write(&path, text)?;
    }
    let cmd = controller.config.long_msg_cmd.replace("{file_path}", &path.to_string_lossy());
    {
        let _suspend = Suspend::enter()?;
        controller.shell.run(&cmd)?;
    }
    Ok(path)
}

/// Opens `$EDITOR` on a scratch file; an empty result cancels the compose
/// instead of sending a blank message (§8 long-editor scenario).
pub fn write_new_long(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let path = spawn_long_editor(controller, None)?;
    let contents = std::fs::read_to_string(&path).unwrap_or_default();
    let _ = std::fs::remove_file(&path);
    let text = contents.trim().to_string();
    if text.is_empty() {
        controller.mp.send_chat_action(chat_id, ChatAction::Cancel).wait()?;
        controller.report_info("Message wasn't sent");
        return Ok(CommandOutcome::Continue);
    }
    send_text(controller, text)?;
    Ok(CommandOutcome::Continue)
}

/// Queues downloads for the nearest unfetched file attachments around the
/// cursor. There is no viewport plumbed through to the command layer, so
/// "shown in current view" is approximated as a 20-message window
/// centered on the cursor.
pub fn save_files(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let cursor = controller.model.msgs.cursor(chat_id);
    let window: Vec<i64> = controller
        .model
        .msgs
        .index(chat_id)
        .iter()
        .skip(cursor.saturating_sub(10))
        .take(20)
        .copied()
        .collect();
    let mut queued = 0;
    for msg_id in window {
        let Some(msg) = controller.model.msgs.get_mut(chat_id, msg_id) else {
            continue;
        };
        let proxy = MsgProxy::new(msg);
        if proxy.is_downloaded() {
            continue;
        }
        let Some(file_id) = proxy.file_id() else {
            continue;
        };
        controller.model.downloads.insert(file_id, (chat_id, msg_id));
        controller.mp.download_file(file_id, 1, 0, 0, false).wait()?;
        queued += 1;
    }
    controller.report_info(format!("Queued {queued} file(s) for download"));
    Ok(CommandOutcome::Continue)
}

pub fn open_msg(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg_id = current_msg_id(controller, chat_id)?;
    let msg = controller
        .model
        .msgs
        .get_mut(chat_id, msg_id)
        .ok_or(AppError::NotFound { msg_id })?;
    let path = MsgProxy::new(msg)
        .local_path()
        .filter(|p| !p.is_empty())
        .ok_or(AppError::CommandPermission("file not downloaded"))?
        .to_string();
    controller.mp.open_message_content(chat_id, msg_id).wait()?;
    controller.model.msgs.update_content_opened(chat_id, msg_id);
    let _suspend = Suspend::enter()?;
    controller.shell.open_file(std::path::Path::new(&path), None)?;
    Ok(CommandOutcome::Continue)
}

pub fn begin_open_with(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg_id = current_msg_id(controller, chat_id)?;
    Ok(controller.begin_line_prompt(LinePromptKind::OpenWith { msg_id }))
}

/// Entity offsets are byte-model TDLib UTF-16 code unit counts in the wire
/// format; this build models them as `char` offsets instead (§3 REDESIGN
/// FLAG), which only misaligns `textEntityTypeUrl` extraction on messages
/// containing astral-plane characters before the link.
fn message_urls(msg: &Message) -> Vec<String> {
    let crate::mp::types::MessageContent::Text { text } = &msg.content else {
        return Vec::new();
    };
    let chars: Vec<char> = text.text.chars().collect();
    text.entities
        .iter()
        .filter_map(|e| match &e.entity_type {
            TextEntityType::TextUrl { url } => Some(url.clone()),
            TextEntityType::Url => {
                let end = (e.offset + e.length).min(chars.len());
                (e.offset < end).then(|| chars[e.offset..end].iter().collect())
            }
            TextEntityType::Unknown => None,
        })
        .collect()
}

/// A single link opens directly; several are piped through `url_view` (or
/// `fzf` as a fallback) so the user picks one (§4.5 "open URL").
pub fn open_url(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg_id = current_msg_id(controller, chat_id)?;
    let msg = controller.model.msgs.get(chat_id, msg_id).ok_or(AppError::NotFound { msg_id })?;
    let urls = message_urls(msg);
    match urls.len() {
        0 => Err(AppError::CommandPermission("message has no links")),
        1 => {
            controller.shell.open_default(&urls[0])?;
            Ok(CommandOutcome::Continue)
        }
        _ => {
            let chooser = controller.config.url_view.clone().unwrap_or_else(|| controller.config.fzf.clone());
            let list = urls.join("\n");
            let chosen = {
                let _suspend = Suspend::enter()?;
                controller.shell.run_with_input(&chooser, &list)?
            };
            if chosen.is_empty() {
                return Ok(CommandOutcome::Continue);
            }
            controller.shell.open_default(&chosen)?;
            Ok(CommandOutcome::Continue)
        }
    }
}

/// §7 "NotFound: recorded in MessageStore.not_found... callers surface
/// 'Can't jump to reply msg: it's not preloaded or deleted'". Tries the
/// cache first, then falls back to `get_or_fetch` before giving up, so a
/// reply target outside the loaded window is still reachable.
pub fn jump_to_reply(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg_id = current_msg_id(controller, chat_id)?;
    let reply_to = controller
        .model
        .msgs
        .get(chat_id, msg_id)
        .and_then(|m| m.reply_to_message_id)
        .ok_or(AppError::CommandPermission("message has no reply"))?;
    if controller.model.msgs.jump_to(chat_id, reply_to) {
        return Ok(CommandOutcome::Continue);
    }
    controller.model.msgs.get_or_fetch(controller.mp.as_ref(), chat_id, reply_to);
    if controller.model.msgs.jump_to(chat_id, reply_to) {
        Ok(CommandOutcome::Continue)
    } else {
        Err(AppError::CommandPermission(
            "Can't jump to reply msg: it's not preloaded or deleted",
        ))
    }
}

/// Suspends the TUI to run `voice_record_cmd` against a scratch path,
/// probes the resulting duration with `ffprobe`, then asks for y/N before
/// sending — mirroring the long-editor flow's "nothing is sent until
/// confirmed" discipline.
pub fn record_voice(controller: &mut Controller) -> Result<CommandOutcome> {
    current_chat(controller)?;
    let template = controller
        .config
        .voice_record_cmd
        .clone()
        .ok_or(AppError::CommandPermission("voice_record_cmd is not configured"))?;
    let unique: u64 = rand::rng().random();
    let path = std::env::temp_dir().join(format!("piper-chat-voice-{unique:x}.ogg"));
    let cmd = template.replace("{file_path}", &path.to_string_lossy());
    {
        let _suspend = Suspend::enter()?;
        controller.shell.run(&cmd)?;
    }
    if !path.is_file() {
        return Err(AppError::CommandPermission("recording produced no file"));
    }
    let probe = format!(
        "ffprobe -v error -show_entries format=duration -of csv=p=0 {}",
        shell_quote(&path.to_string_lossy())
    );
    let duration = controller
        .shell
        .run_capturing_stdout(&probe)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .map(|secs| secs.round() as i64)
        .unwrap_or(0);
    Ok(controller.begin_confirm(ConfirmKind::RecordVoiceSend {
        path: path.to_string_lossy().into_owned(),
        duration,
    }))
}

pub fn begin_send_file_by_path(controller: &mut Controller) -> CommandOutcome {
    controller.begin_line_prompt(LinePromptKind::SendFileByPath)
}

/// Classifies a path's MIME type into the `send_*` family it should go
/// out as, used by both the by-path prompt and the external file picker.
fn classify_path(path: &str) -> FileKind {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let essence = mime.essence_str();
    if essence.starts_with("image/") {
        FileKind::Photo
    } else if essence.starts_with("video/") {
        FileKind::Video
    } else if essence.starts_with("audio/") {
        FileKind::Audio
    } else {
        FileKind::Document
    }
}

/// Runs the configured file picker with the terminal's own stdin attached
/// (so an interactive picker can read keystrokes) and sends back whatever
/// path it prints to stdout.
pub fn send_chosen_file(controller: &mut Controller) -> Result<CommandOutcome> {
    let template = controller
        .config
        .file_picker_cmd
        .clone()
        .ok_or(AppError::CommandPermission("file_picker_cmd is not configured"))?;
    let chosen = {
        let _suspend = Suspend::enter()?;
        controller.shell.run_capturing_stdout(&template)?
    };
    if chosen.is_empty() {
        return Ok(CommandOutcome::Continue);
    }
    let kind = classify_path(&chosen);
    send_file(controller, kind, chosen, SendFileOptions::default())
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// No dedicated chat-info overlay exists; a one-line summary goes to the
/// status pane instead (same simplification as [`show_help`]).
pub fn show_chat_info(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let chat = controller.model.chats.get(chat_id).ok_or(AppError::CommandPermission("unknown chat"))?;
    let info = match &chat.chat_type {
        ChatType::Private { user_id } => {
            let now = now_unix();
            let status = controller.model.users.status_label(*user_id, now);
            if status.is_empty() {
                chat.title.clone()
            } else {
                format!("{} — {status}", chat.title)
            }
        }
        ChatType::BasicGroup { .. } | ChatType::Supergroup { .. } => {
            format!("{} — {} members", chat.title, chat.member_count.unwrap_or(0))
        }
        ChatType::Secret { .. } => format!("{} (secret chat)", chat.title),
        ChatType::Unknown => chat.title.clone(),
    };
    controller.report_info(info);
    Ok(CommandOutcome::Continue)
}

pub fn show_user_info(controller: &mut Controller) -> Result<CommandOutcome> {
    let chat_id = current_chat(controller)?;
    let msg_id = current_msg_id(controller, chat_id)?;
    let sender_id = controller
        .model
        .msgs
        .get(chat_id, msg_id)
        .ok_or(AppError::NotFound { msg_id })?
        .sender_id;
    controller.model.users.get_user(controller.mp.as_ref(), sender_id);
    let now = now_unix();
    let label = controller.model.users.label(sender_id);
    let status = controller.model.users.status_label(sender_id, now);
    let info = if status.is_empty() { label } else { format!("{label} — {status}") };
    controller.report_info(info);
    Ok(CommandOutcome::Continue)
}

fn current_msg_id(controller: &Controller, chat_id: i64) -> Result<i64> {
    let cursor = controller.model.msgs.cursor(chat_id);
    controller
        .model
        .msgs
        .index(chat_id)
        .get(cursor)
        .copied()
        .ok_or(AppError::CommandPermission("no message selected"))
}

/// Dispatches a committed single-line prompt to the action its
/// [`LinePromptKind`] names. Grounded in the same per-handler-calls-MP
/// shape as the rest of this module; the prompt/resolve split exists only
/// because the terminal input has to return to the draw thread between
/// "ask" and "act" (§5).
pub fn resolve_line_prompt(controller: &mut Controller, kind: LinePromptKind, text: String) -> Result<CommandOutcome> {
    match kind {
        LinePromptKind::Reply { reply_to } => {
            if text.trim().is_empty() {
                return Ok(CommandOutcome::Continue);
            }
            let chat_id = current_chat(controller)?;
            view_all_msgs(controller, chat_id)?;
            controller.mp.send_chat_action(chat_id, ChatAction::Cancel).wait()?;
            let msg = controller.mp.reply_message(chat_id, reply_to, text).wait()?;
            controller.model.msgs.add(chat_id, msg);
            controller.report_info("Message sent");
            Ok(CommandOutcome::Continue)
        }
        LinePromptKind::WriteNew => {
            if text.trim().is_empty() {
                return Ok(CommandOutcome::Continue);
            }
            send_text(controller, text)
        }
        LinePromptKind::EditOwn { msg_id } => {
            if text.trim().is_empty() {
                return Err(AppError::CommandPermission("edited message can't be empty"));
            }
            let chat_id = current_chat(controller)?;
            if !controller.model.msgs.edit(controller.mp.as_ref(), chat_id, msg_id, text) {
                return Err(AppError::CommandPermission("edit was rejected"));
            }
            controller.report_info("Message edited");
            Ok(CommandOutcome::Continue)
        }
        LinePromptKind::SearchContacts => {
            controller.model.chats.search(&text);
            match controller.model.chats.found.first().copied() {
                Some(chat_id) => {
                    if let Some(idx) = controller.model.chats.index_of_id(chat_id) {
                        controller.model.current_chat_index = idx;
                    }
                    Ok(CommandOutcome::Continue)
                }
                None => Err(AppError::CommandPermission("No matches")),
            }
        }
        LinePromptKind::OpenWith { msg_id } => {
            let template = text.trim().to_string();
            if template.is_empty() {
                return Ok(CommandOutcome::Continue);
            }
            let chat_id = current_chat(controller)?;
            let msg = controller.model.msgs.get_mut(chat_id, msg_id).ok_or(AppError::NotFound { msg_id })?;
            let path = MsgProxy::new(msg)
                .local_path()
                .filter(|p| !p.is_empty())
                .ok_or(AppError::CommandPermission("file not downloaded"))?
                .to_string();
            let _suspend = Suspend::enter()?;
            controller.shell.open_file(std::path::Path::new(&path), Some(&template))?;
            Ok(CommandOutcome::Continue)
        }
        LinePromptKind::SendFileByPath => {
            let path = text.trim().to_string();
            if path.is_empty() {
                return Ok(CommandOutcome::Continue);
            }
            let kind = classify_path(&path);
            send_file(controller, kind, path, SendFileOptions::default())
        }
        LinePromptKind::NewSecretChatUser => {
            let user_id: i64 = text
                .trim()
                .parse()
                .map_err(|_| AppError::CommandPermission("expected a numeric user id"))?;
            let chat = controller.mp.create_new_secret_chat(user_id).wait()?;
            controller.model.chats.add(chat);
            Ok(CommandOutcome::Continue)
        }
        LinePromptKind::NewGroupUsers => {
            let mut user_ids = Vec::new();
            for part in text.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let id: i64 = part
                    .parse()
                    .map_err(|_| AppError::CommandPermission("expected comma-separated numeric user ids"))?;
                user_ids.push(id);
            }
            if user_ids.is_empty() {
                return Err(AppError::CommandPermission("at least one user id is required"));
            }
            Ok(controller.begin_line_prompt(LinePromptKind::NewGroupTitle { user_ids }))
        }
        LinePromptKind::NewGroupTitle { user_ids } => {
            let title = text.trim().to_string();
            if title.is_empty() {
                return Err(AppError::CommandPermission("group title can't be empty"));
            }
            let chat = controller.mp.create_new_basic_group_chat(user_ids, title).wait()?;
            controller.model.chats.add(chat);
            Ok(CommandOutcome::Continue)
        }
    }
}

/// Dispatches a resolved y/N confirmation. `DeleteChat` branches by chat
/// type (§4.5 "delete chat"): groups/supergroups leave, secret chats
/// close+delete, private chats ask a second revoke-for-all question via
/// `DeleteChatRevoke` before deleting history either way.
pub fn resolve_confirm(controller: &mut Controller, kind: ConfirmKind, yes: bool) -> Result<CommandOutcome> {
    match kind {
        ConfirmKind::DeleteChat { chat_id } => {
            if !yes {
                return Ok(CommandOutcome::Continue);
            }
            let chat_type = controller
                .model
                .chats
                .get(chat_id)
                .map(|c| c.chat_type.clone())
                .ok_or(AppError::CommandPermission("unknown chat"))?;
            match chat_type {
                ChatType::BasicGroup { .. } | ChatType::Supergroup { .. } => {
                    controller.mp.leave_chat(chat_id).wait()?;
                    controller.report_info("Left chat");
                    Ok(CommandOutcome::Continue)
                }
                ChatType::Secret { .. } => {
                    controller.mp.close_secret_chat(chat_id).wait()?;
                    controller.mp.delete_chat_history(chat_id, true, false).wait()?;
                    controller.report_info("Chat deleted");
                    Ok(CommandOutcome::Continue)
                }
                ChatType::Private { .. } | ChatType::Unknown => {
                    Ok(controller.begin_confirm(ConfirmKind::DeleteChatRevoke { chat_id }))
                }
            }
        }
        ConfirmKind::DeleteChatRevoke { chat_id } => {
            controller.mp.delete_chat_history(chat_id, true, yes).wait()?;
            controller.report_info("Chat deleted");
            Ok(CommandOutcome::Continue)
        }
        ConfirmKind::RecordVoiceSend { path, duration } => {
            if yes {
                send_file(
                    controller,
                    FileKind::Voice,
                    path.clone(),
                    SendFileOptions { duration: Some(duration), ..Default::default() },
                )?;
            } else {
                controller.report_info("Recording discarded");
            }
            let _ = std::fs::remove_file(&path);
            Ok(CommandOutcome::Continue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;

    #[test]
    fn toggle_mute_refuses_without_a_selected_chat() {
        let mut controller = Controller::for_test();
        let err = toggle_mute(&mut controller).unwrap_err();
        assert!(matches!(err, AppError::CommandPermission(_)));
    }

    #[test]
    fn insert_then_strip_replied_msg_recovers_the_typed_body() {
        let quoted = "original message\nsecond line";
        let new_body = "my reply";
        // What the long-editor's scratch file looks like once the user has
        // typed their reply below the inserted quote.
        let file_contents = format!("{}{new_body}", insert_replied_msg(quoted));
        assert!(strip_replied_msg(&file_contents).trim() == new_body.trim());
    }

    #[test]
    fn insert_replied_msg_prefixes_every_line() {
        let quoted = insert_replied_msg("a\nb");
        assert!(quoted.lines().filter(|l| !l.trim().is_empty()).all(|l| l.starts_with(REPLY_MSG_PREFIX)));
    }
}
