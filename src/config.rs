//! Configuration surface (§6 "Configuration surface").
//!
//! Unlike a chat-over-the-network client, this configuration has nothing to
//! do with server addresses or identity — it's entirely about local paths,
//! helper command templates, and display knobs. It loads from a TOML file
//! at `~/.config/piper-chat/config.toml`, with every field optional and
//! defaulted, mirroring the override-by-file pattern in `freeq-tui`'s
//! `config.rs` (`Config::load` falling back to `Self::default()` on a
//! missing or malformed file) adapted from that crate's session-oriented
//! fields to this crate's path/command-template fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::parse_size;

/// Default config file location: `~/.config/piper-chat/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("piper-chat")
        .join("config.toml")
}

/// Default media cache / log directory: `~/.cache/piper-chat/`.
fn default_files_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("piper-chat")
}

/// Raw, fully-optional TOML shape. Every field mirrors a config key from
/// §6; `None` means "use the built-in default" and is resolved by
/// [`Config::resolve`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    pub api_id: Option<String>,
    pub api_hash: Option<String>,
    pub phone: Option<String>,
    pub enc_key: Option<String>,
    pub files_dir: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub max_download_size: Option<String>,
    pub voice_record_cmd: Option<String>,
    pub long_msg_cmd: Option<String>,
    pub editor: Option<String>,
    pub default_open: Option<String>,
    pub copy_cmd: Option<String>,
    pub notify_cmd: Option<String>,
    pub icon_path: Option<PathBuf>,
    pub url_view: Option<String>,
    pub fzf: Option<String>,
    pub file_picker_cmd: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub view_text_cmd: Option<String>,
    pub users_colors: Option<Vec<String>>,
    pub keep_media: Option<u64>,
    pub chat_flags: Option<ChatFlagsConfig>,
    pub msg_flags: Option<MsgFlagsConfig>,
    pub tdlib_verbosity: Option<i32>,
    pub tdlib_path: Option<PathBuf>,
}

/// Overridable glyphs for chat-pane flags (unseen, seen, online, pinned,
/// muted, unread, secret — §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFlagsConfig {
    pub unseen: Option<String>,
    pub seen: Option<String>,
    pub online: Option<String>,
    pub pinned: Option<String>,
    pub muted: Option<String>,
    pub unread: Option<String>,
    pub secret: Option<String>,
}

/// Overridable glyphs for message-pane flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgFlagsConfig {
    pub edited: Option<String>,
    pub selected: Option<String>,
}

/// Fully resolved configuration: every field has a concrete value. This is
/// what the rest of the crate reads from; nothing downstream ever sees an
/// `Option` here.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_id: String,
    pub api_hash: String,
    pub phone: String,
    pub enc_key: String,
    pub files_dir: PathBuf,
    pub log_path: PathBuf,
    pub log_level: String,
    pub max_download_size: u64,
    pub voice_record_cmd: Option<String>,
    pub long_msg_cmd: String,
    pub editor: String,
    pub default_open: String,
    pub copy_cmd: Option<String>,
    pub notify_cmd: Option<String>,
    pub icon_path: Option<PathBuf>,
    pub url_view: Option<String>,
    pub fzf: String,
    pub file_picker_cmd: Option<String>,
    pub download_dir: PathBuf,
    pub view_text_cmd: String,
    pub users_colors: Vec<String>,
    pub keep_media: Option<u64>,
    pub chat_flags: ChatFlags,
    pub msg_flags: MsgFlags,
    pub tdlib_verbosity: i32,
    pub tdlib_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ChatFlags {
    pub unseen: String,
    pub seen: String,
    pub online: String,
    pub pinned: String,
    pub muted: String,
    pub unread: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct MsgFlags {
    pub edited: String,
    pub selected: String,
}

impl Default for ChatFlags {
    fn default() -> Self {
        Self {
            unseen: "○".into(),
            seen: "●".into(),
            online: "•".into(),
            pinned: "📌".into(),
            muted: "🔇".into(),
            unread: "#".into(),
            secret: "🔒".into(),
        }
    }
}

impl Default for MsgFlags {
    fn default() -> Self {
        Self {
            edited: "(edited)".into(),
            selected: "*".into(),
        }
    }
}

impl Config {
    /// Loads `path` (or the built-in default if `path` is `None`), merging
    /// whatever keys are present over the defaults. A missing file is not
    /// an error — a fresh install should still start with sane defaults,
    /// same as `freeq-tui::Config::load` falling back to `Self::default()`.
    pub fn load(path: Option<&Path>) -> Self {
        let path_buf = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);
        let raw = match std::fs::read_to_string(&path_buf) {
            Ok(contents) => match toml::from_str::<RawConfig>(&contents) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path_buf.display(), error = %e, "malformed config file, using defaults");
                    RawConfig::default()
                }
            },
            Err(_) => RawConfig::default(),
        };
        Self::resolve(raw)
    }

    /// An all-defaults `Config`, for tests that need a `Controller` but
    /// don't care about config values.
    #[cfg(test)]
    pub fn default_for_test() -> Self {
        Self::resolve(RawConfig::default())
    }

    fn resolve(raw: RawConfig) -> Self {
        let files_dir = raw.files_dir.unwrap_or_else(default_files_dir);
        let max_download_size = raw
            .max_download_size
            .as_deref()
            .and_then(parse_size)
            .unwrap_or(10_000_000);
        let chat_flags = raw.chat_flags.map(resolve_chat_flags).unwrap_or_default();
        let msg_flags = raw.msg_flags.map(resolve_msg_flags).unwrap_or_default();

        Config {
            api_id: raw.api_id.unwrap_or_default(),
            api_hash: raw.api_hash.unwrap_or_default(),
            phone: raw.phone.unwrap_or_default(),
            enc_key: raw.enc_key.unwrap_or_default(),
            log_path: raw
                .log_path
                .unwrap_or_else(|| files_dir.join("piper-chat.log")),
            log_level: raw.log_level.unwrap_or_else(|| "info".into()),
            max_download_size,
            voice_record_cmd: raw.voice_record_cmd,
            long_msg_cmd: raw
                .long_msg_cmd
                .unwrap_or_else(|| "${EDITOR:-vi} {file_path}".into()),
            editor: raw.editor.unwrap_or_else(|| "vi".into()),
            default_open: raw.default_open.unwrap_or_else(|| "system".into()),
            copy_cmd: raw.copy_cmd,
            notify_cmd: raw.notify_cmd,
            icon_path: raw.icon_path,
            url_view: raw.url_view,
            fzf: raw.fzf.unwrap_or_else(|| "fzf".into()),
            file_picker_cmd: raw.file_picker_cmd,
            download_dir: raw
                .download_dir
                .unwrap_or_else(|| dirs::download_dir().unwrap_or_else(|| files_dir.join("downloads"))),
            view_text_cmd: raw.view_text_cmd.unwrap_or_else(|| "less {file_path}".into()),
            users_colors: raw.users_colors.unwrap_or_default(),
            keep_media: raw.keep_media,
            chat_flags,
            msg_flags,
            tdlib_verbosity: raw.tdlib_verbosity.unwrap_or(0),
            tdlib_path: raw.tdlib_path,
            files_dir,
        }
    }
}

fn resolve_chat_flags(raw: ChatFlagsConfig) -> ChatFlags {
    let default = ChatFlags::default();
    ChatFlags {
        unseen: raw.unseen.unwrap_or(default.unseen),
        seen: raw.seen.unwrap_or(default.seen),
        online: raw.online.unwrap_or(default.online),
        pinned: raw.pinned.unwrap_or(default.pinned),
        muted: raw.muted.unwrap_or(default.muted),
        unread: raw.unread.unwrap_or(default.unread),
        secret: raw.secret.unwrap_or(default.secret),
    }
}

fn resolve_msg_flags(raw: MsgFlagsConfig) -> MsgFlags {
    let default = MsgFlags::default();
    MsgFlags {
        edited: raw.edited.unwrap_or(default.edited),
        selected: raw.selected.unwrap_or(default.selected),
    }
}

/// Startup sweep: removes files under `FILES_DIR/files` older than
/// `KEEP_MEDIA` days, per §6 "Persisted state". A `None` `keep_media`
/// disables the sweep entirely.
pub fn sweep_old_media(files_dir: &Path, keep_media_days: Option<u64>) -> std::io::Result<usize> {
    let Some(days) = keep_media_days else {
        return Ok(0);
    };
    let media_dir = files_dir.join("files");
    if !media_dir.is_dir() {
        return Ok(0);
    }
    let cutoff = std::time::SystemTime::now() - std::time::Duration::from_secs(days * 86_400);
    let mut removed = 0;
    for entry in std::fs::read_dir(&media_dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        if let Ok(modified) = metadata.modified() {
            if modified < cutoff {
                if std::fs::remove_file(entry.path()).is_ok() {
                    removed += 1;
                }
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_fills_in_defaults_for_empty_config() {
        let cfg = Config::resolve(RawConfig::default());
        assert_eq!(cfg.max_download_size, 10_000_000);
        assert_eq!(cfg.editor, "vi");
        assert_eq!(cfg.fzf, "fzf");
        assert_eq!(cfg.chat_flags.pinned, "📌");
    }

    #[test]
    fn resolve_honors_explicit_values() {
        let mut raw = RawConfig::default();
        raw.max_download_size = Some("5MB".into());
        raw.editor = Some("nvim".into());
        let cfg = Config::resolve(raw);
        assert_eq!(cfg.max_download_size, 5_000_000);
        assert_eq!(cfg.editor, "nvim");
    }

    #[test]
    fn load_falls_back_to_defaults_on_missing_file() {
        let cfg = Config::load(Some(Path::new("/nonexistent/piper-chat-config.toml")));
        assert_eq!(cfg.editor, "vi");
    }

    #[test]
    fn load_parses_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "editor = \"emacs\"\nmax_download_size = \"1MB\"\n").unwrap();
        let cfg = Config::load(Some(&path));
        assert_eq!(cfg.editor, "emacs");
        assert_eq!(cfg.max_download_size, 1_000_000);
    }

    #[test]
    fn sweep_old_media_skips_when_keep_media_unset() {
        let dir = tempfile::tempdir().unwrap();
        let removed = sweep_old_media(dir.path(), None).unwrap();
        assert_eq!(removed, 0);
    }
}
