//! Typed error kinds for the application core (§7 Error handling design).
//!
//! `anyhow` is still used at the very top of `main` to collapse setup errors
//! (terminal init, backend login) into a single exit path, but everything
//! that flows through the controller and stores uses this enum so callers
//! can match on *kind* — e.g. to decide whether to surface a status-pane
//! message or just log and move on.

use thiserror::Error;

/// All fallible operations inside the core return this type.
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The MP reported `error` on a request. The `String` is `error_info`.
    #[error("backend request failed: {0}")]
    BackendRequestFailed(String),

    /// A message id was looked up and is known to not exist (memoized in
    /// `MessageStore::not_found`) or was looked up and the MP confirmed it
    /// is gone/inaccessible.
    #[error("message {msg_id} not found")]
    NotFound { msg_id: i64 },

    /// A remote record used a `@type`/status discriminator this build does
    /// not know about. Rendering falls back to a placeholder; this variant
    /// exists so the fallback path can still be logged at error level.
    #[error("unknown protocol kind: {0}")]
    ProtocolUnknown(String),

    /// A failure while talking to the terminal surface. Caught at the draw
    /// proxy so a single bad frame doesn't kill the draw loop.
    #[error("terminal draw error: {0}")]
    TerminalDraw(#[from] std::io::Error),

    /// The action was refused because of a permission flag on the chat or
    /// message (`can_be_edited`, `can_be_forwarded`, `can_send_messages`,
    /// or the self-chat mute guard).
    #[error("{0}")]
    CommandPermission(&'static str),

    /// The user cancelled an interactive prompt (Ctrl-G / Esc). Not a real
    /// error — command implementations treat it as an early, side-effect-free
    /// return.
    #[error("input cancelled")]
    InputCancelled,

    /// A helper subprocess exited non-zero.
    #[error("command `{cmd}` failed (status: {status:?})")]
    SubprocessFailed { cmd: String, status: Option<i32> },

    /// Unrecoverable: the backend or terminal could not be initialized.
    /// `main` exits the process after restoring terminal state.
    #[error("fatal: {0}")]
    Fatal(String),
}
