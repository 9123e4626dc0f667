//! Status pane: single status line / single-line editor (§4.7 "Status
//! pane").
//!
//! Grounded in `tg/views/__init__.py`'s `StatusView.get_input`: a raw
//! single-line editor loop that appends printable characters, treats
//! `DEL`/`^G`/`Enter` as control keys, and flips terminal echo/line
//! buffering around the loop, restoring it on every exit path including
//! errors.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::view::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorOutcome {
    Committed,
    Cancelled,
}

/// A single-line editor over a terminal surface. Callers drive it one key
/// at a time via [`Self::handle_key`] so command implementations can
/// interleave it with other blocking reads without owning the terminal
/// loop themselves.
pub struct LineEditor {
    buffer: String,
    cursor: usize,
}

impl LineEditor {
    pub fn new() -> Self {
        LineEditor {
            buffer: String::new(),
            cursor: 0,
        }
    }

    pub fn with_prefill(text: &str) -> Self {
        LineEditor {
            buffer: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Applies one key event. Returns `Some(outcome)` once the editor
    /// should stop (Enter commits, Ctrl-G or Esc cancels); `None` means
    /// keep editing.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<EditorOutcome> {
        match key.code {
            KeyCode::Enter => Some(EditorOutcome::Committed),
            KeyCode::Esc => Some(EditorOutcome::Cancelled),
            KeyCode::Char('g') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(EditorOutcome::Cancelled),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let byte_idx = self.byte_index(self.cursor);
                    self.buffer.remove(byte_idx);
                }
                None
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
                None
            }
            KeyCode::Char(c) => {
                let byte_idx = self.byte_index(self.cursor);
                self.buffer.insert(byte_idx, c);
                self.cursor += 1;
                None
            }
            _ => None,
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// Draws either a status message (`"Info: ..."`/`"Error: ..."`) or the
/// live editor buffer, depending on which is active.
pub fn draw_message(surface: &mut dyn Surface, level: StatusLevel, text: &str, row: u16, width: u16) -> crate::error::Result<()> {
    let label = match level {
        StatusLevel::Info => "Info",
        StatusLevel::Error => "Error",
    };
    let line = crate::util::truncate_to_len(&format!("{label}: {text}"), width as usize);
    surface.addstr(row, 0, &line, None, crate::view::theme::Attrs::NORMAL)
}

pub fn draw_editor(surface: &mut dyn Surface, editor: &LineEditor, row: u16, width: u16) -> crate::error::Result<()> {
    let line = crate::util::truncate_to_len(editor.text(), width as usize);
    surface.addstr(row, 0, &line, None, crate::view::theme::Attrs::NORMAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_then_enter_commits_buffer() {
        let mut editor = LineEditor::new();
        for c in "hello".chars() {
            assert!(editor.handle_key(key(KeyCode::Char(c))).is_none());
        }
        assert_eq!(editor.text(), "hello");
        assert_eq!(editor.handle_key(key(KeyCode::Enter)), Some(EditorOutcome::Committed));
    }

    #[test]
    fn esc_cancels() {
        let mut editor = LineEditor::new();
        editor.handle_key(key(KeyCode::Char('x')));
        assert_eq!(editor.handle_key(key(KeyCode::Esc)), Some(EditorOutcome::Cancelled));
    }

    #[test]
    fn ctrl_g_cancels() {
        let mut editor = LineEditor::new();
        let cancel_key = KeyEvent::new(KeyCode::Char('g'), KeyModifiers::CONTROL);
        assert_eq!(editor.handle_key(cancel_key), Some(EditorOutcome::Cancelled));
    }

    #[test]
    fn backspace_removes_last_char() {
        let mut editor = LineEditor::new();
        editor.handle_key(key(KeyCode::Char('a')));
        editor.handle_key(key(KeyCode::Char('b')));
        editor.handle_key(key(KeyCode::Backspace));
        assert_eq!(editor.text(), "a");
    }
}
