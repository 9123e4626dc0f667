//! Key-sequence resolver: numeric repeat-factor prefix + multi-char
//! keybinding prefix matching (§4.5 "Key dispatcher").
//!
//! Grounded in `tg/views/__init__.py`'s `View.get_keys` (digit
//! accumulation into `repeat_factor`, a `MULTICHAR_KEYBINDINGS`
//! prefix-matching loop bounded at `MAX_KEYBINDING_LENGTH = 5`) and
//! `tg/controllers/__init__.py`'s `handle_chats`/`handle_msgs`
//! `elif keys == ...` dispatch chains, which become a lookup table here.

/// A bound command slot, parameterized on the command identifier type `C`
/// so chat-mode and message-mode tables can share this resolver.
#[derive(Debug, Clone)]
pub struct Binding<C> {
    pub keys: &'static str,
    pub command: C,
    /// Whether the command consumes the accumulated `repeat_factor`
    /// (§4.5 "A bound command may declare `repeat_factor: bool`").
    pub takes_repeat: bool,
}

pub const MAX_KEYBINDING_LENGTH: usize = 5;

/// Accumulates digits into a repeat factor and non-digit characters into a
/// bounded key buffer, resolving against a static table of bindings after
/// each key.
pub struct KeyResolver<C: 'static> {
    bindings: &'static [Binding<C>],
    repeat_factor: u32,
    buffer: String,
}

/// Carries the repeat factor alongside a resolved match; returned by
/// [`KeyResolver::feed_with_repeat`]. `repeat_factor` is `None` when the
/// matched binding doesn't declare `takes_repeat`.
pub struct Matched<'a, C> {
    pub command: &'a C,
    pub repeat_factor: Option<u32>,
}

impl<C: 'static> KeyResolver<C> {
    pub fn new(bindings: &'static [Binding<C>]) -> Self {
        KeyResolver {
            bindings,
            repeat_factor: 0,
            buffer: String::new(),
        }
    }

    pub fn reset(&mut self) {
        self.repeat_factor = 0;
        self.buffer.clear();
    }

    fn effective_repeat(&self) -> u32 {
        if self.repeat_factor == 0 {
            1
        } else {
            self.repeat_factor
        }
    }

    /// Feeds one character. Digits (only while no non-digit key has been
    /// buffered yet) accumulate into the repeat factor; anything else
    /// appends to the key buffer, bounded at [`MAX_KEYBINDING_LENGTH`].
    /// Returns `Some` once the buffer resolves to an exact binding match;
    /// `None` while the buffer is empty, a pending prefix, or was just
    /// reset because nothing could match it.
    pub fn feed_with_repeat(&mut self, ch: char) -> Option<Matched<'_, C>> {
        if ch.is_ascii_digit() && self.buffer.is_empty() && !(ch == '0' && self.repeat_factor == 0) {
            self.repeat_factor = self.repeat_factor.saturating_mul(10) + ch.to_digit(10).unwrap();
            return None;
        }
        self.buffer.push(ch);
        if self.buffer.chars().count() > MAX_KEYBINDING_LENGTH {
            self.reset();
            return None;
        }
        if let Some(binding) = self.bindings.iter().find(|b| b.keys == self.buffer) {
            let repeat = self.effective_repeat();
            self.reset();
            return Some(Matched {
                command: &binding.command,
                repeat_factor: if binding.takes_repeat { Some(repeat) } else { None },
            });
        }
        if !self.bindings.iter().any(|b| b.keys.starts_with(self.buffer.as_str())) {
            self.reset();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cmd {
        NextChat,
        DeleteMsgs,
        JumpDown,
    }

    const BINDINGS: &[Binding<Cmd>] = &[
        Binding { keys: "j", command: Cmd::NextChat, takes_repeat: true },
        Binding { keys: "dd", command: Cmd::DeleteMsgs, takes_repeat: false },
        Binding { keys: "gg", command: Cmd::JumpDown, takes_repeat: false },
    ];

    #[test]
    fn simple_binding_matches_without_repeat() {
        let mut resolver = KeyResolver::new(BINDINGS);
        let matched = resolver.feed_with_repeat('j').unwrap();
        assert_eq!(*matched.command, Cmd::NextChat);
        assert_eq!(matched.repeat_factor, Some(1));
    }

    #[test]
    fn digits_accumulate_into_repeat_factor() {
        let mut resolver = KeyResolver::new(BINDINGS);
        assert!(resolver.feed_with_repeat('1').is_none());
        assert!(resolver.feed_with_repeat('0').is_none());
        let matched = resolver.feed_with_repeat('j').unwrap();
        assert_eq!(matched.repeat_factor, Some(10));
    }

    #[test]
    fn two_char_binding_requires_both_keys() {
        let mut resolver = KeyResolver::new(BINDINGS);
        assert!(resolver.feed_with_repeat('d').is_none());
        let matched = resolver.feed_with_repeat('d').unwrap();
        assert_eq!(*matched.command, Cmd::DeleteMsgs);
    }

    #[test]
    fn unbound_prefix_resets_buffer() {
        let mut resolver = KeyResolver::new(BINDINGS);
        assert!(resolver.feed_with_repeat('z').is_none());
        // buffer reset; 'j' should resolve fresh.
        let matched = resolver.feed_with_repeat('j').unwrap();
        assert_eq!(*matched.command, Cmd::NextChat);
    }
}
