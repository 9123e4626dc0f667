//! Color-pair allocation and the deterministic per-user color rule (§4.7
//! "Colors and attributes").
//!
//! Grounded in `tg/colors.py`'s palette-indexing scheme, reimplemented
//! with the `sha1` crate since hashing a label into a palette index is the
//! same idea either language expresses it in: `SHA-1(label) mod
//! |palette|` gives a stable color per display name without a central
//! allocation table that would need to be kept in sync across redraws.

use sha1::{Digest, Sha1};

/// A 16-color terminal palette, matching `crossterm::style::Color`'s
/// basic ANSI set (the teacher's own terminal dependency) rather than
/// inventing an RGB palette the spec's TS interface doesn't ask for.
pub const PALETTE: &[crossterm::style::Color] = &[
    crossterm::style::Color::Red,
    crossterm::style::Color::Green,
    crossterm::style::Color::Yellow,
    crossterm::style::Color::Blue,
    crossterm::style::Color::Magenta,
    crossterm::style::Color::Cyan,
    crossterm::style::Color::DarkRed,
    crossterm::style::Color::DarkGreen,
    crossterm::style::Color::DarkYellow,
    crossterm::style::Color::DarkBlue,
    crossterm::style::Color::DarkMagenta,
    crossterm::style::Color::DarkCyan,
];

/// Deterministic per-user color: `SHA-1(label) mod |palette|`. Two users
/// with the same display label get the same color, which is accepted —
/// the point is visual stability across redraws and sessions, not
/// collision-freedom. Uses the built-in [`PALETTE`]; see
/// [`color_for_label_in`] for the `USERS_COLORS`-overridable version.
pub fn color_for_label(label: &str) -> crossterm::style::Color {
    color_for_label_in(label, PALETTE)
}

/// Same rule as [`color_for_label`] against a caller-supplied palette, so
/// a `USERS_COLORS` config override (§6 "Configuration surface") can
/// replace the built-in 12-color set without touching the hashing logic.
pub fn color_for_label_in(label: &str, palette: &[crossterm::style::Color]) -> crossterm::style::Color {
    if palette.is_empty() {
        return crossterm::style::Color::White;
    }
    let mut hasher = Sha1::new();
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    // First 8 bytes as a big-endian integer is plenty of entropy for an
    // index into a small palette.
    let mut acc: u64 = 0;
    for byte in &digest[..8] {
        acc = acc.wrapping_shl(8) | *byte as u64;
    }
    let idx = (acc % palette.len() as u64) as usize;
    palette[idx]
}

/// Parses `USERS_COLORS` config entries (color names like `"red"` or
/// `"darkmagenta"`) into a palette, skipping any name that doesn't match
/// one of [`PALETTE`]'s basic ANSI colors. An empty or all-unrecognized
/// list falls back to the built-in palette, so a typo in the config file
/// degrades to the default rather than disabling per-user color.
pub fn resolve_palette(names: &[String]) -> Vec<crossterm::style::Color> {
    let resolved: Vec<crossterm::style::Color> = names.iter().filter_map(|n| parse_color_name(n)).collect();
    if resolved.is_empty() {
        PALETTE.to_vec()
    } else {
        resolved
    }
}

fn parse_color_name(name: &str) -> Option<crossterm::style::Color> {
    use crossterm::style::Color;
    match name.to_ascii_lowercase().as_str() {
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "black" => Some(Color::Black),
        "darkred" => Some(Color::DarkRed),
        "darkgreen" => Some(Color::DarkGreen),
        "darkyellow" => Some(Color::DarkYellow),
        "darkblue" => Some(Color::DarkBlue),
        "darkmagenta" => Some(Color::DarkMagenta),
        "darkcyan" => Some(Color::DarkCyan),
        "grey" | "gray" => Some(Color::Grey),
        _ => None,
    }
}

/// Attribute flags layered on top of a color, per §4.7's
/// `normal|bold|reverse|underline|dim` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attrs {
    pub bold: bool,
    pub reverse: bool,
    pub underline: bool,
    pub dim: bool,
}

impl Attrs {
    pub const NORMAL: Attrs = Attrs {
        bold: false,
        reverse: false,
        underline: false,
        dim: false,
    };

    pub const REVERSE: Attrs = Attrs {
        bold: false,
        reverse: true,
        underline: false,
        dim: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_for_label_is_deterministic() {
        assert_eq!(color_for_label("alice"), color_for_label("alice"));
    }

    #[test]
    fn color_for_label_picks_from_palette() {
        let color = color_for_label("bob");
        assert!(PALETTE.contains(&color));
    }

    #[test]
    fn resolve_palette_parses_known_names_case_insensitively() {
        let palette = resolve_palette(&["Red".into(), "darkcyan".into()]);
        assert_eq!(palette, vec![crossterm::style::Color::Red, crossterm::style::Color::DarkCyan]);
    }

    #[test]
    fn resolve_palette_falls_back_to_default_when_all_names_unknown() {
        let palette = resolve_palette(&["not-a-color".into()]);
        assert_eq!(palette, PALETTE.to_vec());
    }

    #[test]
    fn color_for_label_in_is_stable_for_a_given_palette() {
        let palette = resolve_palette(&["red".into(), "green".into()]);
        assert_eq!(color_for_label_in("alice", &palette), color_for_label_in("alice", &palette));
        assert!(palette.contains(&color_for_label_in("alice", &palette)));
    }
}
