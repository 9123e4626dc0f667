//! Small stand-alone helpers shared across the crate: human-readable size and
//! duration formatting, the inverse size-suffix parser used by the config
//! loader, and display-width-aware string truncation for the view layer.
//!
//! None of this depends on the rest of the crate — it's kept as free
//! functions so the store and view modules can use them without importing
//! half the crate graph.

use unicode_width::UnicodeWidthChar;

/// Binary (IEC) size suffixes, smallest to largest. Used by both
/// [`humanize_size`] and [`parse_size`] so the two stay in lock-step.
const IEC_SUFFIXES: &[(&str, u64)] = &[
    ("B", 1),
    ("KiB", 1024),
    ("MiB", 1024 * 1024),
    ("GiB", 1024 * 1024 * 1024),
    ("TiB", 1024 * 1024 * 1024 * 1024),
];

/// Decimal suffixes accepted by [`parse_size`] for config values like
/// `MAX_DOWNLOAD_SIZE = "10MB"` (§6 Configuration surface).
const DECIMAL_SUFFIXES: &[(&str, u64)] = &[
    ("B", 1),
    ("KB", 1_000),
    ("MB", 1_000_000),
    ("GB", 1_000_000_000),
    ("TB", 1_000_000_000_000),
];

/// Formats a byte count using binary (IEC) suffixes with one decimal place,
/// e.g. `humanize_size(1024) == "1.0KiB"`. Bytes under 1 KiB are printed as
/// a bare integer with a `B` suffix and no decimal point.
pub fn humanize_size(bytes: u64) -> String {
    if bytes < IEC_SUFFIXES[1].1 {
        return format!("{bytes}B");
    }
    let mut chosen = &IEC_SUFFIXES[0];
    for entry in IEC_SUFFIXES.iter() {
        if bytes >= entry.1 {
            chosen = entry;
        }
    }
    let value = bytes as f64 / chosen.1 as f64;
    format!("{value:.1}{}", chosen.0)
}

/// Parses a config size string such as `"10MB"` or `"512B"` into a byte
/// count. Suffix matching is case-insensitive and accepts a bare number with
/// no suffix (interpreted as bytes). Returns `None` for anything else so the
/// config loader can report a clear error instead of silently defaulting.
pub fn parse_size(input: &str) -> Option<u64> {
    let input = input.trim();
    if let Ok(n) = input.parse::<u64>() {
        return Some(n);
    }
    let upper = input.to_ascii_uppercase();
    // Try longer suffixes first ("KB" before "B") so "10KB" doesn't match the
    // bare "B" entry on its last character.
    let mut candidates: Vec<&(&str, u64)> = DECIMAL_SUFFIXES.iter().collect();
    candidates.sort_by_key(|(suffix, _)| std::cmp::Reverse(suffix.len()));
    for (suffix, multiplier) in candidates {
        if let Some(number_part) = upper.strip_suffix(suffix) {
            let number_part = number_part.trim();
            if number_part.is_empty() {
                continue;
            }
            if let Ok(n) = number_part.parse::<f64>() {
                return Some((n * *multiplier as f64) as u64);
            }
        }
    }
    None
}

/// Formats a duration in whole seconds as `M:SS` or, once it reaches an
/// hour, `H:MM:SS` — matching the original's `humanize_duration` used for
/// voice notes, audio, and video durations in the message pane.
pub fn humanize_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Visual width of a string in terminal columns, counting East-Asian "wide"
/// and emoji characters as 2 columns and everything else as 1. This is the
/// Rust equivalent of the original's `emoji_pattern`-based byte-length
/// adjustment, generalized to all wide characters instead of just emoji.
pub fn string_len_dwc(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Truncates `s` so its visual width (per [`string_len_dwc`]) does not
/// exceed `max_width`, without splitting a multi-byte grapheme or leaving a
/// dangling half of a wide character. Returns the whole string unchanged if
/// it already fits.
pub fn truncate_to_len(s: &str, max_width: usize) -> String {
    if string_len_dwc(s) <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for c in s.chars() {
        let w = char_width(c);
        if used + w > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_size_formats_iec_suffixes() {
        assert_eq!(humanize_size(512), "512B");
        assert_eq!(humanize_size(1024), "1.0KiB");
        assert_eq!(humanize_size(1024 * 1024), "1.0MiB");
        assert_eq!(humanize_size(1536 * 1024), "1.5MiB");
    }

    #[test]
    fn parse_size_decimal_suffixes() {
        assert_eq!(parse_size("10MB"), Some(10_000_000));
        assert_eq!(parse_size("1GB"), Some(1_000_000_000));
        assert_eq!(parse_size("512"), Some(512));
        assert_eq!(parse_size("512B"), Some(512));
        assert_eq!(parse_size("not-a-size"), None);
    }

    #[test]
    fn parse_size_is_case_insensitive() {
        assert_eq!(parse_size("10mb"), Some(10_000_000));
    }

    #[test]
    fn humanize_duration_formats_minutes_and_hours() {
        assert_eq!(humanize_duration(59), "0:59");
        assert_eq!(humanize_duration(3661), "1:01:01");
        assert_eq!(humanize_duration(0), "0:00");
    }

    #[test]
    fn string_len_dwc_counts_wide_chars_double() {
        assert_eq!(string_len_dwc("abc"), 3);
        // CJK ideographs are double-width.
        assert_eq!(string_len_dwc("你好"), 4);
    }

    #[test]
    fn truncate_to_len_never_exceeds_width() {
        let s = "你好世界hello";
        for width in 0..20 {
            let truncated = truncate_to_len(s, width);
            assert!(string_len_dwc(&truncated) <= width);
        }
    }

    #[test]
    fn truncate_to_len_keeps_short_strings_whole() {
        assert_eq!(truncate_to_len("hi", 10), "hi");
    }
}
