//! `Shell` — subprocess dispatch and mailcap-style MIME lookup (§6 "Shell
//! interface").
//!
//! Grounded in `tg/utils.py`'s `suspend` context manager (`subprocess.call`
//! wrapped by a terminal-mode flip) and `tg/config.py`'s `get_file_handler`
//! (a mailcap lookup via Python's `mailcap.findmatch`). Rust has no
//! `mailcap.findmatch` equivalent, so the lookup here is a small
//! MIME-prefix-keyed table plus [`mime_guess`] for sniffing the type from
//! a file's extension, rather than parsing `/etc/mailcap` directly.

use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{AppError, Result};

/// One mailcap-style entry: a MIME type or prefix (`"image/"` matches any
/// image subtype) mapped to a command template containing `%s` as the
/// path placeholder.
pub struct MailcapEntry {
    pub mime_pattern: &'static str,
    pub command_template: &'static str,
}

/// A reasonably complete built-in table, standing in for `/etc/mailcap`
/// entries the original relies on, covering the variant families named in
/// §3 "Message content variants".
pub const DEFAULT_MAILCAP: &[MailcapEntry] = &[
    MailcapEntry {
        mime_pattern: "image/",
        command_template: "xdg-open %s",
    },
    MailcapEntry {
        mime_pattern: "video/",
        command_template: "xdg-open %s",
    },
    MailcapEntry {
        mime_pattern: "audio/",
        command_template: "xdg-open %s",
    },
    MailcapEntry {
        mime_pattern: "text/",
        command_template: "less %s",
    },
    MailcapEntry {
        mime_pattern: "application/pdf",
        command_template: "xdg-open %s",
    },
];

pub struct Shell {
    mailcap: Vec<MailcapEntry>,
    default_open: String,
}

impl Shell {
    pub fn new(default_open: String) -> Self {
        Shell {
            mailcap: DEFAULT_MAILCAP
                .iter()
                .map(|e| MailcapEntry {
                    mime_pattern: e.mime_pattern,
                    command_template: e.command_template,
                })
                .collect(),
            default_open,
        }
    }

    /// Runs `cmd` through the user's shell, blocking until it exits.
    /// Returns `SubprocessFailed` on non-zero exit.
    pub fn run(&self, cmd: &str) -> Result<()> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .status()
            .map_err(|e| AppError::SubprocessFailed {
                cmd: cmd.to_string(),
                status: e.raw_os_error(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(AppError::SubprocessFailed {
                cmd: cmd.to_string(),
                status: status.code(),
            })
        }
    }

    /// Runs `cmd`, piping `stdin_text` to its standard input (used for the
    /// URL-chooser / fzf-style pickers).
    pub fn run_with_input(&self, cmd: &str, stdin_text: &str) -> Result<String> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::SubprocessFailed {
                cmd: cmd.to_string(),
                status: e.raw_os_error(),
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(stdin_text.as_bytes());
        }
        let output = child.wait_with_output().map_err(|e| AppError::SubprocessFailed {
            cmd: cmd.to_string(),
            status: e.raw_os_error(),
        })?;
        if !output.status.success() {
            return Err(AppError::SubprocessFailed {
                cmd: cmd.to_string(),
                status: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Runs `cmd` with our own stdin left attached to the terminal (so an
    /// interactive picker like `fzf` can read keystrokes from it directly)
    /// but captures stdout, for file/URL choosers that print their
    /// selection on exit rather than taking it piped in.
    pub fn run_capturing_stdout(&self, cmd: &str) -> Result<String> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdout(Stdio::piped())
            .output()
            .map_err(|e| AppError::SubprocessFailed {
                cmd: cmd.to_string(),
                status: e.raw_os_error(),
            })?;
        if !output.status.success() {
            return Err(AppError::SubprocessFailed {
                cmd: cmd.to_string(),
                status: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Looks up a mailcap-style handler by MIME type, matching a full type
    /// or any registered prefix. Returns `None` for an unmapped type.
    pub fn mailcap_lookup(&self, mime_type: &str) -> Option<&str> {
        self.mailcap
            .iter()
            .find(|e| {
                if e.mime_pattern.ends_with('/') {
                    mime_type.starts_with(e.mime_pattern)
                } else {
                    mime_type == e.mime_pattern
                }
            })
            .map(|e| e.command_template)
    }

    /// Opens `path`: `optional_cmd` (if given, with `%s` substituted) takes
    /// priority, then a mailcap match on the sniffed MIME type, then
    /// `DEFAULT_OPEN` (§6 "Shell interface").
    pub fn open_file(&self, path: &Path, optional_cmd: Option<&str>) -> Result<()> {
        let path_str = path.to_string_lossy();
        if let Some(template) = optional_cmd {
            return self.run(&template.replace("%s", &path_str));
        }
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if let Some(template) = self.mailcap_lookup(mime.essence_str()) {
            return self.run(&template.replace("%s", &path_str));
        }
        self.open_default(&path_str)
    }

    /// Final `DEFAULT_OPEN` fallback (§6 "Shell interface"): the special
    /// value `"system"` dispatches through the `open` crate's own
    /// cross-platform "open with OS default handler" call rather than
    /// shelling out to a Linux-specific binary name; any other configured
    /// value is treated as a command template run through the shell.
    pub fn open_default(&self, target: &str) -> Result<()> {
        if self.default_open == "system" {
            open::that(target).map_err(|e| AppError::SubprocessFailed { cmd: target.to_string(), status: e.raw_os_error() })
        } else {
            self.run(&format!("{} {}", self.default_open, shell_quote(target)))
        }
    }

    /// Copies `text` to the clipboard: an external `copy_cmd` (piped the
    /// text on stdin) if configured, else an OSC 52 escape sequence written
    /// directly to the terminal — the same fallback ladder §4.5's yank
    /// command relies on ("their text/path to clipboard").
    pub fn copy_to_clipboard(&self, text: &str, copy_cmd: Option<&str>) -> Result<()> {
        if let Some(cmd) = copy_cmd {
            self.run_with_input(cmd, text).map(|_| ())
        } else {
            osc52_copy(text)
        }
    }
}

/// Writes an OSC 52 "set clipboard" escape sequence to stdout, base64-
/// encoding `text` per the sequence's wire format. Works over SSH and in
/// most modern terminal emulators without an external clipboard helper.
fn osc52_copy(text: &str) -> Result<()> {
    use base64::Engine as _;
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    let mut stdout = std::io::stdout();
    write!(stdout, "\x1b]52;c;{encoded}\x07").map_err(AppError::TerminalDraw)?;
    stdout.flush().map_err(AppError::TerminalDraw)
}

pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailcap_lookup_matches_prefix() {
        let shell = Shell::new("xdg-open".into());
        assert_eq!(shell.mailcap_lookup("image/png"), Some("xdg-open %s"));
        assert_eq!(shell.mailcap_lookup("video/mp4"), Some("xdg-open %s"));
    }

    #[test]
    fn mailcap_lookup_returns_none_for_unmapped_type() {
        let shell = Shell::new("xdg-open".into());
        assert_eq!(shell.mailcap_lookup("application/x-made-up"), None);
    }

    #[test]
    fn run_reports_subprocess_failure() {
        let shell = Shell::new("xdg-open".into());
        let err = shell.run("exit 7").unwrap_err();
        assert!(matches!(err, AppError::SubprocessFailed { status: Some(7), .. }));
    }

    #[test]
    fn run_succeeds_on_zero_exit() {
        let shell = Shell::new("xdg-open".into());
        assert!(shell.run("true").is_ok());
    }

    #[test]
    fn run_capturing_stdout_trims_trailing_newline() {
        let shell = Shell::new("xdg-open".into());
        let out = shell.run_capturing_stdout("printf 'chosen.txt\\n'").unwrap();
        assert_eq!(out, "chosen.txt");
    }

    #[test]
    fn open_default_runs_configured_command_template_when_not_system() {
        let shell = Shell::new("touch".into());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opened.txt");
        shell.open_default(&path.to_string_lossy()).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn copy_to_clipboard_pipes_text_to_configured_command() {
        let shell = Shell::new("xdg-open".into());
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("clip.txt");
        let cmd = format!("cat > {}", out_path.to_string_lossy());
        shell.copy_to_clipboard("hello clipboard", Some(&cmd)).unwrap();
        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "hello clipboard");
    }
}
