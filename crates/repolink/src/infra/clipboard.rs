//! Delivering finished links to the system clipboard.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Destination for a finished link.
pub trait LinkSink {
    fn deliver(&mut self, link: &str) -> Result<()>;
}

/// One way of putting text on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// In-process clipboard through arboard.
    System,
    /// External program reading the text from stdin.
    Command(&'static [&'static str]),
}

/// System clipboard with platform executables as alternatives.
///
/// On X11 and Wayland the in-process clipboard only serves the selection while this process is
/// alive, so there the forking helpers (`wl-copy`, `xclip`, `xsel`) are tried first and arboard
/// is the last resort.
#[derive(Default)]
pub struct Clipboard {
    primary: Option<arboard::Clipboard>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, text: &str) -> Result<()> {
        for strategy in strategies() {
            let result = match strategy {
                Strategy::System => self.copy_in_process(text),
                Strategy::Command(command) => try_command_copy(command, text),
            };
            match result {
                Ok(()) => {
                    tracing::debug!(?strategy, "copied to clipboard");
                    return Ok(());
                }
                Err(err) => tracing::debug!(?strategy, error = %err, "clipboard backend failed"),
            }
        }

        Err(anyhow!("no clipboard backend accepted the link"))
    }

    fn copy_in_process(&mut self, text: &str) -> Result<()> {
        let primary = match &mut self.primary {
            Some(primary) => primary,
            slot @ None => {
                slot.insert(arboard::Clipboard::new().context("system clipboard unavailable")?)
            }
        };
        primary
            .set_text(text.to_owned())
            .context("clipboard write failed")?;

        if cfg!(all(unix, not(target_os = "macos"))) {
            tracing::warn!(
                "copied through the in-process clipboard; without a clipboard manager the link \
                 is gone once repolink exits (install wl-copy, xclip, or xsel)"
            );
        }
        Ok(())
    }
}

impl LinkSink for Clipboard {
    fn deliver(&mut self, link: &str) -> Result<()> {
        self.copy(link).context("failed to copy link to clipboard")
    }
}

/// Keeps every delivered link in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub delivered: Vec<String>,
}

impl LinkSink for MemorySink {
    fn deliver(&mut self, link: &str) -> Result<()> {
        self.delivered.push(link.to_owned());
        Ok(())
    }
}

fn try_command_copy(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{program} exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn strategies() -> Vec<Strategy> {
    vec![Strategy::System, Strategy::Command(&["pbcopy"])]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn strategies() -> Vec<Strategy> {
    vec![
        Strategy::Command(&["wl-copy"]),
        Strategy::Command(&["xclip", "-selection", "clipboard"]),
        Strategy::Command(&["xsel", "--clipboard", "--input"]),
        Strategy::System,
    ]
}

#[cfg(target_os = "windows")]
fn strategies() -> Vec<Strategy> {
    vec![
        Strategy::System,
        Strategy::Command(&["powershell.exe", "-NoProfile", "-Command", "Set-Clipboard"]),
    ]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn strategies() -> Vec<Strategy> {
    vec![Strategy::System]
}
