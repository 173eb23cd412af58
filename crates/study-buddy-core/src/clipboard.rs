use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

/// Somewhere copied text can go.
///
/// Writes are fire-and-forget: implementations log failures and never report
/// them back to the caller.
pub trait Clipboard: Send {
    fn write(&self, text: &str);
}

/// The platform clipboard, reached through its command-line helper.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn commands() -> Vec<(&'static str, Vec<&'static str>)> {
        if cfg!(target_os = "macos") {
            vec![("pbcopy", vec![])]
        } else if cfg!(target_os = "windows") {
            vec![("clip", vec![])]
        } else {
            vec![("wl-copy", vec![]), ("xclip", vec!["-selection", "clipboard"])]
        }
    }
}

impl Clipboard for SystemClipboard {
    fn write(&self, text: &str) {
        for (program, args) in Self::commands() {
            match pipe_to(program, &args, text) {
                Ok(_) => return,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(program, error = %e, "clipboard write failed");
                    return;
                }
            }
        }

        tracing::warn!("no clipboard helper available");
    }
}

/// Feed `text` to `program` on stdin and reap it off-thread.
///
/// xclip stays alive to serve the selection, so the wait happens on a
/// detached thread rather than the caller's.
fn pipe_to(program: &str, args: &[&str], text: &str) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    // Dropping stdin closes the pipe so the helper sees EOF
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };
    let reaper = thread::spawn(move || child.wait());
    written.map(|()| reaper)
}

/// Discards everything. For surfaces without a clipboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write(&self, _text: &str) {}
}
