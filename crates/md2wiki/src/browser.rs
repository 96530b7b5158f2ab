//! Open a URL in the desktop browser.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

#[cfg(target_os = "macos")]
fn command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(target_os = "windows")]
fn command(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

/// Open `url` without waiting for the browser. Failure is only logged.
pub(crate) fn open(url: &str) {
    debug!("Opening {} in browser", url);
    let spawned = command(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if let Err(err) = spawned {
        warn!("Could not open browser: {err}");
    }
}
