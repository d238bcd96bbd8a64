use std::{path::Path, process::Command};

use log::{debug, warn};

fn opener_command(path: &Path) -> Command {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        // `start` takes the first quoted argument as the window title
        cmd.args(["/C", "start", ""]);
        cmd
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(path);
    cmd
}

/// Shows `path` with the platform's default viewer. Failing to do so is not
/// an error.
pub fn open_best_effort(path: &Path) {
    let mut cmd = opener_command(path);
    match cmd.status() {
        Ok(status) if status.success() => debug!("Opened {}", path.display()),
        Ok(status) => warn!("Couldn't open {}: opener exited with {status}", path.display()),
        Err(e) => warn!(
            "Couldn't open {}: {:?} failed: {e}",
            path.display(),
            cmd.get_program()
        ),
    }
}
