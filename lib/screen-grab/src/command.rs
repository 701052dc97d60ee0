use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder in [`ToolSpec::args`] replaced by the temp file path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// An external screenshot program and its arguments.
///
/// The program is expected to write a PNG to the path substituted for
/// [`OUTPUT_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Screenshot tool that owns compositor permission on GNOME Wayland.
    pub fn gnome_screenshot() -> Self {
        Self::new("gnome-screenshot", &["-f", OUTPUT_PLACEHOLDER])
    }

    /// ImageMagick root window grab.
    pub fn imagemagick_import() -> Self {
        Self::new("import", &["-window", "root", OUTPUT_PLACEHOLDER])
    }

    /// Arguments with the output placeholder substituted.
    pub fn args_for(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }
}

/// Spawns external programs.
///
/// Capturers only talk to the outside world through this trait, so tests can
/// substitute a runner that never starts a process.
pub trait CommandRunner: Send + Sync {
    /// Whether `program` can be found in PATH.
    fn is_available(&self, program: &str) -> bool;

    /// Runs `program` to completion, failing on a non-zero exit status.
    fn run(&self, program: &str, args: &[String]) -> Result<()>;
}

/// [`CommandRunner`] that starts real processes and blocks until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, program: &str, args: &[String]) -> Result<()> {
        log::debug!("run `{program} {}`", args.join(" "));

        let output = duct::cmd(program, args)
            .stdout_null()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::CommandNotFound(program.to_string())
                } else {
                    Error::Command(format!("run {program} failed: {e}"))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Command(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
