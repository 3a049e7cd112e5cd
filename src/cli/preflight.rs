//! Pre-flight checks before expensive operations.
//!
//! Validates that required external tools are available before starting
//! operations that would otherwise fail midway.

use crate::error::{FinnError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Searching may need caption fetch and the Whisper fallback.
    Search,
    /// The server runs the same pipeline on demand.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Search | Operation::Serve => {
            check_tool("yt-dlp")?;
            check_tool("ffmpeg")?;
            // whisper is only needed when captions are missing; warn-level
            // handling is left to the caller via check_tool directly.
        }
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        "whisper" => "--help",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(FinnError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FinnError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(FinnError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
