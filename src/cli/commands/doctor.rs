//! Doctor command: verify external tool availability.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use anyhow::Result;

/// Check that the external tools the pipeline shells out to are installed.
pub fn run_doctor(settings: &Settings) -> Result<()> {
    Output::header("Finn Doctor");
    println!();

    let tools = [
        ("yt-dlp", "caption listing and audio download", true),
        ("ffmpeg", "audio normalization", true),
        ("whisper", "transcription fallback when captions are missing", false),
    ];

    let mut missing_required = false;
    for (name, purpose, required) in tools {
        match preflight::check_tool(name) {
            Ok(()) => Output::success(&format!("{} — {}", name, purpose)),
            Err(e) if required => {
                Output::error(&format!("{} — {}", name, e));
                missing_required = true;
            }
            Err(_) => {
                Output::warning(&format!(
                    "{} — not found; videos without captions cannot be searched",
                    name
                ));
            }
        }
    }

    println!();
    Output::kv("Data directory", &settings.data_dir().display().to_string());
    Output::kv(
        "Config file",
        &Settings::default_config_path().display().to_string(),
    );

    if missing_required {
        println!();
        anyhow::bail!("required tools are missing");
    }

    println!();
    Output::success("All required tools are available.");
    Ok(())
}
