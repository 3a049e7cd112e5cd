//! Config command: inspect the active configuration.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

pub fn run_config(action: &ConfigAction, settings: &Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)?;
            Output::header("Current Configuration");
            println!("\n{}", content);
        }
        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }
    }
    Ok(())
}
