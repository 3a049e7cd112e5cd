//! Configuration management for Finn.

mod settings;

pub use settings::{
    GeneralSettings, ModelSize, SearchSettings, ServerSettings, Settings, TranscriptionSettings,
};
