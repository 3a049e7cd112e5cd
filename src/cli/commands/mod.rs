//! Command implementations for the Finn CLI.

mod config;
mod doctor;
mod search;
mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use search::run_search;
pub use serve::run_serve;
