//! Shared utilities

pub mod config;
pub mod process;

pub use config::ProjectConfig;
pub use process::ProcessBuilder;
