//! Cross-cutting infrastructure shared by the binary and adapters.

pub mod config;

pub use config::AppConfig;
