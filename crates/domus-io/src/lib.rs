//! # Domus I/O
//!
//! Everything that leaves the session as a file: exported artifacts under
//! their display names, unmodified example graphs, and the JSON session
//! configuration read at startup.

pub mod export;
pub mod config;

pub use export::{download_example, export_artifact, ExportError, ExportState};
pub use config::{ConfigError, EngineSettings, SessionConfig, ViewportSettings};
