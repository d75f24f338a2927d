//! Error types for vibe-piano

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vibe-piano operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vibe-piano
#[derive(Debug, Error)]
pub enum Error {
    /// The display region cannot hold a keyboard with positive key sizes
    #[error("Degenerate keyboard geometry: {0}")]
    DegenerateGeometry(String),

    /// No sample file exists for a note
    #[error("Sample not found: {}", .0.display())]
    SampleNotFound(PathBuf),

    /// A note name could not be parsed
    #[error("Invalid note name: {0:?}")]
    InvalidNote(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio output or decoding error
    #[error("Audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
