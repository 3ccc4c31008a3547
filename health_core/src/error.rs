//! Error types for the health_core library.
//!
//! Only infrastructure failures (I/O, parsing, bad configuration, unknown
//! profile entities) are errors. Data problems found during an evaluation
//! are reported as [`crate::EngineWarning`] values next to the results.

use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for health_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// A profile entity was addressed by an id it does not hold
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    /// Lab panel input could not be used
    #[error("Panel error: {0}")]
    Panel(String),

    /// Narrative generator failure
    #[error("Narrative error: {0}")]
    Narrative(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
