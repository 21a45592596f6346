//! Error types for the dialog orchestrator

use thiserror::Error;

/// Result type alias for dialog engine operations
pub type Result<T> = std::result::Result<T, DialogError>;

#[derive(Error, Debug)]
pub enum DialogError {

    // =============================
    // Configuration Errors (fatal at construction or first use)
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown state: {0}")]
    UnknownState(String),

    // =============================
    // Turn Processing Errors
    // =============================

    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Action chain exceeded {limit} hops in state {state}")]
    ActionHopLimit { state: String, limit: usize },

    #[error("NLU error: {0}")]
    Nlu(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
