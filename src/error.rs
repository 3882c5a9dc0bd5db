//! Error types for ocilink
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using OciError
pub type Result<T> = std::result::Result<T, OciError>;

/// Unified error type for ocilink operations
#[derive(Debug, Error)]
pub enum OciError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Schema integrity error: {0}")]
    SchemaIntegrity(String),

    #[error("Catalog document error: {0}")]
    Catalog(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Unexpected nesting: {0}")]
    UnexpectedNesting(String),

    #[error("Malformed wire document: {0}")]
    MalformedDocument(String),

    #[error("Entity is not a command: {0}")]
    NotACommand(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Frame error: {0}")]
    Frame(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Session not active: {0}")]
    SessionNotActive(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),
}
