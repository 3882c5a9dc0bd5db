//! # ocilink
//!
//! A schema-driven client for XML provisioning protocols:
//! - Per-command schemas with strict, position-significant field ordering
//! - Explicit app-name/wire-name mapping (no case heuristics)
//! - One persistent, authenticated session per connection
//! - Correlated request/response with many commands in flight
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Caller                                │
//! │              (builds Entity command objects)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Message Codec                              │
//! │        (schema-ordered wire documents, XML in/out)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Session Manager                             │
//! │   (correlation ids, pending table, sweep, keep-alive)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌─────────────┐
//!               │  Transport  │
//!               │ (byte frames)│
//!               └─────────────┘
//! ```
//!
//! The schema catalog is loaded once, validated, and shared read-only;
//! serialization assumes well-formed schemas unconditionally.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod schema;
pub mod entity;
pub mod codec;
pub mod transport;
pub mod session;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{OciError, Result};
pub use config::SessionConfig;

pub use codec::{ErrorCode, Response};
pub use entity::{Entity, EntityKind, Scalar, Value};
pub use schema::{SchemaCatalog, SchemaDef};
pub use session::{
    connect, CredentialSource, DigestCredentials, ResponseHandle, SessionHandle,
    SessionState,
};
pub use transport::{TcpTransport, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ocilink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
