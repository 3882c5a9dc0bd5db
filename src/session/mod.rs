//! Session Module
//!
//! Owns the transport connection: authentication handshake, correlation
//! ids, the in-flight request table, response dispatch, timeout sweep,
//! keep-alive and teardown.
//!
//! ## Architecture
//! - One receive-loop thread per session (sole reader)
//! - One housekeeping thread (deadline sweep + keep-alive)
//! - Sends from any number of caller threads, serialized on the writer
//! - Callers wait on `ResponseHandle`, not inside the session

mod auth;
mod frame;
mod manager;
mod pending;

pub use auth::{CredentialSource, DigestCredentials};
pub use frame::{decode_frame, encode_frame, Frame, FRAME_HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use manager::{connect, SessionHandle, SessionState};
pub use pending::ResponseHandle;
