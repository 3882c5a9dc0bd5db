//! Response definitions
//!
//! The result delivered to a waiting caller.

use std::fmt;

use crate::entity::Entity;

/// Failure codes carried by a `Response::Failure`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// The server returned an error envelope with this code
    Server(String),

    /// The request passed its deadline before a response arrived
    Timeout,

    /// The connection was lost (or the session closed) with the request
    /// still in flight
    TransportLost,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Server(code) => f.write_str(code),
            ErrorCode::Timeout => f.write_str("TIMEOUT"),
            ErrorCode::TransportLost => f.write_str("TRANSPORT_LOST"),
        }
    }
}

/// Outcome of one command
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The server answered with a well-formed result document
    Success(Entity),

    /// The server answered with an error envelope, or the session layer
    /// synthesized a failure (timeout, transport loss)
    Failure { code: ErrorCode, message: String },
}

impl Response {
    /// A timeout failure
    pub fn timeout() -> Self {
        Response::Failure {
            code: ErrorCode::Timeout,
            message: "request deadline elapsed before a response arrived".to_string(),
        }
    }

    /// A transport-loss failure
    pub fn transport_lost(message: impl Into<String>) -> Self {
        Response::Failure {
            code: ErrorCode::TransportLost,
            message: message.into(),
        }
    }

    /// Whether this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// The entity inside, if successful
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            Response::Success(entity) => Some(entity),
            Response::Failure { .. } => None,
        }
    }
}
