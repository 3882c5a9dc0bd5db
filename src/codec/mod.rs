//! Codec Module
//!
//! Maps entities to ordered wire documents and back, driven entirely by
//! the schema catalog.
//!
//! ## Wire Shape
//!
//! ```text
//! <UserAddRequest>              root = command wire name
//!   <userId>u1</userId>         siblings in strict order_index order
//!   <services>voicemail</services>
//!   <services>callerid</services>
//!   <address>                   nested schema, recursed
//!     <street>...</street>
//!   </address>
//! </UserAddRequest>
//! ```
//!
//! Error responses arrive in a fixed, schema-independent envelope:
//!
//! ```text
//! <ErrorResponse>
//!   <errorCode>SCHEMA_VIOLATION</errorCode>
//!   <summary>...</summary>
//! </ErrorResponse>
//! ```

mod deserialize;
mod document;
mod response;
mod serialize;
mod xml;

pub use deserialize::{deserialize, ERROR_ENVELOPE_TAG};
pub use document::{WireDocument, WireElement, WireValue};
pub use response::{ErrorCode, Response};
pub use serialize::serialize;
pub use xml::{from_xml, to_xml};
