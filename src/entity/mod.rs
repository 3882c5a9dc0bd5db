//! Entity Module
//!
//! Application-level, naming-convention-agnostic objects the codec maps
//! onto the wire.
//!
//! ## Responsibilities
//! - Typed value union (scalar / nested entity / ordered list)
//! - Name-keyed field storage with last-write-wins semantics
//! - The four entity variants: Enterprise, Group, User, Generic
//!
//! Schema conformance is checked by the codec, not here.

mod object;
mod value;

pub use object::{Entity, EntityKind};
pub use value::{Scalar, Value};
