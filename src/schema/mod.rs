//! Schema Module
//!
//! In-memory model of the per-command wire schemas.
//!
//! ## Responsibilities
//! - Hold each command's field list: wire name, app name, order index,
//!   optionality, cardinality, nested-type reference
//! - Validate integrity once at load time so the codec can assume
//!   well-formedness
//! - Provide the explicit app-name/wire-name mapping table
//! - Load a catalog from its JSON document form

mod loader;
mod model;
mod naming;

pub use loader::{JsonCatalogSource, SchemaSource};
pub use model::{
    FieldKind, ScalarKind, SchemaBuilder, SchemaCatalog, SchemaDef, SchemaField,
};
pub use naming::NamingTable;
