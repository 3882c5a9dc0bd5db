//! Catalog loading
//!
//! Reads the JSON catalog document produced by the schema tooling and
//! builds the in-memory `SchemaCatalog`.
//!
//! ## Document Format
//!
//! ```json
//! {
//!   "commands": [
//!     {
//!       "name": "UserAddRequest",
//!       "response": "SuccessResponse",
//!       "fields": [
//!         {"wire": "userId", "app": "user_id", "type": "string", "required": true},
//!         {"wire": "firstName", "type": "string"},
//!         {"wire": "services", "type": "string", "repeated": true},
//!         {"wire": "address", "ref": "StreetAddress"}
//!       ]
//!     }
//!   ],
//!   "types": [
//!     {"name": "StreetAddress", "entity": "generic", "fields": [...]}
//!   ]
//! }
//! ```
//!
//! Field order in the document is the wire order; `app` defaults to the
//! wire name verbatim when omitted (never a case conversion).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::entity::EntityKind;
use crate::error::{OciError, Result};
use super::model::{FieldKind, ScalarKind, SchemaCatalog, SchemaDef};

/// Supplies catalog contents from an external source
pub trait SchemaSource {
    /// Load every definition into a validated catalog
    fn load_all(&self) -> Result<SchemaCatalog>;
}

/// Catalog source backed by a JSON document
pub struct JsonCatalogSource {
    origin: Origin,
}

enum Origin {
    Text(String),
    File(PathBuf),
}

impl JsonCatalogSource {
    /// Source from an in-memory JSON string
    pub fn from_json_str(json: impl Into<String>) -> Self {
        Self {
            origin: Origin::Text(json.into()),
        }
    }

    /// Source from a JSON file on disk
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
        }
    }
}

impl SchemaSource for JsonCatalogSource {
    fn load_all(&self) -> Result<SchemaCatalog> {
        match &self.origin {
            Origin::Text(json) => parse_catalog(json),
            Origin::File(path) => {
                let json = fs::read_to_string(path)?;
                parse_catalog(&json)
            }
        }
    }
}

impl SchemaCatalog {
    /// Parse a catalog straight from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        parse_catalog(json)
    }

    /// Parse a catalog from a JSON file
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        parse_catalog(&json)
    }
}

// =============================================================================
// Document Shapes
// =============================================================================

#[derive(Deserialize)]
struct CatalogDoc {
    #[serde(default)]
    commands: Vec<DefDoc>,

    #[serde(default)]
    types: Vec<DefDoc>,
}

#[derive(Deserialize)]
struct DefDoc {
    name: String,

    /// Root element name when it differs from the catalog id
    #[serde(default)]
    wire: Option<String>,

    /// Entity variant: "enterprise" | "group" | "user" | "generic"
    #[serde(default)]
    entity: Option<String>,

    /// Expected response schema id (commands)
    #[serde(default)]
    response: Option<String>,

    #[serde(default)]
    fields: Vec<FieldDoc>,
}

#[derive(Deserialize)]
struct FieldDoc {
    wire: String,

    /// App-side name; defaults to the wire name verbatim
    #[serde(default)]
    app: Option<String>,

    /// Scalar type name; ignored when `ref` is present
    #[serde(default, rename = "type")]
    scalar: Option<String>,

    /// Nested type reference
    #[serde(default, rename = "ref")]
    nested: Option<String>,

    #[serde(default)]
    required: bool,

    #[serde(default)]
    repeated: bool,
}

// =============================================================================
// Parsing
// =============================================================================

fn parse_catalog(json: &str) -> Result<SchemaCatalog> {
    let doc: CatalogDoc =
        serde_json::from_str(json).map_err(|e| OciError::Catalog(e.to_string()))?;

    let mut defs = Vec::with_capacity(doc.commands.len() + doc.types.len());
    for def in doc.commands.into_iter().chain(doc.types) {
        defs.push(build_def(def)?);
    }

    let catalog = SchemaCatalog::new(defs)?;
    tracing::debug!("Loaded schema catalog with {} definitions", catalog.len());
    Ok(catalog)
}

fn build_def(doc: DefDoc) -> Result<SchemaDef> {
    let mut builder = SchemaDef::build(&doc.name);

    if let Some(wire) = doc.wire {
        builder = builder.wire_name(wire);
    }
    if let Some(entity) = doc.entity.as_deref() {
        builder = builder.entity_kind(parse_entity_kind(&doc.name, entity)?);
    }
    if let Some(response) = doc.response {
        builder = builder.response(response);
    }

    for field in doc.fields {
        let kind = match field.nested {
            Some(target) => FieldKind::Nested(target),
            None => FieldKind::Scalar(parse_scalar_kind(field.scalar.as_deref())),
        };
        let app = field.app.unwrap_or_else(|| field.wire.clone());
        builder = builder.field(app, field.wire, field.required, field.repeated, kind);
    }

    builder.finish()
}

fn parse_entity_kind(schema: &str, name: &str) -> Result<EntityKind> {
    match name {
        "enterprise" => Ok(EntityKind::Enterprise),
        "group" => Ok(EntityKind::Group),
        "user" => Ok(EntityKind::User),
        "generic" => Ok(EntityKind::Generic),
        other => Err(OciError::Catalog(format!(
            "{}: unknown entity kind {:?}",
            schema, other
        ))),
    }
}

/// Unrecognized scalar type names load as text: the source schema's many
/// simple types (tokens, enumerations, lists) all travel as element text.
fn parse_scalar_kind(name: Option<&str>) -> ScalarKind {
    match name {
        Some("int") | Some("integer") => ScalarKind::Int,
        Some("bool") | Some("boolean") => ScalarKind::Bool,
        _ => ScalarKind::Text,
    }
}
