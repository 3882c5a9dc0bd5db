//! Schema model
//!
//! Immutable definitions of command and type shapes, validated at load.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::EntityKind;
use crate::error::{OciError, Result};
use super::naming::NamingTable;

/// Scalar wire types
///
/// The protocol's simple types all travel as element text; the kind
/// controls how response text is re-typed on the way back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Int,
    Bool,
}

/// What a field holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Element text, re-typed per ScalarKind
    Scalar(ScalarKind),

    /// A nested element whose children follow another schema,
    /// referenced by catalog id
    Nested(String),
}

/// One field of a command or type schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// Element name on the wire, verbatim (casing included)
    pub wire_name: String,

    /// Application-side field name, verbatim
    pub app_name: String,

    /// Position among siblings; the wire order is strictly increasing
    /// order_index
    pub order_index: usize,

    /// Whether serialization fails when the field is absent
    pub required: bool,

    /// Whether the field may occur more than once
    pub repeated: bool,

    /// Scalar or nested shape
    pub kind: FieldKind,
}

/// The schema of one command or nested type
///
/// Immutable once built; shared by reference (`Arc`) across every message
/// of that shape for the life of the catalog.
#[derive(Debug, Clone)]
pub struct SchemaDef {
    id: String,
    command_wire_name: String,
    entity_kind: EntityKind,
    response: Option<String>,
    fields: Vec<SchemaField>,
    naming: NamingTable,
}

impl SchemaDef {
    /// Start building a definition
    pub fn build(id: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(id)
    }

    /// A definition with no fields
    ///
    /// Used for bare acknowledgement and keep-alive shapes.
    pub fn empty(id: impl Into<String>) -> Arc<SchemaDef> {
        let id = id.into();
        Arc::new(SchemaDef {
            command_wire_name: id.clone(),
            id,
            entity_kind: EntityKind::Generic,
            response: None,
            fields: Vec::new(),
            naming: NamingTable::default(),
        })
    }

    /// Catalog identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Root element name on the wire
    pub fn command_wire_name(&self) -> &str {
        &self.command_wire_name
    }

    /// Entity variant produced when deserializing this shape
    pub fn entity_kind(&self) -> EntityKind {
        self.entity_kind
    }

    /// Expected response schema id, for command definitions
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Fields in strictly increasing order_index order
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Look up a field by its application name
    pub fn field_by_app(&self, app_name: &str) -> Option<&SchemaField> {
        self.naming.index_by_app(app_name).map(|i| &self.fields[i])
    }

    /// Look up a field by its wire name
    pub fn field_by_wire(&self, wire_name: &str) -> Option<&SchemaField> {
        self.naming.index_by_wire(wire_name).map(|i| &self.fields[i])
    }

    /// The explicit name-mapping table for this definition
    pub fn naming(&self) -> &NamingTable {
        &self.naming
    }
}

/// Builder for SchemaDef
pub struct SchemaBuilder {
    id: String,
    wire_name: Option<String>,
    entity_kind: EntityKind,
    response: Option<String>,
    fields: Vec<SchemaField>,
}

impl SchemaBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            wire_name: None,
            entity_kind: EntityKind::Generic,
            response: None,
            fields: Vec::new(),
        }
    }

    /// Override the root wire element name (defaults to the id)
    pub fn wire_name(mut self, name: impl Into<String>) -> Self {
        self.wire_name = Some(name.into());
        self
    }

    /// Set the entity variant for deserialized values
    pub fn entity_kind(mut self, kind: EntityKind) -> Self {
        self.entity_kind = kind;
        self
    }

    /// Declare the expected response schema id (commands only)
    pub fn response(mut self, id: impl Into<String>) -> Self {
        self.response = Some(id.into());
        self
    }

    /// Append a field; order_index is its position in the declaration
    /// sequence
    pub fn field(
        mut self,
        app_name: impl Into<String>,
        wire_name: impl Into<String>,
        required: bool,
        repeated: bool,
        kind: FieldKind,
    ) -> Self {
        let order_index = self.fields.len();
        self.fields.push(SchemaField {
            wire_name: wire_name.into(),
            app_name: app_name.into(),
            order_index,
            required,
            repeated,
            kind,
        });
        self
    }

    /// Append a field with an explicit order index
    ///
    /// Indexes are validated for uniqueness and contiguity by `finish`.
    pub fn field_at(
        mut self,
        order_index: usize,
        app_name: impl Into<String>,
        wire_name: impl Into<String>,
        required: bool,
        repeated: bool,
        kind: FieldKind,
    ) -> Self {
        self.fields.push(SchemaField {
            wire_name: wire_name.into(),
            app_name: app_name.into(),
            order_index,
            required,
            repeated,
            kind,
        });
        self
    }

    /// Validate and freeze the definition
    ///
    /// Fails with `SchemaIntegrity` when order indexes are not unique and
    /// contiguous from 0, or when wire/app names collide in the sibling
    /// set. Front-loading these checks lets the codec assume
    /// well-formedness unconditionally.
    pub fn finish(self) -> Result<SchemaDef> {
        let mut fields = self.fields;
        fields.sort_by_key(|f| f.order_index);

        for (expected, field) in fields.iter().enumerate() {
            if field.order_index != expected {
                return Err(OciError::SchemaIntegrity(format!(
                    "{}: order indexes must be unique and contiguous from 0, \
                     found {} at position {}",
                    self.id, field.order_index, expected
                )));
            }
        }

        let naming = NamingTable::build(&self.id, &fields)?;

        Ok(SchemaDef {
            command_wire_name: self.wire_name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            entity_kind: self.entity_kind,
            response: self.response,
            fields,
            naming,
        })
    }
}

/// The process-wide schema catalog
///
/// Maps command/type identifiers to their definitions. Built once from an
/// external source, validated on build, read-only thereafter — reads need
/// no synchronization.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    defs: HashMap<String, Arc<SchemaDef>>,
}

impl SchemaCatalog {
    /// Build a catalog from definitions
    ///
    /// Validates that every nested-type reference resolves; dangling refs
    /// fail here rather than at serialization time.
    pub fn new(defs: Vec<SchemaDef>) -> Result<Self> {
        let mut map: HashMap<String, Arc<SchemaDef>> = HashMap::with_capacity(defs.len());
        for def in defs {
            let id = def.id.clone();
            if map.insert(id.clone(), Arc::new(def)).is_some() {
                return Err(OciError::SchemaIntegrity(format!(
                    "duplicate schema id {}",
                    id
                )));
            }
        }

        // Every Nested ref and response ref must resolve
        for def in map.values() {
            for field in def.fields() {
                if let FieldKind::Nested(ref target) = field.kind {
                    if !map.contains_key(target) {
                        return Err(OciError::SchemaIntegrity(format!(
                            "{}.{} references unknown type {}",
                            def.id(),
                            field.app_name,
                            target
                        )));
                    }
                }
            }
            if let Some(response) = def.response() {
                if !map.contains_key(response) {
                    return Err(OciError::SchemaIntegrity(format!(
                        "{} declares unknown response {}",
                        def.id(),
                        response
                    )));
                }
            }
        }

        Ok(Self { defs: map })
    }

    /// Look up a command definition
    pub fn lookup(&self, id: &str) -> Result<Arc<SchemaDef>> {
        self.defs
            .get(id)
            .cloned()
            .ok_or_else(|| OciError::SchemaNotFound(id.to_string()))
    }

    /// Resolve a nested-type reference from a composite field
    pub fn resolve_nested(&self, schema_ref: &str) -> Result<Arc<SchemaDef>> {
        self.lookup(schema_ref)
    }

    /// Whether a definition exists
    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    /// Number of definitions loaded
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
