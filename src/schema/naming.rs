//! Naming table
//!
//! Explicit bidirectional mapping between application field names and
//! declared wire names.
//!
//! The table is populated from the schema at load time and returns names
//! verbatim. It deliberately replaces any convert-on-the-fly
//! camelCase/snake_case heuristic: the protocol's historical wire names
//! carry acronyms and legacy irregularities that no mechanical transform
//! reproduces.

use std::collections::HashMap;

use crate::error::{OciError, Result};
use super::model::SchemaField;

/// Bidirectional name index over one schema's sibling field set
#[derive(Debug, Clone, Default)]
pub struct NamingTable {
    by_app: HashMap<String, usize>,
    by_wire: HashMap<String, usize>,
}

impl NamingTable {
    /// Build the table, rejecting duplicate names in the sibling set
    pub(crate) fn build(schema_id: &str, fields: &[SchemaField]) -> Result<Self> {
        let mut by_app = HashMap::with_capacity(fields.len());
        let mut by_wire = HashMap::with_capacity(fields.len());

        for (index, field) in fields.iter().enumerate() {
            if by_app.insert(field.app_name.clone(), index).is_some() {
                return Err(OciError::SchemaIntegrity(format!(
                    "{}: duplicate app field name {}",
                    schema_id, field.app_name
                )));
            }
            if by_wire.insert(field.wire_name.clone(), index).is_some() {
                return Err(OciError::SchemaIntegrity(format!(
                    "{}: duplicate wire name {}",
                    schema_id, field.wire_name
                )));
            }
        }

        Ok(Self { by_app, by_wire })
    }

    /// The field's declared wire name, verbatim
    pub fn to_wire_name<'a>(&self, field: &'a SchemaField) -> &'a str {
        &field.wire_name
    }

    /// The field's declared application name, verbatim
    pub fn to_app_name<'a>(&self, field: &'a SchemaField) -> &'a str {
        &field.app_name
    }

    /// Index of the field with this application name
    pub(crate) fn index_by_app(&self, app_name: &str) -> Option<usize> {
        self.by_app.get(app_name).copied()
    }

    /// Index of the field with this wire name
    pub(crate) fn index_by_wire(&self, wire_name: &str) -> Option<usize> {
        self.by_wire.get(wire_name).copied()
    }
}
