//! Serialization
//!
//! Entity + schema → ordered wire document.
//!
//! The output's sibling order strictly follows order_index at every
//! nesting level, regardless of the order fields were set on the entity.
//! That ordering is the correctness property this whole mapping exists to
//! guarantee — the remote endpoint rejects misordered documents outright.

use crate::entity::{Entity, Value};
use crate::error::{OciError, Result};
use crate::schema::{FieldKind, SchemaCatalog, SchemaDef, SchemaField};
use super::document::{WireDocument, WireElement};

/// Serialize an entity against its command schema
///
/// Rules, per field in order_index order:
/// - absent + required → `MissingRequiredField`
/// - absent + optional → omitted entirely (no empty placeholder)
/// - repeated → value must be a sequence; elements keep caller order
/// - nested → recurse with the resolved schema
pub fn serialize(
    entity: &Entity,
    schema: &SchemaDef,
    catalog: &SchemaCatalog,
) -> Result<WireDocument> {
    let children = serialize_fields(entity, schema, catalog)?;
    Ok(WireDocument {
        root: WireElement::parent(schema.command_wire_name(), children),
    })
}

fn serialize_fields(
    entity: &Entity,
    schema: &SchemaDef,
    catalog: &SchemaCatalog,
) -> Result<Vec<WireElement>> {
    let mut elements = Vec::with_capacity(schema.fields().len());

    // Fields are pre-sorted by order_index; integrity was validated at
    // catalog build time.
    for field in schema.fields() {
        let value = match entity.get(&field.app_name) {
            Some(value) => value,
            None if field.required => {
                return Err(OciError::MissingRequiredField(format!(
                    "{}.{}",
                    schema.id(),
                    field.app_name
                )));
            }
            None => continue,
        };

        if field.repeated {
            let items = match value {
                Value::List(items) => items,
                _ => {
                    return Err(OciError::UnexpectedNesting(format!(
                        "{}.{}: repeated field requires a sequence value",
                        schema.id(),
                        field.app_name
                    )));
                }
            };
            // minOccurs >= 1: an empty sequence does not satisfy a
            // required repeat
            if items.is_empty() && field.required {
                return Err(OciError::MissingRequiredField(format!(
                    "{}.{}",
                    schema.id(),
                    field.app_name
                )));
            }
            // Caller-provided element order is a contract; never reorder
            for item in items {
                elements.push(serialize_one(item, field, schema, catalog)?);
            }
        } else {
            elements.push(serialize_one(value, field, schema, catalog)?);
        }
    }

    Ok(elements)
}

fn serialize_one(
    value: &Value,
    field: &SchemaField,
    schema: &SchemaDef,
    catalog: &SchemaCatalog,
) -> Result<WireElement> {
    match (&field.kind, value) {
        (FieldKind::Scalar(_), Value::Scalar(scalar)) => {
            Ok(WireElement::text(&field.wire_name, scalar.to_wire_text()))
        }
        (FieldKind::Nested(target), Value::Entity(nested)) => {
            let nested_schema = catalog.resolve_nested(target)?;
            let children = serialize_fields(nested, &nested_schema, catalog)?;
            Ok(WireElement::parent(&field.wire_name, children))
        }
        (FieldKind::Scalar(_), Value::Entity(_)) => Err(OciError::UnexpectedNesting(format!(
            "{}.{}: scalar field given a nested entity",
            schema.id(),
            field.app_name
        ))),
        (FieldKind::Nested(_), Value::Scalar(_)) => Err(OciError::UnexpectedNesting(format!(
            "{}.{}: nested field given a scalar",
            schema.id(),
            field.app_name
        ))),
        (_, Value::List(_)) => Err(OciError::UnexpectedNesting(format!(
            "{}.{}: sequence value on a non-repeated position",
            schema.id(),
            field.app_name
        ))),
    }
}
