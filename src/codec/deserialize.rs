//! Deserialization
//!
//! Wire document + schema → success entity or structured failure.
//!
//! Incoming documents are mapped by wire name (any sibling order is
//! accepted — strict ordering is an obligation on what we emit, not a
//! constraint imposed on the server). Wire elements the schema snapshot
//! doesn't know are preserved in the entity's unmapped bucket, never
//! dropped and never an error: the server may be newer than the client.

use crate::entity::{Entity, Scalar, Value};
use crate::error::{OciError, Result};
use crate::schema::{FieldKind, ScalarKind, SchemaCatalog, SchemaDef, SchemaField};
use super::document::{WireDocument, WireElement, WireValue};
use super::response::{ErrorCode, Response};

/// Root tag of the protocol's error envelope
///
/// The envelope has its own fixed shape and is recognized before the
/// response schema is consulted at all.
pub const ERROR_ENVELOPE_TAG: &str = "ErrorResponse";

const ERROR_CODE_TAG: &str = "errorCode";
const ERROR_SUMMARY_TAG: &str = "summary";

/// Deserialize a response document against the expected schema
pub fn deserialize(
    document: &WireDocument,
    schema: &SchemaDef,
    catalog: &SchemaCatalog,
) -> Result<Response> {
    // Error envelopes short-circuit: fixed shape, schema-independent
    if document.root.name == ERROR_ENVELOPE_TAG {
        return Ok(parse_error_envelope(&document.root));
    }

    if document.root.name != schema.command_wire_name() {
        return Err(OciError::UnexpectedNesting(format!(
            "expected {} document, got {}",
            schema.command_wire_name(),
            document.root.name
        )));
    }

    let children = root_children(&document.root)?;
    let mut entity = deserialize_fields(children, schema, catalog)?;
    entity = entity.into_command(schema.id());
    Ok(Response::Success(entity))
}

fn root_children(root: &WireElement) -> Result<&[WireElement]> {
    match &root.value {
        WireValue::Children(children) => Ok(children),
        // A bare or text-only root is an empty acknowledgement
        WireValue::Text(text) if text.is_empty() => Ok(&[]),
        WireValue::Text(_) => Err(OciError::MalformedDocument(format!(
            "{}: command root carries bare text",
            root.name
        ))),
    }
}

fn parse_error_envelope(root: &WireElement) -> Response {
    let mut code = None;
    let mut summary = None;

    if let WireValue::Children(children) = &root.value {
        for child in children {
            if let WireValue::Text(text) = &child.value {
                match child.name.as_str() {
                    ERROR_CODE_TAG => code = Some(text.clone()),
                    ERROR_SUMMARY_TAG => summary = Some(text.clone()),
                    _ => {}
                }
            }
        }
    }

    Response::Failure {
        code: ErrorCode::Server(code.unwrap_or_else(|| "UNKNOWN".to_string())),
        message: summary.unwrap_or_default(),
    }
}

fn deserialize_fields(
    children: &[WireElement],
    schema: &SchemaDef,
    catalog: &SchemaCatalog,
) -> Result<Entity> {
    let mut entity = Entity::of_kind(schema.entity_kind());

    for element in children {
        let field = match schema.field_by_wire(&element.name) {
            Some(field) => field,
            None => {
                // Forward compatibility: keep what we don't recognize
                entity.push_unmapped(element.name.clone(), unmapped_value(element));
                continue;
            }
        };

        let value = deserialize_one(element, field, schema, catalog)?;

        if field.repeated {
            // Sibling occurrences accumulate in arrival order
            match entity.remove(&field.app_name) {
                Some(Value::List(mut items)) => {
                    items.push(value);
                    entity.set(field.app_name.clone(), Value::List(items));
                }
                Some(_) | None => {
                    entity.set(field.app_name.clone(), Value::List(vec![value]));
                }
            }
        } else if entity.get(&field.app_name).is_some() {
            return Err(OciError::MalformedDocument(format!(
                "{}.{}: repeated occurrence of a single-valued element",
                schema.id(),
                field.app_name
            )));
        } else {
            entity.set(field.app_name.clone(), value);
        }
    }

    Ok(entity)
}

fn deserialize_one(
    element: &WireElement,
    field: &SchemaField,
    schema: &SchemaDef,
    catalog: &SchemaCatalog,
) -> Result<Value> {
    match &field.kind {
        FieldKind::Scalar(kind) => match &element.value {
            WireValue::Text(text) => parse_scalar(text, *kind, schema, field),
            WireValue::Children(_) => Err(OciError::UnexpectedNesting(format!(
                "{}.{}: scalar element carries children",
                schema.id(),
                field.app_name
            ))),
        },
        FieldKind::Nested(target) => {
            let nested_schema = catalog.resolve_nested(target)?;
            let children = match &element.value {
                WireValue::Children(children) => children.as_slice(),
                // <address/> — an empty composite
                WireValue::Text(text) if text.is_empty() => &[],
                WireValue::Text(_) => {
                    return Err(OciError::UnexpectedNesting(format!(
                        "{}.{}: composite element carries bare text",
                        schema.id(),
                        field.app_name
                    )));
                }
            };
            let nested = deserialize_fields(children, &nested_schema, catalog)?;
            Ok(Value::Entity(nested))
        }
    }
}

fn parse_scalar(
    text: &str,
    kind: ScalarKind,
    schema: &SchemaDef,
    field: &SchemaField,
) -> Result<Value> {
    let scalar = match kind {
        ScalarKind::Text => Scalar::Text(text.to_string()),
        ScalarKind::Int => Scalar::Int(text.parse().map_err(|_| {
            OciError::MalformedDocument(format!(
                "{}.{}: {:?} is not an integer",
                schema.id(),
                field.app_name,
                text
            ))
        })?),
        ScalarKind::Bool => match text {
            "true" | "1" => Scalar::Bool(true),
            "false" | "0" => Scalar::Bool(false),
            other => {
                return Err(OciError::MalformedDocument(format!(
                    "{}.{}: {:?} is not a boolean",
                    schema.id(),
                    field.app_name,
                    other
                )));
            }
        },
    };
    Ok(Value::Scalar(scalar))
}

/// Unknown subtrees surface as text scalars or generic entities whose
/// contents are themselves unmapped.
fn unmapped_value(element: &WireElement) -> Value {
    match &element.value {
        WireValue::Text(text) => Value::Scalar(Scalar::Text(text.clone())),
        WireValue::Children(children) => {
            let mut nested = Entity::generic();
            for child in children {
                nested.push_unmapped(child.name.clone(), unmapped_value(child));
            }
            Value::Entity(nested)
        }
    }
}
