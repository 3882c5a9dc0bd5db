//! Entity objects
//!
//! Schema-agnostic storage plus typed accessors for the four variants.

use std::collections::BTreeMap;

use super::value::Value;

/// Entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Enterprise,
    Group,
    User,
    Generic,
}

/// A domain object or command
///
/// A mapping from application field name to value. The object model does
/// not enforce schema conformance; the codec does. Owned by the caller —
/// the core never retains a reference past the call that produced or
/// consumed it.
///
/// Equality is structural: kind, fields, and unmapped content. The
/// command tag is provenance, not a value.
#[derive(Debug, Clone)]
pub struct Entity {
    kind: EntityKind,
    command: Option<String>,
    fields: BTreeMap<String, Value>,

    /// Wire elements the local schema snapshot doesn't know, preserved in
    /// arrival order. Never serialized back out.
    unmapped: Vec<(String, Value)>,
}

impl Entity {
    fn new(kind: EntityKind, command: Option<String>) -> Self {
        Self {
            kind,
            command,
            fields: BTreeMap::new(),
            unmapped: Vec::new(),
        }
    }

    /// A command entity, addressable in the schema catalog by name
    pub fn command(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Generic, Some(name.into()))
    }

    /// An enterprise entity
    pub fn enterprise() -> Self {
        Self::new(EntityKind::Enterprise, None)
    }

    /// A group entity
    pub fn group() -> Self {
        Self::new(EntityKind::Group, None)
    }

    /// A user entity
    pub fn user() -> Self {
        Self::new(EntityKind::User, None)
    }

    /// A generic (untyped) entity
    pub fn generic() -> Self {
        Self::new(EntityKind::Generic, None)
    }

    /// Construct with an explicit kind
    pub fn of_kind(kind: EntityKind) -> Self {
        Self::new(kind, None)
    }

    /// The entity variant
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Command name, when this entity is a command
    pub fn command_name(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Get a field value by application name
    pub fn get(&self, field_name: &str) -> Option<&Value> {
        self.fields.get(field_name)
    }

    /// Set a field value; overwrites — last write wins
    pub fn set(&mut self, field_name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field_name.into(), value.into());
    }

    /// Builder-style set
    pub fn with(mut self, field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field_name, value);
        self
    }

    /// Remove a field; returns the previous value if present
    pub fn remove(&mut self, field_name: &str) -> Option<Value> {
        self.fields.remove(field_name)
    }

    /// Iterate (name, value) pairs in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of mapped fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Wire elements preserved from deserialization that the schema
    /// didn't know, in arrival order
    pub fn unmapped(&self) -> &[(String, Value)] {
        &self.unmapped
    }

    /// Record an unknown wire element (deserialization path)
    pub(crate) fn push_unmapped(&mut self, wire_name: impl Into<String>, value: Value) {
        self.unmapped.push((wire_name.into(), value));
    }

    /// Tag this entity with its command name (deserialization path)
    pub(crate) fn into_command(mut self, name: &str) -> Self {
        self.command = Some(name.to_string());
        self
    }

    /// Convenience accessors for the typed variants
    pub fn is_enterprise(&self) -> bool {
        self.kind == EntityKind::Enterprise
    }

    pub fn is_group(&self) -> bool {
        self.kind == EntityKind::Group
    }

    pub fn is_user(&self) -> bool {
        self.kind == EntityKind::User
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.fields == other.fields
            && self.unmapped == other.unmapped
    }
}
