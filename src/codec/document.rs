//! Wire document model
//!
//! The ordered, transient tree a message takes between the codec and the
//! XML layer. Sibling order mirrors a schema's field order exactly.

/// A complete wire document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireDocument {
    pub root: WireElement,
}

impl WireDocument {
    /// A document with a childless root
    pub fn empty(root_name: impl Into<String>) -> Self {
        Self {
            root: WireElement {
                name: root_name.into(),
                value: WireValue::Children(Vec::new()),
            },
        }
    }
}

/// One element: a name and either text or ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireElement {
    pub name: String,
    pub value: WireValue,
}

impl WireElement {
    /// A text-valued element
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: WireValue::Text(text.into()),
        }
    }

    /// A composite element
    pub fn parent(name: impl Into<String>, children: Vec<WireElement>) -> Self {
        Self {
            name: name.into(),
            value: WireValue::Children(children),
        }
    }
}

/// Element content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Scalar text (possibly empty)
    Text(String),

    /// Nested elements in wire order
    Children(Vec<WireElement>),
}
