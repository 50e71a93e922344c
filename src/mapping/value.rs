//! Declared value types of mapped properties

use crate::object::ClassId;
use crate::rdf::Node;
use std::fmt;

/// Enumeration with a fixed set of constant names
///
/// Constants are written as URIs when the enum has a namespace, as plain
/// literals otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub name: String,
    pub namespace: Option<String>,
    pub constants: Vec<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            namespace: None,
            constants: constants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn constant(&self, name: &str) -> Option<&str> {
        self.constants
            .iter()
            .find(|c| c.as_str() == name)
            .map(|c| c.as_str())
    }
}

/// Type a property value converts to and from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    Double,
    Float,
    Boolean,
    DateTime,
    Date,
    /// Any node, passed through unchanged
    Node,
    /// URI or blank node, passed through unchanged
    Id,
    /// URI node, passed through unchanged
    Uri,
    Enum(EnumType),
    /// Instance of a mapped class
    Class(ClassId),
    /// Whatever the node converts to naturally
    Any,
}

impl ValueType {
    /// Whether the node can be used as a value of this type without conversion
    pub fn accepts_node(&self, node: &Node) -> bool {
        match self {
            ValueType::Node => true,
            ValueType::Id => node.is_resource(),
            ValueType::Uri => node.is_named_node(),
            _ => false,
        }
    }

    pub fn is_node_type(&self) -> bool {
        matches!(self, ValueType::Node | ValueType::Id | ValueType::Uri)
    }

    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            ValueType::Class(class) => Some(*class),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Enum(e) => write!(f, "enum {}", e.name),
            ValueType::Class(c) => write!(f, "{}", c),
            other => write!(f, "{:?}", other),
        }
    }
}
