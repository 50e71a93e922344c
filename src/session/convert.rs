//! Leaf conversions between literals and native scalars
//!
//! Resource-valued conversions recurse into the binder and serializer; this
//! module only covers the cases that need no session state.

use crate::mapping::{ConverterRegistry, EnumType, ValueType};
use crate::object::Value;
use crate::rdf::{Literal, NamedNode, Node};

/// Literal → scalar, requiring the registered datatype
pub(crate) fn literal_to_value(
    registry: &ConverterRegistry,
    literal: &Literal,
    target: &ValueType,
) -> Result<Value, String> {
    let datatype = registry
        .datatype(target)
        .ok_or_else(|| format!("no datatype registered for {}", target))?;
    if &literal.datatype() != datatype {
        return Err(format!(
            "expected datatype {} but got {}",
            datatype,
            literal.datatype()
        ));
    }
    let codec = registry
        .codec(target)
        .ok_or_else(|| format!("no codec registered for {}", target))?;
    codec.from_lexical(literal.value())
}

/// Scalar → literal with the registered datatype
pub(crate) fn value_to_literal(
    registry: &ConverterRegistry,
    value: &Value,
    target: &ValueType,
) -> Result<Literal, String> {
    let target = match target {
        ValueType::Any => ConverterRegistry::infer_type(value)
            .ok_or_else(|| format!("no datatype for {:?}", value))?,
        other => other.clone(),
    };
    let datatype = registry
        .datatype(&target)
        .ok_or_else(|| format!("no datatype registered for {}", target))?;
    let codec = registry
        .codec(&target)
        .ok_or_else(|| format!("no codec registered for {}", target))?;
    let lexical = codec
        .to_lexical(value)
        .ok_or_else(|| format!("{:?} is not a {}", value, target))?;
    Ok(Literal::new_typed_literal(lexical, datatype.clone()))
}

/// Natural native form of a literal: registered datatypes become scalars,
/// anything else stays a node
pub(crate) fn natural_value(registry: &ConverterRegistry, literal: &Literal) -> Value {
    registry
        .value_type(&literal.datatype())
        .and_then(|t| registry.codec(t))
        .and_then(|codec| codec.from_lexical(literal.value()).ok())
        .unwrap_or_else(|| Value::Node(literal.clone().into()))
}

/// URI nodes match constants by local name, literals by lexical value
pub(crate) fn enum_from_node(enum_type: &EnumType, node: &Node) -> Result<Value, String> {
    let name = match node {
        Node::NamedNode(uri) => uri.ln(),
        Node::Literal(lit) => lit.value(),
        Node::BlankNode(_) => return Err(format!("cannot bind blank node into enum {}", enum_type.name)),
    };
    enum_type
        .constant(name)
        .map(|c| Value::Enum(c.to_string()))
        .ok_or_else(|| format!("{} is not a constant of {}", name, enum_type.name))
}

pub(crate) fn enum_to_node(enum_type: &EnumType, name: &str) -> Result<Node, String> {
    let constant = enum_type
        .constant(name)
        .ok_or_else(|| format!("{} is not a constant of {}", name, enum_type.name))?;
    match &enum_type.namespace {
        Some(ns) => NamedNode::from_parts(ns, constant)
            .map(Node::from)
            .map_err(|e| e.to_string()),
        None => Ok(Literal::new_simple_literal(constant).into()),
    }
}
