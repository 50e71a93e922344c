//! RDF term definitions
//!
//! This module provides wrapper types around the oxrdf library for the terms the
//! binder works with: URI nodes (with a namespace/local-name split), blank nodes,
//! literals and context-aware statements.

use oxrdf::{
    BlankNode as OxBlankNode,
    Literal as OxLiteral,
    NamedNode as OxNamedNode,
};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// RDF errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RdfError {
    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid blank node
    #[error("Invalid blank node: {0}")]
    InvalidBlankNode(String),

    /// Invalid literal
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
}

pub type RdfResult<T> = Result<T, RdfError>;

/// Position right after the rightmost `#`, else `/`, else `:`.
fn local_name_start(iri: &str) -> Option<usize> {
    iri.rfind('#')
        .or_else(|| iri.rfind('/'))
        .or_else(|| iri.rfind(':'))
        .map(|pos| pos + 1)
}

/// Named node (IRI)
///
/// Equality and hashing follow the identifier string; the namespace split is
/// derived from it.
#[derive(Debug, Clone)]
pub struct NamedNode {
    inner: OxNamedNode,
    split: usize,
}

impl PartialEq for NamedNode {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for NamedNode {}

impl Hash for NamedNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl NamedNode {
    /// Create a new named node from an IRI string
    pub fn new(iri: &str) -> RdfResult<Self> {
        let split = local_name_start(iri)
            .ok_or_else(|| RdfError::InvalidIri(format!("no separator character in {}", iri)))?;
        let inner = OxNamedNode::new(iri).map_err(|e| RdfError::InvalidIri(e.to_string()))?;
        Ok(Self { inner, split })
    }

    /// Create a named node from a namespace and a local name
    pub fn from_parts(ns: &str, ln: &str) -> RdfResult<Self> {
        if ns.is_empty() {
            return Err(RdfError::InvalidIri(format!("empty namespace for {}", ln)));
        }
        let inner = OxNamedNode::new(format!("{}{}", ns, ln))
            .map_err(|e| RdfError::InvalidIri(e.to_string()))?;
        Ok(Self { inner, split: ns.len() })
    }

    /// Create a named node without validation. Used for vocabulary constants.
    pub(crate) fn new_unchecked(iri: &str) -> Self {
        let split = local_name_start(iri).unwrap_or(0);
        Self {
            inner: OxNamedNode::new_unchecked(iri),
            split,
        }
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Namespace part, including the separator
    pub fn ns(&self) -> &str {
        &self.as_str()[..self.split]
    }

    /// Local name part
    pub fn ln(&self) -> &str {
        &self.as_str()[self.split..]
    }

    /// Get the inner oxrdf NamedNode
    pub fn inner(&self) -> &OxNamedNode {
        &self.inner
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

impl From<OxNamedNode> for NamedNode {
    fn from(node: OxNamedNode) -> Self {
        let split = local_name_start(node.as_str()).unwrap_or(0);
        Self { inner: node, split }
    }
}

impl From<NamedNode> for OxNamedNode {
    fn from(node: NamedNode) -> Self {
        node.inner
    }
}

/// Blank node (anonymous node)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(OxBlankNode);

impl BlankNode {
    /// Create a new blank node with a unique identifier
    pub fn new() -> Self {
        Self(OxBlankNode::default())
    }

    /// Create a blank node from a string identifier
    pub fn with_id(id: &str) -> RdfResult<Self> {
        OxBlankNode::new(id)
            .map(Self)
            .map_err(|e| RdfError::InvalidBlankNode(e.to_string()))
    }

    /// Get the blank node identifier
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner oxrdf BlankNode
    pub fn inner(&self) -> &OxBlankNode {
        &self.0
    }
}

impl Default for BlankNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.as_str())
    }
}

impl From<OxBlankNode> for BlankNode {
    fn from(node: OxBlankNode) -> Self {
        Self(node)
    }
}

/// RDF literal value: a lexical form plus either a datatype or a language tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(OxLiteral);

impl Literal {
    /// Create a simple literal (plain string)
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self(OxLiteral::new_simple_literal(value))
    }

    /// Create a literal with language tag
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> RdfResult<Self> {
        OxLiteral::new_language_tagged_literal(value, language)
            .map(Self)
            .map_err(|e| RdfError::InvalidLiteral(e.to_string()))
    }

    /// Create a typed literal
    pub fn new_typed_literal(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self(OxLiteral::new_typed_literal(value, datatype.inner))
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    /// Get the datatype
    pub fn datatype(&self) -> NamedNode {
        NamedNode::from(self.0.datatype().into_owned())
    }

    /// Get the inner oxrdf Literal
    pub fn inner(&self) -> &OxLiteral {
        &self.0
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lang) = self.language() {
            write!(f, "\"{}\"@{}", self.value(), lang)
        } else {
            write!(f, "\"{}\"^^{}", self.value(), self.datatype())
        }
    }
}

impl From<OxLiteral> for Literal {
    fn from(lit: OxLiteral) -> Self {
        Self(lit)
    }
}

/// Resource identity (NamedNode or BlankNode). Used as statement subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
}

impl Id {
    /// Check if this is a named node
    pub fn is_named_node(&self) -> bool {
        matches!(self, Id::NamedNode(_))
    }

    /// Check if this is a blank node
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Id::BlankNode(_))
    }

    /// The named node, if this is one
    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Id::NamedNode(n) => Some(n),
            Id::BlankNode(_) => None,
        }
    }

    /// Identifier string without any N-Triples decoration
    pub fn as_str(&self) -> &str {
        match self {
            Id::NamedNode(n) => n.as_str(),
            Id::BlankNode(b) => b.as_str(),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::NamedNode(n) => write!(f, "{}", n),
            Id::BlankNode(b) => write!(f, "{}", b),
        }
    }
}

impl From<NamedNode> for Id {
    fn from(node: NamedNode) -> Self {
        Id::NamedNode(node)
    }
}

impl From<BlankNode> for Id {
    fn from(node: BlankNode) -> Self {
        Id::BlankNode(node)
    }
}

/// Any graph value (NamedNode, BlankNode, or Literal)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
    /// Literal value
    Literal(Literal),
}

impl Node {
    /// Check if this is a named node
    pub fn is_named_node(&self) -> bool {
        matches!(self, Node::NamedNode(_))
    }

    /// Check if this is a blank node
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Node::BlankNode(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }

    /// Named or blank node
    pub fn is_resource(&self) -> bool {
        !self.is_literal()
    }

    /// The resource identity, if this node is not a literal
    pub fn as_id(&self) -> Option<Id> {
        match self {
            Node::NamedNode(n) => Some(Id::NamedNode(n.clone())),
            Node::BlankNode(b) => Some(Id::BlankNode(b.clone())),
            Node::Literal(_) => None,
        }
    }

    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Node::NamedNode(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Node kind name, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Node::NamedNode(_) => "URI",
            Node::BlankNode(_) => "blank node",
            Node::Literal(_) => "literal",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::NamedNode(n) => write!(f, "{}", n),
            Node::BlankNode(b) => write!(f, "{}", b),
            Node::Literal(l) => write!(f, "{}", l),
        }
    }
}

impl From<NamedNode> for Node {
    fn from(node: NamedNode) -> Self {
        Node::NamedNode(node)
    }
}

impl From<BlankNode> for Node {
    fn from(node: BlankNode) -> Self {
        Node::BlankNode(node)
    }
}

impl From<Literal> for Node {
    fn from(lit: Literal) -> Self {
        Node::Literal(lit)
    }
}

impl From<Id> for Node {
    fn from(id: Id) -> Self {
        match id {
            Id::NamedNode(n) => Node::NamedNode(n),
            Id::BlankNode(b) => Node::BlankNode(b),
        }
    }
}

impl PartialEq<Id> for Node {
    fn eq(&self, other: &Id) -> bool {
        match (self, other) {
            (Node::NamedNode(a), Id::NamedNode(b)) => a == b,
            (Node::BlankNode(a), Id::BlankNode(b)) => a == b,
            _ => false,
        }
    }
}

/// Statement: triple plus optional context (named graph)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    /// Subject
    pub subject: Id,
    /// Predicate
    pub predicate: NamedNode,
    /// Object
    pub object: Node,
    /// Named graph (None = default graph)
    pub context: Option<NamedNode>,
}

impl Statement {
    /// Create a new statement
    pub fn new(
        subject: impl Into<Id>,
        predicate: NamedNode,
        object: impl Into<Node>,
        context: Option<NamedNode>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
            context,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "{} {} {} {} .",
                self.subject, self.predicate, self.object, context
            )
        } else {
            write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
        }
    }
}

/// Statement pattern for lookups. `None` matches anything, including any context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementPattern {
    pub subject: Option<Id>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Node>,
    pub context: Option<NamedNode>,
}

impl StatementPattern {
    pub fn new(
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
    ) -> Self {
        Self {
            subject: subject.cloned(),
            predicate: predicate.cloned(),
            object: object.cloned(),
            context: context.cloned(),
        }
    }

    /// Check if a statement matches this pattern
    pub fn matches(&self, stmt: &Statement) -> bool {
        if let Some(ref s) = self.subject {
            if s != &stmt.subject {
                return false;
            }
        }
        if let Some(ref p) = self.predicate {
            if p != &stmt.predicate {
                return false;
            }
        }
        if let Some(ref o) = self.object {
            if o != &stmt.object {
                return false;
            }
        }
        if let Some(ref c) = self.context {
            if Some(c) != stmt.context.as_ref() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_node_split() {
        let node = NamedNode::new("http://example.org/ns#alice").unwrap();
        assert_eq!(node.ns(), "http://example.org/ns#");
        assert_eq!(node.ln(), "alice");
        assert_eq!(node.to_string(), "<http://example.org/ns#alice>");

        let node = NamedNode::new("http://example.org/people/bob").unwrap();
        assert_eq!(node.ns(), "http://example.org/people/");
        assert_eq!(node.ln(), "bob");

        let node = NamedNode::new("urn:isbn").unwrap();
        assert_eq!(node.ns(), "urn:");
        assert_eq!(node.ln(), "isbn");
    }

    #[test]
    fn test_named_node_from_parts() {
        let node = NamedNode::from_parts("http://example.org/", "alice").unwrap();
        assert_eq!(node, NamedNode::new("http://example.org/alice").unwrap());
        assert_eq!(node.ln(), "alice");
        assert!(NamedNode::from_parts("", "alice").is_err());
    }

    #[test]
    fn test_named_node_equality_ignores_split() {
        use std::collections::HashSet;

        let from_parts = NamedNode::from_parts("http://example.org/vocab", "#name").unwrap();
        let parsed = NamedNode::new("http://example.org/vocab#name").unwrap();
        assert_ne!(from_parts.ns(), parsed.ns());
        assert_eq!(from_parts, parsed);

        let set: HashSet<NamedNode> = [from_parts.clone()].into_iter().collect();
        assert!(set.contains(&parsed));

        let subject: Id = NamedNode::new("http://example.org/alice").unwrap().into();
        let object = Literal::new_simple_literal("Alice");
        assert_eq!(
            Statement::new(subject.clone(), from_parts, object.clone(), None),
            Statement::new(subject, parsed, object, None)
        );
    }

    #[test]
    fn test_named_node_without_separator() {
        assert!(NamedNode::new("alice").is_err());
    }

    #[test]
    fn test_blank_node() {
        let node1 = BlankNode::new();
        let node2 = BlankNode::new();
        assert_ne!(node1, node2);

        let a = BlankNode::with_id("b1").unwrap();
        let b = BlankNode::with_id("b1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "_:b1");
    }

    #[test]
    fn test_literal() {
        let lit = Literal::new_simple_literal("Alice");
        assert_eq!(lit.value(), "Alice");
        assert_eq!(lit.language(), None);
        assert_eq!(
            lit.datatype().as_str(),
            "http://www.w3.org/2001/XMLSchema#string"
        );

        let lit = Literal::new_language_tagged_literal("Alice", "en").unwrap();
        assert_eq!(lit.value(), "Alice");
        assert_eq!(lit.language(), Some("en"));
    }

    #[test]
    fn test_node_identity_comparison() {
        let uri = NamedNode::new("http://example.org/alice").unwrap();
        let node: Node = uri.clone().into();
        let id: Id = uri.into();
        assert_eq!(node, id);
        assert_eq!(node.as_id(), Some(id));
        assert!(node.is_resource());
        assert!(!Node::from(Literal::new_simple_literal("x")).is_resource());
    }

    #[test]
    fn test_statement_pattern_matching() {
        let subject = NamedNode::new("http://example.org/alice").unwrap();
        let predicate = NamedNode::new("http://xmlns.com/foaf/0.1/name").unwrap();
        let graph = NamedNode::new("http://example.org/graph/social").unwrap();
        let stmt = Statement::new(
            subject.clone(),
            predicate.clone(),
            Literal::new_simple_literal("Alice"),
            Some(graph.clone()),
        );

        let pattern = StatementPattern::new(Some(&subject.clone().into()), None, None, None);
        assert!(pattern.matches(&stmt));

        let pattern = StatementPattern::new(None, Some(&predicate), None, Some(&graph));
        assert!(pattern.matches(&stmt));

        let other = NamedNode::new("http://example.org/graph/other").unwrap();
        let pattern = StatementPattern::new(None, None, None, Some(&other));
        assert!(!pattern.matches(&stmt));

        assert!(StatementPattern::default().matches(&stmt));
    }
}
