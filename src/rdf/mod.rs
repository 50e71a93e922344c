//! RDF model for the object binder
//!
//! This module provides the graph side of the mapping:
//! - URI, blank and literal nodes (wrapping oxrdf)
//! - Statements with an optional context (named graph)
//! - Vocabulary for lists, containers and XSD datatypes
//! - Read-only namespaces
//! - An indexed in-memory quad store
//!
//! # Example
//!
//! ```rust
//! use rdfbind::rdf::{MemoryStore, NamedNode, Literal, Statement, StatementPattern};
//!
//! let mut store = MemoryStore::new();
//!
//! let subject = NamedNode::new("http://example.org/alice").unwrap();
//! let predicate = NamedNode::new("http://xmlns.com/foaf/0.1/name").unwrap();
//! let object = Literal::new_simple_literal("Alice");
//!
//! store.insert(Statement::new(subject.clone(), predicate, object, None)).unwrap();
//!
//! let id = subject.into();
//! let results = store.query(&StatementPattern::new(Some(&id), None, None, None));
//! assert_eq!(results.len(), 1);
//! ```

mod namespace;
mod store;
mod types;
pub mod vocab;

pub use types::{
    BlankNode, Id, Literal, NamedNode, Node, RdfError, RdfResult, Statement, StatementPattern,
};

pub use store::{MemoryStore, StoreError, StoreResult};

pub use namespace::NamespaceManager;
