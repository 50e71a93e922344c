//! Read-only namespaces
//!
//! Tracks the namespaces the serializer must never write statements about.

use super::types::NamedNode;
use super::vocab::{OWL_NS, RDFS_NS, RDF_NS, XSD_NS};
use std::collections::HashSet;

/// Namespace manager for read-only namespaces
///
/// The built-in rdf, rdfs, xsd and owl namespaces start out restricted.
#[derive(Debug, Clone)]
pub struct NamespaceManager {
    /// Namespace IRIs nobody may write statements about
    restricted: HashSet<String>,
}

impl NamespaceManager {
    /// Create a new namespace manager with the built-in namespaces restricted
    pub fn new() -> Self {
        let mut mgr = Self {
            restricted: HashSet::new(),
        };
        for ns in [RDF_NS, RDFS_NS, XSD_NS, OWL_NS] {
            mgr.restrict(ns);
        }
        mgr
    }

    /// Mark a namespace as read-only
    pub fn restrict(&mut self, iri: impl Into<String>) {
        self.restricted.insert(iri.into());
    }

    /// Whether the node lives in a read-only namespace
    pub fn is_restricted(&self, node: &NamedNode) -> bool {
        self.restricted.contains(node.ns())
    }

    /// Restricted namespace IRIs
    pub fn restricted(&self) -> impl Iterator<Item = &str> {
        self.restricted.iter().map(String::as_str)
    }
}

impl Default for NamespaceManager {
    fn default() -> Self {
        Self::new()
    }
}
