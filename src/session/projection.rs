//! Per-subject statement projection grouped by predicate

use crate::rdf::vocab::rdf;
use crate::rdf::{NamedNode, Node, Statement};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub(crate) struct Projection {
    by_predicate: IndexMap<NamedNode, Vec<Statement>>,
}

impl Projection {
    pub fn new(statements: impl IntoIterator<Item = Statement>) -> Self {
        let mut by_predicate: IndexMap<NamedNode, Vec<Statement>> = IndexMap::new();
        for stmt in statements {
            let group = by_predicate.entry(stmt.predicate.clone()).or_default();
            if !group.contains(&stmt) {
                group.push(stmt);
            }
        }
        Self { by_predicate }
    }

    /// Statements of a predicate, restricted to `context` when given
    pub fn statements<'a>(
        &'a self,
        predicate: &NamedNode,
        context: Option<&'a NamedNode>,
    ) -> impl Iterator<Item = &'a Statement> + 'a {
        self.by_predicate
            .get(predicate)
            .into_iter()
            .flatten()
            .filter(move |stmt| in_context(stmt, context))
    }

    /// Distinct objects of a predicate, in statement order
    pub fn objects(&self, predicate: &NamedNode, context: Option<&NamedNode>) -> Vec<Node> {
        let mut objects: Vec<Node> = Vec::new();
        for stmt in self.statements(predicate, context) {
            if !objects.contains(&stmt.object) {
                objects.push(stmt.object.clone());
            }
        }
        objects
    }

    /// URI objects of rdf:type statements
    pub fn types(&self) -> Vec<NamedNode> {
        self.objects(&rdf::type_(), None)
            .into_iter()
            .filter_map(|node| node.as_named_node().cloned())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NamedNode, &[Statement])> {
        self.by_predicate.iter().map(|(p, s)| (p, s.as_slice()))
    }
}

/// Whether the statement is in `context`; `None` matches every context
pub(crate) fn in_context(stmt: &Statement, context: Option<&NamedNode>) -> bool {
    match context {
        Some(context) => stmt.context.as_ref() == Some(context),
        None => true,
    }
}
