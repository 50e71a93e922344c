//! Structural codec: lists, containers and maps
//!
//! Decoding never fails on malformed structures. A missing `rdf:first` yields
//! an absent slot, a broken `rdf:rest` chain ends the list, and container
//! gaps stay as absent slots.

use super::changes::ChangeSet;
use super::SessionResult;
use crate::connection::Connection;
use crate::mapping::ContainerType;
use crate::rdf::vocab::{self, rdf};
use crate::rdf::{BlankNode, Id, NamedNode, Node, Statement, StatementPattern};
use indexmap::IndexSet;
use std::collections::HashSet;

/// Read access to statements, either straight from the connection or
/// overlaid with pending changes
pub(crate) trait StatementSource {
    fn statements(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
    ) -> SessionResult<Vec<Statement>>;

    fn objects(
        &self,
        subject: &Id,
        predicate: &NamedNode,
        context: Option<&NamedNode>,
    ) -> SessionResult<Vec<Node>> {
        let mut objects: Vec<Node> = Vec::new();
        for stmt in self.statements(Some(subject), Some(predicate), None, context)? {
            if !objects.contains(&stmt.object) {
                objects.push(stmt.object);
            }
        }
        Ok(objects)
    }

    fn has_type(
        &self,
        subject: &Id,
        type_uri: &NamedNode,
        context: Option<&NamedNode>,
    ) -> SessionResult<bool> {
        let type_node = Node::from(type_uri.clone());
        Ok(!self
            .statements(Some(subject), Some(&rdf::type_()), Some(&type_node), context)?
            .is_empty())
    }
}

/// Committed (or transaction-visible) statements of a connection
pub(crate) struct Direct<'a, C: Connection> {
    pub connection: &'a C,
    pub include_inferred: bool,
}

impl<C: Connection> StatementSource for Direct<'_, C> {
    fn statements(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
    ) -> SessionResult<Vec<Statement>> {
        Ok(self
            .connection
            .find_statements(subject, predicate, object, context, self.include_inferred)?)
    }
}

/// Connection statements minus pending removals plus pending additions
pub(crate) struct Overlay<'a, C: Connection> {
    pub connection: &'a C,
    pub changes: &'a ChangeSet,
}

impl<C: Connection> StatementSource for Overlay<'_, C> {
    fn statements(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
    ) -> SessionResult<Vec<Statement>> {
        let mut result: IndexSet<Statement> = self
            .connection
            .find_statements(subject, predicate, object, context, false)?
            .into_iter()
            .filter(|stmt| !self.changes.is_removed(stmt))
            .collect();
        let pattern = StatementPattern::new(subject, predicate, object, context);
        for stmt in self.changes.added() {
            if pattern.matches(stmt) {
                result.insert(stmt.clone());
            }
        }
        Ok(result.into_iter().collect())
    }
}

/// Element nodes of the list starting at `head`
pub(crate) fn decode_list(
    source: &impl StatementSource,
    head: &Node,
    context: Option<&NamedNode>,
) -> SessionResult<Vec<Option<Node>>> {
    let nil = Node::from(rdf::nil());
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut current = head.clone();
    while current != nil {
        let Some(id) = current.as_id() else {
            break;
        };
        if !visited.insert(id.clone()) {
            break;
        }
        items.push(source.objects(&id, &rdf::first(), context)?.into_iter().next());
        match source.objects(&id, &rdf::rest(), context)?.into_iter().next() {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(items)
}

/// Largest run of absent slots an indexed container may decode to
const MAX_CONTAINER_GAP: usize = 1024;

/// Members of the container at `node`
///
/// Indexed decoding places each member at `index - 1` and keeps gaps;
/// unordered decoding returns members by increasing index.
pub(crate) fn decode_container(
    source: &impl StatementSource,
    node: &Node,
    context: Option<&NamedNode>,
    indexed: bool,
) -> SessionResult<Vec<Option<Node>>> {
    let Some(id) = node.as_id() else {
        return Ok(Vec::new());
    };
    let mut members: Vec<(usize, Node)> = source
        .statements(Some(&id), None, None, context)?
        .into_iter()
        .filter_map(|stmt| rdf::member_index(&stmt.predicate).map(|i| (i, stmt.object)))
        .collect();
    members.sort_by_key(|(index, _)| *index);

    if !indexed {
        return Ok(members.into_iter().map(|(_, node)| Some(node)).collect());
    }
    // Indices far past the member count are malformed fragments
    let limit = members.len().saturating_add(MAX_CONTAINER_GAP);
    members.retain(|(index, _)| *index <= limit);
    let size = members.last().map(|(index, _)| *index).unwrap_or(0);
    let mut slots = vec![None; size];
    for (index, node) in members {
        slots[index - 1] = Some(node);
    }
    Ok(slots)
}

/// (key, value) pairs of map entries reachable from `subject` through
/// `predicate`. Entries without a key are skipped.
pub(crate) fn decode_map(
    source: &impl StatementSource,
    subject: &Id,
    predicate: &NamedNode,
    key_predicate: &NamedNode,
    value_predicate: Option<&NamedNode>,
    context: Option<&NamedNode>,
) -> SessionResult<Vec<(Node, Node)>> {
    let mut entries = Vec::new();
    for entry in source.objects(subject, predicate, context)? {
        let Some(entry_id) = entry.as_id() else {
            continue;
        };
        let Some(key) = source.objects(&entry_id, key_predicate, context)?.into_iter().next() else {
            continue;
        };
        let value = match value_predicate {
            Some(vp) => match source.objects(&entry_id, vp, context)?.into_iter().next() {
                Some(value) => value,
                None => continue,
            },
            None => entry,
        };
        entries.push((key, value));
    }
    Ok(entries)
}

/// Statements of a freshly encoded structure and the node that heads it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Encoded {
    pub head: Node,
    pub statements: Vec<Statement>,
}

/// Encode a list as a chain of blank nodes; an empty list encodes to nothing
pub(crate) fn encode_list(
    items: &[Option<Node>],
    context: Option<&NamedNode>,
    fresh: &mut dyn FnMut() -> BlankNode,
) -> Option<Encoded> {
    if items.is_empty() {
        return None;
    }
    let nodes: Vec<BlankNode> = items.iter().map(|_| fresh()).collect();
    let mut statements = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let node = &nodes[i];
        statements.push(Statement::new(
            node.clone(),
            rdf::type_(),
            rdf::list(),
            context.cloned(),
        ));
        if let Some(item) = item {
            statements.push(Statement::new(
                node.clone(),
                rdf::first(),
                item.clone(),
                context.cloned(),
            ));
        }
        let rest: Node = match nodes.get(i + 1) {
            Some(next) => next.clone().into(),
            None => rdf::nil().into(),
        };
        statements.push(Statement::new(node.clone(), rdf::rest(), rest, context.cloned()));
    }
    Some(Encoded {
        head: nodes[0].clone().into(),
        statements,
    })
}

/// Encode a container; absent items leave their index unused
pub(crate) fn encode_container(
    container_type: ContainerType,
    items: &[Option<Node>],
    context: Option<&NamedNode>,
    fresh: &mut dyn FnMut() -> BlankNode,
) -> Encoded {
    let node = fresh();
    let mut statements = vec![Statement::new(
        node.clone(),
        rdf::type_(),
        container_type.uri(),
        context.cloned(),
    )];
    for (i, item) in items.iter().enumerate() {
        if let Some(item) = item {
            statements.push(Statement::new(
                node.clone(),
                rdf::member(i + 1),
                item.clone(),
                context.cloned(),
            ));
        }
    }
    Encoded {
        head: node.into(),
        statements,
    }
}

/// Encode map entries hanging off `subject`
///
/// With a value predicate every entry gets its own blank node. Without one the
/// value itself carries the key, so values must be resources.
pub(crate) fn encode_map(
    subject: &Id,
    predicate: &NamedNode,
    entries: &[(Node, Node)],
    key_predicate: &NamedNode,
    value_predicate: Option<&NamedNode>,
    context: Option<&NamedNode>,
    fresh: &mut dyn FnMut() -> BlankNode,
) -> Result<Vec<Statement>, String> {
    let mut statements = Vec::new();
    for (key, value) in entries {
        let entry: Id = match value_predicate {
            Some(vp) => {
                let entry = fresh();
                statements.push(Statement::new(
                    entry.clone(),
                    vp.clone(),
                    value.clone(),
                    context.cloned(),
                ));
                entry.into()
            }
            None => value
                .as_id()
                .ok_or_else(|| format!("map value {} must be a resource", value))?,
        };
        statements.push(Statement::new(
            subject.clone(),
            predicate.clone(),
            entry.clone(),
            context.cloned(),
        ));
        statements.push(Statement::new(
            entry,
            key_predicate.clone(),
            key.clone(),
            context.cloned(),
        ));
    }
    Ok(statements)
}

/// Statements that make up the list or container headed by `node`; empty when
/// the node is neither
pub(crate) fn structure_statements(
    source: &impl StatementSource,
    node: &Node,
    context: Option<&NamedNode>,
) -> SessionResult<Vec<Statement>> {
    let Some(id) = node.as_id() else {
        return Ok(Vec::new());
    };
    let is_list = source.has_type(&id, &rdf::list(), context)?
        || !source
            .statements(Some(&id), Some(&rdf::first()), None, context)?
            .is_empty();
    if is_list {
        return list_statements(source, id, context);
    }

    for container_type in vocab::container_types() {
        if source.has_type(&id, &container_type, context)? {
            return source.statements(Some(&id), None, None, context);
        }
    }
    Ok(Vec::new())
}

fn list_statements(
    source: &impl StatementSource,
    head: Id,
    context: Option<&NamedNode>,
) -> SessionResult<Vec<Statement>> {
    let nil = Node::from(rdf::nil());
    let mut statements = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(head);
    while let Some(id) = current.take() {
        if !visited.insert(id.clone()) {
            break;
        }
        let node_statements = source.statements(Some(&id), None, None, context)?;
        current = node_statements
            .iter()
            .find(|stmt| stmt.predicate == rdf::rest() && stmt.object != nil)
            .and_then(|stmt| stmt.object.as_id());
        statements.extend(node_statements);
    }
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MemoryConnection;
    use crate::rdf::Literal;

    fn uri(s: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{}", s)).unwrap()
    }

    fn lit(s: &str) -> Node {
        Literal::new_simple_literal(s).into()
    }

    fn store(statements: Vec<Statement>) -> MemoryConnection {
        let mut conn = MemoryConnection::new();
        conn.update(&IndexSet::new(), &statements.into_iter().collect())
            .unwrap();
        conn
    }

    #[test]
    fn test_list_encode_decode() {
        let items = vec![Some(lit("a")), None, Some(lit("c"))];
        let encoded = encode_list(&items, None, &mut BlankNode::new).unwrap();
        assert_eq!(encoded.statements.len(), 8);

        let conn = store(encoded.statements);
        let source = Direct {
            connection: &conn,
            include_inferred: false,
        };
        assert_eq!(decode_list(&source, &encoded.head, None).unwrap(), items);
        assert!(encode_list(&[], None, &mut BlankNode::new).is_none());
    }

    #[test]
    fn test_broken_list_degrades() {
        let a = BlankNode::new();
        let b = BlankNode::new();
        let conn = store(vec![
            Statement::new(a.clone(), rdf::first(), lit("a"), None),
            Statement::new(a.clone(), rdf::rest(), b.clone(), None),
            Statement::new(b.clone(), rdf::rest(), a.clone(), None),
        ]);
        let source = Direct {
            connection: &conn,
            include_inferred: false,
        };
        let items = decode_list(&source, &a.into(), None).unwrap();
        assert_eq!(items, vec![Some(lit("a")), None]);
        assert!(decode_list(&source, &rdf::nil().into(), None).unwrap().is_empty());
    }

    #[test]
    fn test_container_gap() {
        let items = vec![Some(lit("one")), None, Some(lit("three"))];
        let encoded = encode_container(ContainerType::Seq, &items, None, &mut BlankNode::new);
        assert_eq!(encoded.statements.len(), 3);

        let conn = store(encoded.statements);
        let source = Direct {
            connection: &conn,
            include_inferred: false,
        };
        assert_eq!(
            decode_container(&source, &encoded.head, None, true).unwrap(),
            items
        );
        assert_eq!(
            decode_container(&source, &encoded.head, None, false).unwrap(),
            vec![Some(lit("one")), Some(lit("three"))]
        );
    }

    #[test]
    fn test_container_index_out_of_range() {
        let head = BlankNode::new();
        let conn = store(vec![
            Statement::new(head.clone(), rdf::member(1), lit("one"), None),
            Statement::new(
                head.clone(),
                NamedNode::from_parts(vocab::RDF_NS, &format!("_{}", usize::MAX)).unwrap(),
                lit("huge"),
                None,
            ),
            Statement::new(head.clone(), rdf::member(5000), lit("far"), None),
        ]);
        let source = Direct {
            connection: &conn,
            include_inferred: false,
        };
        let node: Node = head.into();
        assert_eq!(
            decode_container(&source, &node, None, true).unwrap(),
            vec![Some(lit("one"))]
        );
        assert_eq!(decode_container(&source, &node, None, false).unwrap().len(), 3);
    }

    #[test]
    fn test_map_with_value_predicate() {
        let subject: Id = uri("alice").into();
        let entries = vec![(lit("home"), lit("+358 1")), (lit("work"), lit("+358 2"))];
        let statements = encode_map(
            &subject,
            &uri("phones"),
            &entries,
            &uri("key"),
            Some(&uri("value")),
            None,
            &mut BlankNode::new,
        )
        .unwrap();
        assert_eq!(statements.len(), 6);

        let conn = store(statements);
        let source = Direct {
            connection: &conn,
            include_inferred: false,
        };
        let decoded = decode_map(
            &source,
            &subject,
            &uri("phones"),
            &uri("key"),
            Some(&uri("value")),
            None,
        )
        .unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn test_map_without_value_predicate() {
        let subject: Id = uri("alice").into();
        let entries = vec![(lit("b"), Node::from(uri("bob")))];
        let statements = encode_map(
            &subject,
            &uri("friends"),
            &entries,
            &uri("nick"),
            None,
            None,
            &mut BlankNode::new,
        )
        .unwrap();
        assert_eq!(
            statements,
            vec![
                Statement::new(subject.clone(), uri("friends"), uri("bob"), None),
                Statement::new(uri("bob"), uri("nick"), lit("b"), None),
            ]
        );

        let literal_value = vec![(lit("b"), lit("bob"))];
        assert!(encode_map(
            &subject,
            &uri("friends"),
            &literal_value,
            &uri("nick"),
            None,
            None,
            &mut BlankNode::new,
        )
        .is_err());
    }

    #[test]
    fn test_structure_statements() {
        let items = vec![Some(lit("a")), Some(lit("b"))];
        let list = encode_list(&items, None, &mut BlankNode::new).unwrap();
        let container = encode_container(ContainerType::Bag, &items, None, &mut BlankNode::new);
        let plain = Statement::new(uri("bob"), uri("name"), lit("Bob"), None);

        let mut all = list.statements.clone();
        all.extend(container.statements.clone());
        all.push(plain);
        let conn = store(all);
        let source = Direct {
            connection: &conn,
            include_inferred: false,
        };

        let found = structure_statements(&source, &list.head, None).unwrap();
        assert_eq!(found.len(), list.statements.len());
        let found = structure_statements(&source, &container.head, None).unwrap();
        assert_eq!(found.len(), container.statements.len());
        assert!(structure_statements(&source, &uri("bob").into(), None)
            .unwrap()
            .is_empty());
        assert!(structure_statements(&source, &lit("x"), None).unwrap().is_empty());
    }

    #[test]
    fn test_overlay() {
        let kept = Statement::new(uri("a"), uri("p"), lit("1"), None);
        let dropped = Statement::new(uri("a"), uri("p"), lit("2"), None);
        let pending = Statement::new(uri("a"), uri("p"), lit("3"), None);
        let conn = store(vec![kept.clone(), dropped.clone()]);

        let mut changes = ChangeSet::new();
        changes.remove(dropped);
        changes.add(pending.clone());
        changes.add(Statement::new(uri("b"), uri("p"), lit("4"), None));

        let overlay = Overlay {
            connection: &conn,
            changes: &changes,
        };
        let subject: Id = uri("a").into();
        let found = overlay.statements(Some(&subject), None, None, None).unwrap();
        assert_eq!(found, vec![kept, pending]);
    }
}
