//! Serializer: objects → pending statement changes
//!
//! Every save call carries a seen set keyed by object address. An object is
//! written at most once per call, which terminates reference cycles and
//! avoids re-emitting shared sub-objects.

use super::codec::{self, Encoded};
use super::convert;
use super::locale;
use super::{read_value, write_value, LocalId, Session, SessionError, SessionResult};
use crate::connection::Connection;
use crate::mapping::{IdKind, MappedClass, MappedProperty, PropertyKind, ValueType};
use crate::object::{self, Entity, ObjectRef, Value};
use crate::rdf::vocab::rdf;
use crate::rdf::{Id, Literal, NamedNode, Node, Statement};
use rustc_hash::FxHashSet;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

impl<C: Connection> Session<C> {
    /// Record the statements of `object`; returns its identity
    pub(super) fn to_rdf(
        &mut self,
        object: &ObjectRef,
        parent_context: Option<&NamedNode>,
        seen: &mut FxHashSet<usize>,
    ) -> SessionResult<Id> {
        if let Some(id) = node_identity(object) {
            return Ok(id);
        }
        let config = Arc::clone(&self.configuration);
        let class = object::class_of(object);
        let mapped = config
            .get(class)
            .ok_or_else(|| SessionError::UnmappedClass(class.name().to_string()))?;

        let address = object::address(object);
        if seen.contains(&address) {
            if let Some(id) = self.cache.identity_of(object) {
                return Ok(id.clone());
            }
        }
        seen.insert(address);

        let known = match self.cache.identity_of(object) {
            Some(id) => Some(id.clone()),
            None => self.state_identity(mapped, object)?,
        };
        let context = mapped.context().or(parent_context);
        let (id, update) = match known {
            Some(id) => {
                let update = self.subject_exists(&id, mapped, context)?;
                (id, update)
            }
            None => (self.assign_identity(mapped, object)?, false),
        };
        self.cache.register(id.clone(), Rc::clone(object));

        if config.is_restricted(&id) {
            debug!("Not writing {}: namespace is read-only", id);
            return Ok(id);
        }
        debug!(
            "{} {} as {}",
            if update { "Updating" } else { "Creating" },
            id,
            class
        );
        self.write_properties(object, &id, mapped, context, update, seen)?;
        Ok(id)
    }

    /// Identity held by the object's id property, if any
    fn state_identity(&self, mapped: &MappedClass, object: &ObjectRef) -> SessionResult<Option<Id>> {
        let Some(id_property) = mapped.id_property() else {
            return Ok(None);
        };
        let value = read_value(object, &id_property.accessor);
        let id = match (id_property.kind, value) {
            (_, Value::Null) => None,
            (IdKind::Local, Value::Integer(n)) => Some(self.known_local_id(LocalId::new(n as u64))?),
            (IdKind::Local, Value::String(s)) => {
                let local_id = s
                    .parse::<LocalId>()
                    .map_err(|e| SessionError::InvalidIdentity(format!("{}: {}", s, e)))?;
                Some(self.known_local_id(local_id)?)
            }
            (_, Value::Node(node)) => Some(node.as_id().ok_or_else(|| {
                SessionError::InvalidIdentity(format!("literal {} cannot identify an object", node))
            })?),
            (_, Value::String(s)) => Some(self.configuration.resolve_uri(&s)?.into()),
            (_, other) => {
                return Err(SessionError::InvalidIdentity(format!(
                    "{:?} cannot identify an object",
                    other
                )))
            }
        };
        Ok(id)
    }

    fn known_local_id(&self, local_id: LocalId) -> SessionResult<Id> {
        self.identities
            .id(local_id)
            .ok_or_else(|| SessionError::InvalidIdentity(format!("unknown local id {}", local_id)))
    }

    /// New identity from the URI template, else a fresh blank node
    fn assign_identity(&mut self, mapped: &MappedClass, object: &ObjectRef) -> SessionResult<Id> {
        let template = {
            let guard = object.borrow();
            let entity: &dyn Entity = &*guard;
            mapped.template_uri(entity.as_any())
        };
        let id: Id = match template {
            Some(uri) => self.configuration.resolve_uri(&uri)?.into(),
            None => self.connection.create_blank_node().into(),
        };
        debug!("Assigned identity {} to new {}", id, mapped.class());

        if let Some(id_property) = mapped.id_property() {
            let value = match id_property.kind {
                IdKind::Local => Value::Integer(self.identities.local_id(&id).value() as i64),
                IdKind::Uri | IdKind::Resource => Value::Node(id.clone().into()),
            };
            write_value(object, &id_property.accessor, value);
        }
        Ok(id)
    }

    /// Whether the subject is already stored as this class. Untyped classes
    /// exist once the subject has any statement in the context.
    fn subject_exists(
        &self,
        id: &Id,
        mapped: &MappedClass,
        context: Option<&NamedNode>,
    ) -> SessionResult<bool> {
        let statements = match mapped.type_uri() {
            Some(type_uri) => {
                let type_node = Node::from(type_uri.clone());
                self.overlay_find(Some(id), Some(&rdf::type_()), Some(&type_node), context)?
            }
            None => self.overlay_find(Some(id), None, None, context)?,
        };
        Ok(!statements.is_empty())
    }

    fn write_properties(
        &mut self,
        object: &ObjectRef,
        id: &Id,
        mapped: &MappedClass,
        context: Option<&NamedNode>,
        update: bool,
        seen: &mut FxHashSet<usize>,
    ) -> SessionResult<()> {
        if !update {
            if let Some(type_uri) = mapped.type_uri() {
                self.record_add(Statement::new(
                    id.clone(),
                    rdf::type_(),
                    type_uri.clone(),
                    context.cloned(),
                ));
            }
        }

        for property in mapped.properties() {
            if property.is_dynamic() {
                continue;
            }
            if property.is_mixin() {
                self.write_mixin(object, id, property, context, seen)?;
                continue;
            }
            if !property.is_simple() {
                continue;
            }
            let Some(predicate) = property.predicate().cloned() else {
                continue;
            };
            let value = read_value(object, property.accessor());
            let context = property.context().or(context);

            match property.kind() {
                PropertyKind::Single | PropertyKind::Collection => {
                    if update {
                        self.remove_values(id, &predicate, context)?;
                    }
                    for item in value.into_list() {
                        if let Some(node) =
                            self.value_to_node(&item, property, property.value_type(), context, seen)?
                        {
                            self.record_add(Statement::new(id.clone(), predicate.clone(), node, context.cloned()));
                        }
                    }
                }
                PropertyKind::Localized => {
                    let locale = self.config.current_locale().to_string();
                    if update {
                        for stmt in self.overlay_find(Some(id), Some(&predicate), None, context)? {
                            let same_locale = stmt
                                .object
                                .as_literal()
                                .map(|l| locale::language_of(l).eq_ignore_ascii_case(&locale))
                                .unwrap_or(false);
                            if same_locale {
                                self.record_remove(stmt)?;
                            }
                        }
                    }
                    if let Some(text) = value.into_string() {
                        let literal = locale::literal(&text, &locale)?;
                        self.record_add(Statement::new(id.clone(), predicate, literal, context.cloned()));
                    }
                }
                PropertyKind::LocalizedMap => {
                    if update {
                        self.remove_values(id, &predicate, context)?;
                    }
                    for (language, text) in value.into_localized() {
                        let literal = locale::literal(&text, &language)?;
                        self.record_add(Statement::new(
                            id.clone(),
                            predicate.clone(),
                            literal,
                            context.cloned(),
                        ));
                    }
                }
                PropertyKind::List | PropertyKind::Container { .. } => {
                    self.write_sequence(id, &predicate, property, value, context, update, seen)?;
                }
                PropertyKind::Map { .. } => {
                    self.write_map(id, &predicate, property, value, context, update, seen)?;
                }
                PropertyKind::Mixin | PropertyKind::Dynamic { .. } => {}
            }
        }

        for property in mapped.dynamic_properties() {
            self.write_dynamic(object, id, mapped, property, context, update, seen)?;
        }
        Ok(())
    }

    /// Mixins write onto the host subject
    fn write_mixin(
        &mut self,
        object: &ObjectRef,
        id: &Id,
        property: &MappedProperty,
        context: Option<&NamedNode>,
        seen: &mut FxHashSet<usize>,
    ) -> SessionResult<()> {
        let Some(mixin_object) = read_value(object, property.accessor()).into_object() else {
            return Ok(());
        };
        let config = Arc::clone(&self.configuration);
        let class = object::class_of(&mixin_object);
        let mixin = config
            .get(class)
            .ok_or_else(|| SessionError::UnmappedClass(class.name().to_string()))?;
        let context = property.context().or(mixin.context()).or(context);
        let update = self.subject_exists(id, mixin, context)?;
        self.write_properties(&mixin_object, id, mixin, context, update, seen)
    }

    fn remove_values(
        &mut self,
        id: &Id,
        predicate: &NamedNode,
        context: Option<&NamedNode>,
    ) -> SessionResult<()> {
        for stmt in self.overlay_find(Some(id), Some(predicate), None, context)? {
            self.record_remove(stmt)?;
        }
        Ok(())
    }

    /// Lists and containers. An equal stored structure is left as it is.
    #[allow(clippy::too_many_arguments)]
    fn write_sequence(
        &mut self,
        id: &Id,
        predicate: &NamedNode,
        property: &MappedProperty,
        value: Value,
        context: Option<&NamedNode>,
        update: bool,
        seen: &mut FxHashSet<usize>,
    ) -> SessionResult<()> {
        let is_null = value.is_null();
        let mut items = Vec::new();
        for item in value.into_list() {
            items.push(self.value_to_node(&item, property, property.value_type(), context, seen)?);
        }

        let stored = if update {
            self.overlay_find(Some(id), Some(predicate), None, context)?
        } else {
            Vec::new()
        };
        let empty_list = items.is_empty() && property.kind() == &PropertyKind::List;
        if stored.is_empty() && (is_null || empty_list) {
            return Ok(());
        }
        if let [head] = stored.as_slice() {
            let current = match property.kind() {
                PropertyKind::List => codec::decode_list(&self.overlay(), &head.object, context)?,
                _ => codec::decode_container(&self.overlay(), &head.object, context, true)?,
            };
            if same_items(&current, &items) && !is_null {
                debug!("{} of {} is unchanged", property.name(), id);
                return Ok(());
            }
        }
        self.remove_structures(stored, context)?;
        if is_null {
            return Ok(());
        }

        let mut fresh = || self.connection.create_blank_node();
        let encoded = match property.kind() {
            PropertyKind::List => codec::encode_list(&items, context, &mut fresh),
            PropertyKind::Container { container_type, .. } => Some(codec::encode_container(
                *container_type,
                &items,
                context,
                &mut fresh,
            )),
            _ => None,
        };
        if let Some(Encoded { head, statements }) = encoded {
            self.record_add(Statement::new(id.clone(), predicate.clone(), head, context.cloned()));
            for stmt in statements {
                self.record_add(stmt);
            }
        }
        Ok(())
    }

    /// Remove `stored` statements together with the structures they point to
    fn remove_structures(
        &mut self,
        stored: Vec<Statement>,
        context: Option<&NamedNode>,
    ) -> SessionResult<()> {
        for stmt in stored {
            let structure = codec::structure_statements(&self.overlay(), &stmt.object, context)?;
            self.record_remove(stmt)?;
            for part in structure {
                self.record_remove(part)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_map(
        &mut self,
        id: &Id,
        predicate: &NamedNode,
        property: &MappedProperty,
        value: Value,
        context: Option<&NamedNode>,
        update: bool,
        seen: &mut FxHashSet<usize>,
    ) -> SessionResult<()> {
        let PropertyKind::Map {
            key_predicate,
            value_predicate,
            key_type,
        } = property.kind()
        else {
            return Ok(());
        };
        let mut entries = Vec::new();
        for (key, value) in value.into_map() {
            let Some(key) = self.value_to_node(&key, property, key_type, context, seen)? else {
                continue;
            };
            if let Some(value) = self.value_to_node(&value, property, property.value_type(), context, seen)? {
                entries.push((key, value));
            }
        }

        if update {
            let current = codec::decode_map(
                &self.overlay(),
                id,
                predicate,
                key_predicate,
                value_predicate.as_ref(),
                context,
            )?;
            if current.len() == entries.len() && entries.iter().all(|e| current.contains(e)) {
                debug!("{} of {} is unchanged", property.name(), id);
                return Ok(());
            }
            for stmt in self.overlay_find(Some(id), Some(predicate), None, context)? {
                if let Some(entry) = stmt.object.as_id() {
                    let parts = match value_predicate {
                        Some(_) if entry.is_blank_node() => {
                            self.overlay_find(Some(&entry), None, None, context)?
                        }
                        _ => self.overlay_find(Some(&entry), Some(key_predicate), None, context)?,
                    };
                    for part in parts {
                        self.record_remove(part)?;
                    }
                }
                self.record_remove(stmt)?;
            }
        }

        let mut fresh = || self.connection.create_blank_node();
        let statements = codec::encode_map(
            id,
            predicate,
            &entries,
            key_predicate,
            value_predicate.as_ref(),
            context,
            &mut fresh,
        );
        match statements {
            Ok(statements) => {
                for stmt in statements {
                    self.record_add(stmt);
                }
            }
            Err(reason) => self.conversion_failed(None, property, property.value_type(), reason)?,
        }
        Ok(())
    }

    /// Dynamic entries write only predicates no static property claims
    #[allow(clippy::too_many_arguments)]
    fn write_dynamic(
        &mut self,
        object: &ObjectRef,
        id: &Id,
        mapped: &MappedClass,
        property: &MappedProperty,
        context: Option<&NamedNode>,
        update: bool,
        seen: &mut FxHashSet<usize>,
    ) -> SessionResult<()> {
        let mut claimed: HashSet<NamedNode> = self.configuration.mapped_predicates(mapped.class());
        claimed.insert(rdf::type_());
        let context = property.context().or(context);
        let value_type = property.value_type();

        if update {
            for stmt in self.overlay_find(Some(id), None, None, context)? {
                if !claimed.contains(&stmt.predicate) && self.dynamic_accepts(&stmt.object, value_type)? {
                    self.record_remove(stmt)?;
                }
            }
        }

        for (key, value) in read_value(object, property.accessor()).into_map() {
            let predicate = match &key {
                Value::Node(Node::NamedNode(uri)) => Some(uri.clone()),
                Value::String(s) => NamedNode::new(s).ok(),
                _ => None,
            };
            let Some(predicate) = predicate else {
                self.conversion_failed(
                    None,
                    property,
                    value_type,
                    format!("{:?} is not a predicate URI", key),
                )?;
                continue;
            };
            if claimed.contains(&predicate) {
                debug!("Skipping {} in {}: claimed by a mapped property", predicate, property.name());
                continue;
            }
            for item in value.into_list() {
                if let Some(node) = self.value_to_node(&item, property, value_type, context, seen)? {
                    self.record_add(Statement::new(id.clone(), predicate.clone(), node, context.cloned()));
                }
            }
        }
        Ok(())
    }

    /// Node for a property value; `None` for null values and tolerated
    /// failures
    fn value_to_node(
        &mut self,
        value: &Value,
        property: &MappedProperty,
        value_type: &ValueType,
        context: Option<&NamedNode>,
        seen: &mut FxHashSet<usize>,
    ) -> SessionResult<Option<Node>> {
        let config = Arc::clone(&self.configuration);
        let converted: Result<Node, String> = match value {
            Value::Null => return Ok(None),
            Value::Node(node) => Ok(node.clone()),
            Value::Object(child) => return self.to_rdf(child, context, seen).map(|id| Some(id.into())),
            Value::Class(class) => config
                .get(*class)
                .and_then(|m| m.type_uri())
                .map(|t| Node::from(t.clone()))
                .ok_or_else(|| format!("{} has no type URI", class)),
            Value::Enum(name) => match value_type {
                ValueType::Enum(enum_type) => convert::enum_to_node(enum_type, name),
                _ => Ok(Literal::new_simple_literal(name.clone()).into()),
            },
            Value::String(s) if value_type.is_node_type() => config
                .resolve_uri(s)
                .map(Node::from)
                .map_err(|e| e.to_string()),
            Value::List(_) | Value::Map(_) | Value::Localized(_) => {
                Err("nested collections cannot be written as a single node".to_string())
            }
            scalar => convert::value_to_literal(config.registry(), scalar, value_type).map(Node::from),
        };
        match converted {
            Ok(node) => Ok(Some(node)),
            Err(reason) => {
                self.conversion_failed(None, property, value_type, reason)?;
                Ok(None)
            }
        }
    }

    /// Remove an object's statements, the references to it and the lists and
    /// containers it owns
    pub(super) fn remove_object(&mut self, object: &ObjectRef) -> SessionResult<()> {
        let config = Arc::clone(&self.configuration);
        let class = object::class_of(object);
        let mapped = config
            .get(class)
            .ok_or_else(|| SessionError::UnmappedClass(class.name().to_string()))?;
        let id = match self.cache.identity_of(object) {
            Some(id) => id.clone(),
            None => match self.state_identity(mapped, object)? {
                Some(id) => id,
                None => {
                    debug!("Nothing to delete: {} has no identity", class);
                    return Ok(());
                }
            },
        };
        let context = mapped.context();
        debug!("Deleting {}", id);

        let own = self.overlay_find(Some(&id), None, None, context)?;
        for stmt in own {
            let structure = if stmt.object != id {
                codec::structure_statements(&self.overlay(), &stmt.object, context)?
            } else {
                Vec::new()
            };
            self.record_remove(stmt)?;
            for part in structure {
                self.record_remove(part)?;
            }
        }

        let node = Node::from(id.clone());
        for stmt in self.overlay_find(None, None, Some(&node), None)? {
            self.record_remove(stmt)?;
        }

        let pending: Vec<Statement> = self
            .changes
            .added()
            .iter()
            .filter(|stmt| stmt.subject == id || stmt.object == id)
            .cloned()
            .collect();
        for stmt in pending {
            self.changes.remove(stmt);
        }

        self.cache.evict(&id);
        Ok(())
    }
}

/// Graph nodes stand for themselves
fn node_identity(object: &ObjectRef) -> Option<Id> {
    if let Some(id) = object::downcast_ref::<Id>(object) {
        return Some(id.clone());
    }
    if let Some(uri) = object::downcast_ref::<NamedNode>(object) {
        return Some(uri.clone().into());
    }
    object::downcast_ref::<Node>(object).and_then(|node| node.as_id())
}

/// Stored structure items equal the new ones, ignoring trailing gaps
fn same_items(stored: &[Option<Node>], items: &[Option<Node>]) -> bool {
    fn trimmed(items: &[Option<Node>]) -> &[Option<Node>] {
        let end = items.iter().rposition(|i| i.is_some()).map(|p| p + 1).unwrap_or(0);
        &items[..end]
    }
    trimmed(stored) == trimmed(items)
}
