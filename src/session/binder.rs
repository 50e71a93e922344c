//! Binder: statements → objects
//!
//! Binding goes Unbound → Cached → Populated. An instance is registered in the
//! identity cache before any of its properties are read, so reference cycles
//! resolve to the instance under construction.

use super::codec::{self, Direct};
use super::convert;
use super::error::{CardinalityError, ConversionError, FunctionalValueError, InstantiationError};
use super::locale;
use super::projection::{in_context, Projection};
use super::resolver::{self, Resolution};
use super::{write_value, Session, SessionError, SessionResult};
use crate::connection::Connection;
use crate::mapping::{Configuration, IdKind, MappedClass, MappedProperty, PropertyKind, ValueType};
use crate::object::{ClassId, ObjectRef, Value};
use crate::rdf::vocab::rdf;
use crate::rdf::{Id, NamedNode, Node};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

impl<C: Connection> Session<C> {
    /// Bind `subject` as an instance of `required` (any mapped class when
    /// `None`). Returns `None` when no class applies or the error policy
    /// tolerated a failure.
    pub(super) fn bind_object(
        &mut self,
        subject: &Id,
        required: Option<ClassId>,
    ) -> SessionResult<Option<ObjectRef>> {
        let config = Arc::clone(&self.configuration);
        if let Some(cached) = self.cache.resolve(subject, required, &config) {
            return Ok(Some(cached));
        }

        let projection = self.fetch_projection(&config, subject, required)?;
        let class = match resolver::resolve(&config, subject, required, &projection.types()) {
            Resolution::Resolved(class) => class,
            Resolution::Absent => match required {
                Some(class) if config.get(class).map(|m| !m.is_abstract()).unwrap_or(false) => {
                    class
                }
                _ => {
                    debug!("No mapped type asserted for {}", subject);
                    return Ok(None);
                }
            },
            Resolution::Mismatch(err) => {
                self.error_policy.type_mismatch_error(err)?;
                return Ok(None);
            }
        };
        let mapped = config
            .get(class)
            .ok_or_else(|| SessionError::UnmappedClass(class.name().to_string()))?;

        let Some(instance) = self.instantiate(mapped, subject, &projection)? else {
            return Ok(None);
        };
        self.cache.register(subject.clone(), Rc::clone(&instance));
        debug!("Binding {} as {}", subject, class);

        if let Some(id_property) = mapped.id_property() {
            let value = match id_property.kind {
                IdKind::Uri | IdKind::Resource => Value::Node(subject.clone().into()),
                IdKind::Local => Value::Integer(self.identities.local_id(subject).value() as i64),
            };
            write_value(&instance, &id_property.accessor, value);
        }

        self.populate(&instance, subject, mapped, &projection, mapped.context())?;
        Ok(Some(instance))
    }

    /// Statements about `subject`. Only the class's own predicates are fetched
    /// when the class can be neither narrowed nor carry dynamic properties.
    fn fetch_projection(
        &self,
        config: &Configuration,
        subject: &Id,
        required: Option<ClassId>,
    ) -> SessionResult<Projection> {
        let restricted = required.filter(|class| {
            !config.is_polymorphic(*class)
                && config
                    .get(*class)
                    .map(|m| !m.has_dynamic_properties())
                    .unwrap_or(false)
        });
        let statements = match restricted {
            Some(class) => self.connection.find_statements_with_predicates(
                subject,
                &config.mapped_predicates(class),
                None,
                self.config.include_inferred,
            )?,
            None => self.connection.find_statements(
                Some(subject),
                None,
                None,
                None,
                self.config.include_inferred,
            )?,
        };
        debug!("Fetched {} statements about {}", statements.len(), subject);
        Ok(Projection::new(statements))
    }

    fn instantiate(
        &mut self,
        mapped: &MappedClass,
        subject: &Id,
        projection: &Projection,
    ) -> SessionResult<Option<ObjectRef>> {
        let created = match mapped.constructor() {
            Some(constructor) => {
                let mut args = Vec::with_capacity(constructor.arguments().len());
                for name in constructor.arguments() {
                    let value = match mapped.property(name) {
                        Some(property) => self
                            .property_value(subject, property, projection, mapped.context())?
                            .unwrap_or_default(),
                        None => Value::Null,
                    };
                    args.push(value);
                }
                constructor.call(args)
            }
            None => mapped
                .instantiate()
                .ok_or_else(|| "class has no factory".to_string()),
        };
        match created {
            Ok(instance) => Ok(Some(instance)),
            Err(reason) => {
                self.error_policy.instantiation_error(InstantiationError {
                    subject: subject.clone(),
                    class: mapped.class(),
                    reason,
                })?;
                Ok(None)
            }
        }
    }

    /// Assign every mapped property of `instance`, dynamic properties last
    fn populate(
        &mut self,
        instance: &ObjectRef,
        subject: &Id,
        mapped: &MappedClass,
        projection: &Projection,
        context: Option<&NamedNode>,
    ) -> SessionResult<()> {
        for property in mapped.properties() {
            if property.is_dynamic()
                || mapped.is_constructor_argument(property.name())
                || !property.accessor().is_writable()
            {
                continue;
            }
            let value = if property.is_mixin() {
                self.bind_mixin(subject, property, projection, context)?
            } else {
                self.property_value(subject, property, projection, context)?
            };
            if let Some(value) = value {
                write_value(instance, property.accessor(), value);
            }
        }

        if mapped.has_dynamic_properties() {
            let config = Arc::clone(&self.configuration);
            let mut claimed = config.mapped_predicates(mapped.class());
            claimed.insert(rdf::type_());
            for property in mapped.dynamic_properties() {
                if !property.accessor().is_writable() {
                    continue;
                }
                let value = self.dynamic_value(subject, property, projection, context, &claimed)?;
                write_value(instance, property.accessor(), value);
            }
        }
        Ok(())
    }

    /// A mixin shares the host subject; it is bound fresh and never cached
    fn bind_mixin(
        &mut self,
        subject: &Id,
        property: &MappedProperty,
        projection: &Projection,
        context: Option<&NamedNode>,
    ) -> SessionResult<Option<Value>> {
        let config = Arc::clone(&self.configuration);
        let Some(mixin) = property.value_type().as_class().and_then(|c| config.get(c)) else {
            return Ok(None);
        };
        let Some(instance) = mixin.instantiate() else {
            self.error_policy.instantiation_error(InstantiationError {
                subject: subject.clone(),
                class: mixin.class(),
                reason: "mixin class has no factory".to_string(),
            })?;
            return Ok(None);
        };
        let context = property.context().or(mixin.context()).or(context);
        self.populate(&instance, subject, mixin, projection, context)?;
        Ok(Some(Value::Object(instance)))
    }

    /// Value of a static property. `None` leaves the field untouched.
    fn property_value(
        &mut self,
        subject: &Id,
        property: &MappedProperty,
        projection: &Projection,
        context: Option<&NamedNode>,
    ) -> SessionResult<Option<Value>> {
        let context = property.context().or(context);
        let mut nodes = self.path_values(subject, property, projection, context)?;
        if nodes.is_empty() {
            nodes = property.defaults().to_vec();
        }
        let value_type = property.value_type();

        let value = match property.kind() {
            PropertyKind::Single => match nodes.first() {
                Some(node) => return self.convert(node, property, value_type),
                None => Value::Null,
            },
            PropertyKind::Collection => {
                let mut values = Vec::with_capacity(nodes.len());
                for node in &nodes {
                    if let Some(value) = self.convert(node, property, value_type)? {
                        values.push(value);
                    }
                }
                Value::List(values)
            }
            PropertyKind::List => {
                let items = match nodes.first() {
                    Some(head) => codec::decode_list(&self.direct(), head, context)?,
                    None => Vec::new(),
                };
                Value::List(self.convert_items(&items, property, value_type)?)
            }
            PropertyKind::Container { indexed, .. } => {
                let items = match nodes.first() {
                    Some(head) => codec::decode_container(&self.direct(), head, context, *indexed)?,
                    None => Vec::new(),
                };
                Value::List(self.convert_items(&items, property, value_type)?)
            }
            PropertyKind::Map {
                key_predicate,
                value_predicate,
                key_type,
            } => {
                let Some(predicate) = property.predicate() else {
                    return Ok(None);
                };
                let pairs = codec::decode_map(
                    &self.direct(),
                    subject,
                    predicate,
                    key_predicate,
                    value_predicate.as_ref(),
                    context,
                )?;
                let mut entries = Vec::with_capacity(pairs.len());
                for (key, value) in &pairs {
                    let Some(key) = self.convert(key, property, key_type)? else {
                        continue;
                    };
                    if let Some(value) = self.convert(value, property, value_type)? {
                        entries.push((key, value));
                    }
                }
                Value::Map(entries)
            }
            PropertyKind::Localized => {
                let texts = localized_texts(&nodes);
                locale::resolve(&texts, &self.config.locales)
                    .cloned()
                    .map(Value::String)
                    .unwrap_or(Value::Null)
            }
            PropertyKind::LocalizedMap => Value::Localized(localized_texts(&nodes)),
            PropertyKind::Mixin | PropertyKind::Dynamic { .. } => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Nodes reached by following the property path from `subject`
    fn path_values(
        &mut self,
        subject: &Id,
        property: &MappedProperty,
        projection: &Projection,
        context: Option<&NamedNode>,
    ) -> SessionResult<Vec<Node>> {
        let Some(path) = property.path() else {
            return Ok(Vec::new());
        };
        let mut current: Vec<Node> = vec![subject.clone().into()];
        for (i, step) in path.steps().iter().enumerate() {
            let step_context = step.context.as_ref().or(context);
            let inferred = step.include_inferred || self.config.include_inferred;
            let mut next: Vec<Node> = Vec::new();
            for node in &current {
                let found: Vec<Node> = if i == 0 && !step.inverse {
                    projection.objects(&step.uri, step_context)
                } else if step.inverse {
                    self.connection
                        .find_statements(None, Some(&step.uri), Some(node), step_context, inferred)?
                        .into_iter()
                        .map(|stmt| stmt.subject.into())
                        .collect()
                } else {
                    let Some(id) = node.as_id() else {
                        continue;
                    };
                    self.connection
                        .find_statements(Some(&id), Some(&step.uri), None, step_context, inferred)?
                        .into_iter()
                        .map(|stmt| stmt.object)
                        .collect()
                };
                for node in found {
                    if !next.contains(&node) {
                        next.push(node);
                    }
                }
            }
            current = next;
        }

        if matches!(property.kind(), PropertyKind::Single) && current.len() > 1 {
            match path.steps() {
                [step] => self.error_policy.functional_value_error(FunctionalValueError {
                    subject: subject.clone(),
                    predicate: step.uri.clone(),
                    context: step.context.clone().or_else(|| context.cloned()),
                    count: current.len(),
                })?,
                _ => self.error_policy.cardinality_error(CardinalityError {
                    subject: subject.clone(),
                    property: property.name().to_string(),
                    count: current.len(),
                })?,
            }
        }
        Ok(current)
    }

    /// Statements that do not belong to any static property, grouped by
    /// predicate
    fn dynamic_value(
        &mut self,
        subject: &Id,
        property: &MappedProperty,
        projection: &Projection,
        context: Option<&NamedNode>,
        claimed: &HashSet<NamedNode>,
    ) -> SessionResult<Value> {
        let PropertyKind::Dynamic {
            include_mapped,
            collection,
        } = property.kind()
        else {
            return Ok(Value::Null);
        };
        let context = property.context().or(context);
        let value_type = property.value_type();

        let mut groups: Vec<(NamedNode, Vec<Node>)> = Vec::new();
        for (predicate, statements) in projection.iter() {
            if !include_mapped && claimed.contains(predicate) {
                continue;
            }
            let mut nodes: Vec<Node> = Vec::new();
            for stmt in statements.iter().filter(|s| in_context(s, context)) {
                if !nodes.contains(&stmt.object) && self.dynamic_accepts(&stmt.object, value_type)? {
                    nodes.push(stmt.object.clone());
                }
            }
            if !nodes.is_empty() {
                groups.push((predicate.clone(), nodes));
            }
        }

        let mut entries = Vec::with_capacity(groups.len());
        for (predicate, nodes) in groups {
            let mut values = Vec::with_capacity(nodes.len());
            for node in &nodes {
                if let Some(value) = self.convert(node, property, value_type)? {
                    values.push(value);
                }
            }
            if values.is_empty() {
                continue;
            }
            let value = if *collection {
                Value::List(values)
            } else {
                if values.len() > 1 {
                    self.error_policy.cardinality_error(CardinalityError {
                        subject: subject.clone(),
                        property: format!("{}[{}]", property.name(), predicate),
                        count: values.len(),
                    })?;
                }
                values.swap_remove(0)
            };
            entries.push((Value::Node(predicate.into()), value));
        }
        Ok(Value::Map(entries))
    }

    /// Whether a dynamic property of `value_type` absorbs the node
    pub(super) fn dynamic_accepts(&self, node: &Node, value_type: &ValueType) -> SessionResult<bool> {
        let accepts = match value_type {
            ValueType::Any | ValueType::Node => true,
            ValueType::Id => node.is_resource(),
            ValueType::Uri => node.is_named_node(),
            ValueType::Enum(_) => !node.is_blank_node(),
            ValueType::Class(class) => {
                let Some(id) = node.as_id() else {
                    return Ok(false);
                };
                let config = &self.configuration;
                match config.get(*class).and_then(|m| m.type_uri()) {
                    None => true,
                    Some(_) => self
                        .connection
                        .find_statements(Some(&id), Some(&rdf::type_()), None, None, false)?
                        .iter()
                        .filter_map(|stmt| stmt.object.as_named_node())
                        .flat_map(|t| config.classes_for_type(t))
                        .any(|c| config.is_assignable(*c, *class)),
                }
            }
            scalar => match (node.as_literal(), self.configuration.registry().datatype(scalar)) {
                (Some(literal), Some(datatype)) => &literal.datatype() == datatype,
                _ => false,
            },
        };
        Ok(accepts)
    }

    fn convert_items(
        &mut self,
        items: &[Option<Node>],
        property: &MappedProperty,
        value_type: &ValueType,
    ) -> SessionResult<Vec<Value>> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let value = match item {
                Some(node) => self.convert(node, property, value_type)?.unwrap_or_default(),
                None => Value::Null,
            };
            values.push(value);
        }
        Ok(values)
    }

    /// Convert one node; `None` when the failure was tolerated
    fn convert(
        &mut self,
        node: &Node,
        property: &MappedProperty,
        value_type: &ValueType,
    ) -> SessionResult<Option<Value>> {
        match self.try_convert(node, property, value_type)? {
            Ok(value) => Ok(Some(value)),
            Err(reason) => {
                self.conversion_failed(Some(node), property, value_type, reason)?;
                Ok(None)
            }
        }
    }

    fn try_convert(
        &mut self,
        node: &Node,
        property: &MappedProperty,
        value_type: &ValueType,
    ) -> SessionResult<Result<Value, String>> {
        if value_type.accepts_node(node) {
            return Ok(Ok(Value::Node(node.clone())));
        }
        if property.is_injection() {
            return self.inject(node, value_type);
        }
        let config = Arc::clone(&self.configuration);
        let registry = config.registry();

        let converted = match value_type {
            ValueType::Any => match node {
                Node::Literal(literal) => Ok(convert::natural_value(registry, literal)),
                resource => {
                    let bound = match resource.as_id() {
                        Some(id) => self.bind_object(&id, None)?,
                        None => None,
                    };
                    Ok(bound
                        .map(Value::Object)
                        .unwrap_or_else(|| Value::Node(resource.clone())))
                }
            },
            ValueType::Enum(enum_type) => convert::enum_from_node(enum_type, node),
            _ if property.is_class_reference() => match node.as_named_node() {
                Some(type_uri) => config
                    .classes_for_type(type_uri)
                    .first()
                    .map(|class| Value::Class(*class))
                    .ok_or_else(|| format!("no class is mapped to {}", type_uri)),
                None => Err(format!("class references need a URI, got a {}", node.kind())),
            },
            ValueType::Class(class) => match node.as_id() {
                Some(id) => self
                    .bind_object(&id, Some(*class))?
                    .map(Value::Object)
                    .ok_or_else(|| format!("{} cannot be bound as {}", id, class)),
                None => Err(format!("{} values need a resource", class)),
            },
            scalar => match node {
                Node::Literal(literal) => convert::literal_to_value(registry, literal, scalar),
                other => Err(format!("expected a literal, got a {}", other.kind())),
            },
        };
        Ok(converted)
    }

    /// Bind through the parent repository registered for the node's namespace
    fn inject(&mut self, node: &Node, value_type: &ValueType) -> SessionResult<Result<Value, String>> {
        let Some(uri) = node.as_named_node() else {
            return Ok(Err(format!("injection needs a URI, got a {}", node.kind())));
        };
        let Some(class) = value_type.as_class() else {
            return Ok(Err(format!("cannot inject a value of type {}", value_type)));
        };
        let Some(parent) = self
            .parents
            .iter()
            .find(|(ns, _)| uri.as_str().starts_with(ns.as_str()))
            .map(|(_, repository)| Rc::clone(repository))
        else {
            return Ok(Err(format!("no parent repository for namespace {}", uri.ns())));
        };
        let Ok(mut repository) = parent.try_borrow_mut() else {
            return Ok(Err(format!("parent repository for {} is busy", uri)));
        };
        Ok(repository
            .get_object(class, uri)?
            .map(Value::Object)
            .ok_or_else(|| format!("{} not found in parent repository", uri)))
    }

    /// Route a conversion failure: `ignore_invalid` properties drop the value
    /// silently, everything else goes to the error policy
    pub(super) fn conversion_failed(
        &self,
        node: Option<&Node>,
        property: &MappedProperty,
        value_type: &ValueType,
        reason: String,
    ) -> SessionResult<()> {
        if property.is_ignore_invalid() {
            debug!("Ignoring invalid value of {}: {}", property.name(), reason);
            return Ok(());
        }
        self.error_policy.conversion_error(ConversionError {
            node: node.cloned(),
            target: value_type.clone(),
            property: property.name().to_string(),
            reason,
        })
    }

    fn direct(&self) -> Direct<'_, C> {
        Direct {
            connection: &self.connection,
            include_inferred: self.config.include_inferred,
        }
    }
}

/// Language → text for the literals among `nodes`; the first text per
/// language wins
fn localized_texts(nodes: &[Node]) -> BTreeMap<String, String> {
    let mut texts = BTreeMap::new();
    for literal in nodes.iter().filter_map(|n| n.as_literal()) {
        texts
            .entry(locale::language_of(literal).to_ascii_lowercase())
            .or_insert_with(|| literal.value().to_string());
    }
    texts
}
