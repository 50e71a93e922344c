//! Mapping configuration
//!
//! Read-only view over all class mappings, built once and shared between
//! sessions.

use super::class::MappedClass;
use super::property::PropertyKind;
use super::registry::ConverterRegistry;
use super::{MappingError, MappingResult};
use crate::object::ClassId;
use crate::rdf::vocab::rdf;
use crate::rdf::{Id, NamedNode, NamespaceManager};
use indexmap::IndexMap;
use oxiri::Iri;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Builder for [`Configuration`]
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    classes: Vec<MappedClass>,
    registry: ConverterRegistry,
    namespaces: NamespaceManager,
    base_iri: Option<String>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(mut self, class: MappedClass) -> Self {
        self.classes.push(class);
        self
    }

    /// Base IRI for relative URI templates
    pub fn base_iri(mut self, iri: impl Into<String>) -> Self {
        self.base_iri = Some(iri.into());
        self
    }

    /// Namespace nobody may write statements about
    pub fn restrict_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespaces.restrict(ns);
        self
    }

    pub fn registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> MappingResult<Configuration> {
        let base_iri = self
            .base_iri
            .map(|iri| Iri::parse(iri).map_err(|e| MappingError::InvalidBaseIri(e.to_string())))
            .transpose()?;

        let mut classes: IndexMap<ClassId, MappedClass> = IndexMap::new();
        for class in self.classes {
            if classes.contains_key(&class.class()) {
                return Err(MappingError::DuplicateClass(class.class().name().to_string()));
            }
            classes.insert(class.class(), class);
        }

        for class in classes.values() {
            for property in class.properties() {
                if property.is_mixin() {
                    let target = property.value_type().as_class();
                    if !target.map(|t| classes.contains_key(&t)).unwrap_or(false) {
                        return Err(MappingError::UnknownClass(format!(
                            "mixin {}.{}",
                            class.class(),
                            property.name()
                        )));
                    }
                } else if property.path().is_none() && !property.is_dynamic() {
                    return Err(MappingError::MissingPath(format!(
                        "{}.{}",
                        class.class(),
                        property.name()
                    )));
                }
            }
            if let Some(ctor) = class.constructor() {
                for arg in ctor.arguments() {
                    if class.property(arg).is_none() {
                        return Err(MappingError::UnknownProperty(format!(
                            "{}.{}",
                            class.class(),
                            arg
                        )));
                    }
                }
            }
        }

        let mut by_type: HashMap<NamedNode, Vec<ClassId>> = HashMap::new();
        for class in classes.values() {
            if let Some(type_uri) = class.type_uri() {
                by_type.entry(type_uri.clone()).or_default().push(class.class());
            }
        }

        debug!("Built mapping configuration with {} classes", classes.len());
        Ok(Configuration {
            classes,
            by_type,
            registry: self.registry,
            namespaces: self.namespaces,
            base_iri,
        })
    }
}

/// All class mappings plus the datatype registry and namespace rules
#[derive(Debug)]
pub struct Configuration {
    classes: IndexMap<ClassId, MappedClass>,
    by_type: HashMap<NamedNode, Vec<ClassId>>,
    registry: ConverterRegistry,
    namespaces: NamespaceManager,
    base_iri: Option<Iri<String>>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    pub fn get(&self, class: ClassId) -> Option<&MappedClass> {
        self.classes.get(&class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &MappedClass> {
        self.classes.values()
    }

    /// Classes mapped to a type URI, in registration order
    pub fn classes_for_type(&self, type_uri: &NamedNode) -> &[ClassId] {
        self.by_type.get(type_uri).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Whether `from` is `to` or one of its (transitive) subtypes
    pub fn is_assignable(&self, from: ClassId, to: ClassId) -> bool {
        let mut pending = vec![from];
        let mut visited = HashSet::new();
        while let Some(current) = pending.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(class) = self.classes.get(&current) {
                pending.extend(class.supertypes().iter().copied());
            }
        }
        false
    }

    /// Mapped classes assignable to `class`, excluding itself
    pub fn subtypes(&self, class: ClassId) -> Vec<ClassId> {
        self.classes
            .keys()
            .copied()
            .filter(|c| *c != class && self.is_assignable(*c, class))
            .collect()
    }

    /// Whether the concrete type has to be resolved from asserted types
    pub fn is_polymorphic(&self, class: ClassId) -> bool {
        match self.classes.get(&class) {
            Some(mapped) => mapped.is_abstract() || !self.subtypes(class).is_empty(),
            None => !self.subtypes(class).is_empty(),
        }
    }

    /// Predicates the class reads directly from its subject, mixins included
    pub fn mapped_predicates(&self, class: ClassId) -> HashSet<NamedNode> {
        let mut predicates = HashSet::new();
        let mut visited = HashSet::new();
        self.collect_predicates(class, &mut predicates, &mut visited);
        predicates
    }

    fn collect_predicates(
        &self,
        class: ClassId,
        predicates: &mut HashSet<NamedNode>,
        visited: &mut HashSet<ClassId>,
    ) {
        if !visited.insert(class) {
            return;
        }
        let Some(mapped) = self.classes.get(&class) else {
            return;
        };
        if mapped.type_uri().is_some() {
            predicates.insert(rdf::type_());
        }
        for property in mapped.properties() {
            match property.kind() {
                PropertyKind::Mixin => {
                    if let Some(target) = property.value_type().as_class() {
                        self.collect_predicates(target, predicates, visited);
                    }
                }
                PropertyKind::Dynamic { .. } => {}
                _ => {
                    if let Some(step) = property.path().and_then(|p| p.first()) {
                        if !step.inverse {
                            predicates.insert(step.uri.clone());
                        }
                    }
                }
            }
        }
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn namespaces(&self) -> &NamespaceManager {
        &self.namespaces
    }

    /// Whether statements about this subject must not be written
    pub fn is_restricted(&self, id: &Id) -> bool {
        id.as_named_node()
            .map(|n| self.namespaces.is_restricted(n))
            .unwrap_or(false)
    }

    pub fn base_iri(&self) -> Option<&str> {
        self.base_iri.as_ref().map(|iri| iri.as_str())
    }

    /// Resolve a possibly relative URI against the base IRI
    pub fn resolve_uri(&self, uri: &str) -> MappingResult<NamedNode> {
        let resolved = match &self.base_iri {
            Some(base) => base
                .resolve(uri)
                .map_err(|e| MappingError::InvalidUri(format!("{}: {}", uri, e)))?
                .into_inner(),
            None => uri.to_string(),
        };
        NamedNode::new(&resolved).map_err(|e| MappingError::InvalidUri(e.to_string()))
    }
}
