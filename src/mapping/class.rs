//! Class mappings

use super::property::{Accessor, MappedProperty};
use crate::object::{self, ClassId, ObjectRef, Value};
use crate::rdf::NamedNode;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type Factory = Arc<dyn Fn() -> ObjectRef + Send + Sync>;
type ConstructorFn = Arc<dyn Fn(Vec<Value>) -> Result<ObjectRef, String> + Send + Sync>;
type UriTemplate = Arc<dyn Fn(&dyn Any) -> Option<String> + Send + Sync>;

/// How the id property represents the subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// URI node (or its string form)
    Uri,
    /// URI or blank node
    Resource,
    /// Session-local identifier string
    Local,
}

/// Id property of a class
#[derive(Debug, Clone)]
pub struct IdProperty {
    pub kind: IdKind,
    pub accessor: Accessor,
}

/// Constructor taking property values as arguments
///
/// Arguments are named properties of the class; they are resolved like any
/// other property before the factory runs and are not set again afterwards.
#[derive(Clone)]
pub struct MappedConstructor {
    arguments: Vec<String>,
    factory: ConstructorFn,
}

impl MappedConstructor {
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn call(&self, args: Vec<Value>) -> Result<ObjectRef, String> {
        (self.factory)(args)
    }
}

impl fmt::Debug for MappedConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedConstructor")
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Mapping of one native type
///
/// A concrete class lists every property it carries; supertypes only decide
/// assignability.
#[derive(Clone)]
pub struct MappedClass {
    class: ClassId,
    type_uri: Option<NamedNode>,
    context: Option<NamedNode>,
    supertypes: Vec<ClassId>,
    factory: Option<Factory>,
    constructor: Option<MappedConstructor>,
    id: Option<IdProperty>,
    uri_template: Option<UriTemplate>,
    properties: Vec<MappedProperty>,
}

impl MappedClass {
    /// Mapping for `T`. Without a factory or constructor the class is abstract.
    pub fn new<T: ?Sized + 'static>() -> Self {
        Self {
            class: ClassId::of::<T>(),
            type_uri: None,
            context: None,
            supertypes: Vec::new(),
            factory: None,
            constructor: None,
            id: None,
            uri_template: None,
            properties: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_uri: NamedNode) -> Self {
        self.type_uri = Some(type_uri);
        self
    }

    pub fn with_context(mut self, context: NamedNode) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_supertype(mut self, supertype: ClassId) -> Self {
        self.supertypes.push(supertype);
        self
    }

    /// Default constructor
    pub fn with_factory<T, F>(mut self, factory: F) -> Self
    where
        T: Any,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move || object::new_ref(factory())));
        self
    }

    /// Constructor taking the values of the named properties
    pub fn with_constructor<T, F>(mut self, arguments: &[&str], factory: F) -> Self
    where
        T: Any,
        F: Fn(Vec<Value>) -> Result<T, String> + Send + Sync + 'static,
    {
        self.constructor = Some(MappedConstructor {
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            factory: Arc::new(move |args| factory(args).map(object::new_ref)),
        });
        self
    }

    pub fn with_id(mut self, kind: IdKind, accessor: Accessor) -> Self {
        self.id = Some(IdProperty { kind, accessor });
        self
    }

    /// URI derived from object state, absolute or relative to the base IRI
    pub fn with_uri_template<T, F>(mut self, template: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        self.uri_template = Some(Arc::new(move |any: &dyn Any| {
            any.downcast_ref::<T>().and_then(|target| template(target))
        }));
        self
    }

    pub fn with_property(mut self, property: MappedProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn type_uri(&self) -> Option<&NamedNode> {
        self.type_uri.as_ref()
    }

    pub fn context(&self) -> Option<&NamedNode> {
        self.context.as_ref()
    }

    pub fn supertypes(&self) -> &[ClassId] {
        &self.supertypes
    }

    pub fn is_abstract(&self) -> bool {
        self.factory.is_none() && self.constructor.is_none()
    }

    pub fn constructor(&self) -> Option<&MappedConstructor> {
        self.constructor.as_ref()
    }

    /// Fresh instance from the default constructor
    pub fn instantiate(&self) -> Option<ObjectRef> {
        self.factory.as_ref().map(|f| f())
    }

    pub fn id_property(&self) -> Option<&IdProperty> {
        self.id.as_ref()
    }

    /// Expand the URI template against the object state
    pub fn template_uri(&self, target: &dyn Any) -> Option<String> {
        self.uri_template.as_ref().and_then(|t| t(target))
    }

    pub fn properties(&self) -> &[MappedProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&MappedProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn dynamic_properties(&self) -> impl Iterator<Item = &MappedProperty> {
        self.properties.iter().filter(|p| p.is_dynamic())
    }

    pub fn has_dynamic_properties(&self) -> bool {
        self.properties.iter().any(|p| p.is_dynamic())
    }

    /// Whether the named property is filled through the constructor
    pub fn is_constructor_argument(&self, name: &str) -> bool {
        self.constructor
            .as_ref()
            .map(|c| c.arguments.iter().any(|a| a == name))
            .unwrap_or(false)
    }
}

impl fmt::Debug for MappedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedClass")
            .field("class", &self.class)
            .field("type_uri", &self.type_uri)
            .field("context", &self.context)
            .field("supertypes", &self.supertypes)
            .field("abstract", &self.is_abstract())
            .field("properties", &self.properties)
            .finish()
    }
}
