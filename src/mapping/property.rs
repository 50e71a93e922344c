//! Property mappings
//!
//! A property pairs a predicate path with a value type, a structural kind and
//! the accessor pair the session uses to read and write it.

use super::value::ValueType;
use crate::object::{ClassId, Value};
use crate::rdf::vocab::{rdf, rdfs};
use crate::rdf::{NamedNode, Node};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type Getter = Arc<dyn Fn(&dyn Any) -> Value + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn Any, Value) + Send + Sync>;

/// Typed getter/setter pair erased to `dyn Any`
#[derive(Clone)]
pub struct Accessor {
    get: Getter,
    set: Option<Setter>,
}

impl Accessor {
    pub fn new<T, G, S>(get: G, set: S) -> Self
    where
        T: Any,
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(move |any: &dyn Any| match any.downcast_ref::<T>() {
                Some(target) => get(target),
                None => Value::Null,
            }),
            set: Some(Arc::new(move |any: &mut dyn Any, value: Value| {
                if let Some(target) = any.downcast_mut::<T>() {
                    set(target, value);
                }
            })),
        }
    }

    /// Accessor without a setter, for constructor-only state
    pub fn read_only<T, G>(get: G) -> Self
    where
        T: Any,
        G: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(move |any: &dyn Any| match any.downcast_ref::<T>() {
                Some(target) => get(target),
                None => Value::Null,
            }),
            set: None,
        }
    }

    pub fn get(&self, target: &dyn Any) -> Value {
        (self.get)(target)
    }

    /// Write the value; returns false when the accessor has no setter
    pub fn set(&self, target: &mut dyn Any, value: Value) -> bool {
        match &self.set {
            Some(set) => {
                set(target, value);
                true
            }
            None => false,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// One hop of a property path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappedPredicate {
    pub uri: NamedNode,
    /// Follow the predicate from object to subject
    pub inverse: bool,
    pub include_inferred: bool,
    /// Context of this hop, overriding the class context
    pub context: Option<NamedNode>,
}

impl MappedPredicate {
    pub fn new(uri: NamedNode) -> Self {
        Self {
            uri,
            inverse: false,
            include_inferred: false,
            context: None,
        }
    }

    pub fn inverse(mut self) -> Self {
        self.inverse = true;
        self
    }

    pub fn inferred(mut self) -> Self {
        self.include_inferred = true;
        self
    }

    pub fn in_context(mut self, context: NamedNode) -> Self {
        self.context = Some(context);
        self
    }
}

/// Ordered predicate path from the subject to the property values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappedPath {
    steps: Vec<MappedPredicate>,
}

impl MappedPath {
    pub fn new(steps: Vec<MappedPredicate>) -> Self {
        Self { steps }
    }

    /// Single forward hop
    pub fn predicate(uri: NamedNode) -> Self {
        Self::new(vec![MappedPredicate::new(uri)])
    }

    pub fn steps(&self) -> &[MappedPredicate] {
        &self.steps
    }

    pub fn first(&self) -> Option<&MappedPredicate> {
        self.steps.first()
    }

    /// Single forward hop; only such paths are written back
    pub fn is_simple(&self) -> bool {
        self.steps.len() == 1 && !self.steps[0].inverse
    }
}

impl From<NamedNode> for MappedPath {
    fn from(uri: NamedNode) -> Self {
        Self::predicate(uri)
    }
}

/// Container flavour used by container properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    Seq,
    Bag,
    Alt,
    Container,
}

impl ContainerType {
    pub fn uri(&self) -> NamedNode {
        match self {
            ContainerType::Seq => rdf::seq(),
            ContainerType::Bag => rdf::bag(),
            ContainerType::Alt => rdf::alt(),
            ContainerType::Container => rdfs::container(),
        }
    }
}

/// Structural shape of a property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// At most one value
    Single,
    /// Unordered values, one statement each
    Collection,
    /// rdf:first/rdf:rest chain
    List,
    /// Membership statements on a container node. Indexed containers keep
    /// gaps as `Null` slots.
    Container {
        container_type: ContainerType,
        indexed: bool,
    },
    /// One resource per entry carrying the key and, optionally, the value.
    /// Without a value predicate the entry resource is the value.
    Map {
        key_predicate: NamedNode,
        value_predicate: Option<NamedNode>,
        key_type: ValueType,
    },
    /// Text in the current locale
    Localized,
    /// Full language → text map
    LocalizedMap,
    /// Another mapped class sharing the host subject
    Mixin,
    /// Statements not claimed by static properties, keyed by predicate
    Dynamic {
        include_mapped: bool,
        collection: bool,
    },
}

impl PropertyKind {
    /// Kinds encoded as a structure hanging off one object node
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PropertyKind::List | PropertyKind::Container { .. } | PropertyKind::Map { .. }
        )
    }

    pub fn is_multi_valued(&self) -> bool {
        !matches!(
            self,
            PropertyKind::Single | PropertyKind::Localized | PropertyKind::Mixin
        )
    }
}

/// Property mapping
#[derive(Debug, Clone)]
pub struct MappedProperty {
    name: String,
    path: Option<MappedPath>,
    value_type: ValueType,
    kind: PropertyKind,
    injection: bool,
    class_reference: bool,
    ignore_invalid: bool,
    defaults: Vec<Node>,
    context: Option<NamedNode>,
    accessor: Accessor,
}

impl MappedProperty {
    /// Single-valued property
    pub fn new(
        name: impl Into<String>,
        path: impl Into<MappedPath>,
        value_type: ValueType,
        accessor: Accessor,
    ) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
            value_type,
            kind: PropertyKind::Single,
            injection: false,
            class_reference: false,
            ignore_invalid: false,
            defaults: Vec::new(),
            context: None,
            accessor,
        }
    }

    /// Mixin: the value is an instance of `class` bound to the host subject
    pub fn mixin(name: impl Into<String>, class: ClassId, accessor: Accessor) -> Self {
        Self {
            name: name.into(),
            path: None,
            value_type: ValueType::Class(class),
            kind: PropertyKind::Mixin,
            injection: false,
            class_reference: false,
            ignore_invalid: false,
            defaults: Vec::new(),
            context: None,
            accessor,
        }
    }

    /// Open property. The value is a map from predicate URI to a value, or to a
    /// list of values for collection properties.
    pub fn dynamic(
        name: impl Into<String>,
        value_type: ValueType,
        include_mapped: bool,
        collection: bool,
        accessor: Accessor,
    ) -> Self {
        Self {
            name: name.into(),
            path: None,
            value_type,
            kind: PropertyKind::Dynamic {
                include_mapped,
                collection,
            },
            injection: false,
            class_reference: false,
            ignore_invalid: false,
            defaults: Vec::new(),
            context: None,
            accessor,
        }
    }

    pub fn collection(mut self) -> Self {
        self.kind = PropertyKind::Collection;
        self
    }

    pub fn list(mut self) -> Self {
        self.kind = PropertyKind::List;
        self
    }

    pub fn container(mut self, container_type: ContainerType, indexed: bool) -> Self {
        self.kind = PropertyKind::Container {
            container_type,
            indexed,
        };
        self
    }

    pub fn map(
        mut self,
        key_predicate: NamedNode,
        value_predicate: Option<NamedNode>,
        key_type: ValueType,
    ) -> Self {
        self.kind = PropertyKind::Map {
            key_predicate,
            value_predicate,
            key_type,
        };
        self
    }

    pub fn localized(mut self) -> Self {
        self.kind = PropertyKind::Localized;
        self
    }

    pub fn localized_map(mut self) -> Self {
        self.kind = PropertyKind::LocalizedMap;
        self
    }

    /// Value comes from a parent repository instead of the store
    pub fn injection(mut self) -> Self {
        self.injection = true;
        self
    }

    /// Value is a mapped class, stored as its type URI
    pub fn class_reference(mut self) -> Self {
        self.class_reference = true;
        self
    }

    /// Drop unconvertible values silently
    pub fn ignore_invalid(mut self) -> Self {
        self.ignore_invalid = true;
        self
    }

    /// Node used when the store holds no value
    pub fn with_default(mut self, node: impl Into<Node>) -> Self {
        self.defaults.push(node.into());
        self
    }

    /// Context override, used by mixins
    pub fn in_context(mut self, context: NamedNode) -> Self {
        self.context = Some(context);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&MappedPath> {
        self.path.as_ref()
    }

    /// First predicate of the path
    pub fn predicate(&self) -> Option<&NamedNode> {
        self.path.as_ref().and_then(|p| p.first()).map(|p| &p.uri)
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn is_injection(&self) -> bool {
        self.injection
    }

    pub fn is_class_reference(&self) -> bool {
        self.class_reference
    }

    pub fn is_ignore_invalid(&self) -> bool {
        self.ignore_invalid
    }

    pub fn defaults(&self) -> &[Node] {
        &self.defaults
    }

    pub fn context(&self) -> Option<&NamedNode> {
        self.context.as_ref()
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    pub fn is_mixin(&self) -> bool {
        matches!(self.kind, PropertyKind::Mixin)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, PropertyKind::Dynamic { .. })
    }

    /// Written back by the serializer
    pub fn is_simple(&self) -> bool {
        !self.injection && self.path.as_ref().map(|p| p.is_simple()).unwrap_or(false)
    }

    pub fn is_localized(&self) -> bool {
        matches!(self.kind, PropertyKind::Localized | PropertyKind::LocalizedMap)
    }
}
