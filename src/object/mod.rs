//! Native object model
//!
//! Bound objects are plain Rust structs behind a shared, mutable handle
//! ([`ObjectRef`]). The session never inspects struct fields itself: every read
//! and write goes through the accessor table registered for the class, which
//! moves data in and out as dynamic [`Value`]s.
//!
//! # Example
//!
//! ```rust
//! use rdfbind::object::{self, ClassId, Value};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//! }
//!
//! let alice = object::new_ref(Person { name: "Alice".into() });
//! assert_eq!(object::class_of(&alice), ClassId::of::<Person>());
//! assert_eq!(object::downcast_ref::<Person>(&alice).unwrap().name, "Alice");
//!
//! let value = Value::from("Alice");
//! assert_eq!(value.as_str(), Some("Alice"));
//! ```

use crate::rdf::{Id, NamedNode, Node};
use chrono::{DateTime, NaiveDate, Utc};
use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Runtime identifier of a native type
///
/// Works for unsized types too, so traits (`dyn Named`) and marker types can be
/// mapped as abstract classes.
#[derive(Clone, Copy)]
pub struct ClassId {
    id: TypeId,
    name: &'static str,
}

impl ClassId {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.name)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Anything that can be bound to a graph identity
///
/// Implemented for every `'static` type. Call the methods through a
/// `&dyn Entity`; the helpers in this module do that for [`ObjectRef`]s.
pub trait Entity: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn class_id(&self) -> ClassId;
}

impl<T: Any> Entity for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn class_id(&self) -> ClassId {
        ClassId::of::<T>()
    }
}

/// Shared handle to a bound object
pub type ObjectRef = Rc<RefCell<dyn Entity>>;

/// Wrap a value into a shared handle
pub fn new_ref<T: Any>(value: T) -> ObjectRef {
    Rc::new(RefCell::new(value))
}

/// Runtime class of the referenced object
pub fn class_of(object: &ObjectRef) -> ClassId {
    let entity = object.borrow();
    let entity: &dyn Entity = &*entity;
    entity.class_id()
}

/// Object identity: the address of the shared allocation
pub fn address(object: &ObjectRef) -> usize {
    Rc::as_ptr(object) as *const () as usize
}

/// Borrow the referenced object as `T`
pub fn downcast_ref<T: Any>(object: &ObjectRef) -> Option<Ref<'_, T>> {
    Ref::filter_map(object.borrow(), |entity| entity.as_any().downcast_ref::<T>()).ok()
}

/// Mutably borrow the referenced object as `T`
pub fn downcast_mut<T: Any>(object: &ObjectRef) -> Option<RefMut<'_, T>> {
    RefMut::filter_map(object.borrow_mut(), |entity| {
        entity.as_any_mut().downcast_mut::<T>()
    })
    .ok()
}

/// Dynamic property value
///
/// The session reads and writes object state exclusively as values of this
/// type. Objects compare by identity, everything else structurally.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    /// Enum constant name
    Enum(String),
    Node(Node),
    /// Reference to a mapped class (class-reference properties)
    Class(ClassId),
    Object(ObjectRef),
    /// Ordered sequence; `Null` entries are absent slots
    List(Vec<Value>),
    /// Key/value pairs in insertion order
    Map(Vec<(Value, Value)>),
    /// Language tag → text
    Localized(BTreeMap<String, String>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Items of a list; a single value becomes a one-element list and `Null` an
    /// empty one
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    pub fn into_map(self) -> Vec<(Value, Value)> {
        match self {
            Value::Map(entries) => entries,
            _ => Vec::new(),
        }
    }

    pub fn into_localized(self) -> BTreeMap<String, String> {
        match self {
            Value::Localized(map) => map,
            _ => BTreeMap::new(),
        }
    }

    /// Objects referenced by this value, including nested ones
    pub fn objects(&self) -> Vec<ObjectRef> {
        let mut out = Vec::new();
        self.collect_objects(&mut out);
        out
    }

    fn collect_objects(&self, out: &mut Vec<ObjectRef>) {
        match self {
            Value::Object(o) => out.push(Rc::clone(o)),
            Value::List(items) => items.iter().for_each(|v| v.collect_objects(out)),
            Value::Map(entries) => entries.iter().for_each(|(k, v)| {
                k.collect_objects(out);
                v.collect_objects(out);
            }),
            _ => {}
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Localized(a), Value::Localized(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Double(d) => write!(f, "Double({})", d),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::DateTime(dt) => write!(f, "DateTime({})", dt),
            Value::Date(d) => write!(f, "Date({})", d),
            Value::Enum(e) => write!(f, "Enum({})", e),
            Value::Node(n) => write!(f, "Node({})", n),
            Value::Class(c) => write!(f, "Class({})", c),
            Value::Object(o) => match o.try_borrow() {
                Ok(entity) => {
                    let entity: &dyn Entity = &*entity;
                    write!(f, "Object({}@{:#x})", entity.class_id(), address(o))
                }
                Err(_) => write!(f, "Object(@{:#x})", address(o)),
            },
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
            Value::Localized(map) => write!(f, "Localized({:?})", map),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<Node> for Value {
    fn from(n: Node) -> Self {
        Value::Node(n)
    }
}

impl From<NamedNode> for Value {
    fn from(n: NamedNode) -> Self {
        Value::Node(n.into())
    }
}

impl From<Id> for Value {
    fn from(id: Id) -> Self {
        Value::Node(id.into())
    }
}

impl From<ClassId> for Value {
    fn from(c: ClassId) -> Self {
        Value::Class(c)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::Localized(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
