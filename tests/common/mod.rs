//! Shared fixture: a small people/companies domain and its mappings
#![allow(dead_code)]

use rdfbind::connection::MemoryConnection;
use rdfbind::mapping::{
    Accessor, ContainerType, Configuration, ConfigurationBuilder, EnumType, IdKind, MappedClass,
    MappedPath, MappedPredicate, MappedProperty, ValueType,
};
use rdfbind::object::{ClassId, ObjectRef, Value};
use rdfbind::rdf::vocab::rdfs;
use rdfbind::rdf::{Id, NamedNode, Statement};
use rdfbind::session::{FlushMode, Session, SessionConfig};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const EX: &str = "http://example.org/";
pub const VOCAB: &str = "http://example.org/vocab#";
pub const COMPANIES: &str = "http://companies.example.org/";

pub fn vocab(ln: &str) -> NamedNode {
    NamedNode::from_parts(VOCAB, ln).unwrap()
}

pub fn resource(path: &str) -> Id {
    NamedNode::new(&format!("{}{}", EX, path)).unwrap().into()
}

pub trait Agent {}

#[derive(Default)]
pub struct Person {
    pub id: Option<Id>,
    pub name: String,
    pub age: Option<i64>,
    pub status: Option<String>,
    pub friends: Vec<ObjectRef>,
    pub nicknames: Vec<String>,
    pub scores: Vec<Option<i64>>,
}

#[derive(Default)]
pub struct Employee {
    pub id: Option<Id>,
    pub name: String,
    pub employer: Option<ObjectRef>,
}

#[derive(Default)]
pub struct Company {
    pub id: Option<Id>,
    pub name: String,
    pub budget: Vec<(String, i64)>,
}

#[derive(Default)]
pub struct Contractor {
    pub id: Option<Id>,
    pub name: String,
    pub agency: Option<ObjectRef>,
}

#[derive(Default)]
pub struct Robot {
    pub id: Option<Id>,
    pub serial: String,
}

#[derive(Default)]
pub struct Product {
    pub id: Option<Id>,
    pub sku: String,
    pub label: Option<String>,
    pub descriptions: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct Note {
    pub id: Option<i64>,
    pub text: String,
}

#[derive(Default)]
pub struct Profile {
    pub id: Option<Id>,
    pub name: String,
    pub extra: Vec<(Value, Value)>,
}

/// Mixin sharing the subject of its host
#[derive(Default)]
pub struct Location {
    pub street: String,
    pub city: String,
}

/// Built through a mapped constructor that requires a name
pub struct Office {
    pub id: Option<Id>,
    pub name: String,
    pub location: Option<ObjectRef>,
    pub occupants: Vec<Id>,
    pub occupant_names: Vec<String>,
    pub occupant_kind: Option<ClassId>,
    pub floors: Option<i64>,
}

impl Office {
    pub fn new(name: &str) -> Self {
        Office {
            id: None,
            name: name.to_string(),
            location: None,
            occupants: Vec::new(),
            occupant_names: Vec::new(),
            occupant_kind: None,
            floors: None,
        }
    }
}

/// Types whose identity lives in an `id: Option<Id>` field
pub trait Identified: 'static {
    fn id(&self) -> &Option<Id>;
    fn id_mut(&mut self) -> &mut Option<Id>;
}

macro_rules! identified {
    ($($ty:ty),*) => {
        $(impl Identified for $ty {
            fn id(&self) -> &Option<Id> {
                &self.id
            }
            fn id_mut(&mut self) -> &mut Option<Id> {
                &mut self.id
            }
        })*
    };
}

identified!(Person, Employee, Company, Contractor, Robot, Product, Profile, Office);

fn id_accessor<T: Identified>() -> Accessor {
    Accessor::new(
        |t: &T| Value::from(t.id().clone()),
        |t: &mut T, v: Value| *t.id_mut() = v.into_node().and_then(|n| n.as_id()),
    )
}

fn objects_value(items: &[ObjectRef]) -> Value {
    Value::List(items.iter().cloned().map(Value::Object).collect())
}

fn into_objects(value: Value) -> Vec<ObjectRef> {
    value.into_list().into_iter().filter_map(Value::into_object).collect()
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

pub fn status_type() -> EnumType {
    EnumType::new("Status", ["Active", "Retired"]).with_namespace(VOCAB)
}

fn person_class() -> MappedClass {
    MappedClass::new::<Person>()
        .with_type(vocab("Person"))
        .with_supertype(ClassId::of::<dyn Agent>())
        .with_factory(Person::default)
        .with_id(IdKind::Uri, id_accessor::<Person>())
        .with_uri_template(|p: &Person| Some(format!("{}person/{}", EX, slug(&p.name))))
        .with_property(MappedProperty::new(
            "name",
            vocab("name"),
            ValueType::String,
            Accessor::new(
                |p: &Person| Value::from(p.name.clone()),
                |p: &mut Person, v| p.name = v.into_string().unwrap_or_default(),
            ),
        ))
        .with_property(MappedProperty::new(
            "age",
            vocab("age"),
            ValueType::Integer,
            Accessor::new(|p: &Person| Value::from(p.age), |p: &mut Person, v| p.age = v.as_i64()),
        ))
        .with_property(MappedProperty::new(
            "status",
            vocab("status"),
            ValueType::Enum(status_type()),
            Accessor::new(
                |p: &Person| p.status.clone().map(Value::Enum).unwrap_or_default(),
                |p: &mut Person, v| p.status = v.into_string(),
            ),
        ))
        .with_property(
            MappedProperty::new(
                "friends",
                vocab("knows"),
                ValueType::Class(ClassId::of::<Person>()),
                Accessor::new(
                    |p: &Person| objects_value(&p.friends),
                    |p: &mut Person, v| p.friends = into_objects(v),
                ),
            )
            .collection(),
        )
        .with_property(
            MappedProperty::new(
                "nicknames",
                vocab("nicknames"),
                ValueType::String,
                Accessor::new(
                    |p: &Person| Value::from(p.nicknames.clone()),
                    |p: &mut Person, v| {
                        p.nicknames = v.into_list().into_iter().filter_map(Value::into_string).collect()
                    },
                ),
            )
            .list(),
        )
        .with_property(
            MappedProperty::new(
                "scores",
                vocab("scores"),
                ValueType::Integer,
                Accessor::new(
                    |p: &Person| Value::List(p.scores.iter().map(|s| Value::from(*s)).collect()),
                    |p: &mut Person, v| p.scores = v.into_list().iter().map(Value::as_i64).collect(),
                ),
            )
            .container(ContainerType::Seq, true),
        )
}

fn employee_class() -> MappedClass {
    MappedClass::new::<Employee>()
        .with_type(vocab("Employee"))
        .with_supertype(ClassId::of::<Person>())
        .with_factory(Employee::default)
        .with_id(IdKind::Uri, id_accessor::<Employee>())
        .with_uri_template(|e: &Employee| Some(format!("{}person/{}", EX, slug(&e.name))))
        .with_property(MappedProperty::new(
            "name",
            vocab("name"),
            ValueType::String,
            Accessor::new(
                |e: &Employee| Value::from(e.name.clone()),
                |e: &mut Employee, v| e.name = v.into_string().unwrap_or_default(),
            ),
        ))
        .with_property(MappedProperty::new(
            "employer",
            vocab("employer"),
            ValueType::Class(ClassId::of::<Company>()),
            Accessor::new(
                |e: &Employee| Value::from(e.employer.clone()),
                |e: &mut Employee, v| e.employer = v.into_object(),
            ),
        ))
}

fn company_class() -> MappedClass {
    MappedClass::new::<Company>()
        .with_type(vocab("Company"))
        .with_factory(Company::default)
        .with_id(IdKind::Uri, id_accessor::<Company>())
        .with_uri_template(|c: &Company| Some(format!("{}{}", COMPANIES, slug(&c.name))))
        .with_property(MappedProperty::new(
            "name",
            vocab("name"),
            ValueType::String,
            Accessor::new(
                |c: &Company| Value::from(c.name.clone()),
                |c: &mut Company, v| c.name = v.into_string().unwrap_or_default(),
            ),
        ))
        .with_property(
            MappedProperty::new(
                "budget",
                vocab("budget"),
                ValueType::Integer,
                Accessor::new(
                    |c: &Company| {
                        Value::Map(
                            c.budget
                                .iter()
                                .map(|(k, v)| (Value::from(k.clone()), Value::from(*v)))
                                .collect(),
                        )
                    },
                    |c: &mut Company, v| {
                        c.budget = v
                            .into_map()
                            .into_iter()
                            .filter_map(|(k, v)| Some((k.into_string()?, v.as_i64()?)))
                            .collect()
                    },
                ),
            )
            .map(vocab("department"), Some(vocab("amount")), ValueType::String),
        )
}

fn contractor_class() -> MappedClass {
    MappedClass::new::<Contractor>()
        .with_type(vocab("Contractor"))
        .with_factory(Contractor::default)
        .with_id(IdKind::Uri, id_accessor::<Contractor>())
        .with_uri_template(|c: &Contractor| Some(format!("{}contractor/{}", EX, slug(&c.name))))
        .with_property(MappedProperty::new(
            "name",
            vocab("name"),
            ValueType::String,
            Accessor::new(
                |c: &Contractor| Value::from(c.name.clone()),
                |c: &mut Contractor, v| c.name = v.into_string().unwrap_or_default(),
            ),
        ))
        .with_property(
            MappedProperty::new(
                "agency",
                vocab("agency"),
                ValueType::Class(ClassId::of::<Company>()),
                Accessor::new(
                    |c: &Contractor| Value::from(c.agency.clone()),
                    |c: &mut Contractor, v| c.agency = v.into_object(),
                ),
            )
            .injection(),
        )
}

fn robot_class() -> MappedClass {
    MappedClass::new::<Robot>()
        .with_type(vocab("Robot"))
        .with_supertype(ClassId::of::<dyn Agent>())
        .with_factory(Robot::default)
        .with_id(IdKind::Uri, id_accessor::<Robot>())
        .with_property(MappedProperty::new(
            "serial",
            vocab("serial"),
            ValueType::String,
            Accessor::new(
                |r: &Robot| Value::from(r.serial.clone()),
                |r: &mut Robot, v| r.serial = v.into_string().unwrap_or_default(),
            ),
        ))
}

fn product_class() -> MappedClass {
    MappedClass::new::<Product>()
        .with_type(vocab("Product"))
        .with_factory(Product::default)
        .with_id(IdKind::Uri, id_accessor::<Product>())
        .with_uri_template(|p: &Product| Some(format!("{}product/{}", EX, p.sku)))
        .with_property(MappedProperty::new(
            "sku",
            vocab("sku"),
            ValueType::String,
            Accessor::new(
                |p: &Product| Value::from(p.sku.clone()),
                |p: &mut Product, v| p.sku = v.into_string().unwrap_or_default(),
            ),
        ))
        .with_property(
            MappedProperty::new(
                "label",
                rdfs::label(),
                ValueType::String,
                Accessor::new(
                    |p: &Product| Value::from(p.label.clone()),
                    |p: &mut Product, v| p.label = v.into_string(),
                ),
            )
            .localized(),
        )
        .with_property(
            MappedProperty::new(
                "descriptions",
                vocab("description"),
                ValueType::String,
                Accessor::new(
                    |p: &Product| Value::from(p.descriptions.clone()),
                    |p: &mut Product, v| p.descriptions = v.into_localized(),
                ),
            )
            .localized_map(),
        )
}

fn note_class() -> MappedClass {
    MappedClass::new::<Note>()
        .with_type(vocab("Note"))
        .with_factory(Note::default)
        .with_id(
            IdKind::Local,
            Accessor::new(|n: &Note| Value::from(n.id), |n: &mut Note, v| n.id = v.as_i64()),
        )
        .with_property(MappedProperty::new(
            "text",
            vocab("text"),
            ValueType::String,
            Accessor::new(
                |n: &Note| Value::from(n.text.clone()),
                |n: &mut Note, v| n.text = v.into_string().unwrap_or_default(),
            ),
        ))
}

fn profile_class() -> MappedClass {
    MappedClass::new::<Profile>()
        .with_type(vocab("Profile"))
        .with_factory(Profile::default)
        .with_id(IdKind::Uri, id_accessor::<Profile>())
        .with_uri_template(|p: &Profile| Some(format!("{}profile/{}", EX, slug(&p.name))))
        .with_property(MappedProperty::new(
            "name",
            vocab("name"),
            ValueType::String,
            Accessor::new(
                |p: &Profile| Value::from(p.name.clone()),
                |p: &mut Profile, v| p.name = v.into_string().unwrap_or_default(),
            ),
        ))
        .with_property(MappedProperty::dynamic(
            "extra",
            ValueType::Any,
            false,
            false,
            Accessor::new(
                |p: &Profile| Value::Map(p.extra.clone()),
                |p: &mut Profile, v| p.extra = v.into_map(),
            ),
        ))
}

fn location_class() -> MappedClass {
    MappedClass::new::<Location>()
        .with_factory(Location::default)
        .with_property(MappedProperty::new(
            "street",
            vocab("street"),
            ValueType::String,
            Accessor::new(
                |l: &Location| Value::from(l.street.clone()),
                |l: &mut Location, v| l.street = v.into_string().unwrap_or_default(),
            ),
        ))
        .with_property(MappedProperty::new(
            "city",
            vocab("city"),
            ValueType::String,
            Accessor::new(
                |l: &Location| Value::from(l.city.clone()),
                |l: &mut Location, v| l.city = v.into_string().unwrap_or_default(),
            ),
        ))
}

/// People point at their office through vocab:office
fn occupied_by() -> MappedPredicate {
    MappedPredicate::new(vocab("office")).inverse()
}

fn office_class() -> MappedClass {
    MappedClass::new::<Office>()
        .with_type(vocab("Office"))
        .with_constructor(&["name"], |args: Vec<Value>| {
            let name = args
                .into_iter()
                .next()
                .and_then(Value::into_string)
                .ok_or_else(|| "an office needs a name".to_string())?;
            Ok(Office::new(&name))
        })
        .with_id(IdKind::Uri, id_accessor::<Office>())
        .with_uri_template(|o: &Office| Some(format!("office/{}", slug(&o.name))))
        .with_property(MappedProperty::new(
            "name",
            vocab("name"),
            ValueType::String,
            Accessor::read_only(|o: &Office| Value::from(o.name.clone())),
        ))
        .with_property(MappedProperty::mixin(
            "location",
            ClassId::of::<Location>(),
            Accessor::new(
                |o: &Office| Value::from(o.location.clone()),
                |o: &mut Office, v| o.location = v.into_object(),
            ),
        ))
        .with_property(
            MappedProperty::new(
                "occupants",
                MappedPath::new(vec![occupied_by()]),
                ValueType::Id,
                Accessor::new(
                    |o: &Office| Value::List(o.occupants.iter().cloned().map(Value::from).collect()),
                    |o: &mut Office, v| {
                        o.occupants = v
                            .into_list()
                            .into_iter()
                            .filter_map(|v| v.into_node().and_then(|n| n.as_id()))
                            .collect()
                    },
                ),
            )
            .collection(),
        )
        .with_property(
            MappedProperty::new(
                "occupant_names",
                MappedPath::new(vec![occupied_by(), MappedPredicate::new(vocab("name"))]),
                ValueType::String,
                Accessor::new(
                    |o: &Office| Value::from(o.occupant_names.clone()),
                    |o: &mut Office, v| {
                        o.occupant_names =
                            v.into_list().into_iter().filter_map(Value::into_string).collect()
                    },
                ),
            )
            .collection(),
        )
        .with_property(
            MappedProperty::new(
                "occupant_kind",
                vocab("occupantKind"),
                ValueType::Class(ClassId::of::<dyn Agent>()),
                Accessor::new(
                    |o: &Office| o.occupant_kind.map(Value::Class).unwrap_or_default(),
                    |o: &mut Office, v| {
                        o.occupant_kind = match v {
                            Value::Class(class) => Some(class),
                            _ => None,
                        }
                    },
                ),
            )
            .class_reference(),
        )
        .with_property(
            MappedProperty::new(
                "floors",
                vocab("floors"),
                ValueType::Integer,
                Accessor::new(|o: &Office| Value::from(o.floors), |o: &mut Office, v| o.floors = v.as_i64()),
            )
            .ignore_invalid(),
        )
}

/// Every fixture class, ready for extra settings
pub fn configuration_builder() -> ConfigurationBuilder {
    Configuration::builder()
        .base_iri(EX)
        .add_class(MappedClass::new::<dyn Agent>().with_type(vocab("Agent")))
        .add_class(person_class())
        .add_class(employee_class())
        .add_class(company_class())
        .add_class(contractor_class())
        .add_class(robot_class())
        .add_class(product_class())
        .add_class(note_class())
        .add_class(profile_class())
        .add_class(location_class())
        .add_class(office_class())
}

pub fn configuration() -> Arc<Configuration> {
    Arc::new(configuration_builder().build().unwrap())
}

/// Route session logs to the test harness output
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn session(connection: MemoryConnection) -> Session<MemoryConnection> {
    init_logging();
    Session::new(connection, configuration(), SessionConfig::default())
}

pub fn manual_session(connection: MemoryConnection) -> Session<MemoryConnection> {
    init_logging();
    let config = SessionConfig::default().with_flush_mode(FlushMode::Manual);
    Session::new(connection, configuration(), config)
}

/// Write statements straight into the connection's store
pub fn seed(connection: &MemoryConnection, statements: Vec<Statement>) {
    let store = connection.store();
    let mut store = store.write().unwrap();
    for stmt in statements {
        store.insert(stmt).unwrap();
    }
}

/// Every stored statement
pub fn stored(connection: &MemoryConnection) -> Vec<Statement> {
    let store = connection.store();
    let store = store.read().unwrap();
    store.iter().cloned().collect()
}

pub fn person(name: &str) -> Person {
    Person {
        name: name.to_string(),
        ..Person::default()
    }
}
