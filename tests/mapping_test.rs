mod common;

use common::{person, resource, vocab, Location, Office, Person, Robot};
use rdfbind::connection::MemoryConnection;
use rdfbind::object::{self, ClassId};
use rdfbind::rdf::vocab::{rdf, xsd};
use rdfbind::rdf::{Id, Literal, NamedNode, Node, Statement};
use rdfbind::session::{Session, SessionConfig, SessionError, StrictErrorPolicy};
use std::sync::Arc;

fn headquarters() -> Office {
    let mut office = Office::new("HQ");
    office.location = Some(object::new_ref(Location {
        street: "Main Street 1".to_string(),
        city: "Espoo".to_string(),
    }));
    office.floors = Some(4);
    office
}

#[test]
fn test_mixin_and_constructor_round_trip() {
    let conn = MemoryConnection::new();
    let mut session = common::session(conn.reconnect());

    let id = session.save(&object::new_ref(headquarters())).unwrap();
    assert_eq!(id, resource("office/hq"));

    // The mixin writes onto the office itself
    let stored = common::stored(&conn);
    assert!(stored.iter().all(|s| s.subject == id));
    assert!(stored.contains(&Statement::new(
        id.clone(),
        vocab("city"),
        Literal::new_simple_literal("Espoo"),
        None
    )));

    session.clear();
    let loaded = session.get(ClassId::of::<Office>(), &id).unwrap().unwrap();
    let office = object::downcast_ref::<Office>(&loaded).unwrap();
    assert_eq!(office.name, "HQ");
    assert_eq!(office.id, Some(id.clone()));
    assert_eq!(office.floors, Some(4));
    let location = office.location.as_ref().unwrap();
    let location = object::downcast_ref::<Location>(location).unwrap();
    assert_eq!(location.street, "Main Street 1");
    assert_eq!(location.city, "Espoo");
}

#[test]
fn test_mixin_update_keeps_minimal_diff() {
    let mut session = common::manual_session(MemoryConnection::new());
    let office = object::new_ref(headquarters());
    session.save(&office).unwrap();
    session.flush().unwrap();

    session.save(&office).unwrap();
    assert!(session.pending_additions().is_empty());
    assert!(session.pending_removals().is_empty());

    {
        let office = object::downcast_ref::<Office>(&office).unwrap();
        let location = office.location.as_ref().unwrap();
        object::downcast_mut::<Location>(location).unwrap().city = "Helsinki".to_string();
    }
    session.save(&office).unwrap();
    assert_eq!(session.pending_additions().len(), 1);
    assert_eq!(session.pending_removals().len(), 1);
    assert_eq!(session.pending_additions()[0].predicate, vocab("city"));
}

#[test]
fn test_constructor_failure_is_fatal() {
    let conn = MemoryConnection::new();
    let id = resource("office/nameless");
    common::seed(
        &conn,
        vec![Statement::new(id.clone(), rdf::type_(), vocab("Office"), None)],
    );

    let mut session = common::session(conn);
    let result = session.get(ClassId::of::<Office>(), &id);
    assert!(matches!(result, Err(SessionError::Instantiation(_))));
}

fn occupied_store() -> (MemoryConnection, Id) {
    let conn = MemoryConnection::new();
    let mut session = common::session(conn.reconnect());
    let office = session.save(&object::new_ref(Office::new("Lab"))).unwrap();
    let ann = session.save(&object::new_ref(person("Ann"))).unwrap();
    let bob = session.save(&object::new_ref(person("Bob"))).unwrap();
    common::seed(
        &conn,
        vec![
            Statement::new(ann, vocab("office"), office.clone(), None),
            Statement::new(bob, vocab("office"), office.clone(), None),
            Statement::new(office.clone(), vocab("occupantKind"), vocab("Robot"), None),
        ],
    );
    (conn, office)
}

#[test]
fn test_inverse_and_multi_step_paths() {
    let (conn, office) = occupied_store();
    let mut session = common::session(conn);

    let loaded = session.get(ClassId::of::<Office>(), &office).unwrap().unwrap();
    let loaded = object::downcast_ref::<Office>(&loaded).unwrap();

    let mut occupants = loaded.occupants.clone();
    occupants.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(occupants, vec![resource("person/ann"), resource("person/bob")]);

    let mut names = loaded.occupant_names.clone();
    names.sort();
    assert_eq!(names, vec!["Ann", "Bob"]);
}

#[test]
fn test_derived_paths_are_not_written() {
    let (conn, office) = occupied_store();
    let mut session = common::session(conn.reconnect());

    let loaded = session.get(ClassId::of::<Office>(), &office).unwrap().unwrap();
    object::downcast_mut::<Office>(&loaded).unwrap().occupants.clear();
    session.save(&loaded).unwrap();

    let stored = common::stored(&conn);
    let occupied: Vec<_> = stored.iter().filter(|s| s.predicate == vocab("office")).collect();
    assert_eq!(occupied.len(), 2);
    assert!(occupied.iter().all(|s| s.object == Node::from(office.clone())));
    assert!(stored.contains(&Statement::new(
        office.clone(),
        vocab("name"),
        Literal::new_simple_literal("Lab"),
        None
    )));
}

#[test]
fn test_class_reference_round_trip() {
    let (conn, office) = occupied_store();
    let mut session = common::session(conn.reconnect());

    let loaded = session.get(ClassId::of::<Office>(), &office).unwrap().unwrap();
    assert_eq!(
        object::downcast_ref::<Office>(&loaded).unwrap().occupant_kind,
        Some(ClassId::of::<Robot>())
    );

    object::downcast_mut::<Office>(&loaded).unwrap().occupant_kind = Some(ClassId::of::<Person>());
    session.save(&loaded).unwrap();
    let kinds: Vec<_> = common::stored(&conn)
        .into_iter()
        .filter(|s| s.predicate == vocab("occupantKind"))
        .collect();
    assert_eq!(kinds.len(), 1);
    assert_eq!(kinds[0].object.as_named_node(), Some(&vocab("Person")));
}

#[test]
fn test_ignore_invalid_bypasses_strict_policy() {
    let conn = MemoryConnection::new();
    let id = resource("office/annex");
    common::seed(
        &conn,
        vec![
            Statement::new(id.clone(), rdf::type_(), vocab("Office"), None),
            Statement::new(id.clone(), vocab("name"), Literal::new_simple_literal("Annex"), None),
            Statement::new(
                id.clone(),
                vocab("floors"),
                Literal::new_typed_literal("many", xsd::integer()),
                None,
            ),
        ],
    );

    let mut session = common::session(conn).with_error_policy(StrictErrorPolicy);
    let loaded = session.get(ClassId::of::<Office>(), &id).unwrap().unwrap();
    let office = object::downcast_ref::<Office>(&loaded).unwrap();
    assert_eq!(office.name, "Annex");
    assert_eq!(office.floors, None);
}

#[test]
fn test_restricted_namespace_is_not_written() {
    let conn = MemoryConnection::new();
    let mut session = common::session(conn.reconnect());

    let thing: Id = NamedNode::new("http://www.w3.org/2002/07/owl#Thing").unwrap().into();
    let robot = object::new_ref(Robot {
        id: Some(thing.clone()),
        serial: "R2".to_string(),
    });
    assert_eq!(session.save(&robot).unwrap(), thing);
    assert!(conn.is_empty().unwrap());
    assert_eq!(session.identity_of(&robot), Some(thing));
}

#[test]
fn test_configured_restricted_namespace() {
    let conn = MemoryConnection::new();
    let config = common::configuration_builder()
        .restrict_namespace(format!("{}person/", common::EX))
        .build()
        .unwrap();
    let mut session = Session::new(conn.reconnect(), Arc::new(config), SessionConfig::default());

    let alice = session.save(&object::new_ref(person("Alice"))).unwrap();
    assert!(session.configuration().is_restricted(&alice));
    assert!(conn.is_empty().unwrap());

    let office = session.save(&object::new_ref(Office::new("HQ"))).unwrap();
    assert!(!conn.is_empty().unwrap());
    assert!(common::stored(&conn).iter().all(|s| s.subject == office));
}
