mod common;

use common::Product;
use rdfbind::connection::MemoryConnection;
use rdfbind::object::{self, ClassId, ObjectRef};
use rdfbind::rdf::{Id, Statement};
use rdfbind::session::{Session, SessionConfig};
use std::collections::BTreeMap;

fn session_in(conn: &MemoryConnection, locale: &str) -> Session<MemoryConnection> {
    let config = SessionConfig::default().with_locales([locale]);
    Session::new(conn.reconnect(), common::configuration(), config)
}

fn load(session: &mut Session<MemoryConnection>, id: &Id) -> ObjectRef {
    session.get(ClassId::of::<Product>(), id).unwrap().unwrap()
}

fn labels(conn: &MemoryConnection) -> Vec<Statement> {
    common::stored(conn)
        .into_iter()
        .filter(|s| s.predicate.as_str().ends_with("#label"))
        .collect()
}

#[test]
fn test_localized_text_per_locale() {
    let conn = MemoryConnection::new();
    let mut english = session_in(&conn, "en");

    let chair = object::new_ref(Product {
        sku: "chair".to_string(),
        label: Some("Chair".to_string()),
        ..Product::default()
    });
    let id = english.save(&chair).unwrap();
    let stored = labels(&conn);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].object.as_literal().unwrap().language(), Some("en"));

    // No Finnish text yet and no root-locale fallback
    let mut finnish = session_in(&conn, "fi");
    let loaded = load(&mut finnish, &id);
    assert_eq!(object::downcast_ref::<Product>(&loaded).unwrap().label, None);

    object::downcast_mut::<Product>(&loaded).unwrap().label = Some("Tuoli".to_string());
    finnish.save(&loaded).unwrap();
    assert_eq!(labels(&conn).len(), 2);

    // Writing Finnish leaves the English text alone
    english.clear();
    let loaded = load(&mut english, &id);
    assert_eq!(object::downcast_ref::<Product>(&loaded).unwrap().label.as_deref(), Some("Chair"));

    finnish.clear();
    let loaded = load(&mut finnish, &id);
    assert_eq!(object::downcast_ref::<Product>(&loaded).unwrap().label.as_deref(), Some("Tuoli"));
}

#[test]
fn test_localized_update_replaces_current_locale() {
    let conn = MemoryConnection::new();
    let mut english = session_in(&conn, "en");

    let chair = object::new_ref(Product {
        sku: "chair".to_string(),
        label: Some("Chair".to_string()),
        ..Product::default()
    });
    english.save(&chair).unwrap();
    object::downcast_mut::<Product>(&chair).unwrap().label = Some("Armchair".to_string());
    english.save(&chair).unwrap();

    let stored = labels(&conn);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].object.as_literal().unwrap().value(), "Armchair");
}

#[test]
fn test_locale_fallback_to_language() {
    let conn = MemoryConnection::new();
    let mut english = session_in(&conn, "en");
    let chair = object::new_ref(Product {
        sku: "chair".to_string(),
        label: Some("Chair".to_string()),
        ..Product::default()
    });
    let id = english.save(&chair).unwrap();

    let mut british = session_in(&conn, "en_GB");
    assert_eq!(british.current_locale(), "en-gb");
    let loaded = load(&mut british, &id);
    assert_eq!(object::downcast_ref::<Product>(&loaded).unwrap().label.as_deref(), Some("Chair"));
}

#[test]
fn test_localized_map_round_trip() {
    let conn = MemoryConnection::new();
    let mut session = session_in(&conn, "en");

    let descriptions: BTreeMap<String, String> = [("en", "A chair"), ("fi", "Tuoli")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let chair = object::new_ref(Product {
        sku: "chair".to_string(),
        descriptions: descriptions.clone(),
        ..Product::default()
    });
    let id = session.save(&chair).unwrap();

    // Every locale is visible whatever the session locale
    let mut other = session_in(&conn, "de");
    let loaded = load(&mut other, &id);
    assert_eq!(object::downcast_ref::<Product>(&loaded).unwrap().descriptions, descriptions);
}
