//! rdfbind
//!
//! Binds native Rust objects to RDF statements and back through a session
//! that tracks identities and pending changes.
//!
//! # Architecture
//!
//! - [`rdf`]: graph terms, statements, vocabulary, namespaces, in-memory quad store
//! - [`connection`]: statement store contract plus an in-memory connection
//! - [`mapping`]: how native types map to type URIs, predicates and structures
//! - [`object`]: shared object handles and dynamic property values
//! - [`session`]: binder, serializer, identity cache and change tracking
//!
//! A [`session::Session`] reads subjects into object graphs with `get`, records
//! the statements of changed objects with `save` and `delete`, and pushes them
//! to its [`connection::Connection`] on `flush`. Mappings live in a
//! [`mapping::Configuration`] built once and shared between sessions.

pub mod connection;
pub mod mapping;
pub mod object;
pub mod rdf;
pub mod session;

pub use connection::{Connection, ConnectionError, MemoryConnection};
pub use mapping::{Configuration, MappedClass, MappedProperty, MappingError};
pub use object::{ClassId, ObjectRef, Value};
pub use session::{FlushMode, Session, SessionConfig, SessionError, SessionResult};
