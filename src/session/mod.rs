//! Object session
//!
//! A [`Session`] is the unit of work between native objects and a statement
//! store:
//! - binding: `get` turns a subject's statements into an object graph
//! - serialization: `save` turns an object graph into pending statement changes
//! - identity: every graph identity maps to one object per concrete class
//! - change tracking: pending additions and removals reach the store on flush
//!
//! A session is single-threaded. Use one session per thread, each with its own
//! connection; [`Configuration`] is shared between them.
//!
//! # Example
//!
//! ```rust
//! use rdfbind::connection::MemoryConnection;
//! use rdfbind::mapping::{Accessor, Configuration, IdKind, MappedClass, MappedProperty, ValueType};
//! use rdfbind::object::{self, ClassId, Value};
//! use rdfbind::rdf::{Id, NamedNode};
//! use rdfbind::session::{Session, SessionConfig};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Person {
//!     id: Option<Id>,
//!     name: String,
//! }
//!
//! let foaf = |ln: &str| NamedNode::from_parts("http://xmlns.com/foaf/0.1/", ln).unwrap();
//! let config = Configuration::builder()
//!     .add_class(
//!         MappedClass::new::<Person>()
//!             .with_type(foaf("Person"))
//!             .with_factory(Person::default)
//!             .with_id(
//!                 IdKind::Uri,
//!                 Accessor::new(
//!                     |p: &Person| Value::from(p.id.clone()),
//!                     |p: &mut Person, v| p.id = v.into_node().and_then(|n| n.as_id()),
//!                 ),
//!             )
//!             .with_uri_template(|p: &Person| Some(format!("http://example.org/{}", p.name.to_lowercase())))
//!             .with_property(MappedProperty::new(
//!                 "name",
//!                 foaf("name"),
//!                 ValueType::String,
//!                 Accessor::new(
//!                     |p: &Person| Value::from(p.name.clone()),
//!                     |p: &mut Person, v| p.name = v.into_string().unwrap_or_default(),
//!                 ),
//!             )),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut session = Session::new(MemoryConnection::new(), Arc::new(config), SessionConfig::default());
//! let alice = object::new_ref(Person { id: None, name: "Alice".into() });
//! let id = session.save(&alice).unwrap();
//! session.clear();
//!
//! let loaded = session.get(ClassId::of::<Person>(), &id).unwrap().unwrap();
//! let loaded = object::downcast_ref::<Person>(&loaded).unwrap();
//! assert_eq!(loaded.name, "Alice");
//! assert_eq!(loaded.id, Some(id));
//! ```

mod binder;
mod cache;
mod changes;
mod codec;
mod config;
mod convert;
mod error;
mod identity;
mod locale;
mod projection;
mod resolver;
mod serializer;

pub use changes::ChangeSet;
pub use config::{FlushMode, SessionConfig};
pub use error::{
    CardinalityError, ConversionError, DefaultErrorPolicy, ErrorPolicy, FunctionalValueError,
    InstantiationError, SessionError, SessionResult, StrictErrorPolicy, TypeMismatchError,
};
pub use identity::{IdentityService, LocalId, MemoryIdentityService};

use crate::connection::{Connection, ConnectionError, TransactionOptions};
use crate::mapping::{Accessor, Configuration};
use crate::object::{ClassId, Entity, ObjectRef, Value};
use crate::rdf::vocab::rdf;
use crate::rdf::{Id, NamedNode, Node, Statement};
use cache::IdentityCache;
use codec::{Overlay, StatementSource};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info};

/// Source of objects for injection properties
///
/// Registered on a session with [`Session::add_parent`]; subjects whose URI
/// starts with the registered namespace are bound by the parent instead.
pub trait ObjectRepository {
    fn get_object(&mut self, class: ClassId, uri: &NamedNode) -> SessionResult<Option<ObjectRef>>;
}

/// Unit of work over a [`Connection`]
pub struct Session<C: Connection> {
    connection: C,
    /// Class mappings, shared between sessions
    configuration: Arc<Configuration>,
    config: SessionConfig,
    cache: IdentityCache,
    changes: ChangeSet,
    identities: Box<dyn IdentityService>,
    error_policy: Box<dyn ErrorPolicy>,
    /// Namespace → repository for injection properties
    parents: Vec<(String, Rc<RefCell<dyn ObjectRepository>>)>,
    transaction_active: bool,
    closed: bool,
}

impl<C: Connection> Session<C> {
    pub fn new(connection: C, configuration: Arc<Configuration>, config: SessionConfig) -> Self {
        info!(
            "Opening session (flush mode {:?}, locales {:?})",
            config.flush_mode, config.locales
        );
        Self {
            connection,
            configuration,
            config,
            cache: IdentityCache::new(),
            changes: ChangeSet::new(),
            identities: Box::new(MemoryIdentityService::new()),
            error_policy: Box::new(DefaultErrorPolicy),
            parents: Vec::new(),
            transaction_active: false,
            closed: false,
        }
    }

    pub fn with_error_policy(mut self, policy: impl ErrorPolicy + 'static) -> Self {
        self.error_policy = Box::new(policy);
        self
    }

    pub fn with_identity_service(mut self, service: impl IdentityService + 'static) -> Self {
        self.identities = Box::new(service);
        self
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn flush_mode(&self) -> FlushMode {
        self.config.flush_mode
    }

    pub fn set_flush_mode(&mut self, flush_mode: FlushMode) {
        self.config.flush_mode = flush_mode;
    }

    /// Locale localized text is written in; empty for the root locale
    pub fn current_locale(&self) -> &str {
        self.config.current_locale()
    }

    pub fn set_locales<I, S>(&mut self, locales: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = std::mem::take(&mut self.config).with_locales(locales);
    }

    /// Delegate injection properties under `namespace` to `repository`
    pub fn add_parent(
        &mut self,
        namespace: impl Into<String>,
        repository: Rc<RefCell<dyn ObjectRepository>>,
    ) {
        self.parents.push((namespace.into(), repository));
    }

    // ---- Reading ----

    /// Object of `class` bound to `id`, or `None` when the store knows nothing
    /// about the subject
    pub fn get(&mut self, class: ClassId, id: &Id) -> SessionResult<Option<ObjectRef>> {
        self.check_open()?;
        if let Some(cached) = self.cache.resolve(id, Some(class), &self.configuration) {
            return Ok(Some(cached));
        }
        let exists = self.connection.exists(
            Some(id),
            None,
            None,
            None,
            self.config.include_inferred,
        )?;
        if !exists {
            debug!("No statements about {}", id);
            return Ok(None);
        }
        self.bind_object(id, Some(class))
    }

    /// Batch `get`; the result keeps the order of `ids`
    pub fn get_all(&mut self, class: ClassId, ids: &[Id]) -> SessionResult<Vec<Option<ObjectRef>>> {
        ids.iter().map(|id| self.get(class, id)).collect()
    }

    pub fn get_by_local_id(
        &mut self,
        class: ClassId,
        local_id: LocalId,
    ) -> SessionResult<Option<ObjectRef>> {
        match self.identities.id(local_id) {
            Some(id) => self.get(class, &id),
            None => Ok(None),
        }
    }

    /// Every stored instance of `class` and its mapped subtypes
    pub fn find_instances(&mut self, class: ClassId) -> SessionResult<Vec<ObjectRef>> {
        let config = Arc::clone(&self.configuration);
        let mut type_uris: Vec<NamedNode> = Vec::new();
        for candidate in std::iter::once(class).chain(config.subtypes(class)) {
            if let Some(type_uri) = config.get(candidate).and_then(|m| m.type_uri()) {
                if !type_uris.contains(type_uri) {
                    type_uris.push(type_uri.clone());
                }
            }
        }
        if type_uris.is_empty() {
            return Err(SessionError::UnmappedClass(format!(
                "{} has no type URI to search by",
                class
            )));
        }
        let context = config.get(class).and_then(|m| m.context()).cloned();

        let mut subjects: IndexSet<Id> = IndexSet::new();
        for type_uri in type_uris {
            subjects.extend(self.subjects_of_type(&type_uri, context.as_ref())?);
        }
        self.bind_all(class, subjects)
    }

    /// Stored subjects asserted as `type_uri`, bound as `class`
    pub fn find_instances_of_type(
        &mut self,
        class: ClassId,
        type_uri: &NamedNode,
    ) -> SessionResult<Vec<ObjectRef>> {
        let context = self
            .configuration
            .get(class)
            .and_then(|m| m.context())
            .cloned();
        let subjects = self.subjects_of_type(type_uri, context.as_ref())?;
        self.bind_all(class, subjects)
    }

    fn subjects_of_type(
        &self,
        type_uri: &NamedNode,
        context: Option<&NamedNode>,
    ) -> SessionResult<Vec<Id>> {
        self.check_open()?;
        let type_node = Node::from(type_uri.clone());
        let statements = self.connection.find_statements(
            None,
            Some(&rdf::type_()),
            Some(&type_node),
            context,
            self.config.include_inferred,
        )?;
        debug!("Found {} subjects of type {}", statements.len(), type_uri);
        Ok(statements.into_iter().map(|stmt| stmt.subject).collect())
    }

    fn bind_all(
        &mut self,
        class: ClassId,
        subjects: impl IntoIterator<Item = Id>,
    ) -> SessionResult<Vec<ObjectRef>> {
        let mut instances = Vec::new();
        let mut visited = FxHashSet::default();
        for subject in subjects {
            if !visited.insert(subject.clone()) {
                continue;
            }
            if let Some(instance) = self.get(class, &subject)? {
                instances.push(instance);
            }
        }
        Ok(instances)
    }

    // ---- Writing ----

    /// Record the statements of `object` and everything it references;
    /// returns its identity
    pub fn save(&mut self, object: &ObjectRef) -> SessionResult<Id> {
        self.check_open()?;
        let mut seen = FxHashSet::default();
        let id = self.to_rdf(object, None, &mut seen)?;
        self.auto_flush()?;
        Ok(id)
    }

    /// Save several objects sharing one cycle guard
    pub fn save_all(&mut self, objects: &[ObjectRef]) -> SessionResult<Vec<Id>> {
        self.check_open()?;
        let mut seen = FxHashSet::default();
        let ids = objects
            .iter()
            .map(|object| self.to_rdf(object, None, &mut seen))
            .collect::<SessionResult<Vec<_>>>()?;
        self.auto_flush()?;
        Ok(ids)
    }

    /// Remove the statements of `object` and the references to it
    pub fn delete(&mut self, object: &ObjectRef) -> SessionResult<()> {
        self.check_open()?;
        self.remove_object(object)?;
        self.auto_flush()
    }

    pub fn delete_all(&mut self, objects: &[ObjectRef]) -> SessionResult<()> {
        self.check_open()?;
        for object in objects {
            self.remove_object(object)?;
        }
        self.auto_flush()
    }

    /// Send pending changes to the connection
    pub fn flush(&mut self) -> SessionResult<()> {
        self.check_open()?;
        if self.changes.is_empty() {
            return Ok(());
        }
        debug!(
            "Flushing {} removals and {} additions",
            self.changes.removed().len(),
            self.changes.added().len()
        );
        self.connection
            .update(self.changes.removed(), self.changes.added())?;
        self.changes.clear();
        Ok(())
    }

    /// Forget cached objects and pending changes
    pub fn clear(&mut self) {
        debug!(
            "Clearing session: {} cached objects, {} pending additions, {} pending removals",
            self.cache.len(),
            self.changes.added().len(),
            self.changes.removed().len()
        );
        self.cache.clear();
        self.changes.clear();
    }

    pub fn pending_additions(&self) -> &IndexSet<Statement> {
        self.changes.added()
    }

    pub fn pending_removals(&self) -> &IndexSet<Statement> {
        self.changes.removed()
    }

    // ---- Identity ----

    /// Identity the object is bound to in this session
    pub fn identity_of(&self, object: &ObjectRef) -> Option<Id> {
        self.cache.identity_of(object).cloned()
    }

    pub fn local_id(&mut self, id: &Id) -> LocalId {
        self.identities.local_id(id)
    }

    // ---- Transactions ----

    pub fn begin_transaction(&mut self, options: TransactionOptions) -> SessionResult<()> {
        self.check_open()?;
        if self.transaction_active {
            return Err(ConnectionError::TransactionExists.into());
        }
        self.connection.begin_transaction(options)?;
        self.transaction_active = true;
        Ok(())
    }

    /// Flush (unless flushing is manual) and commit
    pub fn commit(&mut self) -> SessionResult<()> {
        self.check_open()?;
        if !self.transaction_active {
            return Err(ConnectionError::NoTransaction.into());
        }
        if self.config.flush_mode != FlushMode::Manual {
            self.flush()?;
        }
        self.connection.commit()?;
        self.transaction_active = false;
        Ok(())
    }

    /// Roll back the transaction; pending changes and cached objects are
    /// discarded since they may reflect rolled back state
    pub fn rollback(&mut self) -> SessionResult<()> {
        self.check_open()?;
        if !self.transaction_active {
            return Err(ConnectionError::NoTransaction.into());
        }
        self.changes.clear();
        self.cache.clear();
        self.connection.rollback()?;
        self.transaction_active = false;
        Ok(())
    }

    pub fn is_transaction_active(&self) -> bool {
        self.transaction_active
    }

    /// Close the session. Pending changes are discarded and an open
    /// transaction is rolled back.
    pub fn close(&mut self) -> SessionResult<()> {
        if self.closed {
            return Ok(());
        }
        if self.transaction_active {
            self.connection.rollback()?;
            self.transaction_active = false;
        }
        if !self.changes.is_empty() {
            info!(
                "Discarding {} pending changes on close",
                self.changes.added().len() + self.changes.removed().len()
            );
        }
        self.changes.clear();
        self.cache.clear();
        self.connection.close()?;
        self.closed = true;
        info!("Session closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ---- Internals shared by binder and serializer ----

    fn check_open(&self) -> SessionResult<()> {
        if self.closed {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn auto_flush(&mut self) -> SessionResult<()> {
        if self.config.flush_mode == FlushMode::Always {
            self.flush()?;
        }
        Ok(())
    }

    /// Connection statements overlaid with pending changes
    fn overlay(&self) -> Overlay<'_, C> {
        Overlay {
            connection: &self.connection,
            changes: &self.changes,
        }
    }

    fn overlay_find(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
    ) -> SessionResult<Vec<Statement>> {
        self.overlay().statements(subject, predicate, object, context)
    }

    fn record_add(&mut self, stmt: Statement) {
        self.changes.add(stmt);
    }

    /// Record a removal. A statement that is both stored and pending
    /// addition must still be removed from the store.
    fn record_remove(&mut self, stmt: Statement) -> SessionResult<()> {
        if self.changes.is_added(&stmt) {
            let stored = self
                .connection
                .find_statements(
                    Some(&stmt.subject),
                    Some(&stmt.predicate),
                    Some(&stmt.object),
                    stmt.context.as_ref(),
                    false,
                )?
                .contains(&stmt);
            if stored {
                self.changes.remove_stored(stmt);
                return Ok(());
            }
        }
        self.changes.remove(stmt);
        Ok(())
    }
}

impl<C: Connection> ObjectRepository for Session<C> {
    fn get_object(&mut self, class: ClassId, uri: &NamedNode) -> SessionResult<Option<ObjectRef>> {
        self.get(class, &uri.clone().into())
    }
}

impl<C: Connection> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("pending_additions", &self.changes.added().len())
            .field("pending_removals", &self.changes.removed().len())
            .field("transaction_active", &self.transaction_active)
            .field("closed", &self.closed)
            .finish()
    }
}

/// Read a property through its accessor
fn read_value(object: &ObjectRef, accessor: &Accessor) -> Value {
    let guard = object.borrow();
    let entity: &dyn Entity = &*guard;
    accessor.get(entity.as_any())
}

/// Write a property through its accessor; read-only accessors ignore the value
fn write_value(object: &ObjectRef, accessor: &Accessor, value: Value) {
    let mut guard = object.borrow_mut();
    let entity: &mut dyn Entity = &mut *guard;
    accessor.set(entity.as_any_mut(), value);
}
