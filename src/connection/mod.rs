//! Statement store connection contract
//!
//! The session never talks to a store directly; it lists and matches statements
//! and commits change sets through a [`Connection`]. [`MemoryConnection`] is the
//! in-memory implementation used by tests and embedded setups.

mod memory;

pub use memory::MemoryConnection;

use crate::rdf::{BlankNode, Id, NamedNode, Node, Statement};
use indexmap::IndexSet;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Connection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// A transaction is already running on this connection
    #[error("Transaction exists already")]
    TransactionExists,

    /// Commit or rollback without a running transaction
    #[error("No active transaction")]
    NoTransaction,

    /// Write attempted inside a read-only transaction
    #[error("Transaction is read-only")]
    ReadOnly,

    /// Connection was closed
    #[error("Connection is closed")]
    Closed,

    /// Store lock poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,

    /// Backend specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Options for [`Connection::begin_transaction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionOptions {
    /// Reject writes while the transaction runs
    pub read_only: bool,
    /// Backend-enforced timeout, if any
    pub timeout: Option<Duration>,
    /// Isolation level requested from the backend
    pub isolation: IsolationLevel,
}

/// Access to a statement store
///
/// `None` arguments of the lookup methods are wildcards; a `None` context
/// matches statements in every context.
pub trait Connection {
    /// List statements matching the given pattern
    fn find_statements(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
        include_inferred: bool,
    ) -> ConnectionResult<Vec<Statement>>;

    /// Statements of `subject` whose predicate is one of `predicates`
    fn find_statements_with_predicates(
        &self,
        subject: &Id,
        predicates: &HashSet<NamedNode>,
        context: Option<&NamedNode>,
        include_inferred: bool,
    ) -> ConnectionResult<Vec<Statement>> {
        Ok(self
            .find_statements(Some(subject), None, None, context, include_inferred)?
            .into_iter()
            .filter(|stmt| predicates.contains(&stmt.predicate))
            .collect())
    }

    /// Whether any statement matches the given pattern
    fn exists(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
        include_inferred: bool,
    ) -> ConnectionResult<bool> {
        Ok(!self
            .find_statements(subject, predicate, object, context, include_inferred)?
            .is_empty())
    }

    /// Remove then add the given statements
    fn update(
        &mut self,
        removed: &IndexSet<Statement>,
        added: &IndexSet<Statement>,
    ) -> ConnectionResult<()>;

    /// Fresh blank node scoped to this store
    fn create_blank_node(&mut self) -> BlankNode;

    fn begin_transaction(&mut self, options: TransactionOptions) -> ConnectionResult<()>;

    fn commit(&mut self) -> ConnectionResult<()>;

    fn rollback(&mut self) -> ConnectionResult<()>;

    fn close(&mut self) -> ConnectionResult<()> {
        Ok(())
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn find_statements(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
        include_inferred: bool,
    ) -> ConnectionResult<Vec<Statement>> {
        (**self).find_statements(subject, predicate, object, context, include_inferred)
    }

    fn find_statements_with_predicates(
        &self,
        subject: &Id,
        predicates: &HashSet<NamedNode>,
        context: Option<&NamedNode>,
        include_inferred: bool,
    ) -> ConnectionResult<Vec<Statement>> {
        (**self).find_statements_with_predicates(subject, predicates, context, include_inferred)
    }

    fn exists(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
        include_inferred: bool,
    ) -> ConnectionResult<bool> {
        (**self).exists(subject, predicate, object, context, include_inferred)
    }

    fn update(
        &mut self,
        removed: &IndexSet<Statement>,
        added: &IndexSet<Statement>,
    ) -> ConnectionResult<()> {
        (**self).update(removed, added)
    }

    fn create_blank_node(&mut self) -> BlankNode {
        (**self).create_blank_node()
    }

    fn begin_transaction(&mut self, options: TransactionOptions) -> ConnectionResult<()> {
        (**self).begin_transaction(options)
    }

    fn commit(&mut self) -> ConnectionResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> ConnectionResult<()> {
        (**self).rollback()
    }

    fn close(&mut self) -> ConnectionResult<()> {
        (**self).close()
    }
}
