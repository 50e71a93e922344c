//! In-memory connection
//!
//! Several connections can share one [`MemoryStore`]. A transaction buffers its
//! updates and makes them visible to other connections on commit; the
//! transaction's own lookups already see them.

use super::{Connection, ConnectionError, ConnectionResult, TransactionOptions};
use crate::rdf::{BlankNode, Id, MemoryStore, NamedNode, Node, Statement, StatementPattern};
use indexmap::IndexSet;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct PendingTransaction {
    options: TransactionOptions,
    removed: IndexSet<Statement>,
    added: IndexSet<Statement>,
}

/// Connection over a shared in-memory store
///
/// `include_inferred` is accepted but no inference is performed.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    store: Arc<RwLock<MemoryStore>>,
    transaction: Option<PendingTransaction>,
    closed: bool,
}

impl MemoryConnection {
    /// Connection over a fresh, empty store
    pub fn new() -> Self {
        Self::with_store(Arc::new(RwLock::new(MemoryStore::new())))
    }

    /// Connection over an existing shared store
    pub fn with_store(store: Arc<RwLock<MemoryStore>>) -> Self {
        Self {
            store,
            transaction: None,
            closed: false,
        }
    }

    /// Handle to the underlying store
    pub fn store(&self) -> Arc<RwLock<MemoryStore>> {
        Arc::clone(&self.store)
    }

    /// New connection sharing this connection's store, without its transaction
    pub fn reconnect(&self) -> Self {
        Self::with_store(self.store())
    }

    /// Number of committed statements
    pub fn len(&self) -> ConnectionResult<usize> {
        Ok(self.store.read().map_err(|_| ConnectionError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> ConnectionResult<bool> {
        Ok(self.len()? == 0)
    }

    fn check_open(&self) -> ConnectionResult<()> {
        if self.closed {
            Err(ConnectionError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MemoryConnection {
    fn find_statements(
        &self,
        subject: Option<&Id>,
        predicate: Option<&NamedNode>,
        object: Option<&Node>,
        context: Option<&NamedNode>,
        _include_inferred: bool,
    ) -> ConnectionResult<Vec<Statement>> {
        self.check_open()?;
        let pattern = StatementPattern::new(subject, predicate, object, context);
        let mut results = self
            .store
            .read()
            .map_err(|_| ConnectionError::Poisoned)?
            .query(&pattern);

        if let Some(tx) = &self.transaction {
            results.retain(|stmt| !tx.removed.contains(stmt));
            results.extend(
                tx.added
                    .iter()
                    .filter(|stmt| pattern.matches(stmt))
                    .cloned(),
            );
        }
        Ok(results)
    }

    fn update(
        &mut self,
        removed: &IndexSet<Statement>,
        added: &IndexSet<Statement>,
    ) -> ConnectionResult<()> {
        self.check_open()?;
        match &mut self.transaction {
            Some(tx) => {
                if tx.options.read_only {
                    return Err(ConnectionError::ReadOnly);
                }
                for stmt in removed {
                    if !tx.added.shift_remove(stmt) {
                        tx.removed.insert(stmt.clone());
                    }
                }
                for stmt in added {
                    if !tx.removed.shift_remove(stmt) {
                        tx.added.insert(stmt.clone());
                    }
                }
                Ok(())
            }
            None => {
                let (r, a) = self
                    .store
                    .write()
                    .map_err(|_| ConnectionError::Poisoned)?
                    .apply(removed, added);
                debug!("Applied update: {} removed, {} added", r, a);
                Ok(())
            }
        }
    }

    fn create_blank_node(&mut self) -> BlankNode {
        BlankNode::new()
    }

    fn begin_transaction(&mut self, options: TransactionOptions) -> ConnectionResult<()> {
        self.check_open()?;
        if self.transaction.is_some() {
            return Err(ConnectionError::TransactionExists);
        }
        debug!("Beginning transaction {:?}", options);
        self.transaction = Some(PendingTransaction {
            options,
            removed: IndexSet::new(),
            added: IndexSet::new(),
        });
        Ok(())
    }

    fn commit(&mut self) -> ConnectionResult<()> {
        self.check_open()?;
        let tx = self.transaction.take().ok_or(ConnectionError::NoTransaction)?;
        let (r, a) = self
            .store
            .write()
            .map_err(|_| ConnectionError::Poisoned)?
            .apply(&tx.removed, &tx.added);
        debug!("Committed transaction: {} removed, {} added", r, a);
        Ok(())
    }

    fn rollback(&mut self) -> ConnectionResult<()> {
        self.check_open()?;
        if self.transaction.take().is_none() {
            return Err(ConnectionError::NoTransaction);
        }
        debug!("Rolled back transaction");
        Ok(())
    }

    fn close(&mut self) -> ConnectionResult<()> {
        self.transaction = None;
        self.closed = true;
        Ok(())
    }
}
