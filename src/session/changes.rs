//! Pending statement changes
//!
//! A statement is never pending in both directions: recording the opposite
//! change cancels the pending one.

use crate::rdf::Statement;
use indexmap::IndexSet;

#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    added: IndexSet<Statement>,
    removed: IndexSet<Statement>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an addition, or cancel a pending removal of the same statement
    pub fn add(&mut self, stmt: Statement) {
        if !self.removed.shift_remove(&stmt) {
            self.added.insert(stmt);
        }
    }

    /// Record a removal, or cancel a pending addition of the same statement
    pub fn remove(&mut self, stmt: Statement) {
        if !self.added.shift_remove(&stmt) {
            self.removed.insert(stmt);
        }
    }

    /// Record a removal of a stored statement, dropping any pending addition
    pub(crate) fn remove_stored(&mut self, stmt: Statement) {
        self.added.shift_remove(&stmt);
        self.removed.insert(stmt);
    }

    pub fn is_added(&self, stmt: &Statement) -> bool {
        self.added.contains(stmt)
    }

    pub fn is_removed(&self, stmt: &Statement) -> bool {
        self.removed.contains(stmt)
    }

    pub fn added(&self) -> &IndexSet<Statement> {
        &self.added
    }

    pub fn removed(&self) -> &IndexSet<Statement> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
    }
}
