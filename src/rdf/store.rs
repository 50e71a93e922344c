//! In-memory quad store
//!
//! Insertion-ordered statement storage with subject and object indices. Backs the
//! in-memory connection.

use super::types::{Id, Node, Statement, StatementPattern};
use indexmap::IndexSet;
use std::collections::HashMap;
use thiserror::Error;

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Statement not found
    #[error("Statement not found: {0}")]
    StatementNotFound(String),

    /// Duplicate statement
    #[error("Duplicate statement: {0}")]
    DuplicateStatement(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Quad store with subject and object indices
///
/// Lookups with a fixed subject or object only scan the statements sharing that
/// term. Results come back in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// All statements (primary storage)
    statements: IndexSet<Statement>,

    /// Subject index
    by_subject: HashMap<Id, IndexSet<Statement>>,

    /// Object index
    by_object: HashMap<Node, IndexSet<Statement>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a statement into the store
    pub fn insert(&mut self, stmt: Statement) -> StoreResult<()> {
        if self.statements.contains(&stmt) {
            return Err(StoreError::DuplicateStatement(stmt.to_string()));
        }
        self.update_indices_insert(&stmt);
        self.statements.insert(stmt);
        Ok(())
    }

    /// Remove a statement from the store
    pub fn remove(&mut self, stmt: &Statement) -> StoreResult<()> {
        if !self.statements.shift_remove(stmt) {
            return Err(StoreError::StatementNotFound(stmt.to_string()));
        }
        self.update_indices_remove(stmt);
        Ok(())
    }

    /// Apply a change set: removals first, then additions. Missing removals and
    /// duplicate additions are ignored. Returns (removed, added) counts.
    pub fn apply<'a>(
        &mut self,
        removed: impl IntoIterator<Item = &'a Statement>,
        added: impl IntoIterator<Item = &'a Statement>,
    ) -> (usize, usize) {
        let removed = removed
            .into_iter()
            .filter(|stmt| self.remove(stmt).is_ok())
            .count();
        let added = added
            .into_iter()
            .filter(|stmt| self.insert((*stmt).clone()).is_ok())
            .count();
        (removed, added)
    }

    /// Check if a statement exists in the store
    pub fn contains(&self, stmt: &Statement) -> bool {
        self.statements.contains(stmt)
    }

    /// Get the total number of statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Clear all statements
    pub fn clear(&mut self) {
        self.statements.clear();
        self.by_subject.clear();
        self.by_object.clear();
    }

    /// Query statements matching a pattern
    pub fn query(&self, pattern: &StatementPattern) -> Vec<Statement> {
        let candidates: Box<dyn Iterator<Item = &Statement>> =
            match (&pattern.subject, &pattern.object) {
                (Some(subject), _) => match self.by_subject.get(subject) {
                    Some(stmts) => Box::new(stmts.iter()),
                    None => return Vec::new(),
                },
                (None, Some(object)) => match self.by_object.get(object) {
                    Some(stmts) => Box::new(stmts.iter()),
                    None => return Vec::new(),
                },
                (None, None) => Box::new(self.statements.iter()),
            };
        candidates
            .filter(|stmt| pattern.matches(stmt))
            .cloned()
            .collect()
    }

    /// Whether any statement matches the pattern
    pub fn matches_any(&self, pattern: &StatementPattern) -> bool {
        match &pattern.subject {
            Some(subject) => self
                .by_subject
                .get(subject)
                .map(|stmts| stmts.iter().any(|s| pattern.matches(s)))
                .unwrap_or(false),
            None => self.statements.iter().any(|s| pattern.matches(s)),
        }
    }

    /// Get an iterator over all statements
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Get all subjects in the store
    pub fn subjects(&self) -> Vec<Id> {
        self.by_subject.keys().cloned().collect()
    }

    /// Named graphs present in the store
    pub fn contexts(&self) -> Vec<String> {
        self.statements
            .iter()
            .filter_map(|s| s.context.as_ref().map(|c| c.as_str().to_string()))
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    fn update_indices_insert(&mut self, stmt: &Statement) {
        self.by_subject
            .entry(stmt.subject.clone())
            .or_default()
            .insert(stmt.clone());
        self.by_object
            .entry(stmt.object.clone())
            .or_default()
            .insert(stmt.clone());
    }

    fn update_indices_remove(&mut self, stmt: &Statement) {
        if let Some(stmts) = self.by_subject.get_mut(&stmt.subject) {
            stmts.shift_remove(stmt);
            if stmts.is_empty() {
                self.by_subject.remove(&stmt.subject);
            }
        }
        if let Some(stmts) = self.by_object.get_mut(&stmt.object) {
            stmts.shift_remove(stmt);
            if stmts.is_empty() {
                self.by_object.remove(&stmt.object);
            }
        }
    }
}
