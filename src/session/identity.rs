//! Session-local identifiers
//!
//! A [`LocalId`] is a short, stable handle for a graph identity, handy where
//! URIs or blank node ids are awkward (form fields, cache keys).

use crate::rdf::Id;
use bimap::BiMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Local identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(u64);

impl LocalId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(LocalId)
    }
}

/// Two-way mapping between local identifiers and graph identities
pub trait IdentityService {
    /// Local id of a graph identity, assigned on first use
    fn local_id(&mut self, id: &Id) -> LocalId;

    /// Graph identity of a local id
    fn id(&self, local_id: LocalId) -> Option<Id>;
}

/// In-memory identity service
#[derive(Debug, Default)]
pub struct MemoryIdentityService {
    ids: BiMap<LocalId, Id>,
    next: u64,
}

impl MemoryIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl IdentityService for MemoryIdentityService {
    fn local_id(&mut self, id: &Id) -> LocalId {
        if let Some(local_id) = self.ids.get_by_right(id) {
            return *local_id;
        }
        self.next += 1;
        let local_id = LocalId(self.next);
        self.ids.insert(local_id, id.clone());
        debug!("Assigned local id {} to {}", local_id, id);
        local_id
    }

    fn id(&self, local_id: LocalId) -> Option<Id> {
        self.ids.get_by_left(&local_id).cloned()
    }
}
