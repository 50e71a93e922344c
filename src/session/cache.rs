//! Identity cache
//!
//! Maps graph identities to the objects bound to them and objects back to their
//! identity. An identity can hold several objects when it was requested as
//! unrelated types, but never two objects of the same concrete class.

use crate::mapping::Configuration;
use crate::object::{self, ClassId, ObjectRef};
use crate::rdf::Id;
use rustc_hash::FxHashMap;
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct IdentityCache {
    instances: HashMap<Id, Vec<ObjectRef>>,
    /// Object address → identity
    identities: FxHashMap<usize, Id>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// First object bound to `id` that is assignable to `required`
    pub fn resolve(
        &self,
        id: &Id,
        required: Option<ClassId>,
        config: &Configuration,
    ) -> Option<ObjectRef> {
        self.instances.get(id).and_then(|objects| {
            objects
                .iter()
                .find(|o| match required {
                    Some(class) => config.is_assignable(object::class_of(o), class),
                    None => true,
                })
                .cloned()
        })
    }

    /// Bind an object to an identity. A previously bound object of the same
    /// concrete class is released.
    pub fn register(&mut self, id: Id, instance: ObjectRef) {
        let address = object::address(&instance);
        if self.identities.get(&address) == Some(&id) {
            return;
        }
        if let Some(previous) = self.identities.remove(&address) {
            self.detach(&previous, address);
        }

        let class = object::class_of(&instance);
        let objects = self.instances.entry(id.clone()).or_default();
        if let Some(pos) = objects.iter().position(|o| object::class_of(o) == class) {
            let replaced = objects.remove(pos);
            self.identities.remove(&object::address(&replaced));
        }
        objects.push(instance);
        self.identities.insert(address, id);
    }

    pub fn identity_of(&self, instance: &ObjectRef) -> Option<&Id> {
        self.identities.get(&object::address(instance))
    }

    /// Forget every object bound to `id`
    pub fn evict(&mut self, id: &Id) -> Vec<ObjectRef> {
        let objects = self.instances.remove(id).unwrap_or_default();
        for o in &objects {
            self.identities.remove(&object::address(o));
        }
        objects
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.identities.clear();
    }

    fn detach(&mut self, id: &Id, address: usize) {
        if let Some(objects) = self.instances.get_mut(id) {
            objects.retain(|o| object::address(o) != address);
            if objects.is_empty() {
                self.instances.remove(id);
            }
        }
    }
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("identities", &self.instances.len())
            .field("objects", &self.identities.len())
            .finish()
    }
}
