//! Mapping metadata
//!
//! Describes how native types correspond to graph statements:
//! - [`MappedClass`]: type URI, context, supertypes, identity, constructor
//! - [`MappedProperty`]: predicate path, value type, structural kind, accessors
//! - [`ConverterRegistry`]: scalar types ⇄ XSD datatypes
//! - [`Configuration`]: the immutable set of mappings a session works against

mod class;
mod configuration;
mod property;
mod registry;
mod value;

pub use class::{IdKind, IdProperty, MappedClass, MappedConstructor};
pub use configuration::{Configuration, ConfigurationBuilder};
pub use property::{
    Accessor, ContainerType, MappedPath, MappedPredicate, MappedProperty, PropertyKind,
};
pub use registry::{ConverterRegistry, LexicalCodec};
pub use value::{EnumType, ValueType};

use thiserror::Error;

/// Mapping errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Class registered twice
    #[error("Duplicate class mapping: {0}")]
    DuplicateClass(String),

    /// Reference to a class without mapping
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// Constructor argument naming no property
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Property without predicate path
    #[error("Missing predicate path: {0}")]
    MissingPath(String),

    /// Invalid base IRI
    #[error("Invalid base IRI: {0}")]
    InvalidBaseIri(String),

    /// URI template produced an invalid URI
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

pub type MappingResult<T> = Result<T, MappingError>;
