//! Session errors and the error policy
//!
//! Recoverable binding problems are not raised directly. They are handed to an
//! [`ErrorPolicy`], which either tolerates them (the session substitutes a
//! value or skips the property) or turns them into a fatal [`SessionError`].

use crate::connection::ConnectionError;
use crate::mapping::{MappingError, ValueType};
use crate::object::ClassId;
use crate::rdf::{Id, NamedNode, Node, RdfError};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Node cannot become a value of the target type, or the reverse
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    pub node: Option<Node>,
    pub target: ValueType,
    pub property: String,
    pub reason: String,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(
                f,
                "cannot convert {} to {} for property {}: {}",
                node, self.target, self.property, self.reason
            ),
            None => write!(
                f,
                "cannot convert value of property {} to {}: {}",
                self.property, self.target, self.reason
            ),
        }
    }
}

/// Asserted types yield no compatible class, or several unrelated ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatchError {
    pub subject: Id,
    pub types: Vec<NamedNode>,
    pub required: Option<ClassId>,
    pub candidates: Vec<ClassId>,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let required = self
            .required
            .map(|c| c.to_string())
            .unwrap_or_else(|| "any class".to_string());
        let types: Vec<String> = self.types.iter().map(|t| t.to_string()).collect();
        if self.candidates.len() > 1 {
            let candidates: Vec<String> = self.candidates.iter().map(|c| c.to_string()).collect();
            write!(
                f,
                "ambiguous type for {} as {}: [{}] all match types [{}]",
                self.subject,
                required,
                candidates.join(", "),
                types.join(", ")
            )
        } else {
            write!(
                f,
                "no class for {} assignable to {} among types [{}]",
                self.subject,
                required,
                types.join(", ")
            )
        }
    }
}

/// Instance creation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiationError {
    pub subject: Id,
    pub class: ClassId,
    pub reason: String,
}

impl fmt::Display for InstantiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot create {} for {}: {}",
            self.class, self.subject, self.reason
        )
    }
}

/// More values than a single-valued property holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardinalityError {
    pub subject: Id,
    pub property: String,
    pub count: usize,
}

impl fmt::Display for CardinalityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property {} of {} is single-valued but found {} values",
            self.property, self.subject, self.count
        )
    }
}

/// Several statements for a functional predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalValueError {
    pub subject: Id,
    pub predicate: NamedNode,
    pub context: Option<NamedNode>,
    pub count: usize,
}

impl fmt::Display for FunctionalValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found {} values for functional predicate {} of {}",
            self.count, self.predicate, self.subject
        )?;
        if let Some(context) = &self.context {
            write!(f, " in {}", context)?;
        }
        Ok(())
    }
}

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("RDF error: {0}")]
    Rdf(#[from] RdfError),

    #[error("Conversion error: {0}")]
    Conversion(ConversionError),

    #[error("Type mismatch: {0}")]
    TypeMismatch(TypeMismatchError),

    #[error("Instantiation error: {0}")]
    Instantiation(InstantiationError),

    #[error("Cardinality error: {0}")]
    Cardinality(CardinalityError),

    #[error("Functional value error: {0}")]
    FunctionalValue(FunctionalValueError),

    /// Class without mapping
    #[error("Unmapped class: {0}")]
    UnmappedClass(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session is closed")]
    Closed,
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Decides how recoverable binding errors are handled
///
/// Returning `Ok(())` tolerates the error:
/// - conversion: the value (or property) is skipped
/// - type mismatch and instantiation: no instance is bound
/// - cardinality and functional value: the first value is used
///
/// Returning `Err` aborts the enclosing `get`/`save` call.
pub trait ErrorPolicy {
    fn conversion_error(&self, error: ConversionError) -> SessionResult<()>;

    fn type_mismatch_error(&self, error: TypeMismatchError) -> SessionResult<()>;

    fn instantiation_error(&self, error: InstantiationError) -> SessionResult<()>;

    fn cardinality_error(&self, error: CardinalityError) -> SessionResult<()>;

    fn functional_value_error(&self, error: FunctionalValueError) -> SessionResult<()>;
}

/// Skips unconvertible values and picks the first of several values; type
/// mismatches and instantiation failures are fatal
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorPolicy;

impl ErrorPolicy for DefaultErrorPolicy {
    fn conversion_error(&self, err: ConversionError) -> SessionResult<()> {
        error!("{}", err);
        Ok(())
    }

    fn type_mismatch_error(&self, err: TypeMismatchError) -> SessionResult<()> {
        Err(SessionError::TypeMismatch(err))
    }

    fn instantiation_error(&self, err: InstantiationError) -> SessionResult<()> {
        Err(SessionError::Instantiation(err))
    }

    fn cardinality_error(&self, err: CardinalityError) -> SessionResult<()> {
        warn!("{}", err);
        Ok(())
    }

    fn functional_value_error(&self, err: FunctionalValueError) -> SessionResult<()> {
        warn!("{}", err);
        Ok(())
    }
}

/// Every error is fatal
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictErrorPolicy;

impl ErrorPolicy for StrictErrorPolicy {
    fn conversion_error(&self, err: ConversionError) -> SessionResult<()> {
        Err(SessionError::Conversion(err))
    }

    fn type_mismatch_error(&self, err: TypeMismatchError) -> SessionResult<()> {
        Err(SessionError::TypeMismatch(err))
    }

    fn instantiation_error(&self, err: InstantiationError) -> SessionResult<()> {
        Err(SessionError::Instantiation(err))
    }

    fn cardinality_error(&self, err: CardinalityError) -> SessionResult<()> {
        Err(SessionError::Cardinality(err))
    }

    fn functional_value_error(&self, err: FunctionalValueError) -> SessionResult<()> {
        Err(SessionError::FunctionalValue(err))
    }
}
