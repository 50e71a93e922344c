//! Type resolution from asserted types

use super::error::TypeMismatchError;
use crate::mapping::Configuration;
use crate::object::ClassId;
use crate::rdf::{Id, NamedNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Resolved(ClassId),
    /// None of the asserted types is mapped
    Absent,
    Mismatch(TypeMismatchError),
}

/// Pick the most specific concrete class for `subject`
///
/// `required` of `None` accepts any mapped class. Non-polymorphic classes
/// resolve to themselves without looking at the asserted types.
pub(crate) fn resolve(
    config: &Configuration,
    subject: &Id,
    required: Option<ClassId>,
    asserted: &[NamedNode],
) -> Resolution {
    if let Some(class) = required {
        if !config.is_polymorphic(class) {
            return Resolution::Resolved(class);
        }
    }

    let mapped: Vec<NamedNode> = asserted
        .iter()
        .filter(|t| !config.classes_for_type(t).is_empty())
        .cloned()
        .collect();
    if mapped.is_empty() {
        return Resolution::Absent;
    }

    let mut candidates: Vec<ClassId> = Vec::new();
    for type_uri in &mapped {
        for class in config.classes_for_type(type_uri) {
            let concrete = config.get(*class).map(|c| !c.is_abstract()).unwrap_or(false);
            let assignable = required
                .map(|r| config.is_assignable(*class, r))
                .unwrap_or(true);
            if concrete && assignable && !candidates.contains(class) {
                candidates.push(*class);
            }
        }
    }

    let most_specific: Vec<ClassId> = candidates
        .iter()
        .copied()
        .filter(|c| {
            !candidates
                .iter()
                .any(|other| other != c && config.is_assignable(*other, *c))
        })
        .collect();

    match most_specific.as_slice() {
        [class] => Resolution::Resolved(*class),
        _ => Resolution::Mismatch(TypeMismatchError {
            subject: subject.clone(),
            types: mapped,
            required,
            candidates: most_specific,
        }),
    }
}
