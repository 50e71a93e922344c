//! Locale fallback for localized text

use crate::rdf::{Literal, RdfResult};
use std::collections::BTreeMap;

/// Tags to try for a locale: the full tag, each shorter prefix, then the root
/// locale
pub(crate) fn fallbacks(locale: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut current = locale;
    while !current.is_empty() {
        tags.push(current.to_string());
        current = match current.rfind('-') {
            Some(pos) => &current[..pos],
            None => "",
        };
    }
    tags.push(String::new());
    tags
}

/// Text for the first preferred locale that has a match
pub(crate) fn resolve<'a>(
    texts: &'a BTreeMap<String, String>,
    locales: &[String],
) -> Option<&'a String> {
    if locales.is_empty() {
        return texts.get("");
    }
    locales
        .iter()
        .flat_map(|locale| fallbacks(locale))
        .find_map(|tag| texts.get(&tag))
}

/// Language of a literal; plain literals belong to the root locale
pub(crate) fn language_of(literal: &Literal) -> &str {
    literal.language().unwrap_or("")
}

/// Literal for text in a locale
pub(crate) fn literal(text: &str, locale: &str) -> RdfResult<Literal> {
    if locale.is_empty() {
        Ok(Literal::new_simple_literal(text))
    } else {
        Literal::new_language_tagged_literal(text, locale.to_ascii_lowercase())
    }
}
