//! Vocabulary terms used by the binder
//!
//! RDF collection/container terms and the XSD datatypes known to the default
//! converter registry.

use super::types::NamedNode;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";

pub mod rdf {
    use super::*;

    pub fn type_() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")
    }

    pub fn first() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#first")
    }

    pub fn rest() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#rest")
    }

    pub fn nil() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#nil")
    }

    pub fn list() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#List")
    }

    pub fn seq() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#Seq")
    }

    pub fn bag() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#Bag")
    }

    pub fn alt() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#Alt")
    }

    /// Container membership predicate `rdf:_n` (1-based)
    pub fn member(index: usize) -> NamedNode {
        NamedNode::new_unchecked(&format!("{}_{}", RDF_NS, index))
    }

    /// Index encoded by a container membership predicate. `rdf:li` is not
    /// numbered and yields `None`.
    pub fn member_index(predicate: &NamedNode) -> Option<usize> {
        if predicate.ns() != RDF_NS {
            return None;
        }
        predicate
            .ln()
            .strip_prefix('_')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n > 0)
    }

    pub fn is_li(predicate: &NamedNode) -> bool {
        predicate.ns() == RDF_NS && predicate.ln() == "li"
    }
}

pub mod rdfs {
    use super::*;

    pub fn container() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2000/01/rdf-schema#Container")
    }

    pub fn label() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2000/01/rdf-schema#label")
    }
}

pub mod xsd {
    use super::*;

    pub fn string() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#string")
    }

    pub fn integer() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#integer")
    }

    pub fn long() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#long")
    }

    pub fn int() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#int")
    }

    pub fn double() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#double")
    }

    pub fn float() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#float")
    }

    pub fn boolean() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#boolean")
    }

    pub fn date_time() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#dateTime")
    }

    pub fn date() -> NamedNode {
        NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#date")
    }
}

/// Types marking a container node
pub fn container_types() -> [NamedNode; 4] {
    [rdf::seq(), rdf::bag(), rdf::alt(), rdfs::container()]
}
