//! Ontology oracle wiring.
//!
//! The resolver only needs two questions answered about Biolink terms: which
//! terms descend from a given term, and what a predicate's inverse is.
//! `HttpOntology` asks a remote lookup service, `StaticOntology` answers from
//! an in-memory table, and `CachedOntology` memoizes either one.

pub mod cache;
pub mod http;
pub mod memory;

pub use cache::CachedOntology;
pub use http::HttpOntology;
pub use memory::{StaticOntology, StaticOntologyBuilder};

use crate::catalog::SemanticTerm;
use crate::error::OracleError;

/// Source of ancestor/descendant and inverse relationships between terms.
pub trait Ontology: Send + Sync {
    /// Every term below `term` in the hierarchy. The term itself may or may
    /// not be included; callers treat "self" separately.
    fn descendants(&self, term: &SemanticTerm) -> Result<Vec<SemanticTerm>, OracleError>;

    /// Declared inverse of a predicate, if any.
    fn inverse(&self, predicate: &SemanticTerm) -> Result<Option<SemanticTerm>, OracleError>;

    /// True when `candidate` equals `ancestor` or descends from it.
    fn is_descendant_or_self(
        &self,
        ancestor: &SemanticTerm,
        candidate: &SemanticTerm,
    ) -> Result<bool, OracleError> {
        if ancestor == candidate {
            return Ok(true);
        }
        Ok(self.descendants(ancestor)?.contains(candidate))
    }
}

impl<O: Ontology + ?Sized> Ontology for &O {
    fn descendants(&self, term: &SemanticTerm) -> Result<Vec<SemanticTerm>, OracleError> {
        (**self).descendants(term)
    }

    fn inverse(&self, predicate: &SemanticTerm) -> Result<Option<SemanticTerm>, OracleError> {
        (**self).inverse(predicate)
    }
}
