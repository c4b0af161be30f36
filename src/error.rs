//! Typed failures for catalog loading, resolution and validation.
//!
//! Every variant carries the offending term(s) so callers can report them
//! verbatim, and exposes a stable `kind()` code for machine consumers.

use crate::catalog::SemanticTerm;
use thiserror::Error;

fn join_terms(terms: &[SemanticTerm]) -> String {
    let names: Vec<&str> = terms.iter().map(SemanticTerm::as_str).collect();
    format!("[{}]", names.join(", "))
}

/// Capability document could not be read, parsed or indexed.
#[derive(Error, Debug)]
#[error("Schema load error: {0:#}")]
pub struct SchemaLoadError(#[from] pub anyhow::Error);

/// Ontology lookup failures. Distinct from "no descendant found".
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("ontology lookup for {term} timed out")]
    Timeout { term: String },

    #[error("ontology lookup for {term} failed: {source}")]
    Transport {
        term: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("ontology lookup for {term} returned HTTP {status}")]
    Status { term: String, status: u16 },

    #[error("ontology lookup for {term} returned an unreadable body: {message}")]
    Decode { term: String, message: String },
}

impl OracleError {
    /// Timeouts and connection failures may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, OracleError::Timeout { .. } | OracleError::Transport { .. })
    }
}

/// Reasons the resolver could not narrow a query graph.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("Conflicting identifier prefixes on node {node}: {}", join_terms(.categories))]
    ConflictingIdentifierPrefixes {
        node: String,
        categories: Vec<SemanticTerm>,
    },

    #[error("Unsupported Category Ancestor: {}", join_terms(.0))]
    UnsupportedCategoryAncestors(Vec<SemanticTerm>),

    #[error("Unsupported Predicate Ancestor: {}", join_terms(.0))]
    UnsupportedPredicateAncestor(Vec<SemanticTerm>),

    #[error("Indeterminable Category Descendent: {}", join_terms(.0))]
    IndeterminableWildcardDescendent(Vec<SemanticTerm>),

    #[error("Indeterminable Predicate Descendent: {}", join_terms(.0))]
    IndeterminablePredicateDescendent(Vec<SemanticTerm>),

    #[error("Node {node} is left with {} categories: {}", .categories.len(), join_terms(.categories))]
    UnresolvedNode {
        node: String,
        categories: Vec<SemanticTerm>,
    },

    #[error("Edge {edge} is left with {} predicates: {}", .predicates.len(), join_terms(.predicates))]
    UnresolvedEdge {
        edge: String,
        predicates: Vec<SemanticTerm>,
    },

    #[error("Wildcard node {0} is not connected to any edge")]
    DisconnectedWildcard(String),

    #[error("Malformed query graph: {0}")]
    MalformedGraph(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl ResolveError {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::MalformedIdentifier(_) => "MALFORMED_IDENTIFIER",
            ResolveError::ConflictingIdentifierPrefixes { .. } => "CONFLICTING_IDENTIFIER_PREFIXES",
            ResolveError::UnsupportedCategoryAncestors(_) => "UNSUPPORTED_CATEGORY_ANCESTORS",
            ResolveError::UnsupportedPredicateAncestor(_) => "UNSUPPORTED_PREDICATE_ANCESTOR",
            ResolveError::IndeterminableWildcardDescendent(_) => {
                "INDETERMINABLE_WILDCARD_DESCENDENT"
            }
            ResolveError::IndeterminablePredicateDescendent(_) => {
                "INDETERMINABLE_PREDICATE_DESCENDENT"
            }
            ResolveError::UnresolvedNode { .. } => "UNRESOLVED_NODE",
            ResolveError::UnresolvedEdge { .. } => "UNRESOLVED_EDGE",
            ResolveError::DisconnectedWildcard(_) => "DISCONNECTED_WILDCARD",
            ResolveError::MalformedGraph(_) => "MALFORMED_GRAPH",
            ResolveError::Oracle(_) => "ORACLE_ERROR",
        }
    }
}

/// Conformance failures of a resolved graph against the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("Unsupported Prefix: {0}")]
    UnsupportedPrefix(String),

    #[error("Unsupported Entity: {0}")]
    UnsupportedCategory(SemanticTerm),

    #[error("Unsupported Prefix Category Pair: {prefix} -> {category}")]
    UnsupportedPrefixCategoryPair {
        prefix: String,
        category: SemanticTerm,
    },

    #[error("Unsupported Relationship: {subject} -> {predicate} -> {object}")]
    UnsupportedNodeEdgeRelationship {
        subject: SemanticTerm,
        predicate: SemanticTerm,
        object: SemanticTerm,
    },

    #[error("Node {node} has {} categories after resolution: {}", .categories.len(), join_terms(.categories))]
    UnresolvedNode {
        node: String,
        categories: Vec<SemanticTerm>,
    },

    #[error("Edge {edge} has {} predicates after resolution: {}", .predicates.len(), join_terms(.predicates))]
    UnresolvedEdge {
        edge: String,
        predicates: Vec<SemanticTerm>,
    },

    #[error("Edge {edge} references missing node {node}")]
    DanglingEdge { edge: String, node: String },
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MalformedIdentifier(_) => "MALFORMED_IDENTIFIER",
            ValidationError::UnsupportedPrefix(_) => "UNSUPPORTED_PREFIX",
            ValidationError::UnsupportedCategory(_) => "UNSUPPORTED_CATEGORY",
            ValidationError::UnsupportedPrefixCategoryPair { .. } => {
                "UNSUPPORTED_PREFIX_CATEGORY_PAIR"
            }
            ValidationError::UnsupportedNodeEdgeRelationship { .. } => {
                "UNSUPPORTED_NODE_EDGE_RELATIONSHIP"
            }
            ValidationError::UnresolvedNode { .. } => "UNRESOLVED_NODE",
            ValidationError::UnresolvedEdge { .. } => "UNRESOLVED_EDGE",
            ValidationError::DanglingEdge { .. } => "DANGLING_EDGE",
        }
    }
}

/// Terminal outcome of the resolve-then-validate pipeline.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Validate(#[from] ValidationError),
}

impl ProcessError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::Resolve(err) => err.kind(),
            ProcessError::Validate(err) => err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_offending_terms() {
        let err = ResolveError::UnsupportedCategoryAncestors(vec![SemanticTerm::new("Gene")]);
        assert_eq!(
            err.to_string(),
            "Unsupported Category Ancestor: [biolink:Gene]"
        );
        assert_eq!(err.kind(), "UNSUPPORTED_CATEGORY_ANCESTORS");

        let err = ValidationError::UnsupportedNodeEdgeRelationship {
            subject: SemanticTerm::new("Drug"),
            predicate: SemanticTerm::new("treats"),
            object: SemanticTerm::new("Gene"),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported Relationship: biolink:Drug -> biolink:treats -> biolink:Gene"
        );
    }

    #[test]
    fn process_error_forwards_kind() {
        let err: ProcessError = ValidationError::UnsupportedPrefix("FOO".into()).into();
        assert_eq!(err.kind(), "UNSUPPORTED_PREFIX");
        assert_eq!(err.to_string(), "Unsupported Prefix: FOO");
    }

    #[test]
    fn only_network_failures_are_transient() {
        let timeout = OracleError::Timeout {
            term: "biolink:Gene".into(),
        };
        let status = OracleError::Status {
            term: "biolink:Gene".into(),
            status: 500,
        };
        assert!(timeout.is_transient());
        assert!(!status.is_transient());
    }
}
