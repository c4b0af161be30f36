//! Deserializable representation of a meta knowledge graph document.
//!
//! The types mirror the capability document (`nodes` keyed by category,
//! `edges` as subject/predicate/object triples). Use [`Catalog`] for
//! resolution and validation lookups; use these structs when the raw document
//! is needed (merging catalogs, inverse expansion, dumping).
//!
//! [`Catalog`]: crate::catalog::Catalog

use crate::catalog::identity::SemanticTerm;
use crate::error::OracleError;
use crate::ontology::Ontology;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Full capability document as served by a knowledge provider.
pub struct MetaKnowledgeGraph {
    pub nodes: BTreeMap<SemanticTerm, MetaNode>,
    #[serde(default)]
    pub edges: Vec<MetaEdge>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Identifier namespaces accepted for one category.
pub struct MetaNode {
    pub id_prefixes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// One servable (subject, predicate, object) relationship.
pub struct MetaEdge {
    pub subject: SemanticTerm,
    pub predicate: SemanticTerm,
    pub object: SemanticTerm,
}

impl MetaEdge {
    pub fn new(subject: &str, predicate: &str, object: &str) -> Self {
        Self {
            subject: SemanticTerm::new(subject),
            predicate: SemanticTerm::new(predicate),
            object: SemanticTerm::new(object),
        }
    }

    /// The same relationship read in the opposite direction, when the
    /// ontology declares an inverse for the predicate.
    pub fn inverse(&self, ontology: &dyn Ontology) -> Result<Option<MetaEdge>, OracleError> {
        Ok(ontology.inverse(&self.predicate)?.map(|predicate| MetaEdge {
            subject: self.object.clone(),
            predicate,
            object: self.subject.clone(),
        }))
    }
}

impl MetaKnowledgeGraph {
    /// Register `category` with `prefixes`, unioning with any prefixes
    /// already declared for it.
    pub fn add_node(&mut self, category: &str, prefixes: &[&str]) -> &mut Self {
        let node = self.nodes.entry(SemanticTerm::new(category)).or_default();
        for prefix in prefixes {
            if !node.id_prefixes.iter().any(|p| p == prefix) {
                node.id_prefixes.push(prefix.to_string());
            }
        }
        self
    }

    /// Append a triple unless it is already present.
    pub fn add_edge(&mut self, subject: &str, predicate: &str, object: &str) -> &mut Self {
        let edge = MetaEdge::new(subject, predicate, object);
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
        self
    }

    /// Union several documents: node prefixes are merged per category and
    /// edges are deduplicated, keeping first-seen order.
    pub fn merge<I>(graphs: I) -> MetaKnowledgeGraph
    where
        I: IntoIterator<Item = MetaKnowledgeGraph>,
    {
        let mut merged = MetaKnowledgeGraph::default();
        for graph in graphs {
            for (category, node) in graph.nodes {
                let entry = merged.nodes.entry(category).or_default();
                for prefix in node.id_prefixes {
                    if !entry.id_prefixes.contains(&prefix) {
                        entry.id_prefixes.push(prefix);
                    }
                }
            }
            for edge in graph.edges {
                if !merged.edges.contains(&edge) {
                    merged.edges.push(edge);
                }
            }
        }
        merged
    }

    /// Copy of the document with every invertible edge mirrored.
    pub fn expand_with_inverses(
        &self,
        ontology: &dyn Ontology,
    ) -> Result<MetaKnowledgeGraph, OracleError> {
        let mut expanded = self.clone();
        for edge in &self.edges {
            if let Some(inverse) = edge.inverse(ontology)? {
                if !expanded.edges.contains(&inverse) {
                    tracing::debug!(
                        subject = %inverse.subject,
                        predicate = %inverse.predicate,
                        object = %inverse.object,
                        "adding inverse meta edge"
                    );
                    expanded.edges.push(inverse);
                }
            }
        }
        Ok(expanded)
    }
}
