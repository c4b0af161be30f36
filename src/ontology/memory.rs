//! In-memory ontology built from explicit parent links.
//!
//! Used for offline runs and tests. The on-disk form is
//! `{"terms": {"biolink:Gene": {"parents": ["biolink:BiologicalEntity"], "inverse": null}}}`.

use crate::catalog::SemanticTerm;
use crate::error::OracleError;
use crate::ontology::Ontology;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct OntologyDocument {
    terms: BTreeMap<SemanticTerm, TermEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct TermEntry {
    #[serde(default)]
    parents: Vec<SemanticTerm>,
    #[serde(default)]
    inverse: Option<SemanticTerm>,
}

#[derive(Debug, Clone, Default)]
/// Term hierarchy held as child lists plus an inverse table.
pub struct StaticOntology {
    children: BTreeMap<SemanticTerm, BTreeSet<SemanticTerm>>,
    inverses: BTreeMap<SemanticTerm, SemanticTerm>,
}

#[derive(Debug, Default)]
pub struct StaticOntologyBuilder {
    ontology: StaticOntology,
}

impl StaticOntologyBuilder {
    /// Declare `child` as a direct subclass (or subproperty) of `parent`.
    pub fn parent(mut self, child: &str, parent: &str) -> Self {
        self.ontology.link(SemanticTerm::new(child), SemanticTerm::new(parent));
        self
    }

    /// Declare two predicates as mutual inverses.
    pub fn inverse(mut self, predicate: &str, inverse: &str) -> Self {
        self.ontology
            .pair_inverses(SemanticTerm::new(predicate), SemanticTerm::new(inverse));
        self
    }

    pub fn build(self) -> StaticOntology {
        self.ontology
    }
}

impl StaticOntology {
    pub fn builder() -> StaticOntologyBuilder {
        StaticOntologyBuilder::default()
    }

    /// Load a term table from a JSON document on disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("parsing ontology {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let document: OntologyDocument = serde_json::from_str(data)?;
        let mut ontology = StaticOntology::default();
        for (term, entry) in document.terms {
            for parent in entry.parents {
                ontology.link(term.clone(), parent);
            }
            if let Some(inverse) = entry.inverse {
                ontology.pair_inverses(term, inverse);
            }
        }
        Ok(ontology)
    }

    /// Number of terms that appear anywhere in the hierarchy.
    pub fn term_count(&self) -> usize {
        let mut terms: BTreeSet<&SemanticTerm> = self.children.keys().collect();
        terms.extend(self.children.values().flatten());
        terms.len()
    }

    fn link(&mut self, child: SemanticTerm, parent: SemanticTerm) {
        self.children.entry(parent).or_default().insert(child);
    }

    fn pair_inverses(&mut self, predicate: SemanticTerm, inverse: SemanticTerm) {
        self.inverses.insert(inverse.clone(), predicate.clone());
        self.inverses.insert(predicate, inverse);
    }
}

impl Ontology for StaticOntology {
    fn descendants(&self, term: &SemanticTerm) -> Result<Vec<SemanticTerm>, OracleError> {
        let mut seen: BTreeSet<SemanticTerm> = BTreeSet::new();
        let mut queue: VecDeque<&SemanticTerm> = VecDeque::from([term]);
        while let Some(current) = queue.pop_front() {
            let Some(children) = self.children.get(current) else {
                continue;
            };
            for child in children {
                // Guard against cycles in hand-written tables.
                if child != term && seen.insert(child.clone()) {
                    queue.push_back(child);
                }
            }
        }
        Ok(seen.into_iter().collect())
    }

    fn inverse(&self, predicate: &SemanticTerm) -> Result<Option<SemanticTerm>, OracleError> {
        Ok(self.inverses.get(predicate).cloned())
    }
}
