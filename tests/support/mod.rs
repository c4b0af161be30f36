#![allow(dead_code)]

use anyhow::{Context, Result};
use biolink_resolver::catalog::SemanticTerm;
use biolink_resolver::error::OracleError;
use biolink_resolver::{Catalog, MetaKnowledgeGraph, Ontology, StaticOntology};
use serde_json::{Value, json};
use std::io::Write;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

/// Small slice of the Biolink hierarchy shared by the integration tests.
pub fn ontology() -> StaticOntology {
    StaticOntology::builder()
        .parent("BiologicalEntity", "NamedThing")
        .parent("ChemicalEntity", "NamedThing")
        .parent("Gene", "BiologicalEntity")
        .parent("Disease", "BiologicalEntity")
        .parent("Drug", "ChemicalEntity")
        .parent("treats", "related_to")
        .parent("interacts_with", "related_to")
        .parent("gene_associated_with_condition", "related_to")
        .parent("contributes_to", "related_to")
        .inverse("treats", "treated_by")
        .inverse("gene_associated_with_condition", "condition_associated_with_gene")
        .build()
}

/// The same hierarchy as an on-disk term document.
pub fn ontology_document() -> Value {
    json!({
        "terms": {
            "biolink:BiologicalEntity": {"parents": ["biolink:NamedThing"]},
            "biolink:ChemicalEntity": {"parents": ["biolink:NamedThing"]},
            "biolink:Gene": {"parents": ["biolink:BiologicalEntity"]},
            "biolink:Disease": {"parents": ["biolink:BiologicalEntity"]},
            "biolink:Drug": {"parents": ["biolink:ChemicalEntity"]},
            "biolink:treats": {"parents": ["biolink:related_to"], "inverse": "biolink:treated_by"},
            "biolink:interacts_with": {"parents": ["biolink:related_to"]},
            "biolink:gene_associated_with_condition": {"parents": ["biolink:related_to"]},
            "biolink:contributes_to": {"parents": ["biolink:related_to"]}
        }
    })
}

pub fn base_meta_kg() -> MetaKnowledgeGraph {
    let mut meta_kg = MetaKnowledgeGraph::default();
    meta_kg
        .add_node("Gene", &["ENSEMBL", "NCBIGene"])
        .add_node("Disease", &["MONDO"])
        .add_node("Drug", &["CHEMBL"])
        .add_edge("Drug", "treats", "Disease")
        .add_edge("Gene", "gene_associated_with_condition", "Disease")
        .add_edge("Drug", "interacts_with", "Gene");
    meta_kg
}

pub fn catalog() -> Catalog {
    Catalog::from_meta_kg(base_meta_kg()).expect("fixture catalog indexes")
}

pub fn write_json(value: &impl serde::Serialize) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("failed to allocate temp file")?;
    serde_json::to_writer(&mut file, value)?;
    file.flush()?;
    Ok(file)
}

pub fn term(name: &str) -> SemanticTerm {
    SemanticTerm::new(name)
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

/// Ontology wrapper that counts how often each question reaches it.
pub struct CountingOntology<O> {
    inner: O,
    calls: AtomicUsize,
}

impl<O: Ontology> CountingOntology<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<O: Ontology> Ontology for CountingOntology<O> {
    fn descendants(&self, term: &SemanticTerm) -> Result<Vec<SemanticTerm>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.descendants(term)
    }

    fn inverse(&self, predicate: &SemanticTerm) -> Result<Option<SemanticTerm>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.inverse(predicate)
    }
}

/// Ontology whose every lookup fails as if the service timed out.
pub struct UnreachableOntology;

impl Ontology for UnreachableOntology {
    fn descendants(&self, term: &SemanticTerm) -> Result<Vec<SemanticTerm>, OracleError> {
        Err(OracleError::Timeout {
            term: term.to_string(),
        })
    }

    fn inverse(&self, predicate: &SemanticTerm) -> Result<Option<SemanticTerm>, OracleError> {
        Err(OracleError::Timeout {
            term: predicate.to_string(),
        })
    }
}
