//! Serializable query graph shared by the resolver, validator and binaries.
//!
//! Only the fields the resolver reasons about are typed; anything else a
//! client sends on a node or edge (constraints, `is_set`, ...) is carried
//! through untouched in `extra`.

use crate::catalog::SemanticTerm;
use crate::error::ResolveError;
use crate::schema_loader::{QUERY_GRAPH_SCHEMA, QUERY_GRAPH_SCHEMA_ID, embedded_schema, validate_document};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryGraph {
    #[serde(default)]
    pub nodes: BTreeMap<String, QNode>,
    #[serde(default)]
    pub edges: BTreeMap<String, QEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Query node; a wildcard when `ids` is absent.
pub struct QNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(deserialize_with = "dedup_terms")]
    pub categories: Vec<SemanticTerm>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QEdge {
    pub subject: String,
    pub object: String,
    #[serde(deserialize_with = "dedup_terms")]
    pub predicates: Vec<SemanticTerm>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn dedup_terms<'de, D>(deserializer: D) -> Result<Vec<SemanticTerm>, D::Error>
where
    D: Deserializer<'de>,
{
    let terms = Vec::<SemanticTerm>::deserialize(deserializer)?;
    Ok(unique(terms))
}

fn unique(terms: impl IntoIterator<Item = SemanticTerm>) -> Vec<SemanticTerm> {
    let mut out: Vec<SemanticTerm> = Vec::new();
    for term in terms {
        if !out.contains(&term) {
            out.push(term);
        }
    }
    out
}

impl QNode {
    pub fn pinned(ids: &[&str], categories: &[&str]) -> Self {
        Self {
            ids: Some(ids.iter().map(|id| id.to_string()).collect()),
            categories: unique(categories.iter().map(|c| SemanticTerm::new(c))),
            extra: BTreeMap::new(),
        }
    }

    pub fn wildcard(categories: &[&str]) -> Self {
        Self {
            ids: None,
            categories: unique(categories.iter().map(|c| SemanticTerm::new(c))),
            extra: BTreeMap::new(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.ids.is_none()
    }

    /// Pinned identifiers; empty for wildcards.
    pub fn ids(&self) -> &[String] {
        self.ids.as_deref().unwrap_or(&[])
    }

    /// The single category, once resolution has narrowed the node.
    pub fn category(&self) -> Option<&SemanticTerm> {
        match self.categories.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn narrow_to(&mut self, category: SemanticTerm) {
        self.categories = vec![category];
    }
}

impl QEdge {
    pub fn new(subject: &str, object: &str, predicates: &[&str]) -> Self {
        Self {
            subject: subject.to_string(),
            object: object.to_string(),
            predicates: unique(predicates.iter().map(|p| SemanticTerm::new(p))),
            extra: BTreeMap::new(),
        }
    }

    pub fn predicate(&self) -> Option<&SemanticTerm> {
        match self.predicates.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn narrow_to(&mut self, predicate: SemanticTerm) {
        self.predicates = vec![predicate];
    }
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, id: &str, node: QNode) -> Self {
        self.nodes.insert(id.to_string(), node);
        self
    }

    pub fn with_edge(mut self, id: &str, edge: QEdge) -> Self {
        self.edges.insert(id.to_string(), edge);
        self
    }

    /// Parse and schema-check a query graph document.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("parsing query graph JSON")?;
        // Accept either a bare query graph or a TRAPI message wrapper.
        let graph_value = value
            .pointer("/message/query_graph")
            .or_else(|| value.get("query_graph"))
            .cloned()
            .unwrap_or(value);
        let schema = embedded_schema(QUERY_GRAPH_SCHEMA, QUERY_GRAPH_SCHEMA_ID)?;
        validate_document(&schema, &graph_value, "query graph")?;
        serde_json::from_value(graph_value).context("decoding query graph")
    }

    /// Ids of the edges touching `node_id`, in key order.
    pub fn incident_edges(&self, node_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, edge)| edge.subject == node_id || edge.object == node_id)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Reject graphs the resolver cannot reason about: dangling endpoints,
    /// empty candidate sets, empty pinned id lists.
    pub fn check_structure(&self) -> Result<(), ResolveError> {
        for (id, node) in &self.nodes {
            if node.categories.is_empty() {
                return Err(ResolveError::MalformedGraph(format!(
                    "node {id} declares no categories"
                )));
            }
            if matches!(&node.ids, Some(ids) if ids.is_empty()) {
                return Err(ResolveError::MalformedGraph(format!(
                    "node {id} declares an empty ids list"
                )));
            }
        }
        for (id, edge) in &self.edges {
            for endpoint in [&edge.subject, &edge.object] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(ResolveError::MalformedGraph(format!(
                        "edge {id} references missing node {endpoint}"
                    )));
                }
            }
            if edge.predicates.is_empty() {
                return Err(ResolveError::MalformedGraph(format!(
                    "edge {id} declares no predicates"
                )));
            }
        }
        Ok(())
    }
}

/// Read and parse a query graph from disk.
pub fn load_query_graph_from_path(path: &Path) -> Result<QueryGraph> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    QueryGraph::from_json(&data).with_context(|| format!("loading query graph {}", path.display()))
}
