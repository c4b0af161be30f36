//! Indexed view of a meta knowledge graph.
//!
//! The index checks the document against the embedded schema, cross-checks
//! that edges only mention declared categories and that every identifier
//! prefix belongs to exactly one category, then derives the lookup tables the
//! resolver and validator use. It is read-only after construction.

use crate::catalog::identity::SemanticTerm;
use crate::catalog::model::{MetaEdge, MetaKnowledgeGraph};
use crate::error::SchemaLoadError;
use crate::schema_loader::{
    META_KG_SCHEMA, META_KG_SCHEMA_ID, SchemaLoadOptions, SchemaLoadResult, embedded_schema,
    load_json_schema, validate_document,
};
use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a capability document lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogSource {
    Path(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// `http://` and `https://` values are URLs; anything else is a path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            CatalogSource::Url(trimmed.to_string())
        } else {
            CatalogSource::Path(PathBuf::from(trimmed))
        }
    }

    fn read(&self) -> Result<String> {
        match self {
            CatalogSource::Path(path) => {
                fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
            }
            CatalogSource::Url(url) => {
                let client = Client::builder()
                    .timeout(FETCH_TIMEOUT)
                    .build()
                    .map_err(|e| anyhow!("failed to build http client: {e}"))?;
                let response = client
                    .get(url)
                    .send()
                    .with_context(|| format!("fetching {url}"))?;
                let status = response.status();
                if !status.is_success() {
                    bail!("fetching {url} returned HTTP {status}");
                }
                response.text().with_context(|| format!("reading body of {url}"))
            }
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Path(path) => write!(f, "{}", path.display()),
            CatalogSource::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug)]
/// Capability catalog plus the derived lookup tables.
pub struct Catalog {
    meta_kg: MetaKnowledgeGraph,
    prefix_to_category: BTreeMap<String, SemanticTerm>,
    pair_predicates: BTreeMap<(SemanticTerm, SemanticTerm), Vec<SemanticTerm>>,
    // object category -> (predicate, subject category)
    by_object: BTreeMap<SemanticTerm, Vec<(SemanticTerm, SemanticTerm)>>,
    // subject category -> (predicate, object category)
    by_subject: BTreeMap<SemanticTerm, Vec<(SemanticTerm, SemanticTerm)>>,
    prefix_category_pairs: BTreeSet<(String, SemanticTerm)>,
    triples: BTreeSet<MetaEdge>,
    predicates: BTreeSet<SemanticTerm>,
}

impl Catalog {
    /// Load, schema-check and index a capability document.
    pub fn load(source: &CatalogSource) -> Result<Self, SchemaLoadError> {
        Ok(Self::load_with_schema(source, None)?)
    }

    /// Like [`Catalog::load`], checking against a schema file on disk instead
    /// of the embedded one.
    pub fn load_with_schema(source: &CatalogSource, schema_path: Option<&Path>) -> Result<Self> {
        let schema = match schema_path {
            Some(path) => load_json_schema(
                path,
                SchemaLoadOptions {
                    expected_id: Some(META_KG_SCHEMA_ID),
                    ..Default::default()
                },
            )?,
            None => embedded_schema(META_KG_SCHEMA, META_KG_SCHEMA_ID)?,
        };
        let text = source.read()?;
        let catalog = Self::parse_checked(&text, &schema, &source.to_string())
            .with_context(|| format!("loading catalog {source}"))?;
        tracing::info!(
            %source,
            categories = catalog.meta_kg.nodes.len(),
            edges = catalog.triples.len(),
            "loaded capability catalog"
        );
        Ok(catalog)
    }

    /// Parse a capability document held in memory.
    pub fn from_json(text: &str) -> Result<Self, SchemaLoadError> {
        let schema = embedded_schema(META_KG_SCHEMA, META_KG_SCHEMA_ID)?;
        Ok(Self::parse_checked(text, &schema, "capability document")?)
    }

    fn parse_checked(text: &str, schema: &SchemaLoadResult, label: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("parsing JSON")?;
        validate_document(schema, &value, label)?;
        let meta_kg: MetaKnowledgeGraph =
            serde_json::from_value(value).context("decoding meta knowledge graph")?;
        build_index(meta_kg)
    }

    /// Cross-check and index an in-memory document.
    pub fn from_meta_kg(meta_kg: MetaKnowledgeGraph) -> Result<Self, SchemaLoadError> {
        Ok(build_index(meta_kg)?)
    }

    /// Category whose identifiers use `prefix`.
    pub fn expected_category(&self, prefix: &str) -> Option<&SemanticTerm> {
        self.prefix_to_category.get(prefix)
    }

    /// The predicate joining an ordered category pair, when the catalog
    /// declares exactly one.
    pub fn expected_predicate(
        &self,
        subject: &SemanticTerm,
        object: &SemanticTerm,
    ) -> Option<&SemanticTerm> {
        match self.predicates_between(subject, object) {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Every catalog predicate joining an ordered category pair.
    pub fn predicates_between(&self, subject: &SemanticTerm, object: &SemanticTerm) -> &[SemanticTerm] {
        self.pair_predicates
            .get(&(subject.clone(), object.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `(predicate, subject category)` for every meta edge pointing at
    /// `object`; candidates for a wildcard in subject position.
    pub fn wildcard_candidates(&self, object: &SemanticTerm) -> &[(SemanticTerm, SemanticTerm)] {
        self.by_object.get(object).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(predicate, object category)` for every meta edge leaving `subject`;
    /// candidates for a wildcard in object position.
    pub fn wildcard_candidates_for_subject(
        &self,
        subject: &SemanticTerm,
    ) -> &[(SemanticTerm, SemanticTerm)] {
        self.by_subject.get(subject).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_supported_category(&self, category: &SemanticTerm) -> bool {
        self.meta_kg.nodes.contains_key(category)
    }

    pub fn is_supported_prefix(&self, prefix: &str) -> bool {
        self.prefix_to_category.contains_key(prefix)
    }

    pub fn is_supported_prefix_category_pair(&self, prefix: &str, category: &SemanticTerm) -> bool {
        self.prefix_category_pairs
            .contains(&(prefix.to_string(), category.clone()))
    }

    pub fn is_supported_triple(
        &self,
        subject: &SemanticTerm,
        predicate: &SemanticTerm,
        object: &SemanticTerm,
    ) -> bool {
        self.triples.contains(&MetaEdge {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object: object.clone(),
        })
    }

    /// Declared categories in stable order.
    pub fn categories(&self) -> impl Iterator<Item = &SemanticTerm> {
        self.meta_kg.nodes.keys()
    }

    pub fn supported_predicates(&self) -> &BTreeSet<SemanticTerm> {
        &self.predicates
    }

    /// Access the underlying document.
    pub fn meta_kg(&self) -> &MetaKnowledgeGraph {
        &self.meta_kg
    }
}

fn build_index(meta_kg: MetaKnowledgeGraph) -> Result<Catalog> {
    if meta_kg.nodes.is_empty() {
        bail!("catalog declares no node categories");
    }

    let mut prefix_to_category: BTreeMap<String, SemanticTerm> = BTreeMap::new();
    let mut prefix_category_pairs = BTreeSet::new();
    for (category, node) in &meta_kg.nodes {
        if node.id_prefixes.is_empty() {
            bail!("category {category} declares no id_prefixes");
        }
        for prefix in &node.id_prefixes {
            let prefix = prefix.trim();
            if prefix.is_empty() {
                bail!("category {category} declares an empty id prefix");
            }
            if let Some(existing) = prefix_to_category.get(prefix) {
                if existing != category {
                    bail!("id prefix {prefix} is claimed by both {existing} and {category}");
                }
            }
            prefix_to_category.insert(prefix.to_string(), category.clone());
            prefix_category_pairs.insert((prefix.to_string(), category.clone()));
        }
    }

    let mut pair_predicates: BTreeMap<(SemanticTerm, SemanticTerm), Vec<SemanticTerm>> =
        BTreeMap::new();
    let mut by_object: BTreeMap<SemanticTerm, Vec<(SemanticTerm, SemanticTerm)>> = BTreeMap::new();
    let mut by_subject: BTreeMap<SemanticTerm, Vec<(SemanticTerm, SemanticTerm)>> =
        BTreeMap::new();
    let mut triples = BTreeSet::new();
    let mut predicates = BTreeSet::new();
    for edge in &meta_kg.edges {
        for endpoint in [&edge.subject, &edge.object] {
            if !meta_kg.nodes.contains_key(endpoint) {
                bail!(
                    "meta edge {} -> {} -> {} references undeclared category {endpoint}",
                    edge.subject,
                    edge.predicate,
                    edge.object
                );
            }
        }
        // Duplicate triples are tolerated; only the first is indexed.
        if !triples.insert(edge.clone()) {
            continue;
        }
        predicates.insert(edge.predicate.clone());
        pair_predicates
            .entry((edge.subject.clone(), edge.object.clone()))
            .or_default()
            .push(edge.predicate.clone());
        by_object
            .entry(edge.object.clone())
            .or_default()
            .push((edge.predicate.clone(), edge.subject.clone()));
        by_subject
            .entry(edge.subject.clone())
            .or_default()
            .push((edge.predicate.clone(), edge.object.clone()));
    }

    Ok(Catalog {
        meta_kg,
        prefix_to_category,
        pair_predicates,
        by_object,
        by_subject,
        prefix_category_pairs,
        triples,
        predicates,
    })
}
