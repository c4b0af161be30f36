//! Shared library for the biolink query-graph resolver.
//!
//! The crate exposes the capability catalog, the ontology oracle, the query
//! graph model and the resolve/validate engine used by the helper binaries.
//! Public functions here form the contract the binaries depend on: pipeline
//! entry points, oracle construction from configuration, and small parsing
//! helpers.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub mod catalog;
pub mod config;
pub mod error;
pub mod ontology;
pub mod query_graph;
pub mod resolver;
pub(crate) mod schema_loader;
pub mod validator;

pub use catalog::{
    Catalog, CatalogKey, CatalogRepository, CatalogSource, Curie, MetaEdge, MetaKnowledgeGraph,
    MetaNode, SemanticTerm,
};
pub use config::ResolverConfig;
pub use error::{OracleError, ProcessError, ResolveError, SchemaLoadError, ValidationError};
pub use ontology::{CachedOntology, HttpOntology, Ontology, StaticOntology};
pub use query_graph::{QEdge, QNode, QueryGraph, load_query_graph_from_path};
pub use resolver::{Resolver, resolve, resolve_in_place};
pub use validator::{validate, validate_all};

/// Resolve `graph` against `catalog`, then check the result conforms.
///
/// The input is never modified; on success the narrowed graph is returned.
pub fn process(
    graph: &QueryGraph,
    catalog: &Catalog,
    ontology: &dyn Ontology,
) -> Result<QueryGraph, ProcessError> {
    let resolved = resolve(graph, catalog, ontology)?;
    validate(&resolved, catalog)?;
    Ok(resolved)
}

/// Build the ontology oracle a config asks for.
///
/// A configured term file wins over the lookup service so offline runs never
/// touch the network.
pub fn ontology_from_config(config: &ResolverConfig) -> Result<Arc<dyn Ontology>> {
    if let Some(path) = &config.ontology_file {
        let ontology = StaticOntology::load_from_path(path)
            .with_context(|| format!("loading ontology file {}", path.display()))?;
        tracing::info!(path = %path.display(), terms = ontology.term_count(), "using static ontology");
        return Ok(Arc::new(ontology));
    }
    let ontology = HttpOntology::from_config(config)?;
    tracing::info!(url = %config.lookup_url, version = %config.biolink_version, "using lookup service");
    Ok(Arc::new(ontology))
}

/// Install the stderr log subscriber for a binary.
///
/// `--verbose` forces `debug`; otherwise `RUST_LOG` applies, defaulting to
/// `warn` so stdout stays machine-readable and stderr quiet.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Split comma- or whitespace-delimited configuration lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
