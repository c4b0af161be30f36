// Centralized integration suite for the resolver; exercises catalog loading,
// the three resolution phases, validation and the helper binaries so changes
// surface in one place.
mod support;

use anyhow::{Context, Result};
use biolink_resolver::{
    Catalog, CatalogKey, CatalogRepository, CatalogSource, Curie, MetaKnowledgeGraph,
    ProcessError, QEdge, QNode, QueryGraph, ResolveError, Resolver, ValidationError,
    load_query_graph_from_path, process, resolve, resolve_in_place, validate,
};
use serde_json::{Value, json};
use std::process::Command;
use support::{
    CountingOntology, UnreachableOntology, base_meta_kg, catalog, ontology, ontology_document,
    run_command, term, write_json,
};

fn wildcard_gene_graph() -> QueryGraph {
    QueryGraph::new()
        .with_node("n0", QNode::pinned(&["MONDO:0007254"], &["Disease"]))
        .with_node("n1", QNode::wildcard(&["Gene"]))
        .with_edge("e0", QEdge::new("n1", "n0", &["related_to"]))
}

fn mixed_graph() -> QueryGraph {
    QueryGraph::new()
        .with_node("drug", QNode::pinned(&["CHEMBL:CHEMBL3545252"], &["NamedThing"]))
        .with_node("disease", QNode::pinned(&["MONDO:0007254"], &["Disease"]))
        .with_node("gene", QNode::wildcard(&["BiologicalEntity"]))
        .with_edge("e0", QEdge::new("drug", "disease", &["related_to"]))
        .with_edge("e1", QEdge::new("drug", "gene", &["interacts_with"]))
}

// A MONDO identifier demands Disease, which Gene does not cover.
#[test]
fn pinned_node_outside_declared_ancestors_fails() {
    let graph = QueryGraph::new().with_node("n0", QNode::pinned(&["MONDO:0007254"], &["Gene"]));
    let err = resolve(&graph, &catalog(), &ontology()).unwrap_err();
    assert!(
        matches!(err, ResolveError::UnsupportedCategoryAncestors(ref declared) if declared == &[term("Gene")]),
        "{err:?}"
    );
}

// A node already typed with its prefix category is left as is.
#[test]
fn pinned_node_with_matching_category_is_unchanged() -> Result<()> {
    let graph =
        QueryGraph::new().with_node("n0", QNode::pinned(&["CHEMBL:CHEMBL3545252"], &["Drug"]));
    let resolved = resolve(&graph, &catalog(), &ontology())?;
    assert_eq!(resolved, graph);
    Ok(())
}

// The catalog's only Drug -> Disease predicate is already declared.
#[test]
fn pinned_edge_with_expected_predicate_is_unchanged() -> Result<()> {
    let graph = QueryGraph::new()
        .with_node("drug", QNode::pinned(&["CHEMBL:CHEMBL3545252"], &["Drug"]))
        .with_node("disease", QNode::pinned(&["MONDO:0007254"], &["Disease"]))
        .with_edge("e0", QEdge::new("drug", "disease", &["treats"]));
    let resolved = resolve(&graph, &catalog(), &ontology())?;
    assert_eq!(resolved, graph);
    Ok(())
}

// Only Gene -> gene_associated_with_condition -> Disease fits the wildcard.
#[test]
fn wildcard_resolves_to_unique_candidate() -> Result<()> {
    let resolved = resolve(&wildcard_gene_graph(), &catalog(), &ontology())?;
    assert_eq!(resolved.nodes["n1"].category(), Some(&term("Gene")));
    assert_eq!(
        resolved.edges["e0"].predicate(),
        Some(&term("gene_associated_with_condition"))
    );
    assert_eq!(resolved.nodes["n0"], wildcard_gene_graph().nodes["n0"]);
    Ok(())
}

// A second Gene -> Disease predicate under related_to makes the wildcard ambiguous.
#[test]
fn wildcard_with_two_candidates_is_indeterminable() {
    let mut meta_kg = base_meta_kg();
    meta_kg.add_edge("Gene", "contributes_to", "Disease");
    let catalog = Catalog::from_meta_kg(meta_kg).unwrap();
    let err = resolve(&wildcard_gene_graph(), &catalog, &ontology()).unwrap_err();
    assert!(
        matches!(err, ResolveError::IndeterminableWildcardDescendent(ref declared) if declared == &[term("Gene")]),
        "{err:?}"
    );
    assert_eq!(err.to_string(), "Indeterminable Category Descendent: [biolink:Gene]");
}

// Resolving an already resolved graph changes nothing.
#[test]
fn resolution_is_idempotent() -> Result<()> {
    let catalog = catalog();
    let ontology = ontology();
    for graph in [wildcard_gene_graph(), mixed_graph()] {
        let once = resolve(&graph, &catalog, &ontology)?;
        let twice = resolve(&once, &catalog, &ontology)?;
        assert_eq!(once, twice);
    }
    Ok(())
}

// After a successful pipeline run every pinned node carries the category its
// prefixes map to, and every edge is a catalog triple.
#[test]
fn processed_graph_satisfies_catalog_invariants() -> Result<()> {
    let catalog = catalog();
    let resolved = process(&mixed_graph(), &catalog, &ontology())?;

    for node in resolved.nodes.values() {
        let category = node.category().context("node left unresolved")?;
        for id in node.ids() {
            let prefix = Curie::new(id).prefix()?;
            assert_eq!(catalog.expected_category(prefix), Some(category));
        }
    }
    for edge in resolved.edges.values() {
        let subject = resolved.nodes[&edge.subject].category().unwrap();
        let object = resolved.nodes[&edge.object].category().unwrap();
        let predicate = edge.predicate().unwrap();
        assert!(catalog.is_supported_triple(subject, predicate, object));
    }
    assert_eq!(resolved.nodes["drug"].category(), Some(&term("Drug")));
    assert_eq!(resolved.nodes["gene"].category(), Some(&term("Gene")));
    assert_eq!(resolved.edges["e0"].predicate(), Some(&term("treats")));
    Ok(())
}

// Phase A narrows n0 before the wildcard fails; the caller must not see it.
#[test]
fn failed_resolution_leaves_graph_untouched() {
    let mut graph = QueryGraph::new()
        .with_node("n0", QNode::pinned(&["MONDO:0007254"], &["BiologicalEntity"]))
        .with_node("w", QNode::wildcard(&["Drug"]))
        .with_edge("e0", QEdge::new("w", "n0", &["interacts_with"]));
    let before = serde_json::to_string(&graph).unwrap();

    let err = resolve_in_place(&mut graph, &catalog(), &ontology()).unwrap_err();
    assert_eq!(err.kind(), "UNSUPPORTED_PREDICATE_ANCESTOR");
    assert_eq!(serde_json::to_string(&graph).unwrap(), before);
}

#[test]
fn resolve_in_place_replaces_graph_on_success() -> Result<()> {
    let mut graph = wildcard_gene_graph();
    resolve_in_place(&mut graph, &catalog(), &ontology())?;
    assert_eq!(graph.nodes["n1"].category(), Some(&term("Gene")));
    Ok(())
}

// Lookup failures are reported as oracle errors, not as missing descendants.
#[test]
fn oracle_failure_propagates() {
    let graph = QueryGraph::new()
        .with_node("n0", QNode::pinned(&["MONDO:0007254"], &["BiologicalEntity"]));
    let err = resolve(&graph, &catalog(), &UnreachableOntology).unwrap_err();
    match err {
        ResolveError::Oracle(ref oracle) => assert!(oracle.is_transient()),
        other => panic!("expected oracle error, got {other:?}"),
    }
}

// Two wildcards asking the same questions hit the ontology once per term.
#[test]
fn ontology_lookups_are_memoized() -> Result<()> {
    let graph = QueryGraph::new()
        .with_node("n0", QNode::pinned(&["MONDO:0007254"], &["Disease"]))
        .with_node("w1", QNode::wildcard(&["Gene"]))
        .with_node("w2", QNode::wildcard(&["Gene"]))
        .with_edge("e1", QEdge::new("w1", "n0", &["related_to"]))
        .with_edge("e2", QEdge::new("w2", "n0", &["related_to"]));
    let catalog = catalog();
    let counting = CountingOntology::new(ontology());

    let resolver = Resolver::new(&catalog, &counting);
    resolver.resolve(&graph)?;
    assert_eq!(counting.calls(), 2);
    resolver.resolve(&graph)?;
    assert_eq!(counting.calls(), 2);

    // Free-standing calls start with an empty memo.
    resolve(&graph, &catalog, &counting)?;
    assert_eq!(counting.calls(), 4);
    Ok(())
}

// The validator reports prefixes the resolver had no rule for.
#[test]
fn process_reports_unsupported_prefix() {
    let graph = QueryGraph::new()
        .with_node("n0", QNode::pinned(&["EFO:0000400"], &["Disease"]));
    let err = process(&graph, &catalog(), &ontology()).unwrap_err();
    assert!(matches!(
        err,
        ProcessError::Validate(ValidationError::UnsupportedPrefix(ref prefix)) if prefix == "EFO"
    ));
    assert_eq!(err.kind(), "UNSUPPORTED_PREFIX");
}

// An untyped pinned endpoint is reported as such, not as a predicate the
// caller never declared.
#[test]
fn process_reports_untyped_pinned_endpoint() {
    let graph = QueryGraph::new()
        .with_node("subject", QNode::pinned(&["PUBCHEM:1"], &["Drug", "Gene"]))
        .with_node("object", QNode::pinned(&["MONDO:0007254"], &["Disease"]))
        .with_edge("e0", QEdge::new("subject", "object", &["related_to"]));
    let err = process(&graph, &catalog(), &ontology()).unwrap_err();
    assert!(
        matches!(
            err,
            ProcessError::Resolve(ResolveError::UnresolvedNode { ref node, .. }) if node == "subject"
        ),
        "{err:?}"
    );
    assert_eq!(err.kind(), "UNRESOLVED_NODE");
}

#[test]
fn process_reports_unjoined_pinned_pair() {
    let graph = QueryGraph::new()
        .with_node("disease", QNode::pinned(&["MONDO:0007254"], &["Disease"]))
        .with_node("drug", QNode::pinned(&["CHEMBL:CHEMBL3545252"], &["Drug"]))
        .with_edge("e0", QEdge::new("disease", "drug", &["related_to"]));
    let err = process(&graph, &catalog(), &ontology()).unwrap_err();
    assert_eq!(err.kind(), "UNSUPPORTED_NODE_EDGE_RELATIONSHIP");
}

// Catalog documents on disk go through schema checks and indexing.
#[test]
fn catalog_loads_from_file() -> Result<()> {
    let file = write_json(&base_meta_kg())?;
    let source = CatalogSource::parse(&file.path().display().to_string());
    let catalog = Catalog::load(&source)?;
    let resolved = process(&wildcard_gene_graph(), &catalog, &ontology())?;
    assert_eq!(resolved.nodes["n1"].category(), Some(&term("Gene")));

    let broken = write_json(&json!({"nodes": {"biolink:Gene": {"id_prefixes": []}}}))?;
    let source = CatalogSource::parse(&broken.path().display().to_string());
    let err = Catalog::load(&source).unwrap_err();
    assert!(err.to_string().starts_with("Schema load error"), "{err}");
    Ok(())
}

// Merged catalogs union prefixes; inverse expansion mirrors invertible edges.
#[test]
fn merged_catalog_with_inverses_validates_reverse_edges() -> Result<()> {
    let mut extra = MetaKnowledgeGraph::default();
    extra
        .add_node("Gene", &["HGNC"])
        .add_node("Disease", &["MONDO"])
        .add_edge("Gene", "contributes_to", "Disease");
    let merged = MetaKnowledgeGraph::merge([base_meta_kg(), extra]);
    let expanded = merged.expand_with_inverses(&ontology())?;
    let catalog = Catalog::from_meta_kg(expanded)?;

    assert!(catalog.is_supported_prefix_category_pair("HGNC", &term("Gene")));
    assert!(catalog.is_supported_triple(&term("Disease"), &term("treated_by"), &term("Drug")));
    assert!(catalog.is_supported_triple(
        &term("Disease"),
        &term("condition_associated_with_gene"),
        &term("Gene")
    ));

    let graph = QueryGraph::new()
        .with_node("disease", QNode::pinned(&["MONDO:0007254"], &["Disease"]))
        .with_node("drug", QNode::pinned(&["CHEMBL:CHEMBL3545252"], &["Drug"]))
        .with_edge("e0", QEdge::new("disease", "drug", &["treated_by"]));
    validate(&resolve(&graph, &catalog, &ontology())?, &catalog)?;
    Ok(())
}

// Different capability versions can answer the same graph differently.
#[test]
fn repository_serves_catalog_per_version() -> Result<()> {
    let mut repository = CatalogRepository::default();
    repository.register(CatalogKey("v1".into()), catalog());
    let mut wider = base_meta_kg();
    wider.add_edge("Gene", "contributes_to", "Disease");
    repository.register(CatalogKey("v2".into()), Catalog::from_meta_kg(wider)?);

    let v1 = repository.get(&CatalogKey("v1".into())).context("v1 registered")?;
    let v2 = repository.get(&CatalogKey("v2".into())).context("v2 registered")?;
    assert!(resolve(&wildcard_gene_graph(), &v1, &ontology()).is_ok());
    assert!(resolve(&wildcard_gene_graph(), &v2, &ontology()).is_err());
    Ok(())
}

// TRAPI messages carry the query graph under message.query_graph; other
// fields on nodes and edges survive resolution.
#[test]
fn trapi_message_round_trips_through_resolution() -> Result<()> {
    let message = json!({
        "message": {
            "query_graph": {
                "nodes": {
                    "n0": {"ids": ["MONDO:0007254"], "categories": ["biolink:Disease"]},
                    "n1": {"categories": ["biolink:Gene"], "is_set": false}
                },
                "edges": {
                    "e0": {"subject": "n1", "object": "n0", "predicates": ["biolink:related_to"],
                           "knowledge_type": "inferred"}
                }
            }
        }
    });
    let graph = QueryGraph::from_json(&message.to_string())?;
    let resolved = process(&graph, &catalog(), &ontology())?;
    let value = serde_json::to_value(&resolved)?;
    assert_eq!(value.pointer("/nodes/n1/is_set"), Some(&Value::Bool(false)));
    assert_eq!(
        value.pointer("/edges/e0/knowledge_type"),
        Some(&Value::from("inferred"))
    );
    assert_eq!(
        value.pointer("/edges/e0/predicates/0"),
        Some(&Value::from("biolink:gene_associated_with_condition"))
    );
    Ok(())
}

#[test]
fn query_graph_loads_from_file() -> Result<()> {
    let file = write_json(&wildcard_gene_graph())?;
    let graph = load_query_graph_from_path(file.path())?;
    assert_eq!(graph, wildcard_gene_graph());

    let broken = write_json(&json!({"nodes": {"n0": {"ids": ["MONDO:1"]}}, "edges": {}}))?;
    let err = load_query_graph_from_path(broken.path()).unwrap_err();
    assert!(format!("{err:#}").contains("schema validation"), "{err:#}");
    Ok(())
}

fn qg_resolve(catalog: &std::path::Path, ontology: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_qg-resolve"));
    for var in [
        "BIOLINK_CATALOG",
        "BIOLINK_LOOKUP_URL",
        "BIOLINK_VERSION",
        "BIOLINK_LOOKUP_TIMEOUT_SECS",
        "BIOLINK_ONTOLOGY_FILE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--catalog")
        .arg(catalog)
        .arg("--ontology-file")
        .arg(ontology);
    cmd
}

// The CLI prints the resolved graph on stdout.
#[test]
fn qg_resolve_prints_resolved_graph() -> Result<()> {
    let catalog_file = write_json(&base_meta_kg())?;
    let ontology_file = write_json(&ontology_document())?;
    let query_file = write_json(&wildcard_gene_graph())?;

    let mut cmd = qg_resolve(catalog_file.path(), ontology_file.path());
    cmd.arg("--file").arg(query_file.path());
    let output = run_command(cmd)?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value.pointer("/nodes/n1/categories/0"), Some(&Value::from("biolink:Gene")));
    Ok(())
}

// Failures are a single JSON object on stderr with a stable error code.
#[test]
fn qg_resolve_reports_typed_failure() -> Result<()> {
    let catalog_file = write_json(&base_meta_kg())?;
    let ontology_file = write_json(&ontology_document())?;
    let query_file = write_json(
        &QueryGraph::new().with_node("n0", QNode::pinned(&["MONDO:0007254"], &["Gene"])),
    )?;

    let mut cmd = qg_resolve(catalog_file.path(), ontology_file.path());
    cmd.arg("--file").arg(query_file.path());
    let output = run_command(cmd)?;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last = stderr.lines().rev().find(|line| !line.trim().is_empty()).context("stderr empty")?;
    let report: Value = serde_json::from_str(last)?;
    assert_eq!(report["error"], "UNSUPPORTED_CATEGORY_ANCESTORS");
    assert!(report["detail"].as_str().unwrap().contains("biolink:Gene"));
    Ok(())
}

// metakg-check merges comma-listed catalogs and mirrors invertible edges.
#[test]
fn metakg_check_summarizes_merged_catalogs() -> Result<()> {
    let base = write_json(&base_meta_kg())?;
    let extra = write_json(&json!({
        "nodes": {
            "biolink:Gene": {"id_prefixes": ["HGNC"]},
            "biolink:Disease": {"id_prefixes": ["MONDO"]}
        },
        "edges": [
            {"subject": "biolink:Gene", "predicate": "biolink:contributes_to", "object": "biolink:Disease"}
        ]
    }))?;
    let ontology_file = write_json(&ontology_document())?;

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_metakg-check"));
    cmd.env_remove("BIOLINK_CATALOG")
        .env_remove("BIOLINK_ONTOLOGY_FILE")
        .arg("--catalog")
        .arg(format!("{},{}", base.path().display(), extra.path().display()))
        .arg("--expand-inverses")
        .arg("--ontology-file")
        .arg(ontology_file.path());
    let output = run_command(cmd)?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(summary["categories"], 3);
    assert_eq!(summary["id_prefixes"], 5);
    // Three base edges, one merged in, one inverse of treats.
    assert_eq!(summary["edges"], 5);
    assert_eq!(summary["predicates"], 5);
    Ok(())
}
