//! Narrows node categories and edge predicates of a query graph.
//!
//! Resolution runs three phases in a fixed order: pinned nodes (identifier
//! prefixes decide the category), pinned edges (the catalog decides the
//! predicate between two pinned categories), then wildcards (the catalog
//! edges around the anchor node must yield exactly one candidate). Every
//! phase works on a private copy; the caller only ever sees a fully resolved
//! graph or an error.

use crate::catalog::{Catalog, Curie, SemanticTerm};
use crate::error::ResolveError;
use crate::ontology::{CachedOntology, Ontology};
use crate::query_graph::{QEdge, QNode, QueryGraph};
use std::collections::BTreeSet;

/// Resolve `graph` into a new, fully narrowed graph.
pub fn resolve(
    graph: &QueryGraph,
    catalog: &Catalog,
    ontology: &dyn Ontology,
) -> Result<QueryGraph, ResolveError> {
    Resolver::new(catalog, ontology).resolve(graph)
}

/// Resolve `graph` in place. On error the graph is left exactly as it was.
pub fn resolve_in_place(
    graph: &mut QueryGraph,
    catalog: &Catalog,
    ontology: &dyn Ontology,
) -> Result<(), ResolveError> {
    *graph = resolve(graph, catalog, ontology)?;
    Ok(())
}

/// One resolution run. Ontology answers are memoized for the lifetime of the
/// resolver, so reuse an instance across graphs to share lookups.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    ontology: CachedOntology<&'a dyn Ontology>,
}

struct WildcardMatch {
    predicate: SemanticTerm,
    category: SemanticTerm,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, ontology: &'a dyn Ontology) -> Self {
        Self {
            catalog,
            ontology: CachedOntology::new(ontology),
        }
    }

    /// Lookups forwarded to the underlying ontology so far.
    pub fn ontology_lookups(&self) -> usize {
        self.ontology.misses()
    }

    pub fn resolve(&self, graph: &QueryGraph) -> Result<QueryGraph, ResolveError> {
        graph.check_structure()?;
        let mut working = graph.clone();
        self.narrow_pinned_nodes(&mut working)?;
        self.narrow_pinned_edges(&mut working)?;
        self.resolve_wildcards(&mut working)?;
        ensure_fully_typed(&working)?;
        tracing::info!(
            nodes = working.nodes.len(),
            edges = working.edges.len(),
            lookups = self.ontology_lookups(),
            "resolved query graph"
        );
        Ok(working)
    }

    fn narrow_pinned_nodes(&self, graph: &mut QueryGraph) -> Result<(), ResolveError> {
        for (id, node) in graph.nodes.iter_mut() {
            if node.is_wildcard() {
                continue;
            }
            // Unknown prefixes leave the node as declared; a single declared
            // category goes on to the validator.
            let Some(expected) = self.expected_node_category(id, node)? else {
                continue;
            };
            if !node.categories.contains(&expected) {
                if !self.any_strict_ancestor(&node.categories, &expected)? {
                    return Err(ResolveError::UnsupportedCategoryAncestors(
                        node.categories.clone(),
                    ));
                }
                tracing::debug!(node = %id, declared = ?node.categories, category = %expected, "narrowed pinned node");
            }
            node.narrow_to(expected);
        }
        Ok(())
    }

    fn expected_node_category(
        &self,
        id: &str,
        node: &QNode,
    ) -> Result<Option<SemanticTerm>, ResolveError> {
        let mut expected: Vec<SemanticTerm> = Vec::new();
        for raw in node.ids() {
            let prefix = Curie::new(raw).prefix()?;
            if let Some(category) = self.catalog.expected_category(prefix) {
                if !expected.contains(category) {
                    expected.push(category.clone());
                }
            }
        }
        if expected.len() > 1 {
            return Err(ResolveError::ConflictingIdentifierPrefixes {
                node: id.to_string(),
                categories: expected,
            });
        }
        Ok(expected.pop())
    }

    fn narrow_pinned_edges(&self, graph: &mut QueryGraph) -> Result<(), ResolveError> {
        let QueryGraph { nodes, edges } = graph;
        for (id, edge) in edges.iter_mut() {
            let (Some(subject), Some(object)) = (nodes.get(&edge.subject), nodes.get(&edge.object))
            else {
                continue;
            };
            if subject.is_wildcard() || object.is_wildcard() {
                continue;
            }
            // An endpoint still carrying several categories (unknown prefix)
            // fails the final completeness check instead.
            let (Some(subject_category), Some(object_category)) =
                (subject.category(), object.category())
            else {
                continue;
            };
            let candidates = self
                .catalog
                .predicates_between(subject_category, object_category);
            // Unjoined pairs are reported by the validator.
            if candidates.is_empty() {
                continue;
            }
            let predicate = self.select_predicate(&edge.predicates, candidates)?;
            if edge.predicate() != Some(&predicate) {
                tracing::debug!(edge = %id, declared = ?edge.predicates, %predicate, "narrowed pinned edge");
            }
            edge.narrow_to(predicate);
        }
        Ok(())
    }

    /// Pick the one catalog predicate covered by the declared predicates.
    fn select_predicate(
        &self,
        declared: &[SemanticTerm],
        candidates: &[SemanticTerm],
    ) -> Result<SemanticTerm, ResolveError> {
        let mut matched = Vec::new();
        for candidate in candidates {
            if self.any_descendant_or_self(declared, candidate)? {
                matched.push(candidate.clone());
            }
        }
        match matched.len() {
            0 => Err(ResolveError::UnsupportedPredicateAncestor(declared.to_vec())),
            1 => Ok(matched.remove(0)),
            _ => Err(ResolveError::IndeterminablePredicateDescendent(
                declared.to_vec(),
            )),
        }
    }

    fn resolve_wildcards(&self, graph: &mut QueryGraph) -> Result<(), ResolveError> {
        let wildcard_ids: Vec<String> = graph
            .nodes
            .iter()
            .filter(|(_, node)| node.is_wildcard())
            .map(|(id, _)| id.clone())
            .collect();

        for node_id in wildcard_ids {
            let edge_ids: Vec<String> = graph
                .incident_edges(&node_id)
                .into_iter()
                .map(str::to_string)
                .collect();
            if edge_ids.is_empty() {
                return Err(ResolveError::DisconnectedWildcard(node_id));
            }
            let declared = node_categories(graph, &node_id)?.to_vec();

            let mut assignments: Vec<(String, WildcardMatch)> = Vec::with_capacity(edge_ids.len());
            for edge_id in edge_ids {
                let edge = graph.edges.get(&edge_id).ok_or_else(|| {
                    ResolveError::MalformedGraph(format!("edge {edge_id} disappeared"))
                })?;
                let matched = self.match_wildcard_edge(graph, &node_id, &declared, edge)?;
                assignments.push((edge_id, matched));
            }

            // Every adjacent edge must agree on the wildcard's category.
            let category = assignments[0].1.category.clone();
            if assignments
                .iter()
                .any(|(_, matched)| matched.category != category)
            {
                return Err(ResolveError::IndeterminableWildcardDescendent(declared));
            }

            tracing::debug!(node = %node_id, declared = ?declared, %category, "resolved wildcard");
            if let Some(node) = graph.nodes.get_mut(&node_id) {
                node.narrow_to(category);
            }
            for (edge_id, matched) in assignments {
                if let Some(edge) = graph.edges.get_mut(&edge_id) {
                    edge.narrow_to(matched.predicate);
                }
            }
        }
        Ok(())
    }

    /// Count the (predicate, category) assignments around the anchor that
    /// both the wildcard's categories and the edge's predicates cover. The
    /// same assignment reached through several anchor categories or declared
    /// terms counts once.
    fn match_wildcard_edge(
        &self,
        graph: &QueryGraph,
        node_id: &str,
        declared: &[SemanticTerm],
        edge: &QEdge,
    ) -> Result<WildcardMatch, ResolveError> {
        let wildcard_is_subject = edge.subject == node_id;
        let anchor_id = if wildcard_is_subject {
            &edge.object
        } else {
            &edge.subject
        };
        let anchors = node_categories(graph, anchor_id)?;

        let mut matches: BTreeSet<(SemanticTerm, SemanticTerm)> = BTreeSet::new();
        let mut category_covered = false;
        for anchor in anchors {
            let candidates = if wildcard_is_subject {
                self.catalog.wildcard_candidates(anchor)
            } else {
                self.catalog.wildcard_candidates_for_subject(anchor)
            };
            for (predicate, counterpart) in candidates {
                if !self.any_descendant_or_self(declared, counterpart)? {
                    continue;
                }
                category_covered = true;
                if self.any_descendant_or_self(&edge.predicates, predicate)? {
                    matches.insert((predicate.clone(), counterpart.clone()));
                }
            }
        }

        let mut matches = matches.into_iter();
        match (matches.next(), matches.next()) {
            (Some((predicate, category)), None) => Ok(WildcardMatch {
                predicate,
                category,
            }),
            (Some(_), Some(_)) => Err(ResolveError::IndeterminableWildcardDescendent(
                declared.to_vec(),
            )),
            (None, _) if !category_covered => Err(ResolveError::UnsupportedCategoryAncestors(
                declared.to_vec(),
            )),
            (None, _) => Err(ResolveError::UnsupportedPredicateAncestor(
                edge.predicates.clone(),
            )),
        }
    }

    fn any_descendant_or_self(
        &self,
        ancestors: &[SemanticTerm],
        target: &SemanticTerm,
    ) -> Result<bool, ResolveError> {
        for ancestor in ancestors {
            if self.ontology.is_descendant_or_self(ancestor, target)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn any_strict_ancestor(
        &self,
        ancestors: &[SemanticTerm],
        target: &SemanticTerm,
    ) -> Result<bool, ResolveError> {
        for ancestor in ancestors {
            if self.ontology.descendants(ancestor)?.contains(target) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Every node must end with one category and every edge with one predicate.
fn ensure_fully_typed(graph: &QueryGraph) -> Result<(), ResolveError> {
    for (id, node) in &graph.nodes {
        if node.category().is_none() {
            return Err(ResolveError::UnresolvedNode {
                node: id.clone(),
                categories: node.categories.clone(),
            });
        }
    }
    for (id, edge) in &graph.edges {
        if edge.predicate().is_none() {
            return Err(ResolveError::UnresolvedEdge {
                edge: id.clone(),
                predicates: edge.predicates.clone(),
            });
        }
    }
    Ok(())
}

fn node_categories<'g>(graph: &'g QueryGraph, id: &str) -> Result<&'g [SemanticTerm], ResolveError> {
    graph
        .nodes
        .get(id)
        .map(|node| node.categories.as_slice())
        .ok_or_else(|| ResolveError::MalformedGraph(format!("missing node {id}")))
}
