//! Conformance checks for a resolved query graph.
//!
//! `validate` stops at the first violation; `validate_all` keeps going so a
//! report can show every problem at once. Both walk nodes then edges in key
//! order, so the first entry of `validate_all` is what `validate` returns.

use crate::catalog::{Catalog, Curie};
use crate::error::ValidationError;
use crate::query_graph::{QNode, QueryGraph};
use std::collections::BTreeSet;

pub fn validate(graph: &QueryGraph, catalog: &Catalog) -> Result<(), ValidationError> {
    match validate_all(graph, catalog).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn validate_all(graph: &QueryGraph, catalog: &Catalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (id, node) in &graph.nodes {
        check_node(id, node, catalog, &mut errors);
    }

    for (id, edge) in &graph.edges {
        let mut endpoints = Vec::with_capacity(2);
        for endpoint in [&edge.subject, &edge.object] {
            match graph.nodes.get(endpoint) {
                Some(node) => endpoints.push(node),
                None => errors.push(ValidationError::DanglingEdge {
                    edge: id.clone(),
                    node: endpoint.clone(),
                }),
            }
        }
        let Some(predicate) = edge.predicate() else {
            errors.push(ValidationError::UnresolvedEdge {
                edge: id.clone(),
                predicates: edge.predicates.clone(),
            });
            continue;
        };
        let [subject, object] = endpoints.as_slice() else {
            continue;
        };
        // Unresolved endpoints were already reported with their node.
        let (Some(subject), Some(object)) = (subject.category(), object.category()) else {
            continue;
        };
        if !catalog.is_supported_triple(subject, predicate, object) {
            errors.push(ValidationError::UnsupportedNodeEdgeRelationship {
                subject: subject.clone(),
                predicate: predicate.clone(),
                object: object.clone(),
            });
        }
    }
    errors
}

fn check_node(id: &str, node: &QNode, catalog: &Catalog, errors: &mut Vec<ValidationError>) {
    // Report each distinct prefix once even when several ids share it.
    let mut prefixes = BTreeSet::new();
    for raw in node.ids() {
        match Curie::new(raw).prefix() {
            Ok(prefix) => {
                if prefixes.insert(prefix) && !catalog.is_supported_prefix(prefix) {
                    errors.push(ValidationError::UnsupportedPrefix(prefix.to_string()));
                }
            }
            Err(_) => errors.push(ValidationError::MalformedIdentifier(raw.clone())),
        }
    }

    let Some(category) = node.category() else {
        errors.push(ValidationError::UnresolvedNode {
            node: id.to_string(),
            categories: node.categories.clone(),
        });
        return;
    };
    if !catalog.is_supported_category(category) {
        errors.push(ValidationError::UnsupportedCategory(category.clone()));
        return;
    }
    for prefix in prefixes {
        if catalog.is_supported_prefix(prefix)
            && !catalog.is_supported_prefix_category_pair(prefix, category)
        {
            errors.push(ValidationError::UnsupportedPrefixCategoryPair {
                prefix: prefix.to_string(),
                category: category.clone(),
            });
        }
    }
}
