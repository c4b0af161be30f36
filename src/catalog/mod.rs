//! Capability catalog wiring.
//!
//! This module wraps the meta knowledge graph a knowledge provider publishes
//! so the resolver and validator can ask which categories, identifier
//! prefixes and relationships are servable. Types in `model` mirror the
//! document; [`Catalog`] holds the derived lookups and
//! [`CatalogRepository`] keeps several catalog versions side by side.

pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use identity::{CatalogKey, Curie, SemanticTerm};
pub use index::{Catalog, CatalogSource};
pub use model::{MetaEdge, MetaKnowledgeGraph, MetaNode};
pub use repository::CatalogRepository;
