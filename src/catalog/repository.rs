//! Holds one or more catalogs for lookup by key.
//!
//! A service answering queries for several capability versions registers one
//! catalog per version here and hands out shared read-only handles.

use crate::catalog::identity::CatalogKey;
use crate::catalog::index::Catalog;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
/// In-memory store for catalogs keyed by `CatalogKey`.
pub struct CatalogRepository {
    catalogs: BTreeMap<CatalogKey, Arc<Catalog>>,
}

impl CatalogRepository {
    /// Register a catalog, replacing any previous one under the same key.
    pub fn register(&mut self, key: CatalogKey, catalog: Catalog) -> Arc<Catalog> {
        let shared = Arc::new(catalog);
        self.catalogs.insert(key, Arc::clone(&shared));
        shared
    }

    /// Fetch a catalog by key, if present.
    pub fn get(&self, key: &CatalogKey) -> Option<Arc<Catalog>> {
        self.catalogs.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CatalogKey> {
        self.catalogs.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetaKnowledgeGraph;
    use std::thread;

    fn catalog(prefix: &str) -> Catalog {
        let mut meta_kg = MetaKnowledgeGraph::default();
        meta_kg.add_node("Gene", &[prefix]);
        Catalog::from_meta_kg(meta_kg).unwrap()
    }

    #[test]
    fn catalogs_are_kept_per_version() {
        let mut repository = CatalogRepository::default();
        repository.register(CatalogKey("v1".into()), catalog("ENSEMBL"));
        repository.register(CatalogKey("v2".into()), catalog("NCBIGene"));

        let v1 = repository.get(&CatalogKey("v1".into())).unwrap();
        assert!(v1.is_supported_prefix("ENSEMBL"));
        assert!(!v1.is_supported_prefix("NCBIGene"));
        assert!(repository.get(&CatalogKey("v3".into())).is_none());
        assert_eq!(repository.keys().count(), 2);
    }

    #[test]
    fn shared_catalog_is_readable_across_threads() {
        let mut repository = CatalogRepository::default();
        let shared = repository.register(CatalogKey("v1".into()), catalog("ENSEMBL"));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let catalog = Arc::clone(&shared);
                thread::spawn(move || catalog.is_supported_prefix("ENSEMBL"))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
