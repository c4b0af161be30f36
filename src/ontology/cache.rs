//! Memoizing wrapper around any ontology.
//!
//! The ontology is versioned and static for a catalog's lifetime, so entries
//! never expire. Failed lookups are not cached.

use crate::catalog::SemanticTerm;
use crate::error::OracleError;
use crate::ontology::Ontology;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct CachedOntology<O> {
    inner: O,
    descendants: Mutex<HashMap<SemanticTerm, Vec<SemanticTerm>>>,
    inverses: Mutex<HashMap<SemanticTerm, Option<SemanticTerm>>>,
    misses: AtomicUsize,
}

impl<O: Ontology> CachedOntology<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            descendants: Mutex::new(HashMap::new()),
            inverses: Mutex::new(HashMap::new()),
            misses: AtomicUsize::new(0),
        }
    }

    /// Number of lookups forwarded to the wrapped ontology.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<O: Ontology> Ontology for CachedOntology<O> {
    fn descendants(&self, term: &SemanticTerm) -> Result<Vec<SemanticTerm>, OracleError> {
        {
            let cache = self.descendants.lock().unwrap_or_else(|err| err.into_inner());
            if let Some(hit) = cache.get(term) {
                return Ok(hit.clone());
            }
        }
        // The lock is not held across the lookup; concurrent misses for the
        // same term may both reach the wrapped ontology.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let found = self.inner.descendants(term)?;
        self.descendants
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .insert(term.clone(), found.clone());
        Ok(found)
    }

    fn inverse(&self, predicate: &SemanticTerm) -> Result<Option<SemanticTerm>, OracleError> {
        {
            let cache = self.inverses.lock().unwrap_or_else(|err| err.into_inner());
            if let Some(hit) = cache.get(predicate) {
                return Ok(hit.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let found = self.inner.inverse(predicate)?;
        self.inverses
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .insert(predicate.clone(), found.clone());
        Ok(found)
    }
}
