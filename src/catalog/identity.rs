use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::ResolveError;

/// Namespace applied to bare term names (`Disease` -> `biolink:Disease`).
pub const BIOLINK_NAMESPACE: &str = "biolink";

/// Separator between a CURIE prefix and its local part.
pub const CURIE_SEPARATOR: char = ':';

/// Versioned key for a loaded catalog (e.g. `chp_metakg_v1.2`).
///
/// Used by [`CatalogRepository`](crate::catalog::CatalogRepository) so callers
/// resolve graphs against the catalog snapshot they were written for.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(pub String);

/// Biolink category or predicate in canonical CURIE form.
///
/// Equality, ordering and hashing use the canonical string, so `Disease` and
/// `biolink:Disease` are the same term. Ontology relationships are looked up
/// through [`Ontology`](crate::ontology::Ontology).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SemanticTerm(String);

impl SemanticTerm {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.contains(CURIE_SEPARATOR) {
            Self(trimmed.to_string())
        } else {
            Self(format!("{BIOLINK_NAMESPACE}{CURIE_SEPARATOR}{trimmed}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local part of the CURIE (`Disease` for `biolink:Disease`).
    pub fn name(&self) -> &str {
        self.0
            .split_once(CURIE_SEPARATOR)
            .map(|(_, local)| local)
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for SemanticTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SemanticTerm {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for SemanticTerm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SemanticTerm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        if value.trim().is_empty() {
            return Err(serde::de::Error::custom("semantic term must not be empty"));
        }
        Ok(Self::new(&value))
    }
}

/// Pinned entity identifier such as `MONDO:0007254`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Curie<'a>(&'a str);

impl<'a> Curie<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self(raw)
    }

    /// Namespace of the identifier: everything before the first separator.
    ///
    /// Identifiers without a separator, or with an empty prefix or local part,
    /// are rejected.
    pub fn prefix(&self) -> Result<&'a str, ResolveError> {
        match self.0.trim().split_once(CURIE_SEPARATOR) {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Ok(prefix),
            _ => Err(ResolveError::MalformedIdentifier(self.0.to_string())),
        }
    }
}
