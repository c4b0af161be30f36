//! Biolink lookup service client.
//!
//! Issues blocking `GET <base>/<term>/descendants?version=<v>` and
//! `GET <base>/<term>?version=<v>` requests. A 404 means the service does not
//! know the term, which is reported as "no descendants" / "no inverse" rather
//! than as a failure.

use crate::catalog::SemanticTerm;
use crate::config::ResolverConfig;
use crate::error::OracleError;
use crate::ontology::Ontology;
use anyhow::{Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ElementInfo {
    #[serde(default)]
    inverse: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpOntology {
    client: Client,
    base_url: String,
    version: String,
}

impl HttpOntology {
    pub fn new(base_url: &str, version: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("failed to build http client: {e}"))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.to_string(),
        })
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        Self::new(&config.lookup_url, &config.biolink_version, config.lookup_timeout)
    }

    pub fn descendants_url(&self, term: &SemanticTerm) -> String {
        format!(
            "{}/{}/descendants?version={}",
            self.base_url, term, self.version
        )
    }

    pub fn element_url(&self, term: &SemanticTerm) -> String {
        format!("{}/{}?version={}", self.base_url, term, self.version)
    }

    /// Fetch `url`; `Ok(None)` when the service answers 404.
    fn fetch(&self, term: &SemanticTerm, url: &str) -> Result<Option<Response>, OracleError> {
        tracing::debug!(%term, url, "ontology lookup");
        let response = self.client.get(url).send().map_err(|source| {
            if source.is_timeout() {
                OracleError::Timeout {
                    term: term.to_string(),
                }
            } else {
                OracleError::Transport {
                    term: term.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::warn!(%term, "ontology service does not know term");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(OracleError::Status {
                term: term.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(Some(response))
    }
}

impl Ontology for HttpOntology {
    fn descendants(&self, term: &SemanticTerm) -> Result<Vec<SemanticTerm>, OracleError> {
        let Some(response) = self.fetch(term, &self.descendants_url(term))? else {
            return Ok(Vec::new());
        };
        let names: Vec<String> = response.json().map_err(|e| OracleError::Decode {
            term: term.to_string(),
            message: e.to_string(),
        })?;
        Ok(names.iter().map(|name| SemanticTerm::new(name)).collect())
    }

    fn inverse(&self, predicate: &SemanticTerm) -> Result<Option<SemanticTerm>, OracleError> {
        let Some(response) = self.fetch(predicate, &self.element_url(predicate))? else {
            return Ok(None);
        };
        let info: ElementInfo = response.json().map_err(|e| OracleError::Decode {
            term: predicate.to_string(),
            message: e.to_string(),
        })?;
        Ok(info
            .inverse
            .filter(|name| !name.trim().is_empty())
            .map(|name| predicate_term(&name)))
    }
}

/// Element names come back space-separated ("treated by"); predicates are
/// snake_case CURIEs.
fn predicate_term(name: &str) -> SemanticTerm {
    SemanticTerm::new(&name.trim().replace(' ', "_"))
}
