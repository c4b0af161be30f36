//! Shared JSON Schema loader for catalog and query-graph documents.
//!
//! Both document kinds ship an embedded schema; callers may also point at a
//! schema on disk. The loader checks the schema's `$id` against the expected
//! document kind before compiling, so a catalog can never be checked with the
//! query-graph schema by accident.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

pub(crate) const META_KG_SCHEMA: &str = include_str!("../schema/meta_knowledge_graph.schema.json");
pub(crate) const QUERY_GRAPH_SCHEMA: &str = include_str!("../schema/query_graph.schema.json");

pub(crate) const META_KG_SCHEMA_ID: &str = "biolink_resolver/meta_knowledge_graph";
pub(crate) const QUERY_GRAPH_SCHEMA_ID: &str = "biolink_resolver/query_graph";

/// Result of loading and compiling a JSON Schema.
pub(crate) struct SchemaLoadResult {
    pub schema_id: String,
    pub compiled: JSONSchema,
}

/// Controls how schemas are checked before compilation.
pub(crate) struct SchemaLoadOptions<'a> {
    /// Where to find the identifier inside the schema payload.
    pub schema_id_pointer: &'a str,
    /// Reject schemas whose identifier differs from this value.
    pub expected_id: Option<&'a str>,
}

impl<'a> Default for SchemaLoadOptions<'a> {
    fn default() -> Self {
        Self {
            schema_id_pointer: "/$id",
            expected_id: None,
        }
    }
}

/// Compile one of the schemas embedded in the crate.
pub(crate) fn embedded_schema(text: &str, expected_id: &str) -> Result<SchemaLoadResult> {
    let value: Value =
        serde_json::from_str(text).with_context(|| format!("parsing embedded schema {expected_id}"))?;
    compile_schema(
        value,
        expected_id,
        SchemaLoadOptions {
            expected_id: Some(expected_id),
            ..Default::default()
        },
    )
}

/// Read and compile a schema from disk.
pub(crate) fn load_json_schema(
    path: &Path,
    options: SchemaLoadOptions<'_>,
) -> Result<SchemaLoadResult> {
    let value: Value = serde_json::from_reader(
        File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
    )
    .with_context(|| format!("parsing schema {}", path.display()))?;
    compile_schema(value, &path.display().to_string(), options)
}

fn compile_schema(
    schema: Value,
    label: &str,
    options: SchemaLoadOptions<'_>,
) -> Result<SchemaLoadResult> {
    let schema_id = extract_schema_id(&schema, options.schema_id_pointer)
        .ok_or_else(|| anyhow!("schema {label} missing identifier at {}", options.schema_id_pointer))?;

    if let Some(expected) = options.expected_id {
        if schema_id != expected {
            bail!("schema {label} declares '{schema_id}', expected '{expected}'");
        }
    }

    let compiled =
        JSONSchema::compile(&schema).map_err(|err| anyhow!("compiling schema {label}: {err}"))?;

    Ok(SchemaLoadResult {
        schema_id,
        compiled,
    })
}

/// Validate `instance`, joining every violation into one error.
pub(crate) fn validate_document(
    schema: &SchemaLoadResult,
    instance: &Value,
    label: &str,
) -> Result<()> {
    if let Err(errors) = schema.compiled.validate(instance) {
        let details = errors
            .map(|err| format!("{}: {err}", err.instance_path))
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "{label} failed {} schema validation:\n{details}",
            schema.schema_id
        );
    }
    Ok(())
}

fn extract_schema_id(schema: &Value, pointer: &str) -> Option<String> {
    let id = schema.pointer(pointer).and_then(Value::as_str)?;
    if id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/'))
    {
        Some(id.to_string())
    } else {
        None
    }
}
