//! Load, merge and sanity-check capability catalogs.
//!
//! Each `--catalog` value (a path or URL; comma lists allowed) is schema
//! checked and indexed on its own, then all of them are merged and the merged
//! document is indexed again so prefix clashes between providers surface.
//! Prints a JSON summary, or the merged document with `--dump`.

use anyhow::{Context, Result, anyhow, bail};
use biolink_resolver::{
    Catalog, CatalogSource, MetaKnowledgeGraph, ResolverConfig, init_logging,
    ontology_from_config, split_list,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse(env::args_os().skip(1))?;
    init_logging(args.verbose);

    let mut config = ResolverConfig::from_env()?;
    let mut sources = args.catalogs.clone();
    if sources.is_empty() {
        sources.extend(config.catalog.take());
    }
    if sources.is_empty() {
        bail!("no catalog given; pass --catalog or set BIOLINK_CATALOG");
    }

    let mut documents = Vec::with_capacity(sources.len());
    for source in &sources {
        let catalog = Catalog::load_with_schema(source, args.schema.as_deref())?;
        documents.push(catalog.meta_kg().clone());
    }
    let mut merged = MetaKnowledgeGraph::merge(documents);

    if args.expand_inverses {
        if let Some(path) = &args.ontology_file {
            config.ontology_file = Some(path.clone());
        }
        let ontology = ontology_from_config(&config)?;
        let before = merged.edges.len();
        merged = merged
            .expand_with_inverses(ontology.as_ref())
            .context("expanding catalog with inverse predicates")?;
        tracing::info!(added = merged.edges.len() - before, "expanded catalog with inverses");
    }

    let catalog = Catalog::from_meta_kg(merged).context("indexing merged catalog")?;

    if args.dump {
        println!(
            "{}",
            serde_json::to_string_pretty(catalog.meta_kg()).context("serializing merged catalog")?
        );
        return Ok(());
    }

    let prefixes: BTreeSet<&str> = catalog
        .meta_kg()
        .nodes
        .values()
        .flat_map(|node| node.id_prefixes.iter().map(String::as_str))
        .collect();
    let summary = json!({
        "catalogs": sources.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "categories": catalog.categories().count(),
        "id_prefixes": prefixes.len(),
        "edges": catalog.meta_kg().edges.len(),
        "predicates": catalog.supported_predicates().len(),
    });
    println!("{summary}");
    Ok(())
}

struct CliArgs {
    catalogs: Vec<CatalogSource>,
    schema: Option<PathBuf>,
    ontology_file: Option<PathBuf>,
    expand_inverses: bool,
    dump: bool,
    verbose: bool,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = OsString>) -> Result<Self> {
        let mut parsed = CliArgs {
            catalogs: Vec::new(),
            schema: None,
            ontology_file: None,
            expand_inverses: false,
            dump: false,
            verbose: false,
        };

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--catalog" => {
                    let raw = next_value(&mut args, "--catalog")?;
                    parsed
                        .catalogs
                        .extend(split_list(&raw).iter().map(|s| CatalogSource::parse(s)));
                }
                "--schema" => parsed.schema = Some(PathBuf::from(next_value(&mut args, "--schema")?)),
                "--ontology-file" => {
                    parsed.ontology_file =
                        Some(PathBuf::from(next_value(&mut args, "--ontology-file")?));
                }
                "--expand-inverses" => parsed.expand_inverses = true,
                "--dump" => parsed.dump = true,
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }
        Ok(parsed)
    }
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn usage() -> &'static str {
    "Usage: metakg-check --catalog PATH|URL[,PATH|URL...] [--catalog ...] [--schema PATH]\n\
                    [--expand-inverses [--ontology-file PATH]] [--dump] [--verbose]\n\
Loads and merges capability catalogs, optionally mirrors edges through inverse predicates,\n\
and prints a JSON summary (or the merged document with --dump).\n"
}
