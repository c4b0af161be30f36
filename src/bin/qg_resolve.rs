//! Resolve a query graph against a capability catalog.
//!
//! Reads a query graph (or a TRAPI message carrying one) from a file or
//! stdin, narrows its categories and predicates, validates the result and
//! prints the resolved graph as JSON. Failures are printed to stderr as a
//! `{"error": KIND, "detail": MESSAGE}` object and exit with status 1.

use anyhow::{Context, Result, anyhow, bail};
use biolink_resolver::config::parse_timeout;
use biolink_resolver::{
    Catalog, CatalogSource, ProcessError, QueryGraph, ResolverConfig, ValidationError,
    init_logging, load_query_graph_from_path, ontology_from_config, process, resolve,
    validate_all,
};
use serde_json::json;
use std::env;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;

fn main() {
    let args = match CliArgs::parse(env::args_os().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err:#}");
            eprint!("{}", usage());
            std::process::exit(2);
        }
    };
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => {}
        Err(Failure::Process(err)) => {
            report("process", err.kind(), &err.to_string(), None);
            std::process::exit(1);
        }
        Err(Failure::Invalid(errors)) => {
            let kind = errors.first().map_or("VALIDATION_ERROR", |err| err.kind());
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            let first = details.first().cloned().unwrap_or_default();
            report("validate", kind, &first, Some(details));
            std::process::exit(1);
        }
        Err(Failure::Setup(err)) => {
            report("setup", "SETUP_ERROR", &format!("{err:#}"), None);
            std::process::exit(1);
        }
    }
}

enum Failure {
    Setup(anyhow::Error),
    Process(ProcessError),
    Invalid(Vec<ValidationError>),
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Setup(err)
    }
}

fn report(stage: &str, kind: &str, detail: &str, all: Option<Vec<String>>) {
    let mut body = json!({ "stage": stage, "error": kind, "detail": detail });
    if let Some(all) = all {
        body["violations"] = json!(all);
    }
    eprintln!("{body}");
}

fn run(args: CliArgs) -> Result<(), Failure> {
    let mut config = ResolverConfig::from_env()?;
    args.apply(&mut config);

    let catalog_source = config
        .catalog
        .clone()
        .ok_or_else(|| anyhow!("no catalog given; pass --catalog or set BIOLINK_CATALOG"))?;
    let catalog = Catalog::load(&catalog_source).map_err(|err| Failure::Setup(err.into()))?;
    let ontology = ontology_from_config(&config)?;

    let graph = args.source.load()?;

    let resolved = match process(&graph, &catalog, ontology.as_ref()) {
        Ok(resolved) => resolved,
        // Re-run the validator in collecting mode so the report lists every
        // violation, not just the first.
        Err(ProcessError::Validate(_)) if args.report_all => {
            let resolved = resolve(&graph, &catalog, ontology.as_ref())
                .map_err(|err| Failure::Process(err.into()))?;
            return Err(Failure::Invalid(validate_all(&resolved, &catalog)));
        }
        Err(err) => return Err(Failure::Process(err)),
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&resolved)
    } else {
        serde_json::to_string(&resolved)
    }
    .context("serializing resolved query graph")?;
    println!("{output}");
    Ok(())
}

struct CliArgs {
    source: InputSource,
    catalog: Option<String>,
    ontology_file: Option<PathBuf>,
    lookup_url: Option<String>,
    biolink_version: Option<String>,
    timeout: Option<std::time::Duration>,
    pretty: bool,
    report_all: bool,
    verbose: bool,
}

enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    fn load(&self) -> Result<QueryGraph> {
        match self {
            InputSource::File(path) => {
                if !path.is_file() {
                    bail!("input file not found: {}", path.display());
                }
                load_query_graph_from_path(path)
            }
            InputSource::Stdin => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading stdin")?;
                if buf.trim().is_empty() {
                    bail!("No input provided on stdin");
                }
                QueryGraph::from_json(&buf)
            }
        }
    }
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = OsString>) -> Result<Self> {
        let mut source: Option<InputSource> = None;
        let mut parsed = CliArgs {
            source: InputSource::Stdin,
            catalog: None,
            ontology_file: None,
            lookup_url: None,
            biolink_version: None,
            timeout: None,
            pretty: false,
            report_all: false,
            verbose: false,
        };

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--file" => {
                    let path = next_value(&mut args, "--file")?;
                    if source.is_some() {
                        bail!("--file/--stdin may only be provided once");
                    }
                    source = Some(InputSource::File(PathBuf::from(path)));
                }
                "--stdin" => {
                    if source.is_some() {
                        bail!("--file/--stdin may only be provided once");
                    }
                    source = Some(InputSource::Stdin);
                }
                "--catalog" => parsed.catalog = Some(next_value(&mut args, "--catalog")?),
                "--ontology-file" => {
                    parsed.ontology_file =
                        Some(PathBuf::from(next_value(&mut args, "--ontology-file")?));
                }
                "--lookup-url" => parsed.lookup_url = Some(next_value(&mut args, "--lookup-url")?),
                "--biolink-version" => {
                    parsed.biolink_version = Some(next_value(&mut args, "--biolink-version")?);
                }
                "--timeout" => {
                    let raw = next_value(&mut args, "--timeout")?;
                    parsed.timeout =
                        Some(parse_timeout(&raw).context("invalid --timeout")?);
                }
                "--pretty" => parsed.pretty = true,
                "--all" => parsed.report_all = true,
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        if let Some(source) = source {
            parsed.source = source;
        }
        Ok(parsed)
    }

    /// Command-line values win over the environment.
    fn apply(&self, config: &mut ResolverConfig) {
        if let Some(raw) = &self.catalog {
            config.catalog = Some(CatalogSource::parse(raw));
        }
        if let Some(path) = &self.ontology_file {
            config.ontology_file = Some(path.clone());
        }
        if let Some(url) = &self.lookup_url {
            config.lookup_url = url.clone();
        }
        if let Some(version) = &self.biolink_version {
            config.biolink_version = version.clone();
        }
        if let Some(timeout) = self.timeout {
            config.lookup_timeout = timeout;
        }
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
    "Usage: qg-resolve [--file PATH|--stdin] [--catalog PATH|URL] [--ontology-file PATH]\n\
                  [--lookup-url URL] [--biolink-version V] [--timeout SECS] [--pretty] [--all] [--verbose]\n\
Resolves the categories and predicates of a query graph against a capability catalog,\n\
validates the result and prints the resolved graph as JSON.\n\
Defaults come from BIOLINK_CATALOG, BIOLINK_ONTOLOGY_FILE, BIOLINK_LOOKUP_URL,\n\
BIOLINK_VERSION and BIOLINK_LOOKUP_TIMEOUT_SECS.\n"
}
