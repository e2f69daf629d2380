//! # MAPCTL CLI
//!
//! Offline driver for the mapping engine. Reads a CRD, a custom resource and
//! optional dependents from files and prints the translation result.
//!
//! ## Usage
//!
//! ```bash
//! # List the references declared for spec.v20250312
//! mapctl --major-version v20250312 references --crd crd.yaml
//!
//! # Build the API request for a custom resource
//! mapctl --major-version v20250312 collapse --crd crd.yaml --object team.yaml --deps secrets.yaml
//!
//! # Write an API response back, printing the resource and its dependents
//! mapctl --major-version v20250312 expand --crd crd.yaml --object team.yaml --api response.json
//! ```

use anyhow::{Context, Result};
use atlas_mapping_engine::crd::load_crd_yaml;
use atlas_mapping_engine::{MapperConfig, MatchPolicy, Translator, TranslatorConfig};
use clap::{Parser, Subcommand};
use kube::core::DynamicObject;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
);

/// Atlas mapping engine CLI
#[derive(Parser)]
#[command(name = "mapctl")]
#[command(
    version,
    long_version = LONG_VERSION,
    about = "Translate generated custom resources to and from API documents",
    long_about = None,
    after_help = "\
Examples:
  mapctl --major-version v20250312 references --crd crd.yaml
  mapctl --major-version v20250312 collapse --crd crd.yaml --object team.yaml
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Served CRD version to translate
    #[arg(long, global = true, env = "MAPCTL_CRD_VERSION", default_value = "v1")]
    crd_version: String,

    /// API major version under spec (e.g. v20250312)
    #[arg(long, global = true, env = "MAPCTL_MAJOR_VERSION")]
    major_version: Option<String>,

    /// Array matching policy: first-match or unique
    #[arg(long, global = true, env = "MAPCTL_MATCH_POLICY", default_value = "first-match")]
    match_policy: MatchPolicy,
}

#[derive(Subcommand)]
enum Commands {
    /// List the references declared for the major version
    References {
        /// CRD file (YAML or JSON)
        #[arg(long, value_name = "FILE")]
        crd: PathBuf,
    },
    /// Print the API request for a custom resource (JSON)
    Collapse {
        /// CRD file (YAML or JSON)
        #[arg(long, value_name = "FILE")]
        crd: PathBuf,

        /// Custom resource file
        #[arg(long, value_name = "FILE")]
        object: PathBuf,

        /// Multi-document YAML file with the referenced objects
        #[arg(long, value_name = "FILE")]
        deps: Option<PathBuf>,
    },
    /// Write an API response into a custom resource (YAML stream)
    Expand {
        /// CRD file (YAML or JSON)
        #[arg(long, value_name = "FILE")]
        crd: PathBuf,

        /// Custom resource file
        #[arg(long, value_name = "FILE")]
        object: PathBuf,

        /// API response document (JSON or YAML)
        #[arg(long, value_name = "FILE")]
        api: PathBuf,

        /// Multi-document YAML file with the known dependents
        #[arg(long, value_name = "FILE")]
        deps: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mapctl=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mapper = MapperConfig {
        match_policy: cli.match_policy,
    };

    match cli.command {
        Commands::References { crd } => {
            let translator = translator(&crd, &cli.crd_version, cli.major_version, mapper)?;
            for site in translator.references() {
                let kube = &site.mapping.kubernetes;
                println!(
                    "{}\t{}\t{}",
                    site.path,
                    kube.kube_type.gvk(),
                    site.mapping.openapi.property
                );
            }
        }
        Commands::Collapse { crd, object, deps } => {
            let translator = translator(&crd, &cli.crd_version, cli.major_version, mapper)?;
            let main = load_object(&object)?;
            let deps = load_deps(deps.as_deref())?;
            let request = translator
                .to_api(&main, deps)
                .with_context(|| format!("Failed to collapse {}", object.display()))?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Commands::Expand {
            crd,
            object,
            api,
            deps,
        } => {
            let translator = translator(&crd, &cli.crd_version, cli.major_version, mapper)?;
            let mut main = load_object(&object)?;
            let response: serde_json::Value = serde_yaml::from_str(&read(&api)?)
                .with_context(|| format!("Failed to parse API document {}", api.display()))?;
            let deps = load_deps(deps.as_deref())?;
            let added = translator
                .from_api(&mut main, &response, deps)
                .with_context(|| format!("Failed to expand into {}", object.display()))?;
            info!(dependents = added.len(), "Expansion complete");

            print!("{}", serde_yaml::to_string(&main)?);
            for dependent in &added {
                println!("---");
                print!("{}", serde_yaml::to_string(dependent)?);
            }
        }
    }

    Ok(())
}

fn translator(
    crd: &Path,
    crd_version: &str,
    major_version: Option<String>,
    mapper: MapperConfig,
) -> Result<Translator> {
    let major_version = major_version
        .context("--major-version (or MAPCTL_MAJOR_VERSION) is required")?;
    let crd = load_crd_yaml(&read(crd)?)
        .with_context(|| format!("Failed to load CRD {}", crd.display()))?;
    let config = TranslatorConfig {
        crd_version: crd_version.to_string(),
        major_version,
        mapper,
    };
    let translator = Translator::new(&crd, config).context("Failed to build translator")?;
    debug!(gvk = ?translator.gvk(), "Translator ready");
    Ok(translator)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_object(path: &Path) -> Result<DynamicObject> {
    serde_yaml::from_str(&read(path)?)
        .with_context(|| format!("Failed to parse Kubernetes object {}", path.display()))
}

fn load_deps(path: Option<&Path>) -> Result<Vec<DynamicObject>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = read(path)?;
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&text) {
        let value = serde_yaml::Value::deserialize(document)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if value.is_null() {
            continue;
        }
        objects.push(
            serde_yaml::from_value(value)
                .with_context(|| format!("Failed to parse Kubernetes object in {}", path.display()))?,
        );
    }
    debug!(count = objects.len(), "Loaded dependents");
    Ok(objects)
}
