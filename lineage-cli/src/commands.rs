//! Subcommand handlers.

use anyhow::{bail, Context};
use indexmap::IndexMap;
use lineage::artifact::{LineageGraph, Task, TrackedArtifact};
use lineage::config::LineageConfig;
use lineage::export::Exporter;
use lineage::recipe::{build_recipe_provenance, RecipeDocumentation};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Build the recipe document and export it into a directory
    Recipe {
        /// Documentation record (YAML)
        documentation: PathBuf,

        /// Directory receiving provenance.{xml,png,pdf}
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Initialize and export the lineage of artifacts listed in a manifest
    Artifacts {
        /// Manifest of `{identity, attributes, ancestors}` entries (YAML)
        manifest: PathBuf,

        /// Task credited with the artifacts
        #[arg(short, long)]
        task: String,

        /// Only these identities (default: every artifact nothing derives from)
        #[arg(long)]
        only: Vec<String>,
    },
}

/// One artifact listed in a manifest.
#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub identity: String,
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub ancestors: Vec<String>,
}

pub fn handle_command(command: Command, config: LineageConfig) -> anyhow::Result<()> {
    let exporter = Exporter::new(config);
    match command {
        Command::Recipe {
            documentation,
            output_dir,
        } => {
            let text = std::fs::read_to_string(&documentation)
                .with_context(|| format!("Failed to read {}", documentation.display()))?;
            let written = run_recipe(&text, &output_dir, &exporter)?;
            for path in written {
                println!("{}", path.display());
            }
        }
        Command::Artifacts {
            manifest,
            task,
            only,
        } => {
            let text = std::fs::read_to_string(&manifest)
                .with_context(|| format!("Failed to read {}", manifest.display()))?;
            let exported = run_artifacts(&text, &task, &only, &exporter)?;
            for identity in exported {
                println!("{identity}");
            }
        }
    }
    Ok(())
}

pub fn run_recipe(
    documentation: &str,
    output_dir: &Path,
    exporter: &Exporter,
) -> anyhow::Result<Vec<PathBuf>> {
    let documentation = RecipeDocumentation::from_yaml_str(documentation)?;
    let document = build_recipe_provenance(&documentation, exporter.config())?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    Ok(exporter.export_document(&document, output_dir)?)
}

/// Returns the exported identities in order.
pub fn run_artifacts(
    manifest: &str,
    task: &str,
    only: &[String],
    exporter: &Exporter,
) -> anyhow::Result<Vec<String>> {
    let entries: Vec<ManifestEntry> =
        serde_yaml::from_str(manifest).context("Invalid artifact manifest")?;

    let mut graph: LineageGraph = LineageGraph::with_config(exporter.config());
    for entry in entries {
        graph.track(
            TrackedArtifact::new(entry.identity, entry.attributes).with_ancestors(entry.ancestors),
        )?;
    }

    let selected: Vec<String> = if only.is_empty() {
        graph.terminals().map(str::to_string).collect()
    } else {
        if let Some(missing) = only.iter().find(|id| !graph.contains(id)) {
            bail!("'{missing}' is not listed in the manifest");
        }
        only.to_vec()
    };

    let task = Task::new(task);
    for identity in &selected {
        if !graph.is_initialized(identity)? {
            graph.initialize_lineage(identity, &task)?;
        }
    }
    for identity in &selected {
        graph.export_lineage(identity, exporter)?;
    }

    info!(exported = selected.len(), "Exported artifact provenance");
    Ok(selected)
}
