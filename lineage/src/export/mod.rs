//! Writing finished provenance documents to disk.
//!
//! Exports are all-or-nothing: every output is produced in memory from one
//! snapshot of the document and staged as a temporary file next to its
//! destination. Files are renamed into place only once every output has been
//! staged, so a rendering or staging failure leaves nothing behind. Files
//! from an earlier export are moved aside while publishing and put back if a
//! later output cannot be placed.

mod renderer;

pub use renderer::{GraphRenderer, GraphvizRenderer};

use crate::config::LineageConfig;
use crate::document::ProvenanceDocument;
use crate::errors::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, info, warn};

/// An on-disk representation of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PROV-XML.
    Xml,
    /// PROV-JSON.
    Json,
    /// Graphviz DOT source.
    Dot,
    /// Rendered PNG image.
    Png,
    /// Rendered PDF.
    Pdf,
    /// Rendered SVG.
    Svg,
}

impl ExportFormat {
    /// File extension (without dot), also the Graphviz `-T` value for images.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Dot => "dot",
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
        }
    }

    /// Returns true if the format needs the graph renderer.
    #[must_use]
    pub fn is_rendered(self) -> bool {
        matches!(self, Self::Png | Self::Pdf | Self::Svg)
    }
}

/// Serializes documents and publishes them as files.
#[derive(Debug)]
pub struct Exporter {
    config: LineageConfig,
    renderer: Box<dyn GraphRenderer>,
}

impl Exporter {
    /// Creates an exporter rendering through the configured Graphviz program.
    #[must_use]
    pub fn new(config: LineageConfig) -> Self {
        let renderer = GraphvizRenderer::new(config.graphviz_program.clone());
        Self::with_renderer(config, renderer)
    }

    /// Creates an exporter with an explicit renderer.
    #[must_use]
    pub fn with_renderer(config: LineageConfig, renderer: impl GraphRenderer + 'static) -> Self {
        Self {
            config,
            renderer: Box::new(renderer),
        }
    }

    /// The exporter's configuration.
    #[must_use]
    pub fn config(&self) -> &LineageConfig {
        &self.config
    }

    /// Writes `<output_dir>/provenance.{xml,png,pdf}` (per configuration).
    pub fn export_document<D: ProvenanceDocument>(
        &self,
        document: &D,
        output_dir: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>> {
        let base = output_dir.as_ref().join(&self.config.directory_basename);
        self.export_with_base(document, &base, &self.config.directory_formats)
    }

    /// Writes one file per format at `<base>.<extension>`.
    ///
    /// Returns the published paths in format order. Files replaced by this
    /// call are restored if a later output cannot be put in place.
    pub fn export_with_base<D: ProvenanceDocument>(
        &self,
        document: &D,
        base: &Path,
        formats: &[ExportFormat],
    ) -> Result<Vec<PathBuf>> {
        let outputs = self.produce(document, base, formats)?;
        let staged = stage(outputs)?;
        publish(staged)
    }

    fn produce<D: ProvenanceDocument>(
        &self,
        document: &D,
        base: &Path,
        formats: &[ExportFormat],
    ) -> Result<Vec<(PathBuf, Vec<u8>)>> {
        let mut dot = None;
        let mut outputs = Vec::with_capacity(formats.len());

        for &format in formats {
            let bytes = match format {
                ExportFormat::Xml => document.to_prov_xml()?.into_bytes(),
                ExportFormat::Json => serde_json::to_vec_pretty(&document.to_prov_json())
                    .map_err(|e| ExportError::Serialization(e.to_string()))?,
                ExportFormat::Dot => dot.get_or_insert_with(|| document.to_dot()).clone().into_bytes(),
                rendered => {
                    let source = dot.get_or_insert_with(|| document.to_dot());
                    self.renderer.render(source.as_str(), rendered)?
                }
            };
            outputs.push((with_extension(base, format), bytes));
        }

        Ok(outputs)
    }
}

/// Derives `<stem><suffix>` from an artifact identity, dropping its extension.
///
/// `out/tas.nc` with suffix `_provenance` becomes `out/tas_provenance`.
#[must_use]
pub fn artifact_base(identity: &str, suffix: &str) -> PathBuf {
    let mut name: OsString = Path::new(identity).with_extension("").into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn with_extension(base: &Path, format: ExportFormat) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn stage(outputs: Vec<(PathBuf, Vec<u8>)>) -> Result<Vec<(PathBuf, NamedTempFile)>> {
    let mut staged = Vec::with_capacity(outputs.len());
    for (path, bytes) in outputs {
        let shown = path.display().to_string();
        let mut tmp = NamedTempFile::new_in(parent_dir(&path))
            .map_err(|e| ExportError::write(&shown, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.flush())
            .map_err(|e| ExportError::write(&shown, e))?;
        debug!(path = %shown, bytes = bytes.len(), "Staged provenance output");
        staged.push((path, tmp));
    }
    Ok(staged)
}

/// A file put in place by [`publish`], with the file it replaced.
struct Published {
    path: PathBuf,
    backup: Option<TempPath>,
}

/// Moves an existing regular file at `path` aside so it can be restored.
///
/// The backup lives next to `path` and is deleted when dropped.
fn set_aside(path: &Path) -> std::result::Result<Option<TempPath>, ExportError> {
    let exists = std::fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_file());
    if !exists {
        return Ok(None);
    }
    let shown = path.display().to_string();
    let backup = tempfile::Builder::new()
        .prefix(".provenance-backup")
        .tempfile_in(parent_dir(path))
        .map_err(|e| ExportError::write(&shown, e))?
        .into_temp_path();
    std::fs::rename(path, &backup).map_err(|e| ExportError::write(&shown, e))?;
    Ok(Some(backup))
}

/// Puts `path` back the way it was before this export touched it.
fn restore(path: &Path, backup: Option<TempPath>) {
    let outcome = match &backup {
        Some(previous) => std::fs::rename(previous, path),
        None => std::fs::remove_file(path),
    };
    if let Err(e) = outcome {
        warn!(path = %path.display(), error = %e, "Failed to roll back provenance output");
    }
}

fn publish(staged: Vec<(PathBuf, NamedTempFile)>) -> Result<Vec<PathBuf>> {
    let mut published: Vec<Published> = Vec::with_capacity(staged.len());
    for (path, tmp) in staged {
        info!(path = %path.display(), "Writing provenance to {}", path.display());
        let outcome = set_aside(&path).and_then(|backup| match tmp.persist(&path) {
            Ok(_) => Ok(backup),
            Err(e) => {
                if let Some(previous) = backup {
                    if let Err(restore_err) = std::fs::rename(&previous, &path) {
                        warn!(path = %path.display(), error = %restore_err, "Failed to restore provenance output");
                    }
                }
                Err(ExportError::write(path.display().to_string(), e.error))
            }
        });
        match outcome {
            Ok(backup) => published.push(Published { path, backup }),
            Err(e) => {
                for done in published.into_iter().rev() {
                    restore(&done.path, done.backup);
                }
                return Err(e.into());
            }
        }
    }
    // Backups are dropped, and deleted, only once every output is in place.
    Ok(published.into_iter().map(|p| p.path).collect())
}
