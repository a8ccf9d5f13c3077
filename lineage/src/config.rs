//! Configuration for namespaces and exports.

use crate::errors::{LineageError, Result};
use crate::export::ExportFormat;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`LineageConfig::base_uri`].
pub const ENV_BASE_URI: &str = "LINEAGE_BASE_URI";
/// Environment variable overriding [`LineageConfig::graphviz_program`].
pub const ENV_GRAPHVIZ: &str = "LINEAGE_GRAPHVIZ";

/// Settings shared by the artifact tracker, the recipe builder and the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageConfig {
    /// Prefix every namespace URI is built from.
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    /// Suffix appended to an artifact's stem when exporting its lineage.
    #[serde(default = "default_artifact_suffix")]
    pub artifact_suffix: String,
    /// Base file name used for directory-level exports.
    #[serde(default = "default_directory_basename")]
    pub directory_basename: String,
    /// Formats written by a directory-level export.
    #[serde(default = "default_directory_formats")]
    pub directory_formats: Vec<ExportFormat>,
    /// Formats written next to a single artifact.
    #[serde(default = "default_artifact_formats")]
    pub artifact_formats: Vec<ExportFormat>,
    /// Graphviz executable used to render graphs.
    #[serde(default = "default_graphviz_program")]
    pub graphviz_program: String,
}

fn default_base_uri() -> String {
    "http://www.esmvaltool.org/".to_string()
}

fn default_artifact_suffix() -> String {
    "_provenance".to_string()
}

fn default_directory_basename() -> String {
    "provenance".to_string()
}

fn default_directory_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Xml, ExportFormat::Png, ExportFormat::Pdf]
}

fn default_artifact_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Xml, ExportFormat::Png]
}

fn default_graphviz_program() -> String {
    "dot".to_string()
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            artifact_suffix: default_artifact_suffix(),
            directory_basename: default_directory_basename(),
            directory_formats: default_directory_formats(),
            artifact_formats: default_artifact_formats(),
            graphviz_program: default_graphviz_program(),
        }
    }
}

impl LineageConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a YAML document; missing keys take their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| LineageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML file; see [`LineageConfig::from_yaml_str`].
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Applies `LINEAGE_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(uri) = lookup(ENV_BASE_URI) {
            self.base_uri = uri;
        }
        if let Some(program) = lookup(ENV_GRAPHVIZ) {
            self.graphviz_program = program;
        }
        self
    }

    /// Sets the namespace base URI.
    #[must_use]
    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = uri.into();
        self
    }

    /// Sets the artifact export suffix.
    #[must_use]
    pub fn with_artifact_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.artifact_suffix = suffix.into();
        self
    }

    /// Sets the formats written by directory exports.
    #[must_use]
    pub fn with_directory_formats(mut self, formats: Vec<ExportFormat>) -> Self {
        self.directory_formats = formats;
        self
    }

    /// Sets the formats written by artifact exports.
    #[must_use]
    pub fn with_artifact_formats(mut self, formats: Vec<ExportFormat>) -> Self {
        self.artifact_formats = formats;
        self
    }

    /// Sets the Graphviz program.
    #[must_use]
    pub fn with_graphviz_program(mut self, program: impl Into<String>) -> Self {
        self.graphviz_program = program.into();
        self
    }

    /// Checks the configuration for values that would produce broken output.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_uri.ends_with('/') || self.base_uri.ends_with('#')) {
            return Err(LineageError::Config(format!(
                "base_uri must end with '/' or '#', got '{}'",
                self.base_uri
            )));
        }
        if self.artifact_suffix.is_empty() {
            return Err(LineageError::Config("artifact_suffix must not be empty".into()));
        }
        if self.directory_basename.is_empty() {
            return Err(LineageError::Config("directory_basename must not be empty".into()));
        }
        if self.directory_formats.is_empty() || self.artifact_formats.is_empty() {
            return Err(LineageError::Config("export format lists must not be empty".into()));
        }
        Ok(())
    }
}
