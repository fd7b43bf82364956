/// Configuration module for archetl.
///
/// Handles loading, validating, and providing default configuration values,
/// plus loading the mappings file a run is driven by.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::mapping::{Mappings, MappingsSpec};
use crate::sink::OutputFormat;
use crate::source::{self, ReadOptions};

/// Config file used when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "archetl.json";

// ── Default value functions ──────────────────────────────────────────

fn default_mappings_path() -> String {
    "mappings.json".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Mappings file (JSON, or YAML with a `.yaml`/`.yml` extension).
    #[serde(default = "default_mappings_path")]
    pub mappings_path: String,

    /// Input files, directories or glob patterns.
    #[serde(default)]
    pub input_patterns: Vec<String>,

    /// Output file. Empty writes to stdout.
    #[serde(default)]
    pub output_path: String,

    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,

    #[serde(default)]
    pub fail_fast: bool,

    #[serde(default = "default_true")]
    pub progress: bool,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            mappings_path: default_mappings_path(),
            input_patterns: Vec::new(),
            output_path: String::new(),
            output_format: OutputFormat::default(),
            delimiter: default_delimiter(),
            sheet: None,
            fail_fast: false,
            progress: default_true(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to [`DEFAULT_CONFIG_PATH`].
    /// If the file does not exist, returns a default config. Nothing is
    /// written; see [`Config::write_template`].
    pub fn load(config_path: &str) -> Result<Self> {
        let path = resolve_path(config_path);

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Write a default configuration to `config_path` (or
    /// [`DEFAULT_CONFIG_PATH`]), refusing to replace an existing file unless
    /// `force` is set. Returns the path written.
    pub fn write_template(config_path: &str, force: bool) -> Result<&str> {
        let path = resolve_path(config_path);
        anyhow::ensure!(
            force || !Path::new(path).exists(),
            "{path} already exists (use --force to overwrite)"
        );
        Self::default().save(path)?;
        info!("Generated config template: {path}");
        Ok(path)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.mappings_path.is_empty(),
            "mappings_path must be specified"
        );
        anyhow::ensure!(
            self.delimiter.is_ascii() && self.delimiter != '"',
            "delimiter must be a single ASCII character other than '\"'"
        );
        Ok(())
    }

    /// Options for reading input files.
    #[must_use]
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            // validate() guarantees an ASCII delimiter
            delimiter: u8::try_from(self.delimiter).unwrap_or(b','),
            sheet: self.sheet.clone(),
        }
    }

    /// Expand all input patterns into the supported files they name,
    /// sorted and without duplicates.
    pub fn get_input_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = BTreeSet::new();

        for pattern in &self.input_patterns {
            match expand_pattern(pattern) {
                Ok(matches) => files.extend(matches),
                Err(e) => warn!("Failed to expand pattern {pattern}: {e}"),
            }
        }

        Ok(files.into_iter().collect())
    }

    /// Load and build the mappings named by `mappings_path`.
    pub fn load_mappings(&self) -> Result<Mappings> {
        load_mappings(Path::new(&self.mappings_path))
    }
}

/// Load a mappings file. Files ending in `.yaml` or `.yml` are read as YAML,
/// anything else as JSON.
pub fn load_mappings(path: &Path) -> Result<Mappings> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read mappings: {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let spec: MappingsSpec = if is_yaml {
        serde_yaml::from_str(&data)
            .with_context(|| format!("invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&data)
            .with_context(|| format!("invalid JSON in {}", path.display()))?
    };

    let mappings = Mappings::from_spec(&spec)
        .with_context(|| format!("invalid mappings in {}", path.display()))?;
    if mappings.is_empty() {
        warn!("{} defines no mappings", path.display());
    }
    info!(
        "Loaded {} mappings from {} (id column {})",
        mappings.len(),
        path.display(),
        mappings.id_column()
    );
    Ok(mappings)
}

fn resolve_path(config_path: &str) -> &str {
    if config_path.is_empty() {
        DEFAULT_CONFIG_PATH
    } else {
        config_path
    }
}

// ── Pattern helpers ──────────────────────────────────────────────────

/// Expand a single pattern to matching input files.
fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    // No wildcards: a file or a directory
    if !pattern.contains(['*', '?', '[']) {
        let path = Path::new(pattern);
        if path.is_dir() {
            return walk_dir_for_inputs(path);
        }
        anyhow::ensure!(path.is_file(), "no such file: {pattern}");
        return Ok(vec![path.to_path_buf()]);
    }

    let matches = glob::glob(pattern).context("invalid glob pattern")?;
    let mut files = Vec::new();
    for entry in matches.flatten() {
        if entry.is_file() && source::is_supported(&entry) {
            files.push(entry);
        }
    }
    Ok(files)
}

/// Walk a directory recursively, collecting supported input files.
fn walk_dir_for_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(walk_dir_for_inputs(&path)?);
        } else if source::is_supported(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

// ── Tests ────────────────────────────────────────────────────────────
