//! Configuration loading.

use crate::cli::Args;
use camino::{Utf8Path, Utf8PathBuf};
use melte_pipeline::PipelineOptions;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// Name of the config file looked up in the workspace root.
pub const CONFIG_FILENAME: &str = "melte.config.json";

/// Upper bound for the default worker count.
const DEFAULT_MAX_WORKERS: usize = 4;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("invalid {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

/// Project configuration from `melte.config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MelteConfig {
    /// File extensions to compile.
    pub extensions: Vec<String>,

    /// PostCSS plugin package names.
    pub postcss: Vec<String>,

    pub hydratable: bool,

    /// `false` leaves component CSS out of browser output.
    pub css: bool,

    /// Module the reactive tracker factory is imported from.
    pub tracker_module: Option<String>,

    pub workers: Option<usize>,

    /// Files/patterns to exclude.
    pub ignore: Vec<String>,
}

impl Default for MelteConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".svelte".to_string(), ".html".to_string()],
            postcss: Vec::new(),
            hydratable: false,
            css: true,
            tracker_module: None,
            workers: None,
            ignore: Vec::new(),
        }
    }
}

impl MelteConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, `melte.config.json` in the
    /// workspace root is used when present and defaults otherwise.
    pub fn load(workspace: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if path.is_relative() => workspace.join(path),
            Some(path) => path.to_path_buf(),
            None => {
                let path = workspace.join(CONFIG_FILENAME);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Combines the file values with the command line; flags win.
    pub fn pipeline_options(&self, args: &Args) -> PipelineOptions {
        let defaults = PipelineOptions::default();
        PipelineOptions {
            target: args.target.into(),
            production: args.production,
            hot: args.hot,
            hydratable: args.hydratable || self.hydratable,
            css: self.css && !args.no_css,
            tracker_module: self
                .tracker_module
                .clone()
                .unwrap_or(defaults.tracker_module),
            postcss_plugins: self.postcss.clone(),
        }
    }

    /// Number of bun host processes to run.
    pub fn worker_count(&self, args: &Args) -> usize {
        args.workers.or(self.workers).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().min(DEFAULT_MAX_WORKERS))
                .unwrap_or(1)
        })
    }

    /// Ignore patterns from the file followed by those from the command line.
    pub fn ignore_patterns<'a>(&'a self, args: &'a Args) -> impl Iterator<Item = &'a str> {
        self.ignore
            .iter()
            .chain(args.ignore.iter())
            .map(String::as_str)
    }

    /// Whether `path` has one of the configured extensions.
    pub fn matches_extension(&self, path: &Utf8Path) -> bool {
        let file_name = path.file_name().unwrap_or("");
        self.extensions.iter().any(|ext| file_name.ends_with(ext))
    }
}
