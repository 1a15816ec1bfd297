//! Pipeline and compiler options.

use camino::Utf8Path;
use melte_transformer::DEFAULT_TRACKER_MODULE;
use serde::Serialize;

/// Where the compiled component runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Browser,
    /// Server-side rendering.
    Server,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Browser => "browser",
            Target::Server => "server",
        }
    }
}

impl std::str::FromStr for Target {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "browser" | "client" | "web" => Ok(Target::Browser),
            "server" | "ssr" => Ok(Target::Server),
            other => Err(format!("unknown target: {other}")),
        }
    }
}

/// Configuration shared by every document run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub target: Target,
    /// Production builds compile without dev checks.
    pub production: bool,
    /// Add hot-reload instrumentation to browser output.
    pub hot: bool,
    pub hydratable: bool,
    /// `false` leaves component CSS out of the browser bundle.
    pub css: bool,
    /// Module the reactive tracker factory is imported from.
    pub tracker_module: String,
    /// PostCSS plugins; with none configured, postcss styles pass through.
    pub postcss_plugins: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target: Target::Browser,
            production: false,
            hot: false,
            hydratable: false,
            css: true,
            tracker_module: DEFAULT_TRACKER_MODULE.to_string(),
            postcss_plugins: Vec::new(),
        }
    }
}

/// Options for one downstream compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    pub target: Target,
    /// Component name, a valid identifier.
    pub name: String,
    pub filename: String,
    pub dev: bool,
    pub hydratable: bool,
    pub css: bool,
}

impl CompileOptions {
    /// Derives the compile options for the document at `path`.
    ///
    /// `hydratable` and `css` only apply to browser output.
    pub fn for_document(path: &Utf8Path, options: &PipelineOptions) -> Self {
        let browser = options.target == Target::Browser;
        Self {
            target: options.target,
            name: component_name(path.file_name().unwrap_or(path.as_str())),
            filename: path.to_string(),
            dev: !options.production,
            hydratable: browser && options.hydratable,
            css: !browser || options.css,
        }
    }
}

/// Turns a file basename into a component identifier.
///
/// Everything from the first `.` is dropped and characters outside
/// `[A-Za-z0-9_$]` become `_`.
pub fn component_name(basename: &str) -> String {
    let stem = basename.split('.').next().unwrap_or(basename);
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
