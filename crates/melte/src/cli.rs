//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use melte_pipeline::Target;

/// Compiles Svelte components with reactive tracking.
#[derive(Debug, Parser)]
#[command(name = "melte")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Project root to compile
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Output directory, relative to the workspace
    #[arg(long = "out-dir", default_value = "build")]
    pub out_dir: Utf8PathBuf,

    /// Path to melte.config.json (defaults to the one in the workspace)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Where the compiled components run
    #[arg(long, value_enum, default_value = "browser")]
    pub target: TargetArg,

    /// Compile without dev checks
    #[arg(long)]
    pub production: bool,

    /// Add hot-reload instrumentation to browser output
    #[arg(long)]
    pub hot: bool,

    /// Compile browser output for hydration of server-rendered markup
    #[arg(long)]
    pub hydratable: bool,

    /// Leave component CSS out of the browser output
    #[arg(long = "no-css")]
    pub no_css: bool,

    /// Number of bun host processes
    #[arg(long)]
    pub workers: Option<usize>,

    /// Watch mode
    #[arg(long)]
    pub watch: bool,

    /// Preserve watch output (don't clear screen)
    #[arg(long = "preserveWatchOutput")]
    pub preserve_watch_output: bool,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Log pipeline stages (same as RUST_LOG=debug)
    #[arg(long, short)]
    pub verbose: bool,

    /// Show bun version and installation path
    #[arg(long = "bun-version")]
    pub bun_version: bool,
}

/// Compile target.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum TargetArg {
    /// Client-side components (default)
    #[default]
    Browser,
    /// Server-side rendering
    Server,
}

impl From<TargetArg> for Target {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Browser => Target::Browser,
            TargetArg::Server => Target::Server,
        }
    }
}
