//! melte: compiles Svelte components with reactive tracking.

mod cli;
mod config;
mod orchestrator;
mod output;

use bun_runner::{BunError, BunRunner};
use clap::Parser;
use cli::Args;
use miette::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Handle bun version command
    if args.bun_version {
        let found =
            BunRunner::find_bun(Some(args.workspace.as_path())).ok_or(BunError::NotFound);
        let result = match found {
            Ok(path) => BunRunner::bun_version(&path)
                .await
                .map(|version| (version, path)),
            Err(e) => Err(e),
        };
        match result {
            Ok((version, path)) => {
                println!("bun {}", version);
                println!("path: {}", path);
                if let Some(cache_dir) = BunRunner::get_cache_dir() {
                    println!("cache: {}", cache_dir);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let result = orchestrator::run(args).await;

    match result {
        Ok(summary) => {
            if summary.error_count > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
