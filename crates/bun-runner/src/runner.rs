//! Locating bun and preparing the host script.

use blake3::Hasher;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::fs;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

const HOST_SCRIPT_FILENAME: &str = "melte-bun-host.mjs";
const HOST_SCRIPT_SOURCE: &str = include_str!("host.mjs");

/// Error types for the bun host.
#[derive(Debug, Error)]
pub enum BunError {
    /// Failed to spawn bun process.
    #[error("failed to spawn bun: {0}")]
    SpawnFailed(#[from] std::io::Error),

    /// bun process exited with error.
    #[error("bun exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    /// bun binary not found.
    #[error("bun binary not found; install it from https://bun.sh or add it to node_modules/.bin")]
    NotFound,

    /// The host script could not be written to the cache directory.
    #[error("failed to prepare bun host script: {0}")]
    ScriptFailed(String),

    /// bun host protocol error.
    #[error("bun host protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse bun response.
    #[error("failed to parse bun response: {0}")]
    ParseError(String),
}

/// Settings passed to every host process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// Package names of postcss plugins, loaded from the workspace.
    pub postcss_plugins: Vec<String>,
}

/// Where and how host processes are started.
#[derive(Debug, Clone)]
pub struct BunRunner {
    pub(crate) bun_path: Utf8PathBuf,
    pub(crate) workspace_root: Utf8PathBuf,
    pub(crate) script_path: Utf8PathBuf,
    pub(crate) config_json: String,
}

impl BunRunner {
    /// Creates a runner, writing the host script to the cache directory if
    /// it is missing or stale.
    pub fn new(
        bun_path: Utf8PathBuf,
        workspace_root: Utf8PathBuf,
        config: &HostConfig,
    ) -> Result<Self, BunError> {
        let cache_dir = Self::get_cache_dir()
            .ok_or_else(|| BunError::ScriptFailed("could not determine cache directory".into()))?;
        Self::with_cache_dir(bun_path, workspace_root, &cache_dir, config)
    }

    /// Like [`BunRunner::new`], keeping the host script in `cache_dir`.
    pub fn with_cache_dir(
        bun_path: Utf8PathBuf,
        workspace_root: Utf8PathBuf,
        cache_dir: &Utf8Path,
        config: &HostConfig,
    ) -> Result<Self, BunError> {
        let script_path = ensure_script(cache_dir)?;
        let config_json = serde_json::to_string(config)
            .map_err(|e| BunError::ScriptFailed(format!("failed to encode host config: {e}")))?;
        Ok(Self {
            bun_path,
            workspace_root,
            script_path,
            config_json,
        })
    }

    pub fn bun_path(&self) -> &Utf8Path {
        &self.bun_path
    }

    /// Attempts to find bun in workspace, PATH, or home directory.
    /// 1. Workspace node_modules/.bin/bun (if workspace_root provided)
    /// 2. PATH
    /// 3. ~/.bun/bin/bun (default install location)
    pub fn find_bun(workspace_root: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        if let Some(workspace) = workspace_root {
            let bin = workspace.join("node_modules/.bin");
            if let Some(path) = find_bun_in_bin(&bin) {
                return Some(path);
            }
        }

        if let Ok(path) = which::which("bun") {
            if let Ok(utf8_path) = Utf8PathBuf::try_from(path) {
                return Some(utf8_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            if let Ok(home) = Utf8PathBuf::try_from(home) {
                let bun_home = home.join(".bun/bin");
                if let Some(path) = find_bun_in_bin(&bun_home) {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Gets the cache directory for melte.
    pub fn get_cache_dir() -> Option<Utf8PathBuf> {
        dirs::cache_dir()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .map(|p| p.join("melte"))
    }

    /// Gets the version of a bun binary.
    pub async fn bun_version(bun_path: &Utf8Path) -> Result<String, BunError> {
        let output = Command::new(bun_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(BunError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BunError::ProcessFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn find_bun_in_bin(bin: &Utf8Path) -> Option<Utf8PathBuf> {
    let candidates: &[&str] = if cfg!(windows) {
        &["bun.exe", "bun.cmd", "bun"]
    } else {
        &["bun"]
    };

    candidates
        .iter()
        .map(|candidate| bin.join(candidate))
        .find(|path| path.exists())
}

/// Writes the host script into `cache_dir` unless an identical copy exists.
fn ensure_script(cache_dir: &Utf8Path) -> Result<Utf8PathBuf, BunError> {
    fs::create_dir_all(cache_dir)
        .map_err(|e| BunError::ScriptFailed(format!("failed to create cache dir: {e}")))?;

    let script_path = cache_dir.join(HOST_SCRIPT_FILENAME);
    let expected_hash = blake3::hash(HOST_SCRIPT_SOURCE.as_bytes());

    if let Ok(existing) = fs::read(&script_path) {
        let mut hasher = Hasher::new();
        hasher.update(&existing);
        if hasher.finalize() == expected_hash {
            return Ok(script_path);
        }
    }

    fs::write(&script_path, HOST_SCRIPT_SOURCE)
        .map_err(|e| BunError::ScriptFailed(format!("failed to write bun host script: {e}")))?;

    Ok(script_path)
}
