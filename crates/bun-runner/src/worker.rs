//! One persistent bun host process.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::protocol::{Operation, Ready, Request, Response};
use crate::runner::{BunError, BunRunner};

pub(crate) struct BunWorker {
    child: Child,
    stdin: ChildStdin,
    stdout: tokio::io::Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
    next_id: u64,
}

impl BunWorker {
    pub async fn spawn(runner: &BunRunner) -> Result<Self, BunError> {
        debug!(bun = %runner.bun_path, script = %runner.script_path, "spawning bun host");
        let mut child = Command::new(&runner.bun_path)
            .arg(&runner.script_path)
            .arg(&runner.config_json)
            .current_dir(&runner.workspace_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(BunError::SpawnFailed)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BunError::ProtocolError("failed to open bun stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BunError::ProtocolError("failed to open bun stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BunError::ProtocolError("failed to open bun stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buffer = String::new();
            let _ = reader.read_to_string(&mut buffer).await;
            buffer
        });

        let mut stdout_reader = BufReader::new(stdout).lines();

        let ready_line = stdout_reader
            .next_line()
            .await
            .map_err(|e| BunError::ProtocolError(format!("failed to read bun ready: {e}")))?;

        let Some(ready_line) = ready_line else {
            let stderr = stderr_task.await.unwrap_or_default();
            let status = child.wait().await.map_err(BunError::SpawnFailed)?;
            return Err(BunError::ProcessFailed {
                code: status.code().unwrap_or(-1),
                stderr,
            });
        };

        let ready: Ready = serde_json::from_str(&ready_line)
            .map_err(|e| BunError::ParseError(format!("invalid ready response: {e}")))?;
        if !ready.ready {
            return Err(BunError::ProtocolError(format!(
                "unexpected bun ready response: {ready_line}"
            )));
        }

        Ok(Self {
            child,
            stdin,
            stdout: stdout_reader,
            stderr_task: Some(stderr_task),
            next_id: 1,
        })
    }

    /// Sends one operation and waits for its response.
    pub async fn request(&mut self, operation: Operation<'_>) -> Result<Response, BunError> {
        let id = self.next_id;
        self.next_id += 1;
        let op = operation.name();

        let mut line = serde_json::to_string(&Request { id, operation })
            .map_err(|e| BunError::ProtocolError(format!("failed to serialize request: {e}")))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| BunError::ProtocolError(format!("failed to write to bun stdin: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| BunError::ProtocolError(format!("failed to flush bun stdin: {e}")))?;

        let line = self
            .stdout
            .next_line()
            .await
            .map_err(|e| BunError::ProtocolError(format!("failed to read bun response: {e}")))?;

        let Some(line) = line else {
            let stderr = match self.stderr_task.take() {
                Some(handle) => handle.await.unwrap_or_default(),
                None => String::new(),
            };
            let status = self.child.wait().await.map_err(BunError::SpawnFailed)?;
            return Err(BunError::ProcessFailed {
                code: status.code().unwrap_or(-1),
                stderr,
            });
        };

        let mut response: Response = serde_json::from_str(&line)
            .map_err(|e| BunError::ParseError(format!("invalid response: {e} ({line})")))?;

        if let Some(fatal) = response.fatal.take() {
            return Err(BunError::ProtocolError(fatal));
        }
        if response.id != Some(id) {
            return Err(BunError::ProtocolError(format!(
                "expected response {id} to {op}, got {:?}",
                response.id
            )));
        }

        Ok(response)
    }
}
