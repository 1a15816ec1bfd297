//! [`Toolchain`] backed by a pool of bun host processes.

use std::sync::atomic::{AtomicUsize, Ordering};

use melte_pipeline::{
    CompileRequest, InstrumentRequest, PreprocessOutput, PreprocessRequest, StageOutput,
    ToolError, Toolchain, TranspileRequest,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::protocol::{Operation, Payload};
use crate::runner::{BunError, BunRunner};
use crate::worker::BunWorker;

/// Runs the toolchain operations in bun.
///
/// Holds a fixed number of worker slots. A slot starts its process on first
/// use; concurrent first uses of one slot start it once. Operations are
/// spread over the slots round-robin, one in flight per process. A slot whose
/// process fails a request is emptied and restarts on its next use.
pub struct BunToolchain {
    runner: BunRunner,
    slots: Vec<Mutex<Option<BunWorker>>>,
    next: AtomicUsize,
    spawned: AtomicUsize,
}

impl BunToolchain {
    pub fn new(runner: BunRunner, worker_count: usize) -> Self {
        let slots = (0..worker_count.max(1)).map(|_| Mutex::new(None)).collect();
        Self {
            runner,
            slots,
            next: AtomicUsize::new(0),
            spawned: AtomicUsize::new(0),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of host processes started so far.
    pub fn started_workers(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }

    async fn call(&self, operation: Operation<'_>) -> Result<Payload, ToolError> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        let mut slot = self.slots[index].lock().await;
        let mut worker = match slot.take() {
            Some(worker) => worker,
            None => {
                let worker = BunWorker::spawn(&self.runner).await.map_err(host_error)?;
                self.spawned.fetch_add(1, Ordering::Relaxed);
                worker
            }
        };

        // The worker goes back into its slot only after a clean exchange.
        let response = match worker.request(operation).await {
            Ok(response) => response,
            Err(err) => {
                warn!(slot = index, error = %err, "discarding bun host");
                return Err(host_error(err));
            }
        };
        *slot = Some(worker);
        drop(slot);

        if let Some(failure) = response.error {
            return Err(ToolError::Failed(failure.into()));
        }
        response
            .result
            .ok_or_else(|| host_error(BunError::ProtocolError("response without result".into())))
    }
}

fn host_error(err: BunError) -> ToolError {
    ToolError::Host(err.to_string())
}

impl Toolchain for BunToolchain {
    async fn preprocess(&self, request: PreprocessRequest) -> Result<PreprocessOutput, ToolError> {
        self.call(Operation::Preprocess(&request))
            .await?
            .into_preprocess()
    }

    async fn compile(&self, request: CompileRequest) -> Result<StageOutput, ToolError> {
        self.call(Operation::Compile(&request)).await?.into_stage()
    }

    async fn instrument(&self, request: InstrumentRequest) -> Result<String, ToolError> {
        Ok(self.call(Operation::Hot(&request)).await?.code)
    }

    async fn transpile(&self, request: TranspileRequest) -> Result<StageOutput, ToolError> {
        self.call(Operation::Transpile(&request)).await?.into_stage()
    }
}
