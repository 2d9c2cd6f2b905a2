use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Visible state of a long-running request, e.g. the matchmaker search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum OperationState<T> {
    Idle,
    Pending,
    Succeeded(T),
    Failed(String),
}

/// Issued by [`TrackedOperation::begin`]; only the newest token may publish a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationToken(u64);

/// An operation whose result is applied only if nothing superseded it
///
/// Starting a new run or cancelling bumps the generation. A run that finishes
/// after that discards its result instead of overwriting newer state. The
/// underlying request is not aborted.
#[derive(Clone)]
pub struct TrackedOperation<T> {
    generation: Arc<AtomicU64>,
    state: Arc<RwLock<OperationState<T>>>,
}

impl<T: Clone> Default for TrackedOperation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TrackedOperation<T> {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(RwLock::new(OperationState::Idle)),
        }
    }

    /// Supersedes any run in flight and marks the operation pending
    pub async fn begin(&self) -> OperationToken {
        // bump under the state lock so the newest token is always the last writer
        let mut state = self.state.write().await;
        let token = OperationToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        *state = OperationState::Pending;
        token
    }

    /// Applies `result` if `token` is still current. Returns whether it was applied.
    pub async fn complete<E: ToString>(
        &self,
        token: OperationToken,
        result: &Result<T, E>,
    ) -> bool {
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != token.0 {
            tracing::debug!(token = token.0, "Discarding superseded operation result");
            return false;
        }
        *state = match result {
            Ok(value) => OperationState::Succeeded(value.clone()),
            Err(e) => OperationState::Failed(e.to_string()),
        };
        true
    }

    /// Drops interest in whatever is in flight and returns to idle
    pub async fn cancel(&self) {
        let mut state = self.state.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = OperationState::Idle;
    }

    pub async fn state(&self) -> OperationState<T> {
        self.state.read().await.clone()
    }
}
