//! Bounded concurrent fan-out over independent async tasks.
//!
//! Tasks are spawned eagerly and gated by a shared semaphore, so at most
//! `max_concurrency` run at once. Results always come back in submission
//! order regardless of completion order, and a panicked task is reported as
//! an error in its slot rather than poisoning the batch.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use postforge_types::{PostforgeError, Result};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// A reusable fan-out scheduler with a fixed concurrency bound.
#[derive(Clone)]
pub struct FanOut {
    semaphore: Arc<Semaphore>,
}

impl FanOut {
    /// `max_concurrency` is clamped to at least 1.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Run every task, returning one result per task in submission order.
    pub async fn run_all<T, F, Fut>(&self, tasks: Vec<F>) -> Vec<Result<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let handles: Vec<JoinHandle<Result<T>>> = tasks
            .into_iter()
            .map(|task| {
                let semaphore = self.semaphore.clone();
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| PostforgeError::Other("fan-out semaphore closed".into()))?;
                    task().await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(result) => results.push(result),
                Err(err) => results.push(Err(PostforgeError::Task {
                    task: format!("#{index}"),
                    message: err.to_string(),
                })),
            }
        }
        results
    }
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}
