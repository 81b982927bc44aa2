use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use super::Availability;
use crate::error::{CompileError, Result};
use crate::paths::WorkUnitKey;

#[derive(Debug)]
pub enum UnitStatus<T> {
    Ready(T),
    Skipped(PathBuf),
    Failed(CompileError),
}

#[derive(Debug)]
pub struct UnitOutcome<T> {
    pub key: WorkUnitKey,
    pub status: UnitStatus<T>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs `work` once per key on a pool of `workers` threads.
///
/// Outcomes come back in the order of `keys`, whatever order the workers
/// finish in; the merger's "first time axis wins" and sequential waveform ids
/// depend on it. A failing or panicking unit never affects the others.
pub fn run_units<T, F>(keys: &[WorkUnitKey], workers: usize, work: F) -> Result<Vec<UnitOutcome<T>>>
where
    T: Send,
    F: Fn(&WorkUnitKey) -> Result<Availability<T>> + Sync,
{
    if workers == 0 {
        return Err(CompileError::InvalidConfig("workers must be at least 1".into()));
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("unit-worker-{}", i))
        .build()
        .map_err(|e| CompileError::InvalidConfig(format!("failed to build worker pool: {}", e)))?;

    debug!(units = keys.len(), workers, "dispatching work units");

    let outcomes = pool.install(|| {
        keys.par_iter()
            .map(|key| {
                let status = match catch_unwind(AssertUnwindSafe(|| work(key))) {
                    Ok(Ok(Availability::Ready(value))) => UnitStatus::Ready(value),
                    Ok(Ok(Availability::Absent(path))) => UnitStatus::Skipped(path),
                    Ok(Err(e)) => UnitStatus::Failed(e),
                    Err(payload) => UnitStatus::Failed(CompileError::WorkerPanic(format!(
                        "{}: {}",
                        key,
                        panic_message(payload.as_ref())
                    ))),
                };
                UnitOutcome { key: *key, status }
            })
            .collect::<Vec<_>>()
    });

    Ok(outcomes)
}
