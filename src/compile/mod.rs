pub mod executor;
pub mod loader;
pub mod merger;
pub mod metrics;
pub mod tasks;
pub mod thresholds;

use std::path::PathBuf;

use crate::error::{CompileError, Result};

/// Result of looking at a unit whose inputs may not have been written yet.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    Ready(T),
    /// The first expected input found missing.
    Absent(PathBuf),
}

impl<T> Availability<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Availability<U> {
        match self {
            Availability::Ready(value) => Availability::Ready(f(value)),
            Availability::Absent(path) => Availability::Absent(path),
        }
    }

    /// In strict mode a missing input is as fatal as a corrupt one.
    pub fn require(self, strict: bool) -> Result<Availability<T>> {
        match self {
            Availability::Absent(path) if strict => Err(CompileError::MissingInput(path)),
            other => Ok(other),
        }
    }
}

pub use executor::{run_units, UnitOutcome, UnitStatus};
pub use loader::{load_threshold_unit, load_unit, ThresholdUnit};
pub use merger::{merge_results, merge_thresholds, MergeSummary, MergedDataset};
pub use metrics::{calculate_power, compute_unit};
pub use tasks::enumerate_units;
pub use thresholds::{activation_levels, threshold_entries, ActivationLevel};
