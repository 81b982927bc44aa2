use crate::config::IndexRange;
use crate::paths::WorkUnitKey;

/// Cross product of samples and n-sims, sample-major. This order is the
/// canonical order of every table the merger produces.
pub fn enumerate_units(samples: &[u32], n_sims: IndexRange) -> Vec<WorkUnitKey> {
    samples
        .iter()
        .flat_map(|&sample_id| n_sims.iter().map(move |n_sim| WorkUnitKey::new(sample_id, n_sim)))
        .collect()
}
