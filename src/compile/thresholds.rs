use crate::error::{CompileError, Result};
use crate::paths::FiberType;
use crate::types::dataset::ThresholdEntry;

use super::loader::ThresholdUnit;

/// Fraction of each population activated at `amplitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationLevel {
    pub amplitude: f64,
    pub myelinated: f64,
    pub unmyelinated: f64,
}

fn sorted_magnitudes(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().map(|v| v.abs()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn level_at(sorted: &[f64], amplitude: f64) -> f64 {
    sorted.partition_point(|&t| t <= amplitude) as f64 / sorted.len() as f64
}

/// Step curve of cumulative activation, one step per distinct threshold in
/// either population. Two empty populations give an empty curve; a single
/// empty population has no defined level.
pub fn activation_levels(myelinated: &[f64], unmyelinated: &[f64]) -> Result<Vec<ActivationLevel>> {
    if myelinated.is_empty() && unmyelinated.is_empty() {
        return Ok(Vec::new());
    }
    for (fiber_type, values) in [
        (FiberType::Myelinated, myelinated),
        (FiberType::Unmyelinated, unmyelinated),
    ] {
        if values.is_empty() {
            return Err(CompileError::ZeroPopulation {
                fiber_type: fiber_type.name(),
            });
        }
    }

    let m_sorted = sorted_magnitudes(myelinated);
    let u_sorted = sorted_magnitudes(unmyelinated);

    let mut amplitudes: Vec<f64> = m_sorted.iter().chain(&u_sorted).copied().collect();
    amplitudes.sort_by(f64::total_cmp);
    amplitudes.dedup();

    Ok(amplitudes
        .into_iter()
        .map(|amplitude| ActivationLevel {
            amplitude,
            myelinated: level_at(&m_sorted, amplitude),
            unmyelinated: level_at(&u_sorted, amplitude),
        })
        .collect())
}

pub fn threshold_entries(unit: &ThresholdUnit) -> Result<Vec<ThresholdEntry>> {
    let levels = activation_levels(&unit.myelinated, &unit.unmyelinated)?;
    Ok(levels
        .into_iter()
        .map(|level| ThresholdEntry {
            sample_id: unit.key.sample_id,
            morphology: unit.morphology,
            n_sim: unit.key.n_sim,
            pulse_width: unit.pulse_width,
            frequency: unit.frequency,
            amplitude: level.amplitude,
            ab_fibers: unit.myelinated.len(),
            ab_activation_level: level.myelinated,
            c_fibers: unit.unmyelinated.len(),
            c_activation_level: level.unmyelinated,
        })
        .collect())
}
