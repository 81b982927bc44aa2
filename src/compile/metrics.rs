use tracing::debug;

use crate::config::UnitScales;
use crate::error::{CompileError, Result};
use crate::parsing::sim_files;
use crate::paths::{FiberType, PathKind, SimLayout};
use crate::types::dataset::{
    AmplitudeEntry, AmplitudeResult, FiberActivation, UnitDescriptor, UnitResult, WaveformSet,
};

/// Mean squared value scaled by the sampling interval: `sum((x*scale)^2) * dt / n`.
/// An empty waveform carries no energy.
pub fn calculate_power(waveform: &[f64], scale: f64, dt: f64) -> f64 {
    if waveform.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = waveform.iter().map(|x| (x * scale).powi(2)).sum();
    sum_sq * dt / waveform.len() as f64
}

pub fn activation_fraction(activated: usize, total: usize, fiber_type: FiberType) -> Result<f64> {
    if total == 0 {
        return Err(CompileError::ZeroPopulation {
            fiber_type: fiber_type.name(),
        });
    }
    Ok(activated as f64 / total as f64)
}

/// Sums per-fiber series by grouping on identical time values. Fiber files
/// may differ in length, so rows are never aligned by index. The returned
/// time column is sorted ascending; rows with a NaN time are dropped.
pub fn sum_responses(series: &[Vec<(f64, f64)>]) -> (Vec<f64>, Vec<f64>) {
    let mut rows: Vec<(f64, f64)> = series
        .iter()
        .flatten()
        .copied()
        .filter(|(t, _)| !t.is_nan())
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut time: Vec<f64> = Vec::new();
    let mut values: Vec<f64> = Vec::new();
    for (t, v) in rows {
        match (time.last(), values.last_mut()) {
            (Some(&last_t), Some(sum)) if last_t == t => *sum += v,
            _ => {
                time.push(t);
                values.push(v);
            }
        }
    }
    (time, values)
}

/// What one fiber population produced at one amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationResponse {
    pub fibers_activated: usize,
    pub action_potentials: i64,
    /// Summed `(time, value)` columns; `None` when no fiber wrote a response.
    pub summed: Option<(Vec<f64>, Vec<f64>)>,
}

pub fn scan_population(
    layout: &SimLayout,
    descriptor: &UnitDescriptor,
    fiber_type: FiberType,
    amplitude: usize,
) -> Result<PopulationResponse> {
    let key = &descriptor.key;
    let mut fibers_activated = 0;
    let mut action_potentials = 0i64;
    let mut per_fiber = Vec::new();

    for fiber in 0..descriptor.fiber_count(fiber_type) {
        let activation_path = layout.resolve(
            key,
            PathKind::ActivationOutput {
                fiber_type,
                fiber,
                amplitude,
            },
        );
        if activation_path.is_file() {
            let count = sim_files::read_activation_count(&activation_path)?;
            action_potentials += count;
            if count > 0 {
                fibers_activated += 1;
            }
        }

        let response_path = layout.resolve(
            key,
            PathKind::ResponseOutput {
                fiber_type,
                fiber,
                amplitude,
            },
        );
        if response_path.is_file() {
            per_fiber.push(sim_files::read_response_series(&response_path)?);
        }
    }

    let summed = if per_fiber.is_empty() {
        None
    } else {
        let (time, values) = sum_responses(&per_fiber);
        // header-only files leave nothing to sum
        (!time.is_empty()).then_some((time, values))
    };

    Ok(PopulationResponse {
        fibers_activated,
        action_potentials,
        summed,
    })
}

fn population_activation(
    descriptor: &UnitDescriptor,
    fiber_type: FiberType,
    response: &PopulationResponse,
) -> Result<FiberActivation> {
    Ok(FiberActivation {
        fibers_activated: response.fibers_activated,
        action_potentials: response.action_potentials,
        activation: activation_fraction(
            response.fibers_activated,
            descriptor.fiber_count(fiber_type),
            fiber_type,
        )?,
    })
}

/// Per-amplitude entries and waveforms of one loaded unit.
///
/// An amplitude is kept only when both populations produced a response.
/// Power is computed per population and then added; raw responses are summed
/// only for the combined waveform.
pub fn compute_unit(
    layout: &SimLayout,
    descriptor: &UnitDescriptor,
    scales: UnitScales,
) -> Result<UnitResult> {
    let dt = descriptor.dt;
    let mut result = UnitResult {
        stimulus_time: Some(
            (0..descriptor.unscaled_stimulus.len())
                .map(|i| i as f64 * dt)
                .collect(),
        ),
        ..UnitResult::default()
    };

    for (a, &amplitude) in descriptor.amplitudes.iter().enumerate() {
        let stimulus: Vec<f64> = descriptor
            .unscaled_stimulus
            .iter()
            .map(|x| x * amplitude)
            .collect();
        let stimulation_power = calculate_power(&stimulus, scales.stimulus, dt);

        let myelinated = scan_population(layout, descriptor, FiberType::Myelinated, a)?;
        let unmyelinated = scan_population(layout, descriptor, FiberType::Unmyelinated, a)?;

        if result.response_time.is_none() {
            result.response_time = myelinated
                .summed
                .as_ref()
                .or(unmyelinated.summed.as_ref())
                .map(|(time, _)| time.clone());
        }

        let (Some((_, m_values)), Some((_, u_values))) = (&myelinated.summed, &unmyelinated.summed)
        else {
            debug!(unit = %descriptor.key, amplitude_index = a, "population response missing, amplitude dropped");
            continue;
        };

        if m_values.len() != u_values.len() {
            return Err(CompileError::LengthMismatch {
                context: "combined response",
                expected: m_values.len(),
                got: u_values.len(),
            });
        }
        let combined: Vec<f64> = m_values.iter().zip(u_values).map(|(m, u)| m + u).collect();
        let response_power = calculate_power(m_values, scales.response, dt)
            + calculate_power(u_values, scales.response, dt);

        let ab = population_activation(descriptor, FiberType::Myelinated, &myelinated)?;
        let c = population_activation(descriptor, FiberType::Unmyelinated, &unmyelinated)?;

        let entry = AmplitudeEntry {
            sample_id: descriptor.key.sample_id,
            n_sim: descriptor.key.n_sim,
            pulse_width: descriptor.pulse_width,
            inter_phase: descriptor.inter_phase,
            unit: descriptor.unit.clone(),
            dt,
            frequency: descriptor.frequency,
            amplitude,
            response_power,
            stimulation_power,
            ab_fibers_activated: ab.fibers_activated,
            ab_action_potentials: ab.action_potentials,
            ab_fibers_activation: ab.activation,
            c_fibers_activated: c.fibers_activated,
            c_action_potentials: c.action_potentials,
            c_fibers_activation: c.activation,
            waveforms_index: None,
        };

        result.amplitudes.push(AmplitudeResult {
            entry,
            waveforms: WaveformSet {
                combined,
                myelinated: m_values.clone(),
                unmyelinated: u_values.clone(),
                stimulus,
            },
        });
    }

    Ok(result)
}
