use tracing::{debug, warn};

use super::executor::{UnitOutcome, UnitStatus};
use crate::config::TimeAxisPolicy;
use crate::error::{CompileError, Result};
use crate::paths::WorkUnitKey;
use crate::types::dataset::{AmplitudeEntry, ThresholdEntry, UnitResult, WaveformTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub units_ready: usize,
    pub units_skipped: usize,
    pub units_failed: usize,
    pub entries: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedDataset {
    pub entries: Vec<AmplitudeEntry>,
    pub responses: WaveformTable,
    pub myelinated_responses: WaveformTable,
    pub unmyelinated_responses: WaveformTable,
    pub stimulations: WaveformTable,
}

/// Shared time axis: the first one seen wins, later ones are only compared.
struct AxisReconciler {
    name: &'static str,
    policy: TimeAxisPolicy,
    axis: Option<Vec<f64>>,
}

impl AxisReconciler {
    fn new(name: &'static str, policy: TimeAxisPolicy) -> Self {
        Self {
            name,
            policy,
            axis: None,
        }
    }

    fn offer(&mut self, key: &WorkUnitKey, candidate: Option<Vec<f64>>) -> Result<()> {
        let Some(candidate) = candidate else {
            return Ok(());
        };
        let Some(expected) = self.axis.as_ref().map(Vec::len) else {
            self.axis = Some(candidate);
            return Ok(());
        };
        if expected == candidate.len() {
            return Ok(());
        }
        match self.policy {
            TimeAxisPolicy::FirstWins => {
                warn!(
                    unit = %key,
                    axis = self.name,
                    expected,
                    got = candidate.len(),
                    "time axis differs from the first one seen, keeping the first"
                );
                Ok(())
            }
            TimeAxisPolicy::Strict => Err(CompileError::TimeAxisMismatch {
                unit: key.to_string(),
                expected,
                got: candidate.len(),
            }),
        }
    }

    fn finish(self) -> Vec<f64> {
        self.axis.unwrap_or_default()
    }
}

fn tally<T>(summary: &mut MergeSummary, outcome: &UnitOutcome<T>) {
    match &outcome.status {
        UnitStatus::Ready(_) => summary.units_ready += 1,
        UnitStatus::Skipped(path) => {
            summary.units_skipped += 1;
            debug!(unit = %outcome.key, missing = %path.display(), "unit not ready, skipped");
        }
        UnitStatus::Failed(e) => {
            summary.units_failed += 1;
            warn!(unit = %outcome.key, error = %e, "unit failed, excluded from dataset");
        }
    }
}

/// Folds per-unit results into the global tables, strictly in the order
/// given. Each retained entry gets the next waveform index, which is also
/// its column in all four waveform tables.
pub fn merge_results(
    outcomes: Vec<UnitOutcome<UnitResult>>,
    policy: TimeAxisPolicy,
) -> Result<(MergedDataset, MergeSummary)> {
    let mut merged = MergedDataset::default();
    let mut summary = MergeSummary::default();
    let mut response_axis = AxisReconciler::new("response", policy);
    let mut stimulus_axis = AxisReconciler::new("stimulus", policy);

    for outcome in outcomes {
        tally(&mut summary, &outcome);
        let UnitStatus::Ready(unit) = outcome.status else {
            continue;
        };
        response_axis.offer(&outcome.key, unit.response_time)?;
        stimulus_axis.offer(&outcome.key, unit.stimulus_time)?;

        for amplitude in unit.amplitudes {
            let mut entry = amplitude.entry;
            entry.waveforms_index = Some(merged.entries.len());
            merged.entries.push(entry);

            let waveforms = amplitude.waveforms;
            merged.responses.columns.push(waveforms.combined);
            merged.myelinated_responses.columns.push(waveforms.myelinated);
            merged.unmyelinated_responses.columns.push(waveforms.unmyelinated);
            merged.stimulations.columns.push(waveforms.stimulus);
        }
    }

    let response_time = response_axis.finish();
    merged.myelinated_responses.time = response_time.clone();
    merged.unmyelinated_responses.time = response_time.clone();
    merged.responses.time = response_time;
    merged.stimulations.time = stimulus_axis.finish();

    summary.entries = merged.entries.len();
    Ok((merged, summary))
}

/// Concatenates activation-level rows in submission order.
pub fn merge_thresholds(
    outcomes: Vec<UnitOutcome<Vec<ThresholdEntry>>>,
) -> (Vec<ThresholdEntry>, MergeSummary) {
    let mut rows = Vec::new();
    let mut summary = MergeSummary::default();
    for outcome in outcomes {
        tally(&mut summary, &outcome);
        if let UnitStatus::Ready(entries) = outcome.status {
            rows.extend(entries);
        }
    }
    summary.entries = rows.len();
    (rows, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::dataset::{AmplitudeResult, WaveformSet};
    use std::path::PathBuf;

    fn entry(key: WorkUnitKey, amplitude: f64) -> AmplitudeEntry {
        AmplitudeEntry {
            sample_id: key.sample_id,
            n_sim: key.n_sim,
            pulse_width: 0.1,
            inter_phase: 0.05,
            unit: "[ms]".into(),
            dt: 0.001,
            frequency: 20.0,
            amplitude,
            response_power: 1.0,
            stimulation_power: 2.0,
            ab_fibers_activated: 1,
            ab_action_potentials: 3,
            ab_fibers_activation: 0.5,
            c_fibers_activated: 0,
            c_action_potentials: 0,
            c_fibers_activation: 0.0,
            waveforms_index: None,
        }
    }

    fn unit(key: WorkUnitKey, amplitudes: &[f64], samples: usize) -> UnitOutcome<UnitResult> {
        let time: Vec<f64> = (0..samples).map(|i| i as f64).collect();
        UnitOutcome {
            key,
            status: UnitStatus::Ready(UnitResult {
                amplitudes: amplitudes
                    .iter()
                    .map(|&a| AmplitudeResult {
                        entry: entry(key, a),
                        waveforms: WaveformSet {
                            combined: vec![a; samples],
                            myelinated: vec![a / 2.0; samples],
                            unmyelinated: vec![a / 2.0; samples],
                            stimulus: vec![a; 3],
                        },
                    })
                    .collect(),
                response_time: Some(time),
                stimulus_time: Some(vec![0.0, 0.001, 0.002]),
            }),
        }
    }

    fn outcomes() -> Vec<UnitOutcome<UnitResult>> {
        vec![
            UnitOutcome {
                key: WorkUnitKey::new(10, 0),
                status: UnitStatus::Skipped(PathBuf::from("10/0.json")),
            },
            unit(WorkUnitKey::new(10, 1), &[0.1, 0.2], 4),
            UnitOutcome {
                key: WorkUnitKey::new(10, 2),
                status: UnitStatus::Failed(CompileError::InvalidConfig("x".into())),
            },
            unit(WorkUnitKey::new(11, 0), &[0.3], 4),
        ]
    }

    #[test]
    fn waveform_indices_are_dense_and_ordered() {
        let (merged, summary) = merge_results(outcomes(), TimeAxisPolicy::FirstWins).unwrap();
        let indices: Vec<usize> = merged
            .entries
            .iter()
            .map(|e| e.waveforms_index.unwrap())
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let amplitudes: Vec<f64> = merged.entries.iter().map(|e| e.amplitude).collect();
        assert_eq!(amplitudes, vec![0.1, 0.2, 0.3]);
        assert_eq!(merged.responses.columns.len(), 3);
        assert_eq!(merged.responses.columns[2], vec![0.3; 4]);
        assert_eq!(
            summary,
            MergeSummary {
                units_ready: 2,
                units_skipped: 1,
                units_failed: 1,
                entries: 3
            }
        );
    }

    #[test]
    fn first_time_axis_is_shared_by_all_response_tables() {
        let (merged, _) = merge_results(outcomes(), TimeAxisPolicy::FirstWins).unwrap();
        assert_eq!(merged.responses.time, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(merged.myelinated_responses.time, merged.responses.time);
        assert_eq!(merged.unmyelinated_responses.time, merged.responses.time);
        assert_eq!(merged.stimulations.time, vec![0.0, 0.001, 0.002]);
    }

    #[test]
    fn merge_is_repeatable() {
        let first = merge_results(outcomes(), TimeAxisPolicy::FirstWins).unwrap();
        let second = merge_results(outcomes(), TimeAxisPolicy::FirstWins).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn diverging_axis_is_kept_or_rejected_by_policy() {
        let diverging = || {
            vec![
                unit(WorkUnitKey::new(10, 0), &[0.1], 4),
                unit(WorkUnitKey::new(10, 1), &[0.2], 6),
            ]
        };
        let (merged, _) = merge_results(diverging(), TimeAxisPolicy::FirstWins).unwrap();
        assert_eq!(merged.responses.time.len(), 4);
        assert_eq!(merged.responses.row_count(), 6);

        let err = merge_results(diverging(), TimeAxisPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            CompileError::TimeAxisMismatch {
                expected: 4,
                got: 6,
                ..
            }
        ));
    }

    #[test]
    fn nothing_ready_gives_empty_tables() {
        let (merged, summary) = merge_results(
            vec![UnitOutcome {
                key: WorkUnitKey::new(1, 0),
                status: UnitStatus::Skipped(PathBuf::from("x")),
            }],
            TimeAxisPolicy::Strict,
        )
        .unwrap();
        assert!(merged.entries.is_empty());
        assert!(merged.responses.is_empty());
        assert_eq!(summary.units_skipped, 1);
    }
}
