use serde::Serialize;

use crate::paths::{FiberType, WorkUnitKey};

/// Everything a worker needs to compute one unit's entries.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDescriptor {
    pub key: WorkUnitKey,
    pub pulse_width: f64,
    pub inter_phase: f64,
    pub frequency: f64,
    pub unit: String,
    pub dt: f64,
    pub amplitudes: Vec<f64>,
    pub myelinated_fibers: usize,
    pub unmyelinated_fibers: usize,
    pub unscaled_stimulus: Vec<f64>,
}

impl UnitDescriptor {
    pub fn fiber_count(&self, fiber_type: FiberType) -> usize {
        match fiber_type {
            FiberType::Myelinated => self.myelinated_fibers,
            FiberType::Unmyelinated => self.unmyelinated_fibers,
        }
    }
}

/// Activation summary of one fiber type at one amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiberActivation {
    pub fibers_activated: usize,
    pub action_potentials: i64,
    pub activation: f64,
}

/// One row of the compiled dataset. Field order is the column order.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AmplitudeEntry {
    pub sample_id: u32,
    pub n_sim: u32,
    pub pulse_width: f64,
    pub inter_phase: f64,
    pub unit: String,
    pub dt: f64,
    pub frequency: f64,
    pub amplitude: f64,
    pub response_power: f64,
    pub stimulation_power: f64,
    #[serde(rename = "AB_fibers_activated")]
    pub ab_fibers_activated: usize,
    #[serde(rename = "AB_action_potentials")]
    pub ab_action_potentials: i64,
    #[serde(rename = "AB_fibers_activation")]
    pub ab_fibers_activation: f64,
    #[serde(rename = "C_fibers_activated")]
    pub c_fibers_activated: usize,
    #[serde(rename = "C_action_potentials")]
    pub c_action_potentials: i64,
    #[serde(rename = "C_fibers_activation")]
    pub c_fibers_activation: f64,
    /// Column of this entry in every waveform table; set by the merger.
    pub waveforms_index: Option<usize>,
}

impl AmplitudeEntry {
    pub const HEADER: [&'static str; 17] = [
        "sample_id",
        "n_sim",
        "pulse_width",
        "inter_phase",
        "unit",
        "dt",
        "frequency",
        "amplitude",
        "response_power",
        "stimulation_power",
        "AB_fibers_activated",
        "AB_action_potentials",
        "AB_fibers_activation",
        "C_fibers_activated",
        "C_action_potentials",
        "C_fibers_activation",
        "waveforms_index",
    ];

    pub fn activation(&self, fiber_type: FiberType) -> FiberActivation {
        match fiber_type {
            FiberType::Myelinated => FiberActivation {
                fibers_activated: self.ab_fibers_activated,
                action_potentials: self.ab_action_potentials,
                activation: self.ab_fibers_activation,
            },
            FiberType::Unmyelinated => FiberActivation {
                fibers_activated: self.c_fibers_activated,
                action_potentials: self.c_action_potentials,
                activation: self.c_fibers_activation,
            },
        }
    }
}

/// The four waveforms produced for a retained amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSet {
    pub combined: Vec<f64>,
    pub myelinated: Vec<f64>,
    pub unmyelinated: Vec<f64>,
    pub stimulus: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeResult {
    pub entry: AmplitudeEntry,
    pub waveforms: WaveformSet,
}

/// Output of one work unit of the full-dataset pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnitResult {
    pub amplitudes: Vec<AmplitudeResult>,
    /// Time column of the summed responses, first one seen in this unit.
    pub response_time: Option<Vec<f64>>,
    pub stimulus_time: Option<Vec<f64>>,
}

/// Columns stacked side by side on a shared time axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaveformTable {
    pub time: Vec<f64>,
    pub columns: Vec<Vec<f64>>,
}

impl WaveformTable {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of rows once ragged columns are padded.
    pub fn row_count(&self) -> usize {
        self.columns
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.time.len()))
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NerveMorphology {
    pub area: f64,
    pub equivalent_diameter: f64,
    pub a: f64,
    pub b: f64,
}

impl NerveMorphology {
    pub fn new(area: f64, a: f64, b: f64) -> Self {
        Self {
            area,
            equivalent_diameter: 2.0 * (area / std::f64::consts::PI).sqrt(),
            a,
            b,
        }
    }
}

/// One step of an activation-level curve.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdEntry {
    pub sample_id: u32,
    pub morphology: Option<NerveMorphology>,
    pub n_sim: u32,
    pub pulse_width: f64,
    pub frequency: f64,
    pub amplitude: f64,
    pub ab_fibers: usize,
    pub ab_activation_level: f64,
    pub c_fibers: usize,
    pub c_activation_level: f64,
}

/// Input/output file counts of one n-sim directory.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NSimFileCount {
    pub n_sim: String,
    pub inputs: usize,
    pub outputs: usize,
    pub activation_files: usize,
    pub response_files: usize,
    pub threshold_files: usize,
}
