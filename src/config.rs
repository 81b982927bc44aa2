use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CompileError, Result};
use crate::paths::SimLayout;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Directory holding one subdirectory per sample.
    pub root_dir: String,
    /// Directory holding the per-sample `mock.json` inputs (morphology lookup only).
    #[serde(default = "default_input_dir")]
    pub input_dir: String,
    #[serde(default = "default_model")]
    pub model: u32,
    pub samples: Vec<u32>,
    pub n_sims: IndexRange,
    #[serde(default)]
    pub dataset: DatasetSims,
    #[serde(default)]
    pub thresholds: ThresholdSims,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub scales: UnitScales,
    #[serde(default)]
    pub time_axis: TimeAxisPolicy,
    /// Treat a not-yet-ready unit as a failure instead of skipping it.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub outputs: OutputFiles,
}

/// Half-open `start..end` range of n-sim indices.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: u32,
    pub end: u32,
}

impl IndexRange {
    pub fn iter(&self) -> std::ops::Range<u32> {
        self.start..self.end
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct DatasetSims {
    pub myelinated_sim: u32,
    pub unmyelinated_sim: u32,
}

impl Default for DatasetSims {
    fn default() -> Self {
        Self {
            myelinated_sim: 7,
            unmyelinated_sim: 8,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ThresholdSims {
    pub myelinated_sim: u32,
    pub unmyelinated_sim: u32,
    #[serde(default)]
    pub include_morphology: bool,
}

impl Default for ThresholdSims {
    fn default() -> Self {
        Self {
            myelinated_sim: 5,
            unmyelinated_sim: 6,
            include_morphology: false,
        }
    }
}

/// Factors converting engine units to SI before power is computed.
/// Stimulus amplitudes are in mA, SFAP responses in uV.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct UnitScales {
    pub stimulus: f64,
    pub response: f64,
}

impl Default for UnitScales {
    fn default() -> Self {
        Self {
            stimulus: 1e-3,
            response: 1e-6,
        }
    }
}

/// How the merger reacts when a unit's time axis disagrees with the first one seen.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeAxisPolicy {
    #[default]
    FirstWins,
    Strict,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OutputFiles {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_dataset_file")]
    pub dataset: String,
    #[serde(default = "default_waveform_file")]
    pub waveforms: String,
    #[serde(default = "default_myelinated_file")]
    pub myelinated_waveforms: String,
    #[serde(default = "default_unmyelinated_file")]
    pub unmyelinated_waveforms: String,
    #[serde(default = "default_input_waveform_file")]
    pub input_waveforms: String,
    #[serde(default = "default_threshold_file")]
    pub thresholds: String,
    #[serde(default = "default_survey_file")]
    pub survey: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            dataset: default_dataset_file(),
            waveforms: default_waveform_file(),
            myelinated_waveforms: default_myelinated_file(),
            unmyelinated_waveforms: default_unmyelinated_file(),
            input_waveforms: default_input_waveform_file(),
            thresholds: default_threshold_file(),
            survey: default_survey_file(),
        }
    }
}

impl OutputFiles {
    pub fn path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(&self.dir).join(file_name)
    }
}

fn default_input_dir() -> String {
    "input".to_string()
}
fn default_model() -> u32 {
    2
}
fn default_workers() -> usize {
    10
}
fn default_output_dir() -> String {
    ".".to_string()
}
fn default_dataset_file() -> String {
    "vns_cervical_rat_data.csv".to_string()
}
fn default_waveform_file() -> String {
    "vns_responses.csv".to_string()
}
fn default_myelinated_file() -> String {
    "vns_myelinated_responses.csv".to_string()
}
fn default_unmyelinated_file() -> String {
    "vns_unmyelinated_responses.csv".to_string()
}
fn default_input_waveform_file() -> String {
    "vns_stimulations.csv".to_string()
}
fn default_threshold_file() -> String {
    "vns_dataset_threshold_sim.csv".to_string()
}
fn default_survey_file() -> String {
    "file_counts.csv".to_string()
}

impl Config {
    pub fn dataset_layout(&self) -> SimLayout {
        SimLayout::new(
            &self.root_dir,
            self.model,
            self.dataset.myelinated_sim,
            self.dataset.unmyelinated_sim,
        )
        .with_input_dir(&self.input_dir)
    }

    pub fn threshold_layout(&self) -> SimLayout {
        SimLayout::new(
            &self.root_dir,
            self.model,
            self.thresholds.myelinated_sim,
            self.thresholds.unmyelinated_sim,
        )
        .with_input_dir(&self.input_dir)
    }

    /// Checks everything that does not depend on the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.samples.is_empty() {
            return Err(CompileError::InvalidConfig("samples must not be empty".into()));
        }
        if self.n_sims.start >= self.n_sims.end {
            return Err(CompileError::InvalidConfig(format!(
                "n_sims range {}..{} is empty",
                self.n_sims.start, self.n_sims.end
            )));
        }
        if self.workers == 0 {
            return Err(CompileError::InvalidConfig("workers must be at least 1".into()));
        }
        for (name, scale) in [
            ("scales.stimulus", self.scales.stimulus),
            ("scales.response", self.scales.response),
        ] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(CompileError::InvalidConfig(format!(
                    "{} must be a positive finite number, got {}",
                    name, scale
                )));
            }
        }
        Ok(())
    }
}

pub fn parse_config(contents: &str, file_path: &Path) -> Result<Config> {
    let config = toml::from_str::<Config>(contents).map_err(|source| CompileError::Toml {
        path: file_path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

pub fn load_config_from_file(file_path: &Path) -> Result<Config> {
    match fs::read_to_string(file_path) {
        Ok(contents) => {
            let loaded_config = parse_config(&contents, file_path)?;
            let path = PathBuf::from(&loaded_config.root_dir);
            if path.is_dir() {
                Ok(loaded_config)
            } else {
                Err(CompileError::InvalidConfig(format!(
                    "root_dir specified in {} ('{}') is not a valid directory",
                    file_path.display(),
                    loaded_config.root_dir
                )))
            }
        }
        Err(e) => Err(CompileError::io(file_path, e)),
    }
}
