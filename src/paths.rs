use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// One (sample, n-sim) combination; the unit of parallel dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WorkUnitKey {
    pub sample_id: u32,
    pub n_sim: u32,
}

impl WorkUnitKey {
    pub fn new(sample_id: u32, n_sim: u32) -> Self {
        Self { sample_id, n_sim }
    }
}

impl fmt::Display for WorkUnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sample {} / n_sim {}", self.sample_id, self.n_sim)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiberType {
    Myelinated,
    Unmyelinated,
}

impl FiberType {
    pub const ALL: [FiberType; 2] = [FiberType::Myelinated, FiberType::Unmyelinated];

    /// Column prefix used in the output tables.
    pub fn prefix(self) -> &'static str {
        match self {
            FiberType::Myelinated => "AB",
            FiberType::Unmyelinated => "C",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FiberType::Myelinated => "myelinated",
            FiberType::Unmyelinated => "unmyelinated",
        }
    }
}

impl fmt::Display for FiberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKind<'a> {
    /// `<nsim>.json` of the myelinated run; both runs share one protocol.
    Metadata,
    Diameters(FiberType),
    InputWaveform,
    NSimDir(FiberType),
    OutputDir(FiberType),
    ActivationOutput {
        fiber_type: FiberType,
        fiber: usize,
        amplitude: usize,
    },
    ResponseOutput {
        fiber_type: FiberType,
        fiber: usize,
        amplitude: usize,
    },
    ThresholdOutput {
        fiber_type: FiberType,
        fiber: usize,
    },
    SampleMetadata,
    NerveMock {
        sample_name: &'a str,
    },
}

/// Where a campaign lives on disk and which simulation backs each fiber type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimLayout {
    pub root: PathBuf,
    pub input_dir: PathBuf,
    pub model: u32,
    pub myelinated_sim: u32,
    pub unmyelinated_sim: u32,
}

impl SimLayout {
    pub fn new(root: impl AsRef<Path>, model: u32, myelinated_sim: u32, unmyelinated_sim: u32) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            input_dir: PathBuf::from("input"),
            model,
            myelinated_sim,
            unmyelinated_sim,
        }
    }

    pub fn with_input_dir(mut self, input_dir: impl AsRef<Path>) -> Self {
        self.input_dir = input_dir.as_ref().to_path_buf();
        self
    }

    pub fn sim_id(&self, fiber_type: FiberType) -> u32 {
        match fiber_type {
            FiberType::Myelinated => self.myelinated_sim,
            FiberType::Unmyelinated => self.unmyelinated_sim,
        }
    }

    fn sample_dir(&self, sample_id: u32) -> PathBuf {
        self.root.join(sample_id.to_string())
    }

    /// `<root>/<sample>/models/<model>/sims/<sim>`
    pub fn sim_dir(&self, sample_id: u32, sim: u32) -> PathBuf {
        self.sample_dir(sample_id)
            .join("models")
            .join(self.model.to_string())
            .join("sims")
            .join(sim.to_string())
    }

    /// `<root>/<sample>/models/<model>/sims/<sim>/n_sims`
    pub fn n_sims_dir(&self, sample_id: u32, sim: u32) -> PathBuf {
        self.sim_dir(sample_id, sim).join("n_sims")
    }

    fn nsim_dir(&self, key: &WorkUnitKey, fiber_type: FiberType) -> PathBuf {
        self.n_sims_dir(key.sample_id, self.sim_id(fiber_type))
            .join(key.n_sim.to_string())
    }

    fn outputs(&self, key: &WorkUnitKey, fiber_type: FiberType) -> PathBuf {
        self.nsim_dir(key, fiber_type).join("data").join("outputs")
    }

    /// Derives the path of `kind` for `key`. Never touches the filesystem.
    pub fn resolve(&self, key: &WorkUnitKey, kind: PathKind<'_>) -> PathBuf {
        match kind {
            PathKind::Metadata => self
                .nsim_dir(key, FiberType::Myelinated)
                .join(format!("{}.json", key.n_sim)),
            PathKind::Diameters(fiber_type) => self
                .sim_dir(key.sample_id, self.sim_id(fiber_type))
                .join("fibersets")
                .join("0")
                .join("diams.txt"),
            PathKind::InputWaveform => self
                .nsim_dir(key, FiberType::Myelinated)
                .join("data")
                .join("inputs")
                .join("waveform.dat"),
            PathKind::NSimDir(fiber_type) => self.nsim_dir(key, fiber_type),
            PathKind::OutputDir(fiber_type) => self.outputs(key, fiber_type),
            PathKind::ActivationOutput {
                fiber_type,
                fiber,
                amplitude,
            } => self.outputs(key, fiber_type).join(format!(
                "activation_inner0_fiber{}_amp{}.dat",
                fiber, amplitude
            )),
            PathKind::ResponseOutput {
                fiber_type,
                fiber,
                amplitude,
            } => self.outputs(key, fiber_type).join(format!(
                "SFAP_time_inner0_fiber{}_amp{}.dat",
                fiber, amplitude
            )),
            PathKind::ThresholdOutput { fiber_type, fiber } => self
                .outputs(key, fiber_type)
                .join(format!("thresh_inner0_fiber{}.dat", fiber)),
            PathKind::SampleMetadata => self.sample_dir(key.sample_id).join("sample.json"),
            PathKind::NerveMock { sample_name } => {
                self.input_dir.join(sample_name).join("mock.json")
            }
        }
    }
}
