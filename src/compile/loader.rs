use std::fs;
use std::path::Path;

use tracing::debug;

use super::Availability;
use crate::error::{CompileError, Result};
use crate::parsing::sim_files;
use crate::paths::{FiberType, PathKind, SimLayout, WorkUnitKey};
use crate::types::dataset::{NerveMorphology, UnitDescriptor};
use crate::types::sim_data::{NerveMock, SampleRecord};

fn dir_has_entries(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(path).map_err(|e| CompileError::io(path, e))?;
    Ok(entries.next().is_some())
}

/// Fiber count of one population. The diameters file belongs to the
/// simulation setup, so it is required once a unit's metadata exists.
fn fiber_count(layout: &SimLayout, key: &WorkUnitKey, fiber_type: FiberType) -> Result<usize> {
    let path = layout.resolve(key, PathKind::Diameters(fiber_type));
    if !path.is_file() {
        return Err(CompileError::MissingInput(path));
    }
    let count = sim_files::read_diameter_count(&path)?;
    if count == 0 {
        return Err(CompileError::ZeroPopulation {
            fiber_type: fiber_type.name(),
        });
    }
    Ok(count)
}

/// Reads everything one unit needs, or reports the first missing input.
pub fn load_unit(layout: &SimLayout, key: &WorkUnitKey) -> Result<Availability<UnitDescriptor>> {
    let metadata_path = layout.resolve(key, PathKind::Metadata);
    if !metadata_path.is_file() {
        return Ok(Availability::Absent(metadata_path));
    }
    let metadata = sim_files::read_metadata(&metadata_path)?;

    let myelinated_fibers = fiber_count(layout, key, FiberType::Myelinated)?;
    let unmyelinated_fibers = fiber_count(layout, key, FiberType::Unmyelinated)?;

    let waveform_path = layout.resolve(key, PathKind::InputWaveform);
    if !waveform_path.is_file() {
        return Ok(Availability::Absent(waveform_path));
    }
    let unscaled_stimulus = sim_files::read_stimulus_waveform(&waveform_path)?;

    for fiber_type in FiberType::ALL {
        let outputs = layout.resolve(key, PathKind::OutputDir(fiber_type));
        if !dir_has_entries(&outputs)? {
            return Ok(Availability::Absent(outputs));
        }
    }

    debug!(
        unit = %key,
        amplitudes = metadata.protocol.amplitudes.len(),
        myelinated_fibers,
        unmyelinated_fibers,
        "unit loaded"
    );

    let pulse = metadata.waveform.pulse_train;
    Ok(Availability::Ready(UnitDescriptor {
        key: *key,
        pulse_width: pulse.pulse_width,
        inter_phase: pulse.inter_phase,
        frequency: pulse.pulse_repetition_freq,
        unit: metadata.waveform.global.unit,
        dt: metadata.waveform.global.dt,
        amplitudes: metadata.protocol.amplitudes,
        myelinated_fibers,
        unmyelinated_fibers,
        unscaled_stimulus,
    }))
}

/// Per-fiber thresholds of both populations for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdUnit {
    pub key: WorkUnitKey,
    pub pulse_width: f64,
    pub frequency: f64,
    pub morphology: Option<NerveMorphology>,
    pub myelinated: Vec<f64>,
    pub unmyelinated: Vec<f64>,
}

fn load_morphology(layout: &SimLayout, key: &WorkUnitKey) -> Result<Availability<NerveMorphology>> {
    let sample_path = layout.resolve(key, PathKind::SampleMetadata);
    if !sample_path.is_file() {
        return Ok(Availability::Absent(sample_path));
    }
    let sample: SampleRecord = sim_files::read_json(&sample_path)?;

    let mock_path = layout.resolve(
        key,
        PathKind::NerveMock {
            sample_name: &sample.sample,
        },
    );
    if !mock_path.is_file() {
        return Ok(Availability::Absent(mock_path));
    }
    let mock: NerveMock = sim_files::read_json(&mock_path)?;

    Ok(Availability::Ready(NerveMorphology::new(
        sample.morphology.nerve.area,
        mock.nerve.a,
        mock.nerve.b,
    )))
}

fn read_thresholds(
    layout: &SimLayout,
    key: &WorkUnitKey,
    fiber_type: FiberType,
    fibers: usize,
) -> Result<Vec<f64>> {
    let mut thresholds = Vec::new();
    for fiber in 0..fibers {
        let path = layout.resolve(key, PathKind::ThresholdOutput { fiber_type, fiber });
        if !path.is_file() {
            continue;
        }
        let value = sim_files::read_threshold(&path)?;
        if !value.is_finite() {
            return Err(CompileError::parse(&path, 1, format!("non-finite threshold {}", value)));
        }
        thresholds.push(value.abs());
    }
    Ok(thresholds)
}

pub fn load_threshold_unit(
    layout: &SimLayout,
    key: &WorkUnitKey,
    include_morphology: bool,
) -> Result<Availability<ThresholdUnit>> {
    let morphology = if include_morphology {
        match load_morphology(layout, key)? {
            Availability::Ready(morphology) => Some(morphology),
            Availability::Absent(path) => return Ok(Availability::Absent(path)),
        }
    } else {
        None
    };

    let metadata_path = layout.resolve(key, PathKind::Metadata);
    if !metadata_path.is_file() {
        return Ok(Availability::Absent(metadata_path));
    }
    let pulse = sim_files::read_threshold_metadata(&metadata_path)?.waveform.pulse_train;

    let myelinated_fibers = fiber_count(layout, key, FiberType::Myelinated)?;
    let unmyelinated_fibers = fiber_count(layout, key, FiberType::Unmyelinated)?;

    Ok(Availability::Ready(ThresholdUnit {
        key: *key,
        pulse_width: pulse.pulse_width,
        frequency: pulse.pulse_repetition_freq,
        morphology,
        myelinated: read_thresholds(layout, key, FiberType::Myelinated, myelinated_fibers)?,
        unmyelinated: read_thresholds(layout, key, FiberType::Unmyelinated, unmyelinated_fibers)?,
    }))
}
