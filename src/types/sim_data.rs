use serde::{Deserialize, Serialize};

/// `<nsim>.json` as written by the simulation engine. Only the fields the
/// compiler consumes are modelled; everything else in the file is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimMetadata {
    pub waveform: WaveformSpec,
    pub protocol: Protocol,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WaveformSpec {
    #[serde(rename = "BIPHASIC_PULSE_TRAIN")]
    pub pulse_train: BiphasicPulseTrain,
    pub global: WaveformGlobal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BiphasicPulseTrain {
    pub pulse_width: f64,
    pub inter_phase: f64,
    pub pulse_repetition_freq: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WaveformGlobal {
    pub unit: String,
    pub dt: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Protocol {
    pub amplitudes: Vec<f64>,
}

impl SimMetadata {
    /// Rejects metadata that parsed but cannot drive a unit.
    pub fn check(&self) -> Result<(), String> {
        let dt = self.waveform.global.dt;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(format!("dt must be positive, got {}", dt));
        }
        if self.protocol.amplitudes.is_empty() {
            return Err("protocol.amplitudes is empty".to_string());
        }
        if let Some(bad) = self.protocol.amplitudes.iter().find(|a| !a.is_finite()) {
            return Err(format!("non-finite amplitude {}", bad));
        }
        Ok(())
    }
}

/// `<nsim>.json` of an activation-threshold run. Its protocol searches for a
/// threshold instead of listing amplitudes, so only the pulse shape is read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThresholdMetadata {
    pub waveform: ThresholdWaveform,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThresholdWaveform {
    #[serde(rename = "BIPHASIC_PULSE_TRAIN")]
    pub pulse_train: ThresholdPulseTrain,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThresholdPulseTrain {
    pub pulse_width: f64,
    pub pulse_repetition_freq: f64,
}

/// `<root>/<sample>/sample.json`, reduced to what the morphology columns need.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub sample: String,
    #[serde(rename = "Morphology")]
    pub morphology: SampleMorphology,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SampleMorphology {
    #[serde(rename = "Nerve")]
    pub nerve: NerveShape,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NerveShape {
    pub area: f64,
}

/// `<input>/<sample name>/mock.json`: ellipse axes of the mock nerve.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NerveMock {
    pub nerve: NerveAxes,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NerveAxes {
    pub a: f64,
    pub b: f64,
}
