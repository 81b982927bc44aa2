#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use fiber_dataset::config::{parse_config, Config};
use fiber_dataset::{FiberType, PathKind, SimLayout, WorkUnitKey};
use tempfile::TempDir;

pub const DT: f64 = 0.5;
pub const STIMULUS: [f64; 4] = [0.0, 1.0, -1.0, 0.0];
pub const MYELINATED_FIBERS: usize = 3;
pub const UNMYELINATED_FIBERS: usize = 2;

/// A synthetic campaign tree under a temporary directory.
pub struct Campaign {
    pub dir: TempDir,
    pub layout: SimLayout,
}

impl Campaign {
    pub fn new() -> Self {
        Self::with_sims(7, 8)
    }

    pub fn with_sims(myelinated_sim: u32, unmyelinated_sim: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = SimLayout::new(dir.path().join("samples"), 2, myelinated_sim, unmyelinated_sim)
            .with_input_dir(dir.path().join("input"));
        Self { dir, layout }
    }

    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn write(&self, path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn write_diameters(&self, key: WorkUnitKey, fiber_type: FiberType, fibers: usize) {
        let text: String = (0..fibers).map(|i| format!("{}.5\n", i + 1)).collect();
        self.write(&self.layout.resolve(&key, PathKind::Diameters(fiber_type)), &text);
    }

    pub fn write_metadata(&self, key: WorkUnitKey, amplitudes: &[f64]) {
        let amps: Vec<String> = amplitudes.iter().map(|a| a.to_string()).collect();
        let json = format!(
            r#"{{
  "waveform": {{
    "global": {{ "dt": {dt}, "on": 1.0, "off": 2.0, "stop": 2.0, "unit": "[ms]" }},
    "BIPHASIC_PULSE_TRAIN": {{ "pulse_width": 0.1, "inter_phase": 0.05, "pulse_repetition_freq": 20, "digits": 1 }}
  }},
  "protocol": {{ "mode": "FINITE_AMPLITUDES", "amplitudes": [{amps}] }}
}}"#,
            dt = DT,
            amps = amps.join(", ")
        );
        self.write(&self.layout.resolve(&key, PathKind::Metadata), &json);
    }

    /// Metadata of an activation-threshold run: the protocol carries search
    /// settings and no amplitude list.
    pub fn write_threshold_metadata(&self, key: WorkUnitKey, pulse_width: f64, frequency: f64) {
        let json = format!(
            r#"{{
  "waveform": {{
    "global": {{ "dt": {dt}, "on": 1.0, "off": 2.0, "stop": 2.0, "unit": "[ms]" }},
    "BIPHASIC_PULSE_TRAIN": {{ "pulse_width": {pw}, "inter_phase": 0.05, "pulse_repetition_freq": {freq}, "digits": 1 }}
  }},
  "protocol": {{
    "mode": "ACTIVATION_THRESHOLD",
    "initial_temp": 37,
    "threshold": {{ "value": -30, "n_min_aps": 1, "ap_detect_location": 0.9 }},
    "bounds_search": {{ "mode": "PERCENT_INCREMENT", "top": -1, "bottom": -0.01, "step": 10 }},
    "termination_criteria": {{ "mode": "PERCENT_DIFFERENCE", "percent": 1 }}
  }}
}}"#,
            dt = DT,
            pw = pulse_width,
            freq = frequency
        );
        self.write(&self.layout.resolve(&key, PathKind::Metadata), &json);
    }

    pub fn write_stimulus(&self, key: WorkUnitKey) {
        let mut text = format!("{}\n{}\n", DT, STIMULUS.len());
        for x in STIMULUS {
            text.push_str(&format!("{}\n", x));
        }
        self.write(&self.layout.resolve(&key, PathKind::InputWaveform), &text);
    }

    pub fn write_activation(&self, key: WorkUnitKey, fiber_type: FiberType, fiber: usize, amplitude: usize, count: i64) {
        let path = self.layout.resolve(
            &key,
            PathKind::ActivationOutput {
                fiber_type,
                fiber,
                amplitude,
            },
        );
        self.write(&path, &format!("{}\n", count));
    }

    pub fn write_response(
        &self,
        key: WorkUnitKey,
        fiber_type: FiberType,
        fiber: usize,
        amplitude: usize,
        rows: &[(f64, f64)],
    ) {
        let mut text = String::from("time(ms) SFAP(uV)\n");
        for (t, v) in rows {
            text.push_str(&format!("{} {}\n", t, v));
        }
        let path = self.layout.resolve(
            &key,
            PathKind::ResponseOutput {
                fiber_type,
                fiber,
                amplitude,
            },
        );
        self.write(&path, &text);
    }

    pub fn remove_response(&self, key: WorkUnitKey, fiber_type: FiberType, fiber: usize, amplitude: usize) {
        let path = self.layout.resolve(
            &key,
            PathKind::ResponseOutput {
                fiber_type,
                fiber,
                amplitude,
            },
        );
        fs::remove_file(path).unwrap();
    }

    pub fn write_threshold(&self, key: WorkUnitKey, fiber_type: FiberType, fiber: usize, value: f64) {
        let path = self
            .layout
            .resolve(&key, PathKind::ThresholdOutput { fiber_type, fiber });
        self.write(&path, &format!("{}\n", value));
    }

    /// Value of fiber `f` at amplitude index `a`, per sample: `(f+1)(a+1)` at
    /// t=0 and twice that at t=DT.
    pub fn fiber_value(fiber: usize, amplitude: usize) -> f64 {
        ((fiber + 1) * (amplitude + 1)) as f64
    }

    /// A complete unit: 3 myelinated fibers (only fiber 1 fires, 3 APs) and
    /// 2 unmyelinated fibers (only fiber 0 fires, 1 AP), every response present.
    pub fn write_complete_unit(&self, key: WorkUnitKey, amplitudes: &[f64]) {
        self.write_metadata(key, amplitudes);
        self.write_stimulus(key);
        self.write_diameters(key, FiberType::Myelinated, MYELINATED_FIBERS);
        self.write_diameters(key, FiberType::Unmyelinated, UNMYELINATED_FIBERS);
        for a in 0..amplitudes.len() {
            for f in 0..MYELINATED_FIBERS {
                self.write_activation(key, FiberType::Myelinated, f, a, if f == 1 { 3 } else { 0 });
                let v = Self::fiber_value(f, a);
                self.write_response(key, FiberType::Myelinated, f, a, &[(0.0, v), (DT, 2.0 * v)]);
            }
            for f in 0..UNMYELINATED_FIBERS {
                self.write_activation(key, FiberType::Unmyelinated, f, a, if f == 0 { 1 } else { 0 });
                let v = Self::fiber_value(f, a);
                self.write_response(key, FiberType::Unmyelinated, f, a, &[(0.0, v), (DT, 2.0 * v)]);
            }
        }
    }

    pub fn config(&self, samples: &[u32], n_sims: u32, extra: &str) -> Config {
        self.config_with_morphology(samples, n_sims, extra, false)
    }

    pub fn config_with_morphology(
        &self,
        samples: &[u32],
        n_sims: u32,
        extra: &str,
        include_morphology: bool,
    ) -> Config {
        let samples: Vec<String> = samples.iter().map(|s| s.to_string()).collect();
        let text = format!(
            r#"root_dir = "{root}"
input_dir = "{input}"
samples = [{samples}]
n_sims = {{ start = 0, end = {n_sims} }}
workers = 4
{extra}

[dataset]
myelinated_sim = {m}
unmyelinated_sim = {u}

[thresholds]
myelinated_sim = {m}
unmyelinated_sim = {u}
include_morphology = {morph}

[outputs]
dir = "{out}"
"#,
            root = self.layout.root.display(),
            input = self.layout.input_dir.display(),
            samples = samples.join(", "),
            n_sims = n_sims,
            extra = extra,
            m = self.layout.myelinated_sim,
            u = self.layout.unmyelinated_sim,
            out = self.out_dir().display(),
            morph = include_morphology,
        );
        parse_config(&text, Path::new("test-config.toml")).unwrap()
    }
}

pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

pub fn column<'a>(header: &[String], rows: &'a [Vec<String>], name: &str) -> Vec<&'a str> {
    let index = header.iter().position(|h| h == name).unwrap();
    rows.iter().map(|r| r[index].as_str()).collect()
}
