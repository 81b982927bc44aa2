//! Progress survey of a running campaign: how many input and output files
//! each n-sim directory of one simulation holds so far.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{CompileError, Result};
use crate::types::dataset::NSimFileCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Activation,
    Response,
    Threshold,
}

fn output_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(activation|SFAP_time|thresh)_inner\d+_fiber\d+(?:_amp\d+)?\.dat$")
            .expect("output file pattern is valid")
    })
}

/// Classifies an engine output file by name; `None` for anything else.
pub fn classify_output(file_name: &str) -> Option<OutputKind> {
    let caps = output_name_pattern().captures(file_name)?;
    match caps.get(1)?.as_str() {
        "activation" => Some(OutputKind::Activation),
        "SFAP_time" => Some(OutputKind::Response),
        "thresh" => Some(OutputKind::Threshold),
        _ => None,
    }
}

/// File names in `dir`; an absent directory counts as empty.
fn file_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CompileError::io(dir, e))? {
        let entry = entry.map_err(|e| CompileError::io(dir, e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

fn count_nsim(name: String, nsim_dir: &Path) -> Result<NSimFileCount> {
    let data = nsim_dir.join("data");
    let inputs = file_names(&data.join("inputs"))?.len();
    let outputs = file_names(&data.join("outputs"))?;

    let mut count = NSimFileCount {
        n_sim: name,
        inputs,
        outputs: outputs.len(),
        activation_files: 0,
        response_files: 0,
        threshold_files: 0,
    };
    for file_name in &outputs {
        match classify_output(file_name) {
            Some(OutputKind::Activation) => count.activation_files += 1,
            Some(OutputKind::Response) => count.response_files += 1,
            Some(OutputKind::Threshold) => count.threshold_files += 1,
            None => {}
        }
    }
    Ok(count)
}

/// One row per subdirectory of `n_sims_dir`, ordered by n-sim id
/// (numerically where the name is a number).
pub fn survey_n_sims(n_sims_dir: &Path) -> Result<Vec<NSimFileCount>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(n_sims_dir).map_err(|e| CompileError::io(n_sims_dir, e))? {
        let entry = entry.map_err(|e| CompileError::io(n_sims_dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    dirs.sort_by(|(a, _), (b, _)| {
        (a.parse::<u64>().ok(), a).cmp(&(b.parse::<u64>().ok(), b))
    });

    dirs.into_iter()
        .map(|(name, path)| count_nsim(name, &path))
        .collect()
}
