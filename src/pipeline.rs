use std::path::PathBuf;

use tracing::info;

use crate::compile::{
    compute_unit, enumerate_units, load_threshold_unit, load_unit, merge_results, merge_thresholds,
    run_units, threshold_entries, Availability, MergeSummary,
};
use crate::config::Config;
use crate::error::Result;
use crate::survey::survey_n_sims;
use crate::table_writer::{write_tables_atomic, Table};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub summary: MergeSummary,
    pub written: Vec<PathBuf>,
}

/// Compiles the per-amplitude dataset and its four waveform tables.
pub fn compile_dataset(config: &Config, workers: usize) -> Result<RunReport> {
    let layout = config.dataset_layout();
    let keys = enumerate_units(&config.samples, config.n_sims);
    let scales = config.scales;
    let strict = config.strict;

    info!(
        units = keys.len(),
        workers,
        root = %layout.root.display(),
        "compiling dataset"
    );

    let outcomes = run_units(&keys, workers, |key| {
        match load_unit(&layout, key)?.require(strict)? {
            Availability::Ready(descriptor) => {
                Ok(Availability::Ready(compute_unit(&layout, &descriptor, scales)?))
            }
            Availability::Absent(path) => Ok(Availability::Absent(path)),
        }
    })?;

    let (merged, summary) = merge_results(outcomes, config.time_axis)?;

    // waveform tables are written even when empty, so no table from an
    // earlier run survives next to the new entries
    let outputs = &config.outputs;
    let written = write_tables_atomic(&[
        (outputs.path(&outputs.dataset), Table::Entries(&merged.entries)),
        (outputs.path(&outputs.waveforms), Table::Waveforms(&merged.responses)),
        (outputs.path(&outputs.input_waveforms), Table::Waveforms(&merged.stimulations)),
        (
            outputs.path(&outputs.myelinated_waveforms),
            Table::Waveforms(&merged.myelinated_responses),
        ),
        (
            outputs.path(&outputs.unmyelinated_waveforms),
            Table::Waveforms(&merged.unmyelinated_responses),
        ),
    ])?;

    info!(
        entries = summary.entries,
        units_ready = summary.units_ready,
        units_skipped = summary.units_skipped,
        units_failed = summary.units_failed,
        "dataset compilation complete"
    );
    for path in &written {
        info!(path = %path.display(), "table written");
    }

    Ok(RunReport { summary, written })
}

/// Compiles activation-level curves from per-fiber thresholds.
pub fn compile_thresholds(config: &Config, workers: usize) -> Result<RunReport> {
    let layout = config.threshold_layout();
    let keys = enumerate_units(&config.samples, config.n_sims);
    let include_morphology = config.thresholds.include_morphology;
    let strict = config.strict;

    info!(units = keys.len(), workers, include_morphology, "compiling threshold curves");

    let outcomes = run_units(&keys, workers, |key| {
        match load_threshold_unit(&layout, key, include_morphology)?.require(strict)? {
            Availability::Ready(unit) => Ok(Availability::Ready(threshold_entries(&unit)?)),
            Availability::Absent(path) => Ok(Availability::Absent(path)),
        }
    })?;

    let (rows, summary) = merge_thresholds(outcomes);
    let path = config.outputs.path(&config.outputs.thresholds);
    let written = write_tables_atomic(&[(
        path,
        Table::Thresholds {
            rows: &rows,
            with_morphology: include_morphology,
        },
    )])?;

    info!(
        entries = summary.entries,
        units_ready = summary.units_ready,
        units_skipped = summary.units_skipped,
        units_failed = summary.units_failed,
        "threshold compilation complete"
    );

    Ok(RunReport { summary, written })
}

/// Writes the file-count survey of one simulation's n-sim directories.
/// `dir` overrides the directory derived from `sample` and `sim`.
pub fn survey_files(config: &Config, sample: u32, sim: u32, dir: Option<PathBuf>) -> Result<PathBuf> {
    let n_sims_dir = dir.unwrap_or_else(|| config.dataset_layout().n_sims_dir(sample, sim));
    info!(dir = %n_sims_dir.display(), "surveying n-sim directories");

    let counts = survey_n_sims(&n_sims_dir)?;
    let path = config.outputs.path(&config.outputs.survey);
    write_tables_atomic(&[(path.clone(), Table::FileCounts(&counts))])?;

    info!(n_sims = counts.len(), path = %path.display(), "counts saved");
    Ok(path)
}
