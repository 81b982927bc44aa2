use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{CompileError, Result};
use crate::types::dataset::{AmplitudeEntry, NSimFileCount, ThresholdEntry, WaveformTable};

/// A table ready to be serialized. Column order is fixed per variant.
#[derive(Debug, Clone, Copy)]
pub enum Table<'a> {
    Entries(&'a [AmplitudeEntry]),
    Thresholds {
        rows: &'a [ThresholdEntry],
        with_morphology: bool,
    },
    Waveforms(&'a WaveformTable),
    FileCounts(&'a [NSimFileCount]),
}

const THRESHOLD_LEADING: [&str; 1] = ["sample_id"];
const MORPHOLOGY_COLUMNS: [&str; 4] = [
    "nerve_area",
    "nerve_equivalent_diameter",
    "nerve_a",
    "nerve_b",
];
const THRESHOLD_TRAILING: [&str; 8] = [
    "n_sim",
    "pulse_width",
    "frequency",
    "amplitude",
    "AB_fibers",
    "AB_activation_level",
    "C_fibers",
    "C_activation_level",
];

const FILE_COUNT_HEADER: [&str; 6] = [
    "n_sim",
    "inputs",
    "outputs",
    "activation_files",
    "response_files",
    "threshold_files",
];

fn cell(value: Option<&f64>) -> String {
    value.map(f64::to_string).unwrap_or_default()
}

/// Activation levels and morphology are reported to four decimals.
fn rounded(value: f64) -> f64 {
    (value * 1e4).round() / 1e4
}

fn rounded_cell(value: Option<f64>) -> String {
    cell(value.map(rounded).as_ref())
}

impl Table<'_> {
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
        match *self {
            Table::Entries(rows) => {
                writer.write_record(AmplitudeEntry::HEADER)?;
                for row in rows {
                    writer.serialize(row)?;
                }
            }
            Table::Thresholds {
                rows,
                with_morphology,
            } => {
                let mut header: Vec<&str> = THRESHOLD_LEADING.to_vec();
                if with_morphology {
                    header.extend(MORPHOLOGY_COLUMNS);
                }
                header.extend(THRESHOLD_TRAILING);
                writer.write_record(&header)?;

                for row in rows {
                    let mut record = vec![row.sample_id.to_string()];
                    if with_morphology {
                        let m = row.morphology;
                        record.extend([
                            rounded_cell(m.map(|m| m.area)),
                            rounded_cell(m.map(|m| m.equivalent_diameter)),
                            rounded_cell(m.map(|m| m.a)),
                            rounded_cell(m.map(|m| m.b)),
                        ]);
                    }
                    record.extend([
                        row.n_sim.to_string(),
                        row.pulse_width.to_string(),
                        row.frequency.to_string(),
                        row.amplitude.to_string(),
                        row.ab_fibers.to_string(),
                        rounded(row.ab_activation_level).to_string(),
                        row.c_fibers.to_string(),
                        rounded(row.c_activation_level).to_string(),
                    ]);
                    writer.write_record(&record)?;
                }
            }
            Table::Waveforms(table) => {
                let mut header = vec!["time".to_string()];
                header.extend((0..table.columns.len()).map(|i| i.to_string()));
                writer.write_record(&header)?;

                // ragged columns are padded with empty cells
                for row in 0..table.row_count() {
                    let mut record = Vec::with_capacity(table.columns.len() + 1);
                    record.push(cell(table.time.get(row)));
                    record.extend(table.columns.iter().map(|column| cell(column.get(row))));
                    writer.write_record(&record)?;
                }
            }
            Table::FileCounts(rows) => {
                writer.write_record(FILE_COUNT_HEADER)?;
                for row in rows {
                    writer.serialize(row)?;
                }
            }
        }
        writer
            .flush()
            .map_err(|e| CompileError::Csv(csv::Error::from(e)))?;
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn stage(path: &Path, table: &Table<'_>) -> Result<NamedTempFile> {
    let dir = parent_dir(path);
    fs::create_dir_all(&dir).map_err(|e| CompileError::io(&dir, e))?;
    let mut staged = NamedTempFile::new_in(&dir).map_err(|e| CompileError::io(&dir, e))?;
    table.write_csv(staged.as_file_mut())?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| CompileError::io(staged.path(), e))?;
    Ok(staged)
}

/// Copy of the table a rename is about to replace, if there is one.
fn back_up(path: &Path) -> Result<Option<NamedTempFile>> {
    if !path.is_file() {
        return Ok(None);
    }
    let dir = parent_dir(path);
    let backup = NamedTempFile::new_in(&dir).map_err(|e| CompileError::io(&dir, e))?;
    fs::copy(path, backup.path()).map_err(|e| CompileError::io(path, e))?;
    Ok(Some(backup))
}

/// Puts back what the already-renamed tables replaced, newest first.
fn roll_back(replaced: Vec<(&PathBuf, Option<NamedTempFile>)>) {
    for (path, backup) in replaced.into_iter().rev() {
        let restored = match backup {
            Some(backup) => backup.persist(path).map(|_| ()).map_err(|e| e.error),
            None => fs::remove_file(path),
        };
        if let Err(e) = restored {
            warn!(path = %path.display(), error = %e, "could not restore previous table");
        }
    }
}

/// Writes every table or none of them. Each table is staged to a temporary
/// file beside its destination and any existing destination is copied
/// aside. Only once all are staged are they renamed into place; if a rename
/// fails, the tables renamed before it are restored from their copies (or
/// removed when they did not exist). A staging failure drops every
/// temporary file and leaves the destinations untouched.
pub fn write_tables_atomic(tables: &[(PathBuf, Table<'_>)]) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(tables.len());
    for (path, table) in tables {
        let file = stage(path, table)?;
        let backup = back_up(path)?;
        staged.push((path, file, backup));
    }

    let mut replaced = Vec::with_capacity(staged.len());
    for (path, file, backup) in staged {
        if let Err(e) = file.persist(path) {
            roll_back(replaced);
            return Err(CompileError::io(path, e.error));
        }
        replaced.push((path, backup));
    }
    Ok(replaced.into_iter().map(|(path, _)| path.clone()).collect())
}
