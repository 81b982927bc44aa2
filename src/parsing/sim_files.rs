//! Readers for the small text files the simulation engine leaves behind.
//!
//! Each `parse_*` function works on file contents so it can be tested without
//! a tree on disk; the `read_*` wrappers add the path to every error.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::{CompileError, Result};
use crate::types::sim_data::{SimMetadata, ThresholdMetadata};

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| CompileError::io(path, e))
}

fn parse_number(path: &Path, line: usize, token: &str) -> Result<f64> {
    token
        .trim()
        .parse::<f64>()
        .map_err(|_| CompileError::parse(path, line, format!("'{}' is not a number", token.trim())))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents).map_err(|source| CompileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_metadata(path: &Path, contents: &str) -> Result<SimMetadata> {
    let metadata: SimMetadata =
        serde_json::from_str(contents).map_err(|source| CompileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    metadata
        .check()
        .map_err(|message| CompileError::InvalidMetadata {
            path: path.to_path_buf(),
            message,
        })?;
    Ok(metadata)
}

pub fn read_metadata(path: &Path) -> Result<SimMetadata> {
    parse_metadata(path, &read_text(path)?)
}

pub fn parse_threshold_metadata(path: &Path, contents: &str) -> Result<ThresholdMetadata> {
    serde_json::from_str(contents).map_err(|source| CompileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_threshold_metadata(path: &Path) -> Result<ThresholdMetadata> {
    parse_threshold_metadata(path, &read_text(path)?)
}

/// Number of fibers in a population: one diameter per non-empty line.
pub fn parse_diameter_count(path: &Path, contents: &str) -> Result<usize> {
    let mut count = 0;
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        parse_number(path, index + 1, line)?;
        count += 1;
    }
    Ok(count)
}

pub fn read_diameter_count(path: &Path) -> Result<usize> {
    parse_diameter_count(path, &read_text(path)?)
}

/// Unscaled stimulus samples: two leading rows are skipped, then the first
/// comma- or whitespace-delimited column of every remaining row is taken.
pub fn parse_stimulus_waveform(path: &Path, contents: &str) -> Result<Vec<f64>> {
    let mut samples = Vec::new();
    for (index, line) in contents.lines().enumerate().skip(2) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let first = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .find(|token| !token.is_empty())
            .unwrap_or(trimmed);
        samples.push(parse_number(path, index + 1, first)?);
    }
    Ok(samples)
}

pub fn read_stimulus_waveform(path: &Path) -> Result<Vec<f64>> {
    parse_stimulus_waveform(path, &read_text(path)?)
}

/// Action-potential count of one fiber at one amplitude.
pub fn parse_activation_count(path: &Path, contents: &str) -> Result<i64> {
    let trimmed = contents.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| CompileError::parse(path, 1, format!("'{}' is not an integer", trimmed)))
}

pub fn read_activation_count(path: &Path) -> Result<i64> {
    parse_activation_count(path, &read_text(path)?)
}

/// `(time, value)` rows of an SFAP file; the first row is a header.
pub fn parse_response_series(path: &Path, contents: &str) -> Result<Vec<(f64, f64)>> {
    let mut rows = Vec::new();
    for (index, line) in contents.lines().enumerate().skip(1) {
        let mut tokens = line.split_whitespace();
        let Some(time) = tokens.next() else {
            continue;
        };
        let value = tokens.next().ok_or_else(|| {
            CompileError::parse(path, index + 1, "expected two columns (time, value)")
        })?;
        rows.push((
            parse_number(path, index + 1, time)?,
            parse_number(path, index + 1, value)?,
        ));
    }
    Ok(rows)
}

pub fn read_response_series(path: &Path) -> Result<Vec<(f64, f64)>> {
    parse_response_series(path, &read_text(path)?)
}

pub fn parse_threshold(path: &Path, contents: &str) -> Result<f64> {
    parse_number(path, 1, contents)
}

pub fn read_threshold(path: &Path) -> Result<f64> {
    parse_threshold(path, &read_text(path)?)
}
