//! JSON persistence for ensembles, averaged tables and score reports.
//!
//! Layout under an output directory, for a run named `stem`:
//! - `{stem}_{target}.json`: the ensemble's paths, value tables and averaged table
//! - `{stem}_{target}_averaged.json`: the averaged table alone (`[[f64]]`)
//! - `{stem}_report.json`: pairwise distances and the score

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ensemble::Ensemble;
use crate::error::Result;
use crate::scoring::{PairDistance, ScoreReport};
use crate::types::{SquareMatrix, ValueTable};

/// Serialized form of one target's ensemble.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnsembleFile {
    pub target: String,
    pub paths: Vec<Vec<String>>,
    pub converged: Vec<bool>,
    pub seeds: Vec<u64>,
    pub tables: Vec<Vec<Vec<f64>>>,
    pub averaged: Option<Vec<Vec<f64>>>,
}

impl EnsembleFile {
    pub fn new(ensemble: &Ensemble, averaged: Option<&ValueTable>) -> Self {
        Self {
            target: ensemble.target.clone(),
            paths: ensemble.runs.iter().map(|r| r.path.clone()).collect(),
            converged: ensemble.runs.iter().map(|r| r.converged).collect(),
            seeds: ensemble.runs.iter().map(|r| r.seed).collect(),
            tables: ensemble.runs.iter().map(|r| r.table.to_rows()).collect(),
            averaged: averaged.map(SquareMatrix::to_rows),
        }
    }
}

#[derive(Debug, Serialize)]
struct TargetSummary<'a> {
    target: &'a str,
    most_common_path: Option<&'a [String]>,
    most_common_count: usize,
    non_converged: usize,
}

#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    seed: u64,
    minkowski_order: f64,
    score: f64,
    pairs: &'a [PairDistance],
    targets: Vec<TargetSummary<'a>>,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut w, value)?;
    w.flush()?;
    Ok(())
}

pub fn ensemble_file_path(dir: &Path, stem: &str, target: &str) -> PathBuf {
    dir.join(format!("{stem}_{target}.json"))
}

pub fn averaged_file_path(dir: &Path, stem: &str, target: &str) -> PathBuf {
    dir.join(format!("{stem}_{target}_averaged.json"))
}

pub fn report_file_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}_report.json"))
}

/// Write an ensemble and, when given, its averaged table. Returns the ensemble file path.
pub fn save_ensemble(
    dir: &Path,
    stem: &str,
    ensemble: &Ensemble,
    averaged: Option<&ValueTable>,
) -> Result<PathBuf> {
    let path = ensemble_file_path(dir, stem, &ensemble.target);
    write_json(&path, &EnsembleFile::new(ensemble, averaged))?;
    if let Some(avg) = averaged {
        save_table(&averaged_file_path(dir, stem, &ensemble.target), avg)?;
    }
    tracing::info!(path = %path.display(), runs = ensemble.runs.len(), "saved ensemble");
    Ok(path)
}

pub fn load_ensemble(path: &Path) -> Result<EnsembleFile> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_table(path: &Path, table: &ValueTable) -> Result<()> {
    write_json(path, &table.to_rows())
}

/// Load a table saved by [`save_table`], validating that it is square and finite.
pub fn load_table(path: &Path) -> Result<ValueTable> {
    let reader = BufReader::new(File::open(path)?);
    let rows: Vec<Vec<f64>> = serde_json::from_reader(reader)?;
    SquareMatrix::from_rows(rows)
}

/// Write every target's ensemble plus the report summary.
pub fn save_report(dir: &Path, stem: &str, report: &ScoreReport) -> Result<PathBuf> {
    for outcome in &report.targets {
        save_ensemble(dir, stem, &outcome.ensemble, Some(&outcome.averaged))?;
    }

    let path_sets: Vec<_> = report.targets.iter().map(|o| o.ensemble.paths()).collect();
    let targets = report
        .targets
        .iter()
        .zip(&path_sets)
        .map(|(o, paths)| {
            let common = paths.most_common();
            TargetSummary {
                target: o.target(),
                most_common_path: common.map(|(p, _)| p.as_slice()),
                most_common_count: common.map_or(0, |(_, c)| c),
                non_converged: o.ensemble.non_converged(),
            }
        })
        .collect();

    let path = report_file_path(dir, stem);
    write_json(
        &path,
        &ReportFile {
            seed: report.seed,
            minkowski_order: report.minkowski_order,
            score: report.score,
            pairs: &report.pairs,
            targets,
        },
    )?;
    tracing::info!(path = %path.display(), score = report.score, "saved report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoreError;

    #[test]
    fn test_table_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("t.json");
        let table = SquareMatrix::from_rows(vec![vec![0.5, 1.25], vec![-3.0, 0.0]]).unwrap();
        save_table(&path, &table).unwrap();
        assert_eq!(load_table(&path).unwrap(), table);
    }

    #[test]
    fn test_load_table_rejects_ragged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[[1.0, 2.0], [3.0]]").unwrap();
        assert!(matches!(
            load_table(&path),
            Err(ScoreError::NotSquare { .. })
        ));
        assert!(matches!(
            load_table(&dir.path().join("missing.json")),
            Err(ScoreError::Io(_))
        ));
    }
}
