//! Topology input: the built-in reference graph and comma-separated topology files.
//!
//! A topology file holds one row per state, entries separated by commas:
//!
//! ```text
//! 0,1,1,1,1,0,0,...
//! 0,0,0,0,0,1,1,...
//! ```
//!
//! Blank lines are skipped. Any cell that does not parse as a number is a
//! [`ScoreError::Parse`] carrying its 1-based line number.

use std::path::Path;

use crate::constants::{REFERENCE_DECISION_TIERS, REFERENCE_STATE_COUNT, REFERENCE_TIER_WIDTH};
use crate::error::{Result, ScoreError};
use crate::state_space::StateSpace;
use crate::types::{RewardMatrix, SquareMatrix};

/// Fully layered reference graph: Start reaches every tier-1 state, each tier
/// reaches every state of the next tier, tier 4 reaches every ending.
pub fn reference_reward_matrix() -> RewardMatrix {
    let mut m = SquareMatrix::zeros(REFERENCE_STATE_COUNT);
    for col in 1..=REFERENCE_TIER_WIDTH {
        m.set(0, col, 1.0);
    }
    for tier in 1..=REFERENCE_DECISION_TIERS {
        let first = 1 + (tier - 1) * REFERENCE_TIER_WIDTH;
        let next = first + REFERENCE_TIER_WIDTH;
        for row in first..next {
            for col in next..next + REFERENCE_TIER_WIDTH {
                m.set(row, col, 1.0);
            }
        }
    }
    RewardMatrix::new(m)
}

/// Parse topology text into a reward matrix.
pub fn parse_topology(text: &str) -> Result<RewardMatrix> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split(',')
            .map(|cell| {
                let cell = cell.trim();
                cell.parse::<f64>().map_err(|_| ScoreError::Parse {
                    line: i + 1,
                    message: format!("'{cell}' is not a number"),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    RewardMatrix::from_rows(rows)
}

/// Read and parse a topology file, checking it against `space`.
pub fn load_topology(path: impl AsRef<Path>, space: &StateSpace) -> Result<RewardMatrix> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let rewards = parse_topology(&text)?;
    rewards.ensure_dim(space.len())?;
    Ok(rewards)
}

/// Render a reward matrix in the topology file format.
pub fn format_topology(rewards: &RewardMatrix) -> String {
    let mut out = String::new();
    for row in rewards.matrix().to_rows() {
        let cells: Vec<String> = row.iter().map(|v| format!("{v}")).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_matrix_shape() {
        let r = reference_reward_matrix();
        let m = r.matrix();
        assert_eq!(m.dim(), 21);
        assert_eq!(m.row(0)[1..5], [1.0; 4]);
        assert_eq!(m.row(0).iter().sum::<f64>(), 4.0);
        // 4C reaches all endings, endings reach nothing
        assert_eq!(m.row(16)[17..21], [1.0; 4]);
        for row in 17..21 {
            assert!(m.row(row).iter().all(|&v| v == 0.0));
        }
        // every non-terminal row has exactly four edges
        for row in 0..17 {
            assert_eq!(m.row(row).iter().sum::<f64>(), 4.0, "row {row}");
        }
    }

    #[test]
    fn test_parse_roundtrip_reference() {
        let text = format_topology(&reference_reward_matrix());
        assert!(text.starts_with("0,1,1,1,1,0"));
        let parsed = parse_topology(&text).unwrap();
        assert_eq!(parsed, reference_reward_matrix());
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_topology("0,1\n\n0,x\n").unwrap_err();
        assert!(matches!(err, ScoreError::Parse { line: 3, .. }));
        assert!(matches!(
            parse_topology("0,1,0\n0,0,1\n"),
            Err(ScoreError::NotSquare { .. })
        ));
        assert!(matches!(parse_topology("\n\n"), Err(ScoreError::EmptyMatrix)));
    }

    #[test]
    fn test_load_checks_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.txt");
        std::fs::write(&path, "0,1\n0,0\n").unwrap();
        let err = load_topology(&path, &StateSpace::reference()).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::DimensionMismatch {
                expected: 21,
                found: 2
            }
        ));
    }
}
