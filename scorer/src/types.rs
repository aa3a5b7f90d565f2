//! Core data structures: square matrices, reward templates, and paths.
//!
//! Every table in the pipeline is a [`SquareMatrix`] stored row-major in a flat
//! `Vec<f64>`, so `(row, col)` lives at `row * dim + col` and the row-major
//! flattening used by depth weighting is the storage order itself.
//!
//! [`RewardMatrix`] is the validated, immutable template supplied by the caller.
//! Agents never mutate it; they derive a private copy via [`RewardMatrix::targeted`].

use crate::error::{Result, ScoreError};

/// Dense square matrix of f64, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct SquareMatrix {
    dim: usize,
    values: Vec<f64>,
}

/// Learned state-action values Q(s, a). Row = state, column = action (next state).
pub type ValueTable = SquareMatrix;

impl SquareMatrix {
    /// All-zero `dim x dim` matrix.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            values: vec![0.0; dim * dim],
        }
    }

    /// Build from rows, rejecting empty, ragged or non-finite input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let dim = rows.len();
        if dim == 0 {
            return Err(ScoreError::EmptyMatrix);
        }
        let mut values = Vec::with_capacity(dim * dim);
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(ScoreError::NotSquare {
                    row: r,
                    len: row.len(),
                    expected: dim,
                });
            }
            for (c, &v) in row.iter().enumerate() {
                if !v.is_finite() {
                    return Err(ScoreError::NonFiniteEntry {
                        row: r,
                        col: c,
                        value: v,
                    });
                }
            }
            values.extend(row);
        }
        Ok(Self { dim, values })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.dim + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.dim + col] = value;
    }

    #[inline]
    pub fn add(&mut self, row: usize, col: usize, delta: f64) {
        self.values[row * self.dim + col] += delta;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.dim..(row + 1) * self.dim]
    }

    /// Flat row-major view (length `dim²`).
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Column of the first maximum in `row`. Ties go to the lowest index.
    pub fn argmax_row(&self, row: usize) -> usize {
        let mut best = 0;
        let mut best_val = f64::NEG_INFINITY;
        for (c, &v) in self.row(row).iter().enumerate() {
            if v > best_val {
                best_val = v;
                best = c;
            }
        }
        best
    }

    /// Largest value in `row`.
    #[inline]
    pub fn max_row(&self, row: usize) -> f64 {
        self.get(row, self.argmax_row(row))
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.chunks(self.dim).map(|r| r.to_vec()).collect()
    }

    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

/// Immutable adjacency/reward template: 0 = no edge, positive = viable edge.
#[derive(Clone, Debug, PartialEq)]
pub struct RewardMatrix {
    matrix: SquareMatrix,
}

impl RewardMatrix {
    pub fn new(matrix: SquareMatrix) -> Self {
        Self { matrix }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        SquareMatrix::from_rows(rows).map(Self::new)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.matrix.dim()
    }

    #[inline]
    pub fn matrix(&self) -> &SquareMatrix {
        &self.matrix
    }

    /// Private per-agent copy with `reward` on the diagonal entry of `end`.
    pub fn targeted(&self, end: usize, reward: f64) -> SquareMatrix {
        let mut copy = self.matrix.clone();
        copy.set(end, end, reward);
        copy
    }

    /// Fail unless the template matches a state space of `expected` states.
    pub fn ensure_dim(&self, expected: usize) -> Result<()> {
        if self.dim() != expected {
            return Err(ScoreError::DimensionMismatch {
                expected,
                found: self.dim(),
            });
        }
        Ok(())
    }
}

/// Ordered sequence of state labels visited by a greedy policy.
pub type Path = Vec<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = SquareMatrix::from_rows(vec![vec![0.0, 1.0], vec![0.0]]).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::NotSquare {
                row: 1,
                len: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn test_from_rows_rejects_empty_and_nan() {
        assert!(matches!(
            SquareMatrix::from_rows(vec![]),
            Err(ScoreError::EmptyMatrix)
        ));
        assert!(matches!(
            SquareMatrix::from_rows(vec![vec![f64::NAN]]),
            Err(ScoreError::NonFiniteEntry { row: 0, col: 0, .. })
        ));
    }

    #[test]
    fn test_argmax_first_index_wins_ties() {
        let m = SquareMatrix::from_rows(vec![
            vec![0.0, 2.0, 2.0],
            vec![0.0, 0.0, 0.0],
            vec![-1.0, -3.0, -1.0],
        ])
        .unwrap();
        assert_eq!(m.argmax_row(0), 1);
        assert_eq!(m.argmax_row(1), 0);
        assert_eq!(m.argmax_row(2), 0);
        assert_eq!(m.max_row(0), 2.0);
    }

    #[test]
    fn test_targeted_leaves_template_untouched() {
        let rewards = RewardMatrix::from_rows(vec![vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap();
        let targeted = rewards.targeted(1, 999.0);
        assert_eq!(targeted.get(1, 1), 999.0);
        assert_eq!(rewards.matrix().get(1, 1), 0.0);
    }

    #[test]
    fn test_row_major_layout() {
        let m = SquareMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert_eq!(m.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }
}
