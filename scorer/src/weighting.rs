//! Depth weighting of flattened value tables.
//!
//! A table is flattened row-major into `dim²` entries and every entry is scaled
//! by the weight of its originating row's depth tier. Start rows weigh most,
//! deeper tiers progressively less, so policy differences near the start of
//! play dominate the distance between two tables.
//!
//! Terminal rows get their own policy ([`TerminalWeight`]): the scoring
//! workflow zeroes them, the table-comparison workflow applies a small weight.

use serde::{Deserialize, Serialize};

use crate::constants::{REFERENCE_TIER_WEIGHTS, TAPERED_TERMINAL_WEIGHT};
use crate::error::{Result, ScoreError};
use crate::state_space::StateSpace;
use crate::types::SquareMatrix;

/// Weight applied to terminal-state rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminalWeight {
    /// Terminal rows contribute nothing.
    Zero,
    /// Terminal rows are scaled by a small constant.
    Scaled { weight: f64 },
}

impl TerminalWeight {
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            TerminalWeight::Zero => 0.0,
            TerminalWeight::Scaled { weight } => weight,
        }
    }
}

/// Per-tier weights for non-terminal rows, indexed by depth, plus the terminal policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthWeights {
    pub tiers: Vec<f64>,
    pub terminal: TerminalWeight,
}

impl Default for DepthWeights {
    fn default() -> Self {
        Self::zeroed_terminals()
    }
}

impl DepthWeights {
    /// Reference tier weights with terminal rows dropped.
    pub fn zeroed_terminals() -> Self {
        Self {
            tiers: REFERENCE_TIER_WEIGHTS.to_vec(),
            terminal: TerminalWeight::Zero,
        }
    }

    /// Reference tier weights with terminal rows kept at a small weight.
    pub fn tapered_terminals() -> Self {
        Self {
            tiers: REFERENCE_TIER_WEIGHTS.to_vec(),
            terminal: TerminalWeight::Scaled {
                weight: TAPERED_TERMINAL_WEIGHT,
            },
        }
    }

    /// Weights must be finite, non-negative and strictly decreasing with depth,
    /// and the terminal weight must sit below the deepest tier.
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(ScoreError::InvalidConfig(
                "depth_weights.tiers must not be empty".into(),
            ));
        }
        for (i, &w) in self.tiers.iter().enumerate() {
            if !w.is_finite() || w < 0.0 {
                return Err(ScoreError::InvalidConfig(format!(
                    "depth_weights.tiers[{i}] = {w} is not a finite non-negative weight"
                )));
            }
        }
        if let Some(i) = self.tiers.windows(2).position(|w| w[1] >= w[0]) {
            return Err(ScoreError::InvalidConfig(format!(
                "depth_weights.tiers must strictly decrease (tier {} >= tier {})",
                i + 1,
                i
            )));
        }
        let terminal = self.terminal.value();
        let last = self.tiers[self.tiers.len() - 1];
        if !terminal.is_finite() || terminal < 0.0 || (terminal > 0.0 && terminal >= last) {
            return Err(ScoreError::InvalidConfig(format!(
                "terminal weight {terminal} must be non-negative and below the last tier weight {last}"
            )));
        }
        Ok(())
    }
}

/// Row factors resolved against a particular state space.
#[derive(Clone, Debug)]
pub struct DepthWeighter {
    row_factors: Vec<f64>,
}

impl DepthWeighter {
    /// Resolve one factor per state. Fails if a non-terminal state's depth has no tier weight.
    pub fn new(weights: &DepthWeights, space: &StateSpace) -> Result<Self> {
        let row_factors = space
            .states()
            .iter()
            .map(|s| {
                if s.terminal {
                    Ok(weights.terminal.value())
                } else {
                    weights
                        .tiers
                        .get(s.depth)
                        .copied()
                        .ok_or_else(|| ScoreError::MissingTierWeight {
                            tier: s.depth,
                            label: s.label.clone(),
                        })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { row_factors })
    }

    pub fn row_factors(&self) -> &[f64] {
        &self.row_factors
    }

    /// Flatten `table` row-major and scale each entry by its row's factor.
    pub fn weight(&self, table: &SquareMatrix) -> Result<Vec<f64>> {
        let dim = table.dim();
        if dim != self.row_factors.len() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.row_factors.len(),
                found: dim,
            });
        }
        Ok(table
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &v)| v * self.row_factors[i / dim])
            .collect())
    }
}
