//! Meaningfulness score of a topology.
//!
//! For each target ending: train an ensemble, average its tables, apply depth
//! weighting. Then take the Minkowski distance between every unordered pair of
//! weighted vectors; the score is the mean of those C(n, 2) distances.
//!
//! Endings reached through near-identical value estimates score close to 0
//! (illusory choice); endings reached through distinct learned policies score
//! higher.

use std::time::Instant;

use serde::Serialize;

use crate::averaging::average_tables;
use crate::config::ScoringConfig;
use crate::distance::minkowski_distance;
use crate::ensemble::{Ensemble, EnsembleRunner};
use crate::error::{Result, ScoreError};
use crate::state_space::StateSpace;
use crate::types::{RewardMatrix, ValueTable};
use crate::weighting::DepthWeighter;

/// Per-target output of the pipeline.
#[derive(Clone, Debug)]
pub struct TargetOutcome {
    pub ensemble: Ensemble,
    pub averaged: ValueTable,
    pub weighted: Vec<f64>,
}

impl TargetOutcome {
    pub fn target(&self) -> &str {
        &self.ensemble.target
    }
}

/// Distance between two targets' weighted tables.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairDistance {
    pub a: String,
    pub b: String,
    pub distance: f64,
}

/// Full result of a scoring run.
#[derive(Clone, Debug)]
pub struct ScoreReport {
    pub seed: u64,
    pub minkowski_order: f64,
    pub targets: Vec<TargetOutcome>,
    pub pairs: Vec<PairDistance>,
    pub score: f64,
}

/// Seed for the ensemble of the `slot`-th target.
#[inline]
fn target_seed(seed: u64, slot: usize) -> u64 {
    seed.wrapping_add((slot as u64) << 32)
}

/// Drives ensembles, averaging, weighting and pairwise distances.
pub struct ScoringOrchestrator {
    space: StateSpace,
    rewards: RewardMatrix,
    config: ScoringConfig,
    weighter: DepthWeighter,
}

impl ScoringOrchestrator {
    /// Validates the config and checks the reward matrix against the state space.
    pub fn new(space: StateSpace, rewards: RewardMatrix, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        rewards.ensure_dim(space.len())?;
        let weighter = DepthWeighter::new(&config.depth_weights, &space)?;
        Ok(Self {
            space,
            rewards,
            config,
            weighter,
        })
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn runner(&self) -> Result<EnsembleRunner<'_>> {
        EnsembleRunner::new(
            &self.space,
            &self.rewards,
            self.config.agent_params(self.space.len()),
            self.config.runs,
            self.config.iterations,
            self.config.on_non_convergence,
        )
    }

    /// Train, average and weight one target.
    pub fn evaluate_target(&self, target: &str, seed: u64) -> Result<TargetOutcome> {
        let ensemble = self.runner()?.run(target, seed)?;
        let averaged = average_tables(&ensemble.tables())?;
        let weighted = self.weighter.weight(&averaged)?;
        Ok(TargetOutcome {
            ensemble,
            averaged,
            weighted,
        })
    }

    /// Score every terminal state of the space.
    pub fn score_terminals(&self) -> Result<ScoreReport> {
        let targets = self.space.terminal_labels();
        let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
        self.score(&refs)
    }

    /// Score the given targets. Needs at least two.
    pub fn score(&self, targets: &[&str]) -> Result<ScoreReport> {
        if targets.len() < 2 {
            return Err(ScoreError::TooFewTargets(targets.len()));
        }
        for t in targets {
            self.space.index_of(t)?;
        }

        let seed = self.config.resolve_seed();
        let t0 = Instant::now();
        let outcomes = targets
            .iter()
            .enumerate()
            .map(|(slot, t)| self.evaluate_target(t, target_seed(seed, slot)))
            .collect::<Result<Vec<_>>>()?;

        let weighted: Vec<(&str, &[f64])> = outcomes
            .iter()
            .map(|o| (o.target(), o.weighted.as_slice()))
            .collect();
        let pairs = pairwise_distances(&weighted, self.config.minkowski_order)?;
        let score = mean_distance(&pairs)?;

        tracing::info!(
            targets = targets.len(),
            pairs = pairs.len(),
            score,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "topology scored"
        );

        Ok(ScoreReport {
            seed,
            minkowski_order: self.config.minkowski_order,
            targets: outcomes,
            pairs,
            score,
        })
    }
}

/// Distances for every unordered pair `(i, j)`, `i < j`, in lexicographic order.
pub fn pairwise_distances(vectors: &[(&str, &[f64])], p: f64) -> Result<Vec<PairDistance>> {
    let n = vectors.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let distance = minkowski_distance(vectors[i].1, vectors[j].1, p)?;
            tracing::debug!(a = vectors[i].0, b = vectors[j].0, distance, "pair distance");
            pairs.push(PairDistance {
                a: vectors[i].0.to_string(),
                b: vectors[j].0.to_string(),
                distance,
            });
        }
    }
    Ok(pairs)
}

/// Arithmetic mean of pairwise distances. No pairs is an error.
pub fn mean_distance(pairs: &[PairDistance]) -> Result<f64> {
    if pairs.is_empty() {
        return Err(ScoreError::TooFewTargets(0));
    }
    Ok(pairs.iter().map(|p| p.distance).sum::<f64>() / pairs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::reference_reward_matrix;

    #[test]
    fn test_pairwise_order_and_mean() {
        let a = [0.0, 0.0];
        let b = [1.0, 0.0];
        let c = [1.0, 2.0];
        let pairs =
            pairwise_distances(&[("a", &a[..]), ("b", &b[..]), ("c", &c[..])], 1.0).unwrap();
        let got: Vec<(&str, &str, f64)> = pairs
            .iter()
            .map(|p| (p.a.as_str(), p.b.as_str(), p.distance))
            .collect();
        assert_eq!(got, vec![("a", "b", 1.0), ("a", "c", 3.0), ("b", "c", 2.0)]);
        assert_eq!(mean_distance(&pairs).unwrap(), 2.0);
    }

    #[test]
    fn test_too_few_targets() {
        let orch = ScoringOrchestrator::new(
            StateSpace::reference(),
            reference_reward_matrix(),
            ScoringConfig::default(),
        )
        .unwrap();
        assert!(matches!(orch.score(&["E1"]), Err(ScoreError::TooFewTargets(1))));
        assert!(matches!(orch.score(&[]), Err(ScoreError::TooFewTargets(0))));
        assert!(matches!(mean_distance(&[]), Err(ScoreError::TooFewTargets(0))));
    }

    #[test]
    fn test_unknown_target_rejected_before_training() {
        let orch = ScoringOrchestrator::new(
            StateSpace::reference(),
            reference_reward_matrix(),
            ScoringConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            orch.score(&["E1", "Ending"]),
            Err(ScoreError::UnknownState(_))
        ));
    }

    #[test]
    fn test_rejects_mismatched_matrix() {
        let err = ScoringOrchestrator::new(
            StateSpace::reference(),
            RewardMatrix::new(crate::types::SquareMatrix::zeros(5)),
            ScoringConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ScoreError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_small_reference_score() {
        let config = ScoringConfig {
            runs: 10,
            seed: Some(42),
            ..ScoringConfig::default()
        };
        let orch =
            ScoringOrchestrator::new(StateSpace::reference(), reference_reward_matrix(), config)
                .unwrap();
        let report = orch.score_terminals().unwrap();
        assert_eq!(report.targets.len(), 4);
        assert_eq!(report.pairs.len(), 6);
        assert!(report.score > 0.0);
        for outcome in &report.targets {
            assert_eq!(outcome.weighted.len(), 441);
            // terminal rows are zeroed by the default weights
            assert!(outcome.weighted[17 * 21..].iter().all(|&v| v == 0.0));
        }
        let again = orch.score_terminals().unwrap();
        assert_eq!(report.score, again.score);
    }
}
