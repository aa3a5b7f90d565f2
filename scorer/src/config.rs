//! Scoring configuration: learning parameters, ensemble size, weighting and
//! distance settings.
//!
//! Every field has a default, so a JSON file only needs the fields it changes:
//!
//! ```json
//! { "runs": 50, "depth_weights": { "tiers": [0.3, 0.25, 0.2, 0.15, 0.1],
//!                                  "terminal": { "kind": "scaled", "weight": 0.05 } } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::AgentParams;
use crate::constants::*;
use crate::error::{Result, ScoreError};
use crate::weighting::DepthWeights;

/// What the orchestrator does with an agent whose greedy path never reaches the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NonConvergencePolicy {
    /// Keep the learned table; record the run as non-convergent.
    Keep,
    /// Retrain with a fresh agent up to `attempts` more times, then fail.
    Retrain { attempts: usize },
    /// Fail the whole scoring run.
    Fail,
}

impl Default for NonConvergencePolicy {
    fn default() -> Self {
        NonConvergencePolicy::Retrain { attempts: 3 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub alpha: f64,
    pub gamma: f64,
    /// Agents per target (K).
    pub runs: usize,
    /// Updates per agent (I).
    pub iterations: usize,
    pub target_reward: f64,
    /// Minkowski order p.
    pub minkowski_order: f64,
    pub depth_weights: DepthWeights,
    /// Greedy-path step bound; the state count when absent.
    pub max_path_steps: Option<usize>,
    /// Base seed; drawn from the thread RNG when absent.
    pub seed: Option<u64>,
    pub on_non_convergence: NonConvergencePolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            gamma: DEFAULT_GAMMA,
            runs: DEFAULT_RUNS,
            iterations: DEFAULT_ITERATIONS,
            target_reward: TARGET_REWARD,
            minkowski_order: DEFAULT_MINKOWSKI_ORDER,
            depth_weights: DepthWeights::default(),
            max_path_steps: None,
            seed: None,
            on_non_convergence: NonConvergencePolicy::default(),
        }
    }
}

impl ScoringConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ScoreError::InvalidConfig(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(ScoreError::InvalidConfig(format!(
                "gamma must lie in (0, 1), got {}",
                self.gamma
            )));
        }
        if self.runs == 0 {
            return Err(ScoreError::InvalidConfig("runs must be at least 1".into()));
        }
        if !self.target_reward.is_finite() || self.target_reward <= 0.0 {
            return Err(ScoreError::InvalidConfig(format!(
                "target_reward must be positive, got {}",
                self.target_reward
            )));
        }
        if !self.minkowski_order.is_finite() || self.minkowski_order <= 0.0 {
            return Err(ScoreError::InvalidOrder(self.minkowski_order));
        }
        if self.max_path_steps == Some(0) {
            return Err(ScoreError::InvalidConfig(
                "max_path_steps must be at least 1".into(),
            ));
        }
        self.depth_weights.validate()
    }

    /// Agent hyperparameters for a state space of `state_count` states.
    pub fn agent_params(&self, state_count: usize) -> AgentParams {
        AgentParams {
            alpha: self.alpha,
            gamma: self.gamma,
            target_reward: self.target_reward,
            max_path_steps: self.max_path_steps.unwrap_or(state_count),
        }
    }

    /// The configured seed, or a fresh one from the thread RNG.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::TerminalWeight;

    #[test]
    fn test_defaults_are_reference_values() {
        let c = ScoringConfig::default();
        assert_eq!(c.alpha, 0.9);
        assert_eq!(c.gamma, 0.75);
        assert_eq!(c.runs, 100);
        assert_eq!(c.iterations, 1000);
        assert_eq!(c.minkowski_order, 1.0);
        assert_eq!(c.depth_weights.terminal, TerminalWeight::Zero);
        assert!(c.validate().is_ok());
        assert_eq!(c.agent_params(21).max_path_steps, 21);
    }

    #[test]
    fn test_partial_json() {
        let c = ScoringConfig::from_json_str(
            r#"{
                "runs": 10,
                "seed": 5,
                "depth_weights": {
                    "tiers": [0.3, 0.25, 0.2, 0.15, 0.1],
                    "terminal": { "kind": "scaled", "weight": 0.05 }
                },
                "on_non_convergence": { "kind": "keep" }
            }"#,
        )
        .unwrap();
        assert_eq!(c.runs, 10);
        assert_eq!(c.iterations, 1000);
        assert_eq!(c.resolve_seed(), 5);
        assert_eq!(
            c.depth_weights.terminal,
            TerminalWeight::Scaled { weight: 0.05 }
        );
        assert_eq!(c.on_non_convergence, NonConvergencePolicy::Keep);
    }

    #[test]
    fn test_rejects_bad_values() {
        for json in [
            r#"{"alpha": 1.0}"#,
            r#"{"gamma": 0.0}"#,
            r#"{"runs": 0}"#,
            r#"{"minkowski_order": -1.0}"#,
            r#"{"max_path_steps": 0}"#,
            r#"{"depth_weights": {"tiers": [0.1, 0.2], "terminal": {"kind": "zero"}}}"#,
        ] {
            assert!(ScoringConfig::from_json_str(json).is_err(), "{json}");
        }
        assert!(matches!(
            ScoringConfig::from_json_str(r#"{"runs": "many"}"#),
            Err(ScoreError::Json(_))
        ));
    }
}
