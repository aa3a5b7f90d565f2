//! Ensembles of independently trained agents aimed at one target.
//!
//! Runs are embarrassingly parallel: each builds its own [`QAgent`] with a
//! zeroed table and a private reward copy, reading only the shared immutable
//! template. Run `i` draws from `SmallRng::seed_from_u64(seed + i)`, so an
//! ensemble is reproducible from its base seed whatever the thread count.

use std::collections::HashMap;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::agent::{AgentParams, QAgent};
use crate::config::NonConvergencePolicy;
use crate::error::{Result, ScoreError};
use crate::state_space::StateSpace;
use crate::types::{Path, RewardMatrix, ValueTable};

/// Seed offset between a run and its retrains.
const RETRAIN_SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seed for run `run`, retrain attempt `attempt`.
#[inline]
pub fn run_seed(base: u64, run: usize, attempt: usize) -> u64 {
    base.wrapping_add(run as u64)
        .wrapping_add((attempt as u64).wrapping_mul(RETRAIN_SEED_STRIDE))
}

/// Result of one agent's training.
#[derive(Clone, Debug)]
pub struct AgentRun {
    pub seed: u64,
    pub table: ValueTable,
    /// Greedy path; truncated at the step bound when `converged` is false.
    pub path: Path,
    pub converged: bool,
    /// Trainings performed, including the first.
    pub attempts: usize,
}

/// Greedy paths of an ensemble.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathSet(pub Vec<Path>);

impl PathSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most frequent path and its count. Ties go to the path seen first.
    pub fn most_common(&self) -> Option<(&Path, usize)> {
        let mut counts: HashMap<&Path, usize> = HashMap::new();
        for p in &self.0 {
            *counts.entry(p).or_insert(0) += 1;
        }
        let mut best: Option<(&Path, usize)> = None;
        for p in &self.0 {
            let c = counts[p];
            if best.map_or(true, |(_, bc)| c > bc) {
                best = Some((p, c));
            }
        }
        best
    }
}

/// All runs for one target.
#[derive(Clone, Debug)]
pub struct Ensemble {
    pub target: String,
    pub runs: Vec<AgentRun>,
}

impl Ensemble {
    pub fn tables(&self) -> Vec<ValueTable> {
        self.runs.iter().map(|r| r.table.clone()).collect()
    }

    pub fn paths(&self) -> PathSet {
        PathSet(self.runs.iter().map(|r| r.path.clone()).collect())
    }

    pub fn non_converged(&self) -> usize {
        self.runs.iter().filter(|r| !r.converged).count()
    }
}

/// Trains K agents toward a target.
pub struct EnsembleRunner<'a> {
    space: &'a StateSpace,
    rewards: &'a RewardMatrix,
    params: AgentParams,
    runs: usize,
    iterations: usize,
    policy: NonConvergencePolicy,
}

impl<'a> EnsembleRunner<'a> {
    pub fn new(
        space: &'a StateSpace,
        rewards: &'a RewardMatrix,
        params: AgentParams,
        runs: usize,
        iterations: usize,
        policy: NonConvergencePolicy,
    ) -> Result<Self> {
        rewards.ensure_dim(space.len())?;
        Ok(Self {
            space,
            rewards,
            params,
            runs,
            iterations,
            policy,
        })
    }

    /// Train `runs` agents from the start state toward `target` in parallel.
    pub fn run(&self, target: &str, seed: u64) -> Result<Ensemble> {
        self.space.index_of(target)?;
        let t0 = Instant::now();

        let runs = (0..self.runs)
            .into_par_iter()
            .map(|i| self.run_one(target, seed, i))
            .collect::<Result<Vec<_>>>()?;

        let ensemble = Ensemble {
            target: target.to_string(),
            runs,
        };
        tracing::info!(
            ending = target,
            runs = self.runs,
            iterations = self.iterations,
            non_converged = ensemble.non_converged(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "ensemble trained"
        );
        Ok(ensemble)
    }

    fn run_one(&self, target: &str, base_seed: u64, run: usize) -> Result<AgentRun> {
        let start = self.space.label(self.space.start());
        let max_retrains = match self.policy {
            NonConvergencePolicy::Retrain { attempts } => attempts,
            NonConvergencePolicy::Keep | NonConvergencePolicy::Fail => 0,
        };

        let mut attempt = 0;
        loop {
            let seed = run_seed(base_seed, run, attempt);
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut agent = QAgent::new(self.params, self.space, self.rewards)?;
            match agent.train(start, target, self.iterations, &mut rng) {
                Ok(path) => {
                    return Ok(AgentRun {
                        seed,
                        table: agent.into_table(),
                        path,
                        converged: true,
                        attempts: attempt + 1,
                    })
                }
                Err(ScoreError::NotConverged { path, .. })
                    if self.policy == NonConvergencePolicy::Keep =>
                {
                    tracing::warn!(ending = target, run, "policy did not converge, keeping table");
                    return Ok(AgentRun {
                        seed,
                        table: agent.into_table(),
                        path,
                        converged: false,
                        attempts: attempt + 1,
                    });
                }
                Err(e) if e.is_recoverable() && attempt < max_retrains => {
                    tracing::warn!(
                        ending = target,
                        run,
                        attempt,
                        "policy did not converge, retraining"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::reference_reward_matrix;

    fn params(space: &StateSpace) -> AgentParams {
        AgentParams {
            alpha: 0.9,
            gamma: 0.75,
            target_reward: 999.0,
            max_path_steps: space.len(),
        }
    }

    #[test]
    fn test_reference_ensemble_reaches_target() {
        let space = StateSpace::reference();
        let rewards = reference_reward_matrix();
        let runner = EnsembleRunner::new(
            &space,
            &rewards,
            params(&space),
            8,
            1000,
            NonConvergencePolicy::Retrain { attempts: 5 },
        )
        .unwrap();
        let ensemble = runner.run("E3", 42).unwrap();
        assert_eq!(ensemble.runs.len(), 8);
        assert_eq!(ensemble.non_converged(), 0);
        for run in &ensemble.runs {
            assert_eq!(run.path.first().map(String::as_str), Some("Start"));
            assert_eq!(run.path.last().map(String::as_str), Some("E3"));
            // Start + one state per decision tier + ending
            assert_eq!(run.path.len(), 6);
        }
    }

    #[test]
    fn test_seeded_ensembles_are_reproducible() {
        let space = StateSpace::reference();
        let rewards = reference_reward_matrix();
        let runner = EnsembleRunner::new(
            &space,
            &rewards,
            params(&space),
            4,
            300,
            NonConvergencePolicy::Keep,
        )
        .unwrap();
        let a = runner.run("E1", 7).unwrap();
        let b = runner.run("E1", 7).unwrap();
        assert_eq!(a.tables(), b.tables());
        assert_eq!(a.paths(), b.paths());
    }

    #[test]
    fn test_fail_policy_surfaces_non_convergence() {
        let space = StateSpace::reference();
        let rewards = reference_reward_matrix();
        let runner = EnsembleRunner::new(
            &space,
            &rewards,
            params(&space),
            2,
            0,
            NonConvergencePolicy::Fail,
        )
        .unwrap();
        assert!(matches!(
            runner.run("E2", 1),
            Err(ScoreError::NotConverged { .. })
        ));

        let keep = EnsembleRunner::new(
            &space,
            &rewards,
            params(&space),
            2,
            0,
            NonConvergencePolicy::Keep,
        )
        .unwrap();
        let ensemble = keep.run("E2", 1).unwrap();
        assert_eq!(ensemble.non_converged(), 2);
        assert!(ensemble.runs.iter().all(|r| r.table.is_all_zero()));
    }

    #[test]
    fn test_retrain_exhaustion_fails() {
        let space = StateSpace::reference();
        let rewards = reference_reward_matrix();
        let runner = EnsembleRunner::new(
            &space,
            &rewards,
            params(&space),
            1,
            0,
            NonConvergencePolicy::Retrain { attempts: 2 },
        )
        .unwrap();
        assert!(runner.run("E4", 3).is_err());
    }

    #[test]
    fn test_unknown_target() {
        let space = StateSpace::reference();
        let rewards = reference_reward_matrix();
        let runner = EnsembleRunner::new(
            &space,
            &rewards,
            params(&space),
            1,
            10,
            NonConvergencePolicy::Keep,
        )
        .unwrap();
        assert!(matches!(
            runner.run("E9", 0),
            Err(ScoreError::UnknownState(_))
        ));
    }

    #[test]
    fn test_most_common_path() {
        let p = |s: &[&str]| s.iter().map(|x| x.to_string()).collect::<Path>();
        let set = PathSet(vec![
            p(&["Start", "A"]),
            p(&["Start", "B"]),
            p(&["Start", "B"]),
        ]);
        let (path, count) = set.most_common().unwrap();
        assert_eq!(path, &p(&["Start", "B"]));
        assert_eq!(count, 2);
        assert!(PathSet::default().most_common().is_none());
    }
}
