//! Tabular Q-learning agent trained toward a single terminal state.
//!
//! Training is a global random walk over the state set: each iteration samples
//! a state uniformly from *all* states (not from the agent's current position),
//! samples one viable action from that state's reward row, and applies the
//! temporal-difference update
//!
//! ```text
//! TD      = R(s, a) + γ · max_a' Q(a, a') − Q(s, a)
//! Q(s, a) += α · TD
//! ```
//!
//! States with no viable action (the endings, other than the target's
//! self-loop) make the iteration a no-op.
//!
//! After training, the greedy path follows `argmax_a Q(current, a)` from the
//! start until the target is reached. The walk is bounded: a policy that
//! cycles yields [`ScoreError::NotConverged`] instead of looping forever.

use rand::Rng;

use crate::error::{Result, ScoreError};
use crate::state_space::StateSpace;
use crate::types::{Path, RewardMatrix, SquareMatrix, ValueTable};

/// Fixed hyperparameters for one agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentParams {
    pub alpha: f64,
    pub gamma: f64,
    /// Reward written on the target's diagonal.
    pub target_reward: f64,
    /// Upper bound on greedy-path transitions.
    pub max_path_steps: usize,
}

/// One learner: a private value table and a private targeted reward copy.
pub struct QAgent<'a> {
    params: AgentParams,
    space: &'a StateSpace,
    template: &'a RewardMatrix,
    q: ValueTable,
}

impl<'a> QAgent<'a> {
    /// Fresh agent with an all-zero table. The template must match `space`.
    pub fn new(
        params: AgentParams,
        space: &'a StateSpace,
        template: &'a RewardMatrix,
    ) -> Result<Self> {
        template.ensure_dim(space.len())?;
        Ok(Self {
            params,
            space,
            template,
            q: ValueTable::zeros(space.len()),
        })
    }

    pub fn q(&self) -> &ValueTable {
        &self.q
    }

    pub fn into_table(self) -> ValueTable {
        self.q
    }

    /// Train toward `end` for `iterations` updates, then extract the greedy path from `start`.
    ///
    /// On [`ScoreError::NotConverged`] the learned table is still available via [`QAgent::q`].
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        start: &str,
        end: &str,
        iterations: usize,
        rng: &mut R,
    ) -> Result<Path> {
        let start_idx = self.space.index_of(start)?;
        let end_idx = self.space.index_of(end)?;
        let rewards = self.template.targeted(end_idx, self.params.target_reward);

        let n = self.space.len();
        let mut playable = Vec::with_capacity(n);
        for _ in 0..iterations {
            let state = rng.random_range(0..n);
            playable.clear();
            playable.extend((0..n).filter(|&j| rewards.get(state, j) > 0.0));
            if playable.is_empty() {
                continue;
            }
            let action = playable[rng.random_range(0..playable.len())];
            self.update(&rewards, state, action);
        }

        extract_path(
            self.space,
            &self.q,
            start_idx,
            end_idx,
            self.params.max_path_steps,
        )
    }

    #[inline]
    fn update(&mut self, rewards: &SquareMatrix, state: usize, action: usize) {
        let td = rewards.get(state, action) + self.params.gamma * self.q.max_row(action)
            - self.q.get(state, action);
        self.q.add(state, action, self.params.alpha * td);
    }
}

/// Follow the greedy policy of `q` from `start` until `end`.
///
/// Ties go to the lowest index. Gives up after `max_steps` transitions.
pub fn extract_path(
    space: &StateSpace,
    q: &ValueTable,
    start: usize,
    end: usize,
    max_steps: usize,
) -> Result<Path> {
    let mut current = start;
    let mut visited = vec![start];
    while current != end {
        if visited.len() > max_steps {
            return Err(ScoreError::NotConverged {
                target: space.label(end).to_string(),
                steps: max_steps,
                path: space.labels_for(&visited),
            });
        }
        current = q.argmax_row(current);
        visited.push(current);
    }
    Ok(space.labels_for(&visited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_space::StateSpec;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn toy_space() -> StateSpace {
        StateSpace::new(vec![
            StateSpec::new("Start", 0, false),
            StateSpec::new("Mid", 1, false),
            StateSpec::new("End", 2, true),
        ])
        .unwrap()
    }

    fn toy_rewards() -> RewardMatrix {
        RewardMatrix::from_rows(vec![
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    fn params() -> AgentParams {
        AgentParams {
            alpha: 0.9,
            gamma: 0.75,
            target_reward: 999.0,
            max_path_steps: 3,
        }
    }

    #[test]
    fn test_toy_path() {
        let space = toy_space();
        let rewards = toy_rewards();
        let mut agent = QAgent::new(params(), &space, &rewards).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let path = agent.train("Start", "End", 500, &mut rng).unwrap();
        assert_eq!(path, vec!["Start", "Mid", "End"]);
        // Only viable edges and the target self-loop ever receive value.
        let q = agent.q();
        assert_eq!(q.get(0, 0), 0.0);
        assert_eq!(q.get(0, 2), 0.0);
        assert!(q.get(2, 2) > q.get(1, 2));
        assert!(q.get(1, 2) > q.get(0, 1));
    }

    #[test]
    fn test_zero_iterations_reports_non_convergence() {
        let space = toy_space();
        let rewards = toy_rewards();
        let mut agent = QAgent::new(params(), &space, &rewards).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let err = agent.train("Start", "End", 0, &mut rng).unwrap_err();
        assert!(err.is_recoverable());
        match err {
            ScoreError::NotConverged { target, steps, path } => {
                assert_eq!(target, "End");
                assert_eq!(steps, 3);
                assert_eq!(path, vec!["Start"; 4]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(agent.q().is_all_zero());
    }

    #[test]
    fn test_start_equal_to_end_is_trivial() {
        let space = toy_space();
        let q = ValueTable::zeros(3);
        assert_eq!(extract_path(&space, &q, 2, 2, 0).unwrap(), vec!["End"]);
    }

    #[test]
    fn test_unknown_labels_and_dimension() {
        let space = toy_space();
        let rewards = toy_rewards();
        let mut agent = QAgent::new(params(), &space, &rewards).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(
            agent.train("Start", "Nowhere", 10, &mut rng),
            Err(ScoreError::UnknownState(_))
        ));

        let big = RewardMatrix::new(SquareMatrix::zeros(4));
        assert!(matches!(
            QAgent::new(params(), &space, &big),
            Err(ScoreError::DimensionMismatch {
                expected: 3,
                found: 4
            })
        ));
    }

    #[test]
    fn test_same_seed_same_table() {
        let space = toy_space();
        let rewards = toy_rewards();
        let mut a = QAgent::new(params(), &space, &rewards).unwrap();
        let mut b = QAgent::new(params(), &space, &rewards).unwrap();
        let _ = a.train("Start", "End", 200, &mut SmallRng::seed_from_u64(99));
        let _ = b.train("Start", "End", 200, &mut SmallRng::seed_from_u64(99));
        assert_eq!(a.q(), b.q());
    }
}
