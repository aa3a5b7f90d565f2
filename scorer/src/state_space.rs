//! Bijection between symbolic state labels and matrix indices.
//!
//! Each state also carries its depth tier (0 = Start, growing toward the
//! endings) and whether it is a terminal outcome. Depth drives
//! [`crate::weighting::DepthWeighter`]; the terminal flag selects the
//! default scoring targets and the terminal-tier weight.

use std::collections::HashMap;

use crate::constants::{REFERENCE_DECISION_TIERS, REFERENCE_TIER_WIDTH};
use crate::error::{Result, ScoreError};

/// One state of the topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSpec {
    pub label: String,
    pub depth: usize,
    pub terminal: bool,
}

impl StateSpec {
    pub fn new(label: impl Into<String>, depth: usize, terminal: bool) -> Self {
        Self {
            label: label.into(),
            depth,
            terminal,
        }
    }
}

/// Immutable label <-> index mapping. Index 0 is the start state.
#[derive(Clone, Debug)]
pub struct StateSpace {
    states: Vec<StateSpec>,
    index: HashMap<String, usize>,
}

impl StateSpace {
    pub fn new(states: Vec<StateSpec>) -> Result<Self> {
        if states.is_empty() {
            return Err(ScoreError::EmptyMatrix);
        }
        let mut index = HashMap::with_capacity(states.len());
        for (i, s) in states.iter().enumerate() {
            if index.insert(s.label.clone(), i).is_some() {
                return Err(ScoreError::DuplicateState(s.label.clone()));
            }
        }
        Ok(Self { states, index })
    }

    /// The reference topology with endings `E1`..`E4`.
    pub fn reference() -> Self {
        Self::reference_with_endings(["E1", "E2", "E3", "E4"])
            .expect("reference labels are distinct")
    }

    /// The reference topology with caller-chosen ending labels.
    ///
    /// Layout: `Start`, then four decision tiers of `{n}D, {n}N1, {n}N2, {n}C`
    /// (defensive, two neutral, compliant), then the four endings at depth 5.
    pub fn reference_with_endings(endings: [&str; REFERENCE_TIER_WIDTH]) -> Result<Self> {
        let mut states =
            Vec::with_capacity(1 + REFERENCE_TIER_WIDTH * (REFERENCE_DECISION_TIERS + 1));
        states.push(StateSpec::new("Start", 0, false));
        for tier in 1..=REFERENCE_DECISION_TIERS {
            for suffix in ["D", "N1", "N2", "C"] {
                states.push(StateSpec::new(format!("{tier}{suffix}"), tier, false));
            }
        }
        for ending in endings {
            states.push(StateSpec::new(ending, REFERENCE_DECISION_TIERS + 1, true));
        }
        Self::new(states)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Index of the start state.
    #[inline]
    pub fn start(&self) -> usize {
        0
    }

    pub fn index_of(&self, label: &str) -> Result<usize> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| ScoreError::UnknownState(label.to_string()))
    }

    /// Label at `index`. Panics if out of range, like slice indexing.
    #[inline]
    pub fn label(&self, index: usize) -> &str {
        &self.states[index].label
    }

    #[inline]
    pub fn spec(&self, index: usize) -> &StateSpec {
        &self.states[index]
    }

    pub fn states(&self) -> &[StateSpec] {
        &self.states
    }

    /// Labels of all terminal states, in index order.
    pub fn terminal_labels(&self) -> Vec<String> {
        self.states
            .iter()
            .filter(|s| s.terminal)
            .map(|s| s.label.clone())
            .collect()
    }

    /// Map a sequence of indices to labels.
    pub fn labels_for(&self, indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| self.label(i).to_string()).collect()
    }
}
