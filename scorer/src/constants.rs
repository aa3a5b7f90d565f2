//! Reference parameters of the meaningful-play scorer.
//!
//! These are the values the reference 21-state topology was tuned with:
//! - learning rate α = [`DEFAULT_ALPHA`], discount γ = [`DEFAULT_GAMMA`]
//! - K = [`DEFAULT_RUNS`] agents per target, I = [`DEFAULT_ITERATIONS`] updates per agent
//! - the target's diagonal reward is overwritten with [`TARGET_REWARD`]
//! - pairwise comparison uses Minkowski order p = [`DEFAULT_MINKOWSKI_ORDER`]

/// Learning rate applied to each temporal-difference correction.
pub const DEFAULT_ALPHA: f64 = 0.9;

/// Discount on the successor state's best value.
pub const DEFAULT_GAMMA: f64 = 0.75;

/// Independent agents trained per target state (ensemble size K).
pub const DEFAULT_RUNS: usize = 100;

/// Random updates per agent (I).
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Reward written on the target's diagonal so every agent is pulled toward it.
pub const TARGET_REWARD: f64 = 999.0;

/// Manhattan distance on the weighted, flattened tables.
pub const DEFAULT_MINKOWSKI_ORDER: f64 = 1.0;

/// Decimal places kept by the Minkowski root.
pub const DISTANCE_DECIMALS: u32 = 3;

/// Base seed used by the binaries when none is given.
pub const DEFAULT_SEED: u64 = 42;

/// Depth weights for Start, tier 1, tier 2, tier 3 and tier 4 rows.
pub const REFERENCE_TIER_WEIGHTS: [f64; 5] = [0.3, 0.25, 0.2, 0.15, 0.1];

/// Small nonzero weight for terminal rows in the tapered variant.
pub const TAPERED_TERMINAL_WEIGHT: f64 = 0.05;

/// Number of states in the reference topology.
pub const REFERENCE_STATE_COUNT: usize = 21;

/// Decision states per depth tier in the reference topology (D, N1, N2, C).
pub const REFERENCE_TIER_WIDTH: usize = 4;

/// Decision tiers between Start and the endings in the reference topology.
pub const REFERENCE_DECISION_TIERS: usize = 4;
