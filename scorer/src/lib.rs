//! # Meaningful Play - Q-learning policy divergence scorer
//!
//! Scores how *meaningful* a branching decision topology is. A topology is a
//! directed graph of game states, from a single `Start` through tiers of
//! decision states to several terminal endings. For each ending we learn, by
//! tabular Q-learning, the value table that steers play toward it, and then
//! measure how different those tables are from each other.
//!
//! ## Pipeline
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | 1 | [`agent`] | One agent: random-walk TD training toward a target, bounded greedy path extraction |
//! | 2 | [`ensemble`] | K independent agents per target, trained in parallel with per-run seeds |
//! | 3 | [`averaging`] | Elementwise mean of the K value tables |
//! | 4 | [`weighting`] | Flatten row-major, scale rows by depth tier (early decisions weigh most) |
//! | 5 | [`distance`] | Minkowski distance of order p, decimal root rounded to 3 places |
//! | 6 | [`scoring`] | Mean of all C(n, 2) pairwise distances = the meaningfulness score |
//!
//! Endings reached through near-identical value estimates produce a score near
//! zero (illusory choice); endings reached through distinct learned policies
//! score higher.
//!
//! ## Inputs and outputs
//!
//! The core consumes a [`types::RewardMatrix`] (0 = no edge, positive = viable
//! edge) and a [`state_space::StateSpace`]. [`topology`] reads comma-separated
//! topology files and provides the 21-state reference graph; [`storage`]
//! writes paths, value tables and reports as JSON.

#![allow(clippy::needless_range_loop)]

pub mod agent;
pub mod averaging;
pub mod config;
pub mod constants;
pub mod distance;
pub mod ensemble;
pub mod env_config;
pub mod error;
pub mod scoring;
pub mod state_space;
pub mod storage;
pub mod topology;
pub mod types;
pub mod weighting;

pub use config::{NonConvergencePolicy, ScoringConfig};
pub use error::{Result, ScoreError};
pub use scoring::{ScoreReport, ScoringOrchestrator};
