//! Shared environment configuration for the scorer binaries.
//!
//! Consolidates `RAYON_NUM_THREADS` and `MEANINGFUL_PLAY_OUTPUT` reads, and
//! the tracing subscriber setup.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Default directory for ensemble and report files.
pub const DEFAULT_OUTPUT_DIR: &str = "data/runs";

/// Install the fmt subscriber. `RUST_LOG` overrides the default `meaningful_play=info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("meaningful_play=info"));
    // A second install (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`, default 8) and build
/// the global pool, tolerating an already-initialized one. Returns thread count.
pub fn init_rayon_threads() -> usize {
    let num_threads = std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    if rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .is_err()
    {
        tracing::debug!("rayon pool already initialized");
    }
    tracing::info!(threads = num_threads, "rayon pool");
    num_threads
}

/// Read `MEANINGFUL_PLAY_OUTPUT` (default [`DEFAULT_OUTPUT_DIR`]).
pub fn output_dir() -> PathBuf {
    std::env::var("MEANINGFUL_PLAY_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR))
}
