//! Parallel processing strategies

use serde::{Deserialize, Serialize};
use subcanopy_core::{Error, Result};

/// Processing mode for a pipeline run
///
/// Serialized in snake case: `"sequential"`, `"parallel"` or
/// `{"parallel_with": 4}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using all available cores
    #[default]
    Parallel,
    /// Parallel with specified number of threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Run `f` under this mode.
    ///
    /// `Parallel` runs on the current (usually global) rayon pool. The other
    /// modes build a dedicated pool so every rayon iterator reached from
    /// `f` uses exactly the requested number of threads.
    pub fn install<R, F>(&self, f: F) -> Result<R>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self {
            ProcessingMode::Parallel => Ok(f()),
            ProcessingMode::Sequential => Ok(build_pool(1)?.install(f)),
            ProcessingMode::ParallelWith(threads) => Ok(build_pool(*threads)?.install(f)),
        }
    }

    /// Number of worker threads this mode will use
    pub fn threads(&self) -> usize {
        match self {
            ProcessingMode::Sequential => 1,
            ProcessingMode::Parallel => num_cpus(),
            ProcessingMode::ParallelWith(threads) => *threads,
        }
    }
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    if threads == 0 {
        return Err(Error::InvalidParameter {
            name: "threads",
            value: "0".into(),
            reason: "thread count must be at least 1".into(),
        });
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Other(format!("Failed to build thread pool: {e}")))
}

/// Get the number of threads in the current rayon pool
pub fn num_cpus() -> usize {
    rayon::current_num_threads()
}
