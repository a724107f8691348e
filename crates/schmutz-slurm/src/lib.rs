//! SLURM job metrics for schmutz.
//!
//! Resolve a job's state, then collect its metrics via squeue + sstat while it
//! runs or via sacct once it has finished.

pub mod client;
pub mod sacct;
pub mod squeue;
pub mod sstat;
pub mod stats;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::SlurmClient;
pub use sstat::{STEP_SUFFIXES, StepUsage};
pub use types::{GpuMetrics, JobMetrics, JobState, NodeMetrics};
