//! SLURM job metric types.

use chrono::{DateTime, Utc};
use schmutz_parsers::bytes_to_gb;
use std::fmt;
use std::time::Duration;

/// SLURM job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
    NodeFailure,
    Preempted,
    #[default]
    Unknown,
}

impl JobState {
    /// Parse a squeue/sacct state string.
    ///
    /// Only the first word counts, so "CANCELLED by 12345" is `Cancelled`.
    /// Unrecognized states are `Unknown`.
    pub fn parse(s: &str) -> Self {
        let base = s.split_whitespace().next().unwrap_or_default();
        // sacct marks truncated columns with a trailing '+'
        let base = base.trim_end_matches('+');

        match base.to_ascii_uppercase().as_str() {
            "PENDING" | "PD" => Self::Pending,
            "RUNNING" | "R" => Self::Running,
            "COMPLETED" | "CD" => Self::Completed,
            "FAILED" | "F" | "OUT_OF_MEMORY" | "OOM" => Self::Failed,
            "CANCELLED" | "CA" => Self::Cancelled,
            "TIMEOUT" | "TO" => Self::TimedOut,
            "NODE_FAIL" | "NF" => Self::NodeFailure,
            "PREEMPTED" | "PR" => Self::Preempted,
            _ => Self::Unknown,
        }
    }

    /// State name as SLURM spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::TimedOut => "TIMEOUT",
            Self::NodeFailure => "NODE_FAIL",
            Self::Preempted => "PREEMPTED",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the job reached a terminal state.
    pub fn is_completed(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running | Self::Unknown)
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Utilization of a single GPU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuMetrics {
    pub gpu_id: u32,
    pub name: String,
    /// Compute utilization (%)
    pub utilization: f64,
    /// Memory used (bytes)
    pub memory_used: u64,
    /// Total memory (bytes)
    pub memory_total: u64,
    /// Memory utilization (%)
    pub memory_utilization: f64,
}

impl GpuMetrics {
    pub fn memory_used_gb(&self) -> f64 {
        bytes_to_gb(self.memory_used)
    }

    pub fn memory_total_gb(&self) -> f64 {
        bytes_to_gb(self.memory_total)
    }
}

/// Per-node accounting for multi-node jobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMetrics {
    pub hostname: String,
    pub cpus_allocated: u32,
    /// Allocated memory (bytes)
    pub memory_allocated: u64,
    /// CPU time consumed (seconds)
    pub cpu_time_used: f64,
    /// Current memory use (bytes)
    pub memory_used: u64,
    /// Peak memory use (bytes)
    pub memory_max: u64,
    pub gpus: Vec<GpuMetrics>,
}

/// Resource usage and efficiency of one job.
///
/// Filled in by a collector, then finalized once with
/// [`JobMetrics::calculate_efficiency`].
#[derive(Debug, Clone, Default)]
pub struct JobMetrics {
    pub job_id: String,
    pub job_name: String,
    pub user: String,
    pub partition: String,
    pub state: JobState,

    pub submit_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub elapsed: Duration,
    pub time_limit: Duration,

    pub num_nodes: u32,
    pub num_cpus: u32,
    pub num_gpus: u32,
    /// Requested memory, total across the allocation (bytes)
    pub memory_requested: u64,

    /// Total CPU time used (seconds)
    pub cpu_time_total: f64,
    /// Peak memory (bytes)
    pub memory_used_max: u64,
    /// Average memory (bytes)
    pub memory_used_avg: u64,
    pub gpus: Vec<GpuMetrics>,
    pub nodes: Vec<NodeMetrics>,

    /// Exit code from accounting (exit_code:signal)
    pub exit_code: Option<i32>,

    pub last_updated: Option<DateTime<Utc>>,
    pub error_message: Option<String>,

    cpu_efficiency: f64,
    memory_efficiency: f64,
    gpu_utilization_avg: f64,
    gpu_memory_utilization_avg: f64,
}

impl JobMetrics {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            last_updated: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = state;
        self
    }

    pub fn cpu_efficiency(&self) -> f64 {
        self.cpu_efficiency
    }

    pub fn memory_efficiency(&self) -> f64 {
        self.memory_efficiency
    }

    pub fn gpu_utilization_avg(&self) -> f64 {
        self.gpu_utilization_avg
    }

    pub fn gpu_memory_utilization_avg(&self) -> f64 {
        self.gpu_memory_utilization_avg
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn time_limit_seconds(&self) -> f64 {
        self.time_limit.as_secs_f64()
    }

    /// Percentage of the time limit used; 0 without a limit.
    pub fn time_efficiency(&self) -> f64 {
        let limit = self.time_limit_seconds();
        if limit <= 0.0 {
            return 0.0;
        }
        self.elapsed_seconds() / limit * 100.0
    }

    pub fn memory_requested_gb(&self) -> f64 {
        bytes_to_gb(self.memory_requested)
    }

    pub fn memory_used_max_gb(&self) -> f64 {
        bytes_to_gb(self.memory_used_max)
    }

    pub fn has_gpus(&self) -> bool {
        self.num_gpus > 0
    }

    /// Derive efficiency percentages from the raw counters.
    ///
    /// Idempotent. Every percentage ends up in `[0, 100]`.
    pub fn calculate_efficiency(&mut self) {
        // CPU time used / (wall time * CPUs)
        let elapsed = self.elapsed_seconds();
        if elapsed > 0.0 && self.num_cpus > 0 {
            let max_cpu_time = elapsed * f64::from(self.num_cpus);
            self.cpu_efficiency = clamp_percent(self.cpu_time_total / max_cpu_time * 100.0);
        }

        self.memory_efficiency = if self.memory_requested > 0 {
            clamp_percent(self.memory_used_max as f64 / self.memory_requested as f64 * 100.0)
        } else {
            0.0
        };

        self.gpu_utilization_avg = clamp_percent(mean(self.gpus.iter().map(|g| g.utilization)));
        self.gpu_memory_utilization_avg =
            clamp_percent(mean(self.gpus.iter().map(|g| g.memory_utilization)));
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}
