//! Live step statistics via sstat.

use crate::client::{SlurmClient, args};
use schmutz_parsers::{
    CommandExecutor, parse_bytes, parse_count, parse_duration, split_delimited,
};
use std::time::Duration;

/// Step IDs to try, in order. Which one sstat accepts depends on how the
/// cluster launches job steps.
pub const STEP_SUFFIXES: [&str; 3] = ["", ".batch", ".0"];

const SSTAT_FORMAT: &str = "JobID,AveCPU,MaxRSS,MaxVMSize,NTasks";
const SSTAT_FIELDS: usize = 5;

/// Resource usage of a running job step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepUsage {
    pub step_id: String,
    /// Average CPU time per task
    pub cpu_time: Duration,
    /// Peak resident memory (bytes)
    pub max_rss: u64,
    /// Peak virtual memory (bytes)
    pub max_vmsize: u64,
    pub ntasks: u32,
}

impl<E: CommandExecutor> SlurmClient<E> {
    /// Usage of the first step ID sstat reports on.
    pub async fn step_usage(&self, job_id: &str) -> Option<StepUsage> {
        for suffix in STEP_SUFFIXES {
            let step = format!("{}{}", job_id, suffix);
            let output = self
                .sstat(&args([
                    "-j",
                    step.as_str(),
                    "--noheader",
                    "-P",
                    "-o",
                    SSTAT_FORMAT,
                ]))
                .await;

            if let Some(usage) = output.data().and_then(parse_sstat_output) {
                return Some(usage);
            }
            tracing::debug!("sstat returned nothing usable for {}", step);
        }
        None
    }
}

/// Parse sstat output, taking the first complete record.
fn parse_sstat_output(stdout: &str) -> Option<StepUsage> {
    stdout.lines().find_map(|line| {
        let fields = split_delimited(line.trim_end(), SSTAT_FIELDS).ok()?;
        Some(StepUsage {
            step_id: fields[0].to_string(),
            cpu_time: parse_duration(fields[1]),
            max_rss: parse_bytes(fields[2]),
            max_vmsize: parse_bytes(fields[3]),
            ntasks: parse_count(fields[4], 1),
        })
    })
}
