//! Query queued and running SLURM jobs via squeue.

use crate::client::{SlurmClient, args};
use crate::types::{JobMetrics, JobState};
use chrono::{DateTime, Utc};
use schmutz_parsers::{
    CommandExecutor, non_empty_string, parse_bytes, parse_count, parse_gpu_count,
    parse_slurm_timestamp, parse_time_limit, split_delimited,
};

/// squeue output format:
/// %j - Job name
/// %u - User
/// %T - State (extended)
/// %V - Submit time
/// %S - Start time
/// %L - Time left
/// %D - Node count
/// %C - CPUs
/// %b - GRES
/// %m - Memory
/// %P - Partition
const SQUEUE_FORMAT: &str = "%j|%u|%T|%V|%S|%L|%D|%C|%b|%m|%P";
const SQUEUE_FIELDS: usize = 11;

impl<E: CommandExecutor> SlurmClient<E> {
    /// State of a job still known to the scheduler daemon.
    pub async fn queue_state(&self, job_id: &str) -> Option<JobState> {
        let output = self
            .squeue(&args(["-j", job_id, "--noheader", "-o", "%T"]))
            .await;
        let line = output.data()?.lines().next()?;
        Some(JobState::parse(line))
    }

    /// Metrics for a running job from squeue and sstat.
    ///
    /// Returns None if squeue does not know the job.
    pub async fn running_job_stats(&self, job_id: &str) -> Option<JobMetrics> {
        self.running_job_stats_at(job_id, Utc::now()).await
    }

    pub(crate) async fn running_job_stats_at(
        &self,
        job_id: &str,
        now: DateTime<Utc>,
    ) -> Option<JobMetrics> {
        let output = self
            .squeue(&args(["-j", job_id, "--noheader", "-o", SQUEUE_FORMAT]))
            .await;

        let Some(line) = output.data().and_then(|out| out.lines().next()) else {
            tracing::warn!("Job {} not found in squeue", job_id);
            return None;
        };

        let mut metrics = match parse_squeue_line(job_id, line, now) {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::warn!("Failed to parse squeue line: {}", e);
                return None;
            }
        };

        match self.step_usage(job_id).await {
            Some(usage) => {
                metrics.cpu_time_total = usage.cpu_time.as_secs_f64();
                metrics.memory_used_max = usage.max_rss;
            }
            None => tracing::debug!("No step statistics for job {}", job_id),
        }

        metrics.calculate_efficiency();
        Some(metrics)
    }
}

/// Parse a single line of squeue output.
///
/// squeue reports the time left rather than the limit, so the limit is
/// reconstructed as elapsed + remaining.
fn parse_squeue_line(job_id: &str, line: &str, now: DateTime<Utc>) -> Result<JobMetrics, String> {
    let fields = split_delimited(line.trim_end(), SQUEUE_FIELDS)?;

    let mut metrics = JobMetrics::new(job_id).with_state(JobState::parse(fields[2]));
    metrics.last_updated = Some(now);
    metrics.job_name = fields[0].to_string();
    metrics.user = fields[1].to_string();
    metrics.submit_time = parse_slurm_timestamp(fields[3]);
    metrics.start_time = parse_slurm_timestamp(fields[4]);
    metrics.num_nodes = parse_count(fields[6], 1);
    metrics.num_cpus = parse_count(fields[7], 1);
    metrics.num_gpus = parse_gpu_count(fields[8]);
    metrics.memory_requested = parse_bytes(fields[9]);
    metrics.partition = non_empty_string(fields[10]).unwrap_or_default();

    if let Some(start) = metrics.start_time {
        metrics.elapsed = (now - start).to_std().unwrap_or_default();
        if let Some(remaining) = parse_time_limit(fields[5]) {
            metrics.time_limit = metrics.elapsed.saturating_add(remaining);
        }
    }

    Ok(metrics)
}
