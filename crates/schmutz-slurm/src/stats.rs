//! Job state resolution and collector dispatch.

use crate::client::SlurmClient;
use crate::types::{JobMetrics, JobState};
use schmutz_parsers::CommandExecutor;

impl<E: CommandExecutor> SlurmClient<E> {
    /// Current state of a job.
    ///
    /// squeue is authoritative while the scheduler still tracks the job; after
    /// that only accounting knows it.
    pub async fn job_state(&self, job_id: &str) -> JobState {
        if let Some(state) = self.queue_state(job_id).await {
            return state;
        }
        if let Some(state) = self.accounting_state(job_id).await {
            return state;
        }
        JobState::Unknown
    }

    /// Metrics for a job in any state.
    ///
    /// Returns None if neither squeue nor sacct can describe the job.
    pub async fn job_stats(&self, job_id: &str) -> Option<JobMetrics> {
        let state = self.job_state(job_id).await;
        tracing::debug!("Job {} is {}", job_id, state);

        match state {
            JobState::Running => self.running_job_stats(job_id).await,
            state if state.is_completed() => self.completed_job_stats(job_id).await,
            // Nothing consumed yet
            JobState::Pending => Some(JobMetrics::new(job_id).with_state(JobState::Pending)),
            _ => {
                // The job may have changed state since it was resolved
                if let Some(metrics) = self.completed_job_stats(job_id).await {
                    return Some(metrics);
                }
                self.running_job_stats(job_id).await
            }
        }
    }
}
