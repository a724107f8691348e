//! Query SLURM job history via sacct.

use crate::client::{SlurmClient, args};
use crate::types::{JobMetrics, JobState};
use schmutz_parsers::{
    CommandExecutor, parse_bytes, parse_count, parse_duration, parse_exit_code, parse_gpu_count,
    parse_requested_memory, parse_slurm_timestamp, parse_time_limit,
};

/// sacct output format (-P uses | delimiter), one line per job step.
const SACCT_FORMAT: &str = "JobID,JobName,User,State,Submit,Start,End,Elapsed,Timelimit,\
                            NNodes,NCPUS,ReqMem,MaxRSS,AveCPU,TotalCPU,Partition,AllocTRES,ExitCode";

/// Fields the job record must carry.
const SACCT_FIELDS: usize = 18;

/// Fields a batch step record needs to supply usage (through TotalCPU).
const BATCH_FIELDS: usize = 15;

mod field {
    pub const JOB_ID: usize = 0;
    pub const JOB_NAME: usize = 1;
    pub const USER: usize = 2;
    pub const STATE: usize = 3;
    pub const SUBMIT: usize = 4;
    pub const START: usize = 5;
    pub const END: usize = 6;
    pub const ELAPSED: usize = 7;
    pub const TIMELIMIT: usize = 8;
    pub const NNODES: usize = 9;
    pub const NCPUS: usize = 10;
    pub const REQ_MEM: usize = 11;
    pub const MAX_RSS: usize = 12;
    pub const TOTAL_CPU: usize = 14;
    pub const PARTITION: usize = 15;
    pub const ALLOC_TRES: usize = 16;
    pub const EXIT_CODE: usize = 17;
}

impl<E: CommandExecutor> SlurmClient<E> {
    /// Final state recorded by accounting.
    ///
    /// sacct lists one line per step; the first is the job itself.
    pub async fn accounting_state(&self, job_id: &str) -> Option<JobState> {
        let output = self
            .sacct(&args(["-j", job_id, "--noheader", "-P", "-o", "State"]))
            .await;
        let line = output.data()?.lines().next()?;
        Some(JobState::parse(line))
    }

    /// Metrics for a finished job from accounting.
    ///
    /// Returns None if sacct has no usable record of the job.
    pub async fn completed_job_stats(&self, job_id: &str) -> Option<JobMetrics> {
        let output = self
            .sacct(&args(["-j", job_id, "--noheader", "-P", "-o", SACCT_FORMAT]))
            .await;

        let Some(stdout) = output.data() else {
            tracing::warn!("Job {} not found in sacct: {}", job_id, output.stderr.trim());
            return None;
        };

        let mut metrics = parse_sacct_output(job_id, stdout)?;
        metrics.calculate_efficiency();
        Some(metrics)
    }
}

/// Pick the job record and the batch step record out of sacct output.
///
/// The first line whose ID equals `job_id` is the job record; without one the
/// first line is used. The first `<job_id>.batch` line is the batch step.
fn select_records<'a>(job_id: &str, stdout: &'a str) -> (Option<Vec<&'a str>>, Option<Vec<&'a str>>) {
    let batch_id = format!("{}.batch", job_id);
    let records: Vec<Vec<&str>> = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.trim_end().split('|').collect())
        .collect();

    let main = records
        .iter()
        .find(|r| r[field::JOB_ID] == job_id)
        .or_else(|| records.first())
        .cloned();
    let batch = records
        .iter()
        .find(|r| r[field::JOB_ID] == batch_id)
        .cloned();

    (main, batch)
}

/// Parse sacct output into job metrics (efficiencies not yet derived).
fn parse_sacct_output(job_id: &str, stdout: &str) -> Option<JobMetrics> {
    let (main, batch) = select_records(job_id, stdout);

    let main = match main {
        Some(main) if main.len() >= SACCT_FIELDS => main,
        _ => {
            tracing::warn!("Incomplete sacct output for job {}", job_id);
            return None;
        }
    };

    let mut metrics = JobMetrics::new(job_id).with_state(JobState::parse(main[field::STATE]));
    metrics.job_name = main[field::JOB_NAME].to_string();
    metrics.user = main[field::USER].to_string();
    metrics.submit_time = parse_slurm_timestamp(main[field::SUBMIT]);
    metrics.start_time = parse_slurm_timestamp(main[field::START]);
    metrics.end_time = parse_slurm_timestamp(main[field::END]);
    metrics.elapsed = parse_duration(main[field::ELAPSED]);
    metrics.time_limit = parse_time_limit(main[field::TIMELIMIT]).unwrap_or_default();
    metrics.num_nodes = parse_count(main[field::NNODES], 1);
    metrics.num_cpus = parse_count(main[field::NCPUS], 1);
    metrics.memory_requested =
        parse_requested_memory(main[field::REQ_MEM], metrics.num_nodes, metrics.num_cpus);
    metrics.partition = main[field::PARTITION].to_string();
    metrics.num_gpus = parse_gpu_count(main[field::ALLOC_TRES]);
    metrics.exit_code = parse_exit_code(main[field::EXIT_CODE]);

    // Batch step accounting is more accurate for single-task jobs
    let usage = match &batch {
        Some(batch) if batch.len() >= BATCH_FIELDS => batch,
        _ => &main,
    };
    metrics.memory_used_max = parse_bytes(usage[field::MAX_RSS]);
    metrics.cpu_time_total = parse_duration(usage[field::TOTAL_CPU]).as_secs_f64();

    Some(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedExecutor, client};
    use std::time::Duration;

    const GB: u64 = 1 << 30;

    const MAIN: &str = "100|align|alice|COMPLETED|2024-01-15T10:00:00|2024-01-15T10:05:00|2024-01-15T11:05:00|01:00:00|04:00:00|2|4|4Gn||||short|billing=4,cpu=4,gres/gpu=1,mem=8G,node=2|0:0";
    const BATCH: &str = "100.batch|batch||COMPLETED|2024-01-15T10:05:00|2024-01-15T10:05:00|2024-01-15T11:05:00|01:00:00||1|4||6G|00:30:00|02:00:00|||0:0";
    const EXTERN: &str = "100.extern|extern||COMPLETED|2024-01-15T10:05:00|2024-01-15T10:05:00|2024-01-15T11:05:00|01:00:00||2|4||1M|00:00:00|00:00:01|||0:0";

    fn output(lines: &[&str]) -> String {
        lines.join("\n") + "\n"
    }

    #[test]
    fn test_parse_main_record() {
        let metrics = parse_sacct_output("100", &output(&[MAIN, BATCH, EXTERN])).unwrap();
        assert_eq!(metrics.job_name, "align");
        assert_eq!(metrics.user, "alice");
        assert_eq!(metrics.state, JobState::Completed);
        assert!(metrics.end_time.is_some());
        assert_eq!(metrics.elapsed, Duration::from_secs(3600));
        assert_eq!(metrics.time_limit, Duration::from_secs(4 * 3600));
        assert_eq!(metrics.num_nodes, 2);
        assert_eq!(metrics.num_cpus, 4);
        assert_eq!(metrics.num_gpus, 1);
        assert_eq!(metrics.partition, "short");
        assert_eq!(metrics.exit_code, Some(0));
    }

    #[test]
    fn test_per_node_memory_multiplied() {
        let metrics = parse_sacct_output("100", &output(&[MAIN])).unwrap();
        assert_eq!(metrics.memory_requested, 8 * GB);
    }

    #[test]
    fn test_usage_from_batch_step() {
        let metrics = parse_sacct_output("100", &output(&[EXTERN, MAIN, BATCH])).unwrap();
        assert_eq!(metrics.memory_used_max, 6 * GB);
        assert_eq!(metrics.cpu_time_total, 7200.0);
    }

    #[test]
    fn test_usage_from_main_without_batch() {
        let main = "100|job|bob|FAILED|N/A|N/A|N/A|00:10:00|UNLIMITED|1|2|1000Mc|500M|00:01:00|00:05:00|long||1:0";
        let metrics = parse_sacct_output("100", &output(&[main])).unwrap();
        assert_eq!(metrics.state, JobState::Failed);
        assert_eq!(metrics.memory_requested, 2000 * (1 << 20));
        assert_eq!(metrics.memory_used_max, 500 * (1 << 20));
        assert_eq!(metrics.cpu_time_total, 300.0);
        assert_eq!(metrics.time_limit, Duration::ZERO);
        assert_eq!(metrics.exit_code, Some(1));
        assert_eq!(metrics.num_gpus, 0);
    }

    #[test]
    fn test_first_exact_match_wins() {
        let other = MAIN.replacen("align", "rerun", 1);
        let metrics = parse_sacct_output("100", &output(&[MAIN, &other])).unwrap();
        assert_eq!(metrics.job_name, "align");
    }

    #[test]
    fn test_falls_back_to_first_line() {
        // Array job: the record ID is "100_1", not "100"
        let array = MAIN.replacen("100|", "100_1|", 1);
        let metrics = parse_sacct_output("100", &output(&[&array])).unwrap();
        assert_eq!(metrics.job_name, "align");
    }

    #[test]
    fn test_incomplete_record_is_not_found() {
        assert!(parse_sacct_output("100", "100|align|alice|COMPLETED\n").is_none());
        assert!(parse_sacct_output("100", "").is_none());
    }

    #[tokio::test]
    async fn test_completed_job_stats() {
        let slurm = client(ScriptedExecutor::new().ok("sacct", &output(&[MAIN, BATCH])));
        let metrics = slurm.completed_job_stats("100").await.unwrap();

        // 2h CPU over 1h on 4 CPUs
        assert_eq!(metrics.cpu_efficiency(), 50.0);
        // 6G of 8G
        assert_eq!(metrics.memory_efficiency(), 75.0);
        assert_eq!(metrics.time_efficiency(), 25.0);

        let calls = slurm.executor().calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("sacct -j 100 --noheader -P -o JobID,JobName,"));
    }

    #[tokio::test]
    async fn test_completed_job_stats_not_found() {
        let slurm = client(ScriptedExecutor::new().ok("sacct", ""));
        assert!(slurm.completed_job_stats("100").await.is_none());

        let slurm = client(ScriptedExecutor::new().fail("sacct"));
        assert!(slurm.completed_job_stats("100").await.is_none());
    }

    #[tokio::test]
    async fn test_accounting_state_takes_first_line() {
        let slurm = client(ScriptedExecutor::new().ok("sacct", "CANCELLED by 1000\nCANCELLED\nCOMPLETED\n"));
        assert_eq!(slurm.accounting_state("100").await, Some(JobState::Cancelled));
        assert_eq!(
            slurm.executor().calls(),
            vec!["sacct -j 100 --noheader -P -o State"]
        );
    }
}
