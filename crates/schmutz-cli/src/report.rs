//! Terminal report, JSON record, and session table.

use schmutz_core::EfficiencyThresholds;
use schmutz_parsers::format_duration;
use schmutz_slurm::JobMetrics;
use serde::Serialize;

const BAR_WIDTH: usize = 20;
const RULE: &str = "==================================================";

/// Flat JSON record of a job's efficiency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub job_name: String,
    pub user: String,
    pub state: String,
    pub partition: String,
    pub num_nodes: u32,
    pub num_cpus: u32,
    pub num_gpus: u32,
    pub memory_requested_gb: f64,
    pub memory_used_max_gb: f64,
    pub cpu_efficiency: f64,
    pub memory_efficiency: f64,
    pub gpu_utilization: Option<f64>,
    pub elapsed_seconds: f64,
    pub time_limit_seconds: f64,
    pub time_efficiency: f64,
}

impl From<&JobMetrics> for JobSummary {
    fn from(m: &JobMetrics) -> Self {
        Self {
            job_id: m.job_id.clone(),
            job_name: m.job_name.clone(),
            user: m.user.clone(),
            state: m.state.as_str().to_string(),
            partition: m.partition.clone(),
            num_nodes: m.num_nodes,
            num_cpus: m.num_cpus,
            num_gpus: m.num_gpus,
            memory_requested_gb: m.memory_requested_gb(),
            memory_used_max_gb: m.memory_used_max_gb(),
            cpu_efficiency: m.cpu_efficiency(),
            memory_efficiency: m.memory_efficiency(),
            gpu_utilization: m.has_gpus().then(|| m.gpu_utilization_avg()),
            elapsed_seconds: m.elapsed_seconds(),
            time_limit_seconds: m.time_limit_seconds(),
            time_efficiency: m.time_efficiency(),
        }
    }
}

/// Progress bar of `BAR_WIDTH` cells, e.g. `[█████░░░░░...]`.
fn bar(value: f64) -> String {
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
    let filled = (BAR_WIDTH as f64 * value / 100.0) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Human-readable efficiency report for a job.
pub fn format_report(m: &JobMetrics, thresholds: &EfficiencyThresholds) -> String {
    let mut out = String::new();
    let name = if m.job_name.is_empty() {
        "N/A"
    } else {
        &m.job_name
    };

    out.push_str(&format!("\n{}\n", RULE));
    out.push_str(&format!("Job {}: {}\n", m.job_id, name));
    out.push_str(&format!("{}\n", RULE));
    out.push_str(&format!("User:       {}\n", m.user));
    out.push_str(&format!("State:      {}\n", m.state));
    out.push_str(&format!("Partition:  {}\n", m.partition));

    out.push_str("\n--- Resources ---\n");
    out.push_str(&format!("Nodes:      {}\n", m.num_nodes));
    out.push_str(&format!("CPUs:       {}\n", m.num_cpus));
    if m.has_gpus() {
        out.push_str(&format!("GPUs:       {}\n", m.num_gpus));
    }
    out.push_str(&format!("Memory:     {:.1} GB requested\n", m.memory_requested_gb()));

    out.push_str("\n--- Efficiency ---\n");
    out.push_str(&format!("CPU:        {} {:5.1}%\n", bar(m.cpu_efficiency()), m.cpu_efficiency()));
    out.push_str(&format!(
        "Memory:     {} {:5.1}% (peak: {:.1} GB)\n",
        bar(m.memory_efficiency()),
        m.memory_efficiency(),
        m.memory_used_max_gb(),
    ));
    if m.has_gpus() {
        out.push_str(&format!(
            "GPU:        {} {:5.1}%\n",
            bar(m.gpu_utilization_avg()),
            m.gpu_utilization_avg(),
        ));
    }

    out.push_str("\n--- Time ---\n");
    out.push_str(&format!("Elapsed:    {}\n", format_duration(m.elapsed.as_secs())));
    out.push_str(&format!("Limit:      {}\n", format_duration(m.time_limit.as_secs())));
    out.push_str(&format!(
        "Used:       {} {:5.1}%\n",
        bar(m.time_efficiency()),
        m.time_efficiency(),
    ));
    if let Some(code) = m.exit_code {
        out.push_str(&format!("Exit code:  {}\n", code));
    }

    let recs = recommendations(m, thresholds);
    if !recs.is_empty() {
        out.push_str("\n--- Recommendations ---\n");
        for rec in recs {
            out.push_str(&format!("  • {}\n", rec));
        }
    }

    out
}

/// Suggestions for the next submission of a similar job.
pub fn recommendations(m: &JobMetrics, t: &EfficiencyThresholds) -> Vec<String> {
    let mut recs = Vec::new();

    let cpu = m.cpu_efficiency();
    if cpu > 0.0 && cpu < t.cpu_warning {
        recs.push(format!(
            "Low CPU efficiency ({:.0}%). Consider requesting fewer CPUs.",
            cpu
        ));
    }

    let mem = m.memory_efficiency();
    if mem > 0.0 && mem < t.memory_warning {
        recs.push(format!(
            "Low memory usage ({:.0}%). Consider requesting less memory.",
            mem
        ));
    } else if mem > 95.0 {
        recs.push(format!(
            "High memory usage ({:.0}%). Consider requesting more memory.",
            mem
        ));
    }

    let gpu = m.gpu_utilization_avg();
    if m.has_gpus() && gpu > 0.0 && gpu < t.gpu_warning {
        recs.push(format!(
            "Low GPU utilization ({:.0}%). Ensure code is GPU-optimized.",
            gpu
        ));
    }

    if m.state.is_completed() && m.time_efficiency() < 25.0 {
        recs.push(format!(
            "Only used {:.0}% of time limit. Request less time for faster scheduling.",
            m.time_efficiency()
        ));
    }

    recs
}

/// One line of the session table.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub job_id: String,
    pub session: String,
    /// `(state, cpu %, memory %)`, None when metrics are unavailable.
    pub usage: Option<(String, f64, f64)>,
}

impl SessionRow {
    pub fn new(job_id: &str, session: &str, metrics: Option<&JobMetrics>) -> Self {
        Self {
            job_id: job_id.to_string(),
            session: session.to_string(),
            usage: metrics.map(|m| {
                (
                    m.state.as_str().to_string(),
                    m.cpu_efficiency(),
                    m.memory_efficiency(),
                )
            }),
        }
    }
}

fn percent_or_dash(value: f64) -> String {
    if value > 0.0 {
        format!("{:.1}", value)
    } else {
        "-".to_string()
    }
}

/// Table of a user's active sessions.
pub fn format_sessions(user: &str, rows: &[SessionRow]) -> String {
    if rows.is_empty() {
        return format!("No active OOD sessions found for user {}\n", user);
    }

    let mut out = String::new();
    out.push_str(&format!("\nActive Sessions for {}\n", user));
    out.push_str(&format!(
        "{:<12} {:<12} {:<8} {:<8} Session\n",
        "Job ID",
        "State",
        "CPU %",
        "Mem %",
    ));
    out.push_str(&format!("{}\n", "-".repeat(60)));

    for row in rows {
        let (state, cpu, mem) = match &row.usage {
            Some((state, cpu, mem)) => {
                let state: String = state.chars().take(10).collect();
                (state, percent_or_dash(*cpu), percent_or_dash(*mem))
            }
            None => ("UNKNOWN".to_string(), "-".to_string(), "-".to_string()),
        };
        out.push_str(&format!(
            "{:<12} {:<12} {:<8} {:<8} {}\n",
            row.job_id,
            state,
            cpu,
            mem,
            row.session,
        ));
    }

    out
}
