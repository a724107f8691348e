//! HTML efficiency card for Open OnDemand sessions.

use crate::theme::{CARD_STYLES, Rating};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use schmutz_core::{Config, EfficiencyThresholds};
use schmutz_parsers::{format_bytes, format_duration_compact};
use schmutz_slurm::{JobMetrics, JobState};
use std::fs;
use std::time::Duration;
use thiserror::Error;

/// File OnDemand renders on the session card.
pub const INFO_HTML: &str = "info.html";

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Permission denied writing to {0}")]
    PermissionDenied(Utf8PathBuf),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Renders efficiency cards with the configured title and thresholds.
pub struct SessionCard {
    title: String,
    thresholds: EfficiencyThresholds,
    show_recommendations: bool,
    compact: bool,
}

impl SessionCard {
    pub fn new(config: &Config) -> Self {
        Self {
            title: config.card_title.clone(),
            thresholds: config.thresholds.clone(),
            show_recommendations: config.show_recommendations,
            compact: config.compact_mode,
        }
    }

    /// Card for the job's state: a summary once it has finished, live usage otherwise.
    pub fn render(&self, metrics: &JobMetrics) -> String {
        if metrics.state.is_completed() {
            self.render_completed(metrics)
        } else {
            self.render_running(metrics)
        }
    }

    /// Write the card into `<session_dir>/info.html`.
    pub fn write_session_card(
        &self,
        session_dir: &Utf8Path,
        metrics: &JobMetrics,
    ) -> Result<Utf8PathBuf, CardError> {
        let path = session_dir.join(INFO_HTML);
        fs::write(&path, self.render(metrics)).map_err(|source| {
            if source.kind() == std::io::ErrorKind::PermissionDenied {
                CardError::PermissionDenied(path.clone())
            } else {
                CardError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        tracing::debug!("Updated session card: {}", path);
        Ok(path)
    }

    pub fn render_running(&self, metrics: &JobMetrics) -> String {
        let t = &self.thresholds;
        let cpu = Rating::of(metrics.cpu_efficiency(), t.cpu_good, t.cpu_warning);
        let mem = Rating::of(metrics.memory_efficiency(), t.memory_good, t.memory_warning);

        let mut html = self.open_card(&format!("📊 {}", escape(&self.title)));

        push_section(
            &mut html,
            "CPU Efficiency",
            "Utilization",
            metrics.cpu_efficiency(),
            cpu,
        );
        push_section(
            &mut html,
            "Memory Usage",
            &format!(
                "{} / {}",
                format_bytes(metrics.memory_used_max),
                format_bytes(metrics.memory_requested)
            ),
            metrics.memory_efficiency(),
            mem,
        );

        if metrics.has_gpus() {
            let gpu = Rating::of(metrics.gpu_utilization_avg(), t.gpu_good, t.gpu_warning);
            let gpu_mem = Rating::of(
                metrics.gpu_memory_utilization_avg(),
                t.gpu_memory_good,
                t.gpu_memory_warning,
            );
            html.push_str(&format!(
                "    <div class=\"efficiency-section\">\n        <div class=\"efficiency-label\">GPU Utilization ({})</div>\n",
                gpu_count(metrics.num_gpus),
            ));
            push_row(&mut html, "Compute", metrics.gpu_utilization_avg(), gpu);
            push_row(&mut html, "Memory", metrics.gpu_memory_utilization_avg(), gpu_mem);
            html.push_str("    </div>\n");
        }

        push_summary(
            &mut html,
            &[
                ("Elapsed Time:", format_span(metrics.elapsed)),
                ("Time Limit:", format_span(metrics.time_limit)),
                (
                    "Resources:",
                    format!("{}N × {}C", metrics.num_nodes, metrics.num_cpus),
                ),
            ],
        );

        if self.show_recommendations {
            push_tips(&mut html, "Tips:", &self.recommendations(metrics));
        }

        let updated = metrics
            .last_updated
            .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        html.push_str(&format!(
            "    <div class=\"last-updated\">Last updated: {}</div>\n",
            updated,
        ));
        html.push_str("</div>\n");
        html
    }

    pub fn render_completed(&self, metrics: &JobMetrics) -> String {
        let t = &self.thresholds;
        let cpu = Rating::of(metrics.cpu_efficiency(), t.cpu_good, t.cpu_warning);
        let mem = Rating::of(metrics.memory_efficiency(), t.memory_good, t.memory_warning);

        let heading = match metrics.state {
            JobState::Completed => "✅ Job Completed Successfully".to_string(),
            JobState::Cancelled => "🚫 Job Cancelled".to_string(),
            JobState::TimedOut => "⏱️ Job Timed Out".to_string(),
            state => format!("❌ Job Failed ({})", state),
        };
        let mut html = self.open_card(&heading);

        let mut resources = format!("{}N × {}C", metrics.num_nodes, metrics.num_cpus);
        if metrics.has_gpus() {
            resources.push_str(&format!(" × {}G", metrics.num_gpus));
        }
        push_summary(
            &mut html,
            &[
                ("Job ID:", escape(&metrics.job_id)),
                ("Total Runtime:", format_span(metrics.elapsed)),
                (
                    "Time Limit:",
                    format!(
                        "{} ({:.1}% used)",
                        format_span(metrics.time_limit),
                        metrics.time_efficiency()
                    ),
                ),
                ("Resources:", resources),
            ],
        );

        push_section(
            &mut html,
            "Final CPU Efficiency",
            "Overall",
            metrics.cpu_efficiency(),
            cpu,
        );
        push_section(
            &mut html,
            "Final Memory Usage",
            &format!(
                "Peak: {} / {}",
                format_bytes(metrics.memory_used_max),
                format_bytes(metrics.memory_requested)
            ),
            metrics.memory_efficiency(),
            mem,
        );

        if metrics.has_gpus() {
            let gpu = Rating::of(metrics.gpu_utilization_avg(), t.gpu_good, t.gpu_warning);
            push_section(
                &mut html,
                &format!("GPU Summary ({})", gpu_count(metrics.num_gpus)),
                "Average Utilization",
                metrics.gpu_utilization_avg(),
                gpu,
            );
        }

        if self.show_recommendations {
            let recs = self.recommendations(metrics);
            if !recs.is_empty() {
                push_tips(&mut html, "Suggestions for Future Jobs:", &recs);
            } else if metrics.cpu_efficiency() > t.cpu_good
                && metrics.memory_efficiency() > t.memory_warning
            {
                html.push_str(
                    "    <div class=\"recommendation good\">\n        ✨ Great job! Resource utilization was efficient.\n    </div>\n",
                );
            }
        }

        html.push_str("</div>\n");
        html
    }

    /// Suggestions for better resource requests.
    pub fn recommendations(&self, metrics: &JobMetrics) -> Vec<String> {
        let t = &self.thresholds;
        let mut recs = Vec::new();

        let cpu = metrics.cpu_efficiency();
        if cpu < t.cpu_warning {
            recs.push(format!(
                "⚠️ CPU efficiency is low ({:.1}%). Consider requesting fewer CPUs or optimizing CPU usage.",
                cpu
            ));
        }

        let mem = metrics.memory_efficiency();
        if mem > 0.0 {
            if mem < t.memory_warning {
                recs.push(format!(
                    "⚠️ Memory usage is low ({:.1}%). Consider requesting less memory to improve job scheduling.",
                    mem
                ));
            } else if mem > 95.0 {
                recs.push(format!(
                    "⚠️ Memory usage is very high ({:.1}%). Consider requesting more memory to avoid out-of-memory errors.",
                    mem
                ));
            }
        }

        let gpu = metrics.gpu_utilization_avg();
        if metrics.has_gpus() && gpu > 0.0 && gpu < t.gpu_warning {
            recs.push(format!(
                "⚠️ GPU utilization is low ({:.1}%). Ensure your code is properly utilizing GPUs.",
                gpu
            ));
        }

        let time = metrics.time_efficiency();
        if time > 0.0 && time < 10.0 {
            recs.push(format!(
                "ℹ️ Job completed using only {:.1}% of the time limit. Consider reducing the time limit for better scheduling priority.",
                time
            ));
        }

        recs
    }

    fn open_card(&self, heading: &str) -> String {
        let mut html = String::from(CARD_STYLES);
        let class = if self.compact {
            "job-efficiency-card compact"
        } else {
            "job-efficiency-card"
        };
        html.push_str(&format!("<div class=\"{}\">\n", class));
        html.push_str(&format!("    <h4>{}</h4>\n", heading));
        html
    }
}

fn push_section(html: &mut String, label: &str, caption: &str, value: f64, rating: Rating) {
    html.push_str(&format!(
        "    <div class=\"efficiency-section\">\n        <div class=\"efficiency-label\">{}</div>\n",
        label,
    ));
    push_row(html, caption, value, rating);
    html.push_str("    </div>\n");
}

fn push_row(html: &mut String, caption: &str, value: f64, rating: Rating) {
    let class = rating.as_str();
    html.push_str(&format!(
        "        <div class=\"efficiency-row\">\n            <span>{}</span>\n            <span class=\"efficiency-value efficiency-{}\">{:.1}%</span>\n        </div>\n",
        caption,
        class,
        value,
    ));
    html.push_str(&format!(
        "        <div class=\"efficiency-bar\">\n            <div class=\"efficiency-bar-fill bar-{}\" style=\"width: {:.1}%\"></div>\n        </div>\n",
        class,
        value.clamp(0.0, 100.0),
    ));
}

fn push_summary(html: &mut String, rows: &[(&str, String)]) {
    html.push_str("    <div class=\"job-summary\">\n");
    for (label, value) in rows {
        html.push_str(&format!(
            "        <div class=\"job-summary-row\">\n            <span>{}</span>\n            <span>{}</span>\n        </div>\n",
            label,
            value,
        ));
    }
    html.push_str("    </div>\n");
}

fn push_tips(html: &mut String, heading: &str, recs: &[String]) {
    if recs.is_empty() {
        return;
    }
    html.push_str(&format!(
        "    <div class=\"recommendation\">\n        <strong>{}</strong><br>\n",
        heading,
    ));
    for rec in recs {
        html.push_str(&format!("        {}<br>\n", rec));
    }
    html.push_str("    </div>\n");
}

fn gpu_count(n: u32) -> String {
    if n == 1 {
        "1 GPU".to_string()
    } else {
        format!("{} GPUs", n)
    }
}

fn format_span(d: Duration) -> String {
    format_duration_compact(d.as_secs())
}

/// Escape text for HTML element content.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GB: u64 = 1 << 30;

    fn metrics(state: JobState) -> JobMetrics {
        let mut m = JobMetrics::new("4242").with_state(state);
        m.num_nodes = 1;
        m.num_cpus = 4;
        m.elapsed = Duration::from_secs(3600);
        m.time_limit = Duration::from_secs(4 * 3600);
        m.cpu_time_total = 4.0 * 3600.0 * 0.9;
        m.memory_requested = 10 * GB;
        m.memory_used_max = 7 * GB;
        m.calculate_efficiency();
        m
    }

    fn card() -> SessionCard {
        SessionCard::new(&Config::default())
    }

    #[test]
    fn test_running_card() {
        let html = card().render(&metrics(JobState::Running));
        assert!(html.starts_with("<style>"));
        assert!(html.contains("📊 Job Efficiency"));
        assert!(html.contains("CPU Efficiency"));
        assert!(html.contains("efficiency-value efficiency-good\">90.0%"));
        assert!(html.contains("7.0 GB / 10.0 GB"));
        assert!(html.contains("1h 0m 0s"));
        assert!(html.contains("1N × 4C"));
        assert!(html.contains("Last updated:"));
        assert!(!html.contains("GPU Utilization"));
    }

    #[test]
    fn test_running_card_with_gpus() {
        let mut m = metrics(JobState::Running);
        m.num_gpus = 2;
        let html = card().render(&m);
        assert!(html.contains("GPU Utilization (2 GPUs)"));
    }

    #[test]
    fn test_completed_card_headings() {
        let card = card();
        assert!(card.render(&metrics(JobState::Completed)).contains("✅ Job Completed Successfully"));
        assert!(card.render(&metrics(JobState::Cancelled)).contains("🚫 Job Cancelled"));
        assert!(card.render(&metrics(JobState::TimedOut)).contains("⏱️ Job Timed Out"));
        assert!(card.render(&metrics(JobState::NodeFailure)).contains("❌ Job Failed (NODE_FAIL)"));
    }

    #[test]
    fn test_completed_card_summary() {
        let html = card().render(&metrics(JobState::Completed));
        assert!(html.contains("<span>4242</span>"));
        assert!(html.contains("(25.0% used)"));
        assert!(html.contains("Peak: 7.0 GB / 10.0 GB"));
        assert!(html.contains("Great job!"));
        assert!(!html.contains("Suggestions for Future Jobs"));
    }

    #[test]
    fn test_completed_card_suggestions() {
        let mut m = metrics(JobState::Failed);
        m.cpu_time_total = 600.0;
        m.calculate_efficiency();
        let html = card().render(&m);
        assert!(html.contains("Suggestions for Future Jobs:"));
        assert!(html.contains("CPU efficiency is low"));
        assert!(html.contains("efficiency-poor"));
    }

    #[test]
    fn test_recommendations_disabled() {
        let config = Config {
            show_recommendations: false,
            compact_mode: true,
            ..Config::default()
        };
        let mut m = metrics(JobState::Running);
        m.cpu_time_total = 0.0;
        m.calculate_efficiency();
        let html = SessionCard::new(&config).render(&m);
        assert!(!html.contains("Tips:"));
        assert!(html.contains("job-efficiency-card compact"));
    }

    #[test]
    fn test_recommendations() {
        let card = card();
        let mut m = metrics(JobState::Completed);
        m.memory_used_max = GB;
        m.elapsed = Duration::from_secs(600);
        m.time_limit = Duration::from_secs(24 * 3600);
        m.cpu_time_total = 4.0 * 600.0;
        m.calculate_efficiency();

        let recs = card.recommendations(&m);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].contains("Memory usage is low (10.0%)"));
        assert!(recs[1].contains("only 0.7% of the time limit"));

        m.memory_used_max = 10 * GB;
        m.calculate_efficiency();
        assert!(card.recommendations(&m)[0].contains("very high (100.0%)"));
    }

    #[test]
    fn test_title_is_escaped() {
        let config = Config {
            card_title: "<b>Usage</b>".to_string(),
            ..Config::default()
        };
        let html = SessionCard::new(&config).render(&metrics(JobState::Running));
        assert!(html.contains("&lt;b&gt;Usage&lt;/b&gt;"));
    }

    #[test]
    fn test_write_info_html() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        let path = card().write_session_card(dir, &metrics(JobState::Running)).unwrap();
        assert_eq!(path, dir.join(INFO_HTML));
        assert!(fs::read_to_string(&path).unwrap().contains("CPU Efficiency"));
    }

    #[test]
    fn test_write_missing_dir() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap().join("gone");
        let err = card().write_session_card(&dir, &metrics(JobState::Running)).unwrap_err();
        assert!(matches!(err, CardError::Io { .. }));
    }
}
