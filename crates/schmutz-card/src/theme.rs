//! Card stylesheet and efficiency ratings.

/// Rating of an efficiency value against its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Good,
    Warning,
    Poor,
}

impl Rating {
    /// Higher is better: `good` at or above `good`, `warning` at or above `warning`.
    pub fn of(value: f64, good: f64, warning: f64) -> Self {
        if value >= good {
            Self::Good
        } else if value >= warning {
            Self::Warning
        } else {
            Self::Poor
        }
    }

    /// CSS class suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Poor => "poor",
        }
    }
}

pub const CARD_STYLES: &str = r#"<style>
.job-efficiency-card {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    font-size: 13px;
    line-height: 1.4;
    padding: 10px;
    background: #f8f9fa;
    border-radius: 6px;
    margin: 8px 0;
}
.job-efficiency-card h4 {
    margin: 0 0 10px 0;
    padding-bottom: 6px;
    border-bottom: 1px solid #dee2e6;
    color: #495057;
    font-size: 14px;
}
.efficiency-section { margin-bottom: 10px; }
.efficiency-section:last-child { margin-bottom: 0; }
.efficiency-label {
    font-weight: 500;
    color: #6c757d;
    font-size: 11px;
    text-transform: uppercase;
    letter-spacing: 0.5px;
}
.efficiency-row {
    display: flex;
    justify-content: space-between;
    align-items: center;
    padding: 4px 0;
}
.efficiency-value { font-weight: 600; font-size: 14px; }
.efficiency-bar {
    height: 6px;
    background: #e9ecef;
    border-radius: 3px;
    overflow: hidden;
    margin-top: 2px;
}
.efficiency-bar-fill { height: 100%; border-radius: 3px; transition: width 0.3s ease; }
.efficiency-good { color: #28a745; }
.efficiency-warning { color: #ffc107; }
.efficiency-poor { color: #dc3545; }
.bar-good { background: #28a745; }
.bar-warning { background: #ffc107; }
.bar-poor { background: #dc3545; }
.recommendation {
    margin-top: 10px;
    padding: 8px;
    background: #fff3cd;
    border: 1px solid #ffc107;
    border-radius: 4px;
    font-size: 12px;
    color: #856404;
}
.recommendation.good { background: #d4edda; border-color: #28a745; color: #155724; }
.job-summary { margin-top: 10px; padding: 8px; background: #e9ecef; border-radius: 4px; }
.job-summary-row { display: flex; justify-content: space-between; font-size: 12px; padding: 2px 0; }
.last-updated { font-size: 10px; color: #adb5bd; text-align: right; margin-top: 8px; }
.compact .efficiency-row { padding: 2px 0; }
.compact .efficiency-section { margin-bottom: 6px; }
</style>
"#;
