//! GPU counts from GRES/TRES allocation strings.

use once_cell::sync::Lazy;
use regex::Regex;

/// GRES spelling: "gpu:2", "gpu:a100:2", "gres:gpu:tesla:4(IDX:0-3)".
static GRES_GPU: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)gpu[:\w]*:(\d+)").expect("valid GRES regex")
});

/// TRES spelling: "cpu=4,gres/gpu=2,mem=16G", "gres/gpu:a100=2".
static TRES_GPU: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)gres/gpu(?::\w+)?=(\d+)").expect("valid TRES regex")
});

/// Extract the number of allocated GPUs from a resource specification.
///
/// Returns 0 when no GPU request is present.
pub fn parse_gpu_count(spec: &str) -> u32 {
    GRES_GPU
        .captures(spec)
        .or_else(|| TRES_GPU.captures(spec))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
