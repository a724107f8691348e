//! Memory parsing utilities for scheduler output.

/// Bytes per gibibyte.
pub const GIB: f64 = (1u64 << 30) as f64;

/// How a requested-memory value scales with the allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryScope {
    /// Plain total: "16G"
    Total,
    /// Per node: "4Gn"
    PerNode,
    /// Per allocated CPU: "1000Mc"
    PerCpu,
}

impl MemoryScope {
    /// Split a trailing `n`/`c` scope marker off a requested-memory string.
    pub fn split(s: &str) -> (&str, MemoryScope) {
        let s = s.trim();
        if let Some(stripped) = s.strip_suffix('n') {
            (stripped, MemoryScope::PerNode)
        } else if let Some(stripped) = s.strip_suffix('c') {
            (stripped, MemoryScope::PerCpu)
        } else {
            (s, MemoryScope::Total)
        }
    }
}

/// Parse a SLURM memory string to bytes.
///
/// Accepts a numeral with an optional `K`, `M`, `G` or `T` suffix (any case),
/// using powers of 1024. A bare numeral is a byte count. Empty input is `0`;
/// anything else that fails to parse is logged and treated as `0`.
pub fn parse_bytes(s: &str) -> u64 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }

    match try_parse_bytes(s) {
        Some(bytes) => bytes,
        None => {
            tracing::warn!("Could not parse memory value: {}", s);
            0
        }
    }
}

fn try_parse_bytes(s: &str) -> Option<u64> {
    if let Ok(bytes) = s.parse::<u64>() {
        return Some(bytes);
    }

    let upper = s.to_ascii_uppercase();
    let (number, multiplier) = match upper.char_indices().last()? {
        (i, 'K') => (&upper[..i], 1u64 << 10),
        (i, 'M') => (&upper[..i], 1u64 << 20),
        (i, 'G') => (&upper[..i], 1u64 << 30),
        (i, 'T') => (&upper[..i], 1u64 << 40),
        _ => (upper.as_str(), 1),
    };

    if let Ok(value) = number.parse::<u64>() {
        return value.checked_mul(multiplier);
    }

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier as f64).round() as u64)
}

/// Parse an accounting `ReqMem` value to total bytes.
///
/// Per-node values are multiplied by `nodes`, per-CPU values by `cpus`.
pub fn parse_requested_memory(s: &str, nodes: u32, cpus: u32) -> u64 {
    let (value, scope) = MemoryScope::split(s);
    let bytes = parse_bytes(value);
    match scope {
        MemoryScope::Total => bytes,
        MemoryScope::PerNode => bytes.saturating_mul(u64::from(nodes)),
        MemoryScope::PerCpu => bytes.saturating_mul(u64::from(cpus)),
    }
}

/// Convert bytes to GiB.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// Format bytes as a human-readable size (e.g., "1.5 GB"), "N/A" for zero.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "N/A".to_string();
    }

    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} PB", value)
}
