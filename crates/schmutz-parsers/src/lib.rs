//! Shared parsing utilities for SLURM command output.
//!
//! This crate provides the command executor used for every scheduler query and
//! the pure field parsers that turn squeue/sstat/sacct text into typed values.

pub mod command;
pub mod gres;
pub mod memory;
pub mod time;

pub use command::{
    CommandError, CommandExecutor, CommandOutput, EXECUTION_FAILED, ProcessExecutor, run_command,
};
pub use gres::parse_gpu_count;
pub use memory::{
    GIB, MemoryScope, bytes_to_gb, format_bytes, parse_bytes, parse_requested_memory,
};
pub use time::{
    format_duration, format_duration_compact, parse_duration, parse_exit_code,
    parse_slurm_timestamp, parse_time_limit,
};

/// Filter helper for optional string fields.
/// Returns None if the string is empty or a placeholder value.
pub fn non_empty_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "N/A" || trimmed == "Unknown" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a pipe-delimited line and validate field count.
pub fn split_delimited(line: &str, min_fields: usize) -> Result<Vec<&str>, String> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < min_fields {
        return Err(format!(
            "Expected {} fields, got {}: {}",
            min_fields,
            fields.len(),
            line
        ));
    }
    Ok(fields)
}

/// Parse a count field, falling back to `default` when it is not a number.
pub fn parse_count(s: &str, default: u32) -> u32 {
    s.trim().parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_string() {
        assert_eq!(non_empty_string("hello"), Some("hello".to_string()));
        assert_eq!(non_empty_string("  hello  "), Some("hello".to_string()));
        assert_eq!(non_empty_string(""), None);
        assert_eq!(non_empty_string("-"), None);
        assert_eq!(non_empty_string("N/A"), None);
        assert_eq!(non_empty_string("Unknown"), None);
    }

    #[test]
    fn test_split_delimited() {
        let line = "a|b|c|d";
        assert_eq!(split_delimited(line, 4).unwrap(), vec!["a", "b", "c", "d"]);
        assert!(split_delimited(line, 5).is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("4", 1), 4);
        assert_eq!(parse_count(" 16 ", 1), 16);
        assert_eq!(parse_count("", 1), 1);
        assert_eq!(parse_count("N/A", 1), 1);
    }
}
