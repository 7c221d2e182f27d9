//! JSON serialization for probe reports.

use crate::result::MemoryReport;

/// The whole report on one line, for piping into other tools.
///
/// Curves and the config snapshot are included, so the output is enough
/// to rerun detection offline.
pub fn to_json(report: &MemoryReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Indented form of [`to_json`], used by `memprobe --json`.
pub fn to_json_pretty(report: &MemoryReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
