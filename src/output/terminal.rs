//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::curve::LatencyCurve;
use crate::preflight::PreflightWarning;
use crate::result::{CacheSizes, MemoryReport, ProbeCurves};
use crate::topology::CacheDescriptor;

/// Format a byte count as B, KB or MB (binary multiples).
pub fn format_bytes(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;

    let scaled = |unit: usize, suffix: &str| {
        if bytes % unit == 0 {
            format!("{} {}", bytes / unit, suffix)
        } else {
            format!("{:.1} {}", bytes as f64 / unit as f64, suffix)
        }
    };

    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        scaled(KIB, "KB")
    } else {
        scaled(MIB, "MB")
    }
}

/// Format a MemoryReport for human-readable terminal output.
pub fn format_report(report: &MemoryReport) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);
    let meta = &report.metadata;

    output.push_str("memprobe\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!(
        "  Clock: {} ({:.3} ticks/ns, resolution {:.1} ns)\n",
        meta.clock, meta.ticks_per_ns, meta.clock_resolution_ns
    ));
    output.push_str(&format!("  Runtime: {:.2} s\n", meta.runtime_secs));
    output.push('\n');

    if !report.warnings.is_empty() {
        output.push_str(&format_warnings(&report.warnings));
        output.push('\n');
    }

    let h = &report.hierarchy;
    output.push_str(&format!("  {}\n\n", "Inferred hierarchy".bold()));
    output.push_str(&format!("    Cache line size:  {}\n", format_bytes(h.line_size)));
    output.push_str(&format_cache_levels(&h.caches, "    "));
    output.push_str(&format!("    Associativity:    {}-way\n", h.associativity));
    output.push_str(&format!("    Page size:        {}\n", format_bytes(h.page_size)));
    output.push_str(&format!("    TLB entries:      {}\n", h.tlb_entries));
    output.push('\n');

    if !report.core_runs.is_empty() {
        output.push_str(&format!("  {}\n\n", "Per core class".bold()));
        for run in &report.core_runs {
            let hint = if run.hint_applied {
                "hint applied".green().to_string()
            } else {
                "hint unavailable".yellow().to_string()
            };
            output.push_str(&format!("    {} ({})\n", run.core_class, hint));
            output.push_str(&format!("      Cache line size:  {}\n", format_bytes(run.line_size)));
            output.push_str(&format_cache_levels(&run.caches, "      "));
        }
        output.push('\n');
    }

    if !report.authoritative.is_empty() {
        output.push_str(&format!("  {}\n\n", "Operating system (cpu0)".bold()));
        output.push_str(&format_descriptors(&report.authoritative));
        output.push('\n');
    }

    if let Some(curves) = &report.curves {
        output.push_str(&format_curves(curves));
        output.push('\n');
    }

    output.push_str(&sep);
    output.push('\n');
    output.push_str("Note: values are timing estimates; undetected parameters show their defaults.\n");

    output
}

fn format_cache_levels(caches: &CacheSizes, indent: &str) -> String {
    let level = |size: Option<usize>| match size {
        Some(bytes) => format_bytes(bytes),
        None => "not detected".dimmed().to_string(),
    };
    format!(
        "{indent}L1 data cache:    {}\n{indent}L2 cache:         {}\n{indent}L3 cache:         {}\n",
        level(caches.l1),
        level(caches.l2),
        level(caches.l3),
        indent = indent
    )
}

fn format_warnings(warnings: &[PreflightWarning]) -> String {
    let mut output = String::new();
    for warning in warnings {
        let marker = if warning.is_critical() {
            "\u{2717}".red().bold()
        } else {
            "\u{26A0}".yellow().bold()
        };
        output.push_str(&format!("  {} {}\n", marker, warning.description()));
    }
    output
}

/// Format operating-system cache descriptors, one line per cache.
pub fn format_descriptors(descriptors: &[CacheDescriptor]) -> String {
    let mut output = String::new();
    for d in descriptors {
        let level = d.level.map(|l| format!("L{}", l)).unwrap_or_else(|| format!("index{}", d.index));
        let kind = d.cache_type.as_deref().unwrap_or("Unknown");
        let ways = d.ways.map(|w| format!("{}-way", w)).unwrap_or_else(|| "?-way".to_string());
        let line = d.line_size.map(format_bytes).unwrap_or_else(|| "?".to_string());
        output.push_str(&format!(
            "    {:<7} {:<12} {:>9}  {:>7}  line {}\n",
            level,
            kind,
            format_bytes(d.size_bytes),
            ways,
            line
        ));
    }
    output
}

/// Format every curve as a parameter/latency table.
pub fn format_curves(curves: &ProbeCurves) -> String {
    let mut output = String::new();
    let mut section = |title: &str, curve: &LatencyCurve, bytes: bool| {
        output.push_str(&format!("  {}\n", title.bold()));
        for point in curve.points() {
            let parameter = if bytes {
                format_bytes(point.parameter)
            } else {
                point.parameter.to_string()
            };
            output.push_str(&format!("    {:>10}  {:>12.3}\n", parameter, point.latency));
        }
        output.push('\n');
    };

    if let Some(curve) = &curves.line_size {
        section("Line-size sweep (ticks x stride)", curve, true);
    }
    if let Some(curve) = &curves.cache_sizes {
        section("Working-set sweep (ticks/access)", curve, true);
    }
    if let Some(curve) = &curves.associativity {
        section("Associativity sweep (ticks/access)", curve, false);
    }
    if let Some(curve) = &curves.page_size {
        section("Page-size sweep (ticks/access)", curve, true);
    }
    for (trial, curve) in curves.tlb.iter().enumerate() {
        section(&format!("TLB sweep, trial {} (ticks/access)", trial), curve, false);
    }
    output
}
