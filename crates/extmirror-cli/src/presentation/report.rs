//! Text rendering of batch summaries and inventory reports.

use std::fmt::Write;
use std::path::Path;

use extmirror_download::{BatchSummary, InventoryReport};

/// Render a batch summary for the terminal.
pub fn format_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    let skipped = summary.completed.len() - summary.downloaded_count();

    let _ = writeln!(
        out,
        "✓ {} downloaded, {} already present, {} failed",
        summary.downloaded_count(),
        skipped,
        summary.failed.len()
    );
    for failure in &summary.failed {
        let _ = writeln!(
            out,
            "  ✗ {} {} ({}): {}",
            failure.ext_id, failure.version, failure.platform, failure.error
        );
    }
    if !summary.missing.is_empty() {
        let _ = writeln!(out, "⚠️  Not found: {}", summary.missing.join(", "));
    }
    if !summary.unmatched.is_empty() {
        let _ = writeln!(out, "⚠️  No matching version: {}", summary.unmatched.join(", "));
    }
    out
}

/// Render an inventory report for the terminal.
pub fn format_inventory(report: &InventoryReport, root: &Path) -> String {
    let mut out = String::new();

    for ext in &report.extensions {
        let latest = ext.latest_version().unwrap_or("-");
        let _ = writeln!(
            out,
            "{:<48} {:>14}  {} file(s)",
            ext.metadata.identity.id,
            latest,
            ext.present.len()
        );
        for missing in &ext.missing {
            let _ = writeln!(out, "  ✗ missing {missing}");
        }
    }

    for path in &report.unrecorded {
        let shown = path.strip_prefix(root).unwrap_or(path);
        let _ = writeln!(out, "⚠️  Unrecorded artifact: {}", shown.display());
    }
    for path in &report.corrupt {
        let shown = path.strip_prefix(root).unwrap_or(path);
        let _ = writeln!(out, "⚠️  Unreadable sidecar: {}", shown.display());
    }

    let _ = writeln!(
        out,
        "{} extension(s), {}",
        report.extensions.len(),
        if report.is_consistent() { "consistent" } else { "inconsistent" }
    );
    out
}
