// Report rendering for scans and surveys

use crate::analysis::{rank, ProjectSurvey, Role, ScanReport};
use crate::config::OutputFormat;
use crate::error::Result;
use crate::parser::SourceModel;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Failures listed before the rest are elided
const MAX_LISTED_FAILURES: usize = 10;

#[derive(Serialize)]
struct JsonReport<'a> {
    project: &'a str,
    #[serde(flatten)]
    report: &'a ScanReport,
}

/// Render a scan report in the requested format
pub fn render(report: &ScanReport, format: OutputFormat, project: &str) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(report, project),
        OutputFormat::Summary => Ok(render_summary(report, project)),
        OutputFormat::Layout => Ok(render_layout(report)),
    }
}

pub fn render_json(report: &ScanReport, project: &str) -> Result<String> {
    let json = serde_json::to_string_pretty(&JsonReport { project, report })?;
    Ok(json)
}

/// Human-readable overview: totals, role counts, per-file lines, failures
pub fn render_summary(report: &ScanReport, project: &str) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    let _ = writeln!(out, "{}", project);
    let _ = writeln!(
        out,
        "{} files extracted, {} failed, {} partial",
        stats.extracted, stats.failed, stats.partial
    );
    if stats.skipped_by_priority > 0 || stats.skipped_by_limit > 0 {
        let _ = writeln!(
            out,
            "{} skipped by priority, {} skipped by limit",
            stats.skipped_by_priority, stats.skipped_by_limit
        );
    }

    if !stats.roles.is_empty() {
        out.push_str("\nRoles:\n");
        for (role, count) in &stats.roles {
            let _ = writeln!(out, "  {:<20} {}", role.label(), count);
        }
    }

    if !report.order.is_empty() {
        out.push_str("\nFiles:\n");
        for model in report.iter() {
            let _ = writeln!(out, "  {}", file_line(model));
        }
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out, "\nFailures ({}):", report.failures.len());
        for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
            let _ = writeln!(out, "  {}", failure);
        }
        if report.failures.len() > MAX_LISTED_FAILURES {
            let _ = writeln!(
                out,
                "  ... and {} more",
                report.failures.len() - MAX_LISTED_FAILURES
            );
        }
    }

    out
}

fn file_line(model: &SourceModel) -> String {
    let role = model.role.unwrap_or(Role::Unknown);
    let mut line = format!(
        "[{}] {} ({}, {})",
        rank(&model.path),
        model.path.display(),
        role,
        model.language.as_str()
    );
    if let Some(tier) = model.tier {
        let _ = write!(line, " {}", tier.as_str());
    }
    let _ = write!(
        line,
        ": {} classes, {} methods, {} functions",
        model.classes.len(),
        model.method_count(),
        model.functions.len()
    );
    if model.is_partial() {
        line.push_str(" [partial]");
    }
    line
}

/// Files grouped under the documentation folder of their role
pub fn render_layout(report: &ScanReport) -> String {
    let mut out = String::new();
    for (folder, paths) in report.layout() {
        let _ = writeln!(out, "{}/", folder);
        for path in paths {
            let _ = writeln!(out, "  {}", path.display());
        }
    }
    out
}

/// Survey counts by language and priority
pub fn render_survey(survey: &ProjectSurvey, root: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {} source files", root.display(), survey.total);

    for (language, count) in &survey.by_language {
        let _ = writeln!(out, "  {:<8} {}", language, count);
    }

    out.push('\n');
    for (label, files) in [("high", &survey.high), ("medium", &survey.medium), ("low", &survey.low)] {
        let _ = writeln!(out, "{} priority: {}", label, files.len());
    }
    if !survey.high.is_empty() {
        out.push_str("\nHigh priority files:\n");
        for path in &survey.high {
            let _ = writeln!(out, "  {}", path.display());
        }
    }
    out
}
