//! Generation report
//!
//! Per-path outcomes of a run plus the issue log, renderable as text,
//! JSON, or Markdown. Text rendering goes to stderr-facing summaries; JSON
//! backs `--summary json` for scripting.

use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

use crate::types::{NodeKind, PathKey};

/// What happened to one declared path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Created,
    Placeholder,
    SkippedUnchanged,
    Failed,
}

impl NodeStatus {
    fn label(self) -> &'static str {
        match self {
            NodeStatus::Created => "created",
            NodeStatus::Placeholder => "placeholder",
            NodeStatus::SkippedUnchanged => "skipped",
            NodeStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeOutcome {
    pub path: PathKey,
    pub kind: NodeKind,
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Aggregated results of one generate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub started: DateTime<Utc>,
    pub outcomes: Vec<NodeOutcome>,
    pub issues: Vec<String>,
    pub conflicts: Vec<String>,
    pub unassigned_blocks: usize,
    /// Content lines actually written to disk this run.
    pub lines_written: usize,
}

impl Default for GenerationReport {
    fn default() -> Self {
        GenerationReport {
            started: Utc::now(),
            outcomes: Vec::new(),
            issues: Vec::new(),
            conflicts: Vec::new(),
            unassigned_blocks: 0,
            lines_written: 0,
        }
    }
}

impl GenerationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: PathKey, kind: NodeKind, status: NodeStatus) {
        self.outcomes.push(NodeOutcome {
            path,
            kind,
            status,
            detail: None,
        });
    }

    pub fn record_detail(
        &mut self,
        path: PathKey,
        kind: NodeKind,
        status: NodeStatus,
        detail: String,
    ) {
        self.outcomes.push(NodeOutcome {
            path,
            kind,
            status,
            detail: Some(detail),
        });
    }

    pub fn issue(&mut self, message: String) {
        self.issues.push(message);
    }

    pub fn count(&self, status: NodeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Anything a strict run should refuse to accept.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
            || self.unassigned_blocks > 0
            || self.count(NodeStatus::Failed) > 0
    }
}

/// Format a section heading with bold/underline. Respects NO_COLOR and TTY.
fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Format a report as human-readable text.
pub fn format_report_text(report: &GenerationReport, verbose: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Generation Report")));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Status", "Count"]);
    for status in [
        NodeStatus::Created,
        NodeStatus::Placeholder,
        NodeStatus::SkippedUnchanged,
        NodeStatus::Failed,
    ] {
        table.add_row(vec![status.label().to_string(), report.count(status).to_string()]);
    }
    table.add_row(vec!["lines written".to_string(), report.lines_written.to_string()]);
    out.push_str(&format!("{}\n\n", table));

    if verbose && !report.outcomes.is_empty() {
        let mut detail = Table::new();
        detail.load_preset(UTF8_BORDERS_ONLY);
        detail.set_header(vec!["Path", "Kind", "Status"]);
        for outcome in &report.outcomes {
            detail.add_row(vec![
                outcome.path.to_string(),
                format!("{:?}", outcome.kind).to_lowercase(),
                outcome.status.label().to_string(),
            ]);
        }
        out.push_str(&format!("{}\n\n", detail));
    }

    if !report.conflicts.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("Conflicts")));
        for line in &report.conflicts {
            out.push_str(&format!("  {}\n", line));
        }
        out.push('\n');
    }

    if !report.issues.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("Issues")));
        for issue in &report.issues {
            out.push_str(&format!("  {}\n", issue.yellow()));
        }
        out.push('\n');
    }

    if report.unassigned_blocks > 0 {
        out.push_str(&format!(
            "{} block(s) had no destination and were held.\n",
            report.unassigned_blocks
        ));
    }
    out
}

/// Format a reconciled plan as a preview table, before anything is written.
pub fn format_plan_preview(plan: &crate::reconcile::Reconciled) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Planned Layout")));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "Kind", "Content"]);
    for node in plan.tree.iter() {
        let kind = format!("{:?}", node.kind).to_lowercase();
        let content = match node.kind {
            NodeKind::Directory => String::new(),
            _ => match plan.content_for(&node.path) {
                Some(body) => format!("{} byte(s)", body.len()),
                None => "placeholder".to_string(),
            },
        };
        table.add_row(vec![node.path.to_string(), kind, content]);
    }
    out.push_str(&format!("{}\n\n", table));

    if !plan.unassigned.is_empty() {
        out.push_str(&format!(
            "{} block(s) would be held with no destination.\n\n",
            plan.unassigned.len()
        ));
    }
    if !plan.issues.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("Issues")));
        for issue in &plan.issues {
            out.push_str(&format!("  {}\n", issue.yellow()));
        }
    }
    out
}

/// Format a report as a JSON summary.
pub fn format_report_json(report: &GenerationReport) -> Result<String, crate::error::Error> {
    serde_json::to_string_pretty(report)
        .map_err(|e| crate::error::Error::Config(format!("report serialization failed: {}", e)))
}

/// Format a report as Markdown, suitable for dropping into a PR or doc.
pub fn format_report_markdown(report: &GenerationReport) -> String {
    let mut out = String::new();
    out.push_str("# Generation Report\n\n");
    out.push_str(&format!(
        "Run started {}.\n\n",
        report.started.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str("| Status | Count |\n|---|---|\n");
    for status in [
        NodeStatus::Created,
        NodeStatus::Placeholder,
        NodeStatus::SkippedUnchanged,
        NodeStatus::Failed,
    ] {
        out.push_str(&format!("| {} | {} |\n", status.label(), report.count(status)));
    }
    out.push_str(&format!("| lines written | {} |\n", report.lines_written));
    if !report.issues.is_empty() {
        out.push_str("\n## Issues\n\n");
        for issue in &report.issues {
            out.push_str(&format!("- {}\n", issue));
        }
    }
    if !report.conflicts.is_empty() {
        out.push_str("\n## Conflicts\n\n");
        for line in &report.conflicts {
            out.push_str(&format!("- {}\n", line));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PathKey {
        PathKey::new(s).unwrap()
    }

    fn sample() -> GenerationReport {
        let mut report = GenerationReport::new();
        report.record(key("src"), NodeKind::Directory, NodeStatus::Created);
        report.record(key("src/main.rs"), NodeKind::File, NodeStatus::Created);
        report.record(key("src/lib.rs"), NodeKind::File, NodeStatus::SkippedUnchanged);
        report.record(key("stub.py"), NodeKind::File, NodeStatus::Placeholder);
        report
    }

    #[test]
    fn counts_by_status() {
        let report = sample();
        assert_eq!(report.count(NodeStatus::Created), 2);
        assert_eq!(report.count(NodeStatus::SkippedUnchanged), 1);
        assert_eq!(report.count(NodeStatus::Failed), 0);
        assert!(!report.has_issues());
    }

    #[test]
    fn issues_make_the_report_dirty() {
        let mut report = sample();
        assert!(!report.has_issues());
        report.issue("something odd".to_string());
        assert!(report.has_issues());
    }

    #[test]
    fn text_rendering_includes_counts() {
        let text = format_report_text(&sample(), false);
        assert!(text.contains("Generation Report"));
        assert!(text.contains("created"));
    }

    #[test]
    fn json_round_trips() {
        let report = sample();
        let raw = format_report_json(&report).unwrap();
        let back: GenerationReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.outcomes.len(), report.outcomes.len());
    }

    #[test]
    fn markdown_lists_issues() {
        let mut report = sample();
        report.issue("unclosed fence recovered".to_string());
        let md = format_report_markdown(&report);
        assert!(md.contains("## Issues"));
        assert!(md.contains("- unclosed fence recovered"));
    }
}
