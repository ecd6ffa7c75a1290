//! Text and JSON evaluation reports.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::{EvalError, Result};
use crate::metrics::{EvaluationMetrics, EvaluationResult, Rates};

/// Results listed in each of the best and worst sections.
pub const HIGHLIGHT_COUNT: usize = 5;

const RULE_WIDTH: usize = 80;
const ANSWER_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct JsonReport<'m> {
    timestamp: DateTime<Utc>,
    metrics: Option<Rates>,
    results: &'m [EvaluationResult],
}

/// `simple_factual` -> `Simple Factual`
fn title(category: &str) -> String {
    category
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn preview(answer: &str) -> String {
    match answer.char_indices().nth(ANSWER_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &answer[..cut]),
        None => answer.to_string(),
    }
}

fn diagnose(result: &EvaluationResult) -> Option<&'static str> {
    if !result.retrieval_hit {
        Some("retrieval failed; chunks did not contain relevant information")
    } else if result.hallucinated {
        Some("answer contains claims not found in the source")
    } else if !result.faithful {
        Some("answer not grounded in the retrieved chunks")
    } else {
        None
    }
}

fn banner(out: &mut String, heading: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "{rule}\n{heading}\n{rule}");
}

fn rate(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}%"))
}

pub fn render_text(metrics: &EvaluationMetrics, generated_at: DateTime<Utc>) -> String {
    let counts = metrics.counts();
    let rates = metrics.rates();
    let mut out = String::new();

    banner(&mut out, "RAG SYSTEM EVALUATION REPORT");
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "Total Questions Tested: {}\n", counts.total);

    banner(&mut out, "OVERALL METRICS");
    let overall = [
        ("Retrieval Hit Rate", rates.map(|r| r.retrieval_hit_rate), counts.retrieval_hits, "had relevant chunks retrieved"),
        ("Faithfulness Rate", rates.map(|r| r.faithfulness_rate), counts.faithful, "were grounded in retrieved text"),
        ("Hallucination Rate", rates.map(|r| r.hallucination_rate), counts.hallucinations, "contained unsupported claims"),
        ("No Answer Rate", rates.map(|r| r.no_answer_rate), counts.no_answer, "could not be answered"),
    ];
    for (label, value, n, what) in overall {
        let _ = writeln!(out, "{:<22} {}", format!("{label}:"), rate(value, 2));
        let _ = writeln!(out, "  -> {n}/{} questions {what}\n", counts.total);
    }

    banner(&mut out, "CATEGORY BREAKDOWN");
    for breakdown in metrics.by_category() {
        let r = breakdown.rates;
        let _ = writeln!(out, "\n{}:", title(&breakdown.category));
        let _ = writeln!(out, "  Total Questions: {}", breakdown.counts.total);
        let _ = writeln!(out, "  Hit Rate:        {}", rate(r.map(|r| r.retrieval_hit_rate), 1));
        let _ = writeln!(out, "  Faithfulness:    {}", rate(r.map(|r| r.faithfulness_rate), 1));
        let _ = writeln!(out, "  Hallucinations:  {}", rate(r.map(|r| r.hallucination_rate), 1));
    }
    out.push('\n');

    banner(&mut out, &format!("TOP {HIGHLIGHT_COUNT} BEST ANSWERS"));
    for (i, result) in metrics.best(HIGHLIGHT_COUNT).into_iter().enumerate() {
        let _ = writeln!(out, "\n{}. Question: {}", i + 1, result.question);
        let _ = writeln!(out, "   Category: {}", title(&result.category));
        let _ = writeln!(out, "   Answer: {}", preview(&result.answer));
        let _ = writeln!(out, "   Retrieval Hit: {}", result.retrieval_hit);
        let _ = writeln!(out, "   Faithful: {}", result.faithful);
        let _ = writeln!(out, "   No Hallucination: {}", !result.hallucinated);
    }
    out.push('\n');

    banner(&mut out, &format!("TOP {HIGHLIGHT_COUNT} WORST ANSWERS"));
    for (i, result) in metrics.worst(HIGHLIGHT_COUNT).into_iter().enumerate() {
        let _ = writeln!(out, "\n{}. Question: {}", i + 1, result.question);
        let _ = writeln!(out, "   Category: {}", title(&result.category));
        let _ = writeln!(out, "   Answer: {}", preview(&result.answer));
        let _ = writeln!(out, "   Retrieval Hit: {}", result.retrieval_hit);
        let _ = writeln!(out, "   Faithful: {}", result.faithful);
        let _ = writeln!(out, "   Hallucinated: {}", result.hallucinated);
        if let Some(issue) = diagnose(result) {
            let _ = writeln!(out, "   Issue: {issue}");
        }
    }
    out.push('\n');
    banner(&mut out, "END OF REPORT");
    out
}

pub fn render_json(metrics: &EvaluationMetrics, generated_at: DateTime<Utc>) -> Result<String> {
    let report = JsonReport { timestamp: generated_at, metrics: metrics.rates(), results: metrics.results() };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Paths written by [`write_reports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub text: PathBuf,
    pub json: PathBuf,
}

fn write(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EvalError::ReportWrite { path: parent.to_path_buf(), source })?;
    }
    fs::write(path, contents).map_err(|source| EvalError::ReportWrite { path: path.to_path_buf(), source })
}

/// Write the text report to `path` and the detailed JSON next to it
/// (same stem, `.json` extension).
pub fn write_reports(metrics: &EvaluationMetrics, path: &Path) -> Result<ReportPaths> {
    let now = Utc::now();
    let json_path = path.with_extension("json");
    write(path, &render_text(metrics, now))?;
    write(&json_path, &render_json(metrics, now)?)?;
    info!(text = %path.display(), json = %json_path.display(), "evaluation reports written");
    Ok(ReportPaths { text: path.to_path_buf(), json: json_path })
}
