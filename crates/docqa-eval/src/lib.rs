//! docqa-eval
//!
//! Drives a categorized question catalog through a `DocumentStore` and an
//! answer generator, scores every answer with lexical heuristics and
//! aggregates the scores into a report.

pub mod catalog;
pub mod error;
pub mod harness;
pub mod heuristics;
pub mod metrics;
pub mod report;

pub use catalog::{Category, QuestionCatalog};
pub use error::{EvalError, Result};
pub use harness::{EvaluationHarness, Progress, DEFAULT_TOP_K};
pub use heuristics::{check_faithfulness, check_hallucination, check_retrieval_hit, judge, Verdict};
pub use metrics::{CategoryBreakdown, Counts, EvaluationMetrics, EvaluationResult, Rates};
pub use report::{render_json, render_text, write_reports, ReportPaths};
