use tracing::{debug, info, warn};

use docqa_core::answer::GENERATION_ERROR_ANSWER;
use docqa_core::traits::AnswerGenerator;
use docqa_vector::DocumentStore;

use crate::catalog::QuestionCatalog;
use crate::heuristics::judge;
use crate::metrics::{EvaluationMetrics, EvaluationResult};

pub const DEFAULT_TOP_K: usize = 3;

/// Progress report handed to the caller after each question.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'r> {
    /// 1-based position in the whole catalog.
    pub position: usize,
    pub total: usize,
    pub result: &'r EvaluationResult,
}

pub struct EvaluationHarness<'a> {
    store: &'a DocumentStore,
    generator: &'a dyn AnswerGenerator,
    top_k: usize,
}

impl<'a> EvaluationHarness<'a> {
    pub fn new(store: &'a DocumentStore, generator: &'a dyn AnswerGenerator) -> Self {
        Self { store, generator, top_k: DEFAULT_TOP_K }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Evaluate one question: retrieve, answer, judge.
    pub fn evaluate(&self, category: &str, question: &str) -> EvaluationResult {
        let retrieval = self.store.retrieve(question, self.top_k);
        if let Some(reason) = retrieval.message() {
            debug!(question, %reason, "retrieval unavailable");
        }
        let chunks = retrieval.into_chunks();
        let answer = match self.generator.generate(&chunks, question) {
            Ok(answer) => answer,
            Err(err) => {
                warn!(question, error = %err, "answer generation failed");
                GENERATION_ERROR_ANSWER.to_string()
            }
        };
        let verdict = judge(&answer, &chunks);
        EvaluationResult::new(category, question, answer, chunks, verdict)
    }

    /// Run every catalog question in order.
    pub fn run(&self, catalog: &QuestionCatalog) -> EvaluationMetrics {
        self.run_with_progress(catalog, |_| {})
    }

    pub fn run_with_progress<F>(&self, catalog: &QuestionCatalog, mut on_progress: F) -> EvaluationMetrics
    where
        F: FnMut(Progress<'_>),
    {
        let total = catalog.len();
        info!(questions = total, top_k = self.top_k, "starting evaluation");
        let mut metrics = EvaluationMetrics::new();
        for (i, (category, question)) in catalog.questions().enumerate() {
            let result = self.evaluate(category, question);
            debug!(
                question,
                hit = result.retrieval_hit,
                faithful = result.faithful,
                hallucinated = result.hallucinated,
                "scored"
            );
            on_progress(Progress { position: i + 1, total, result: &result });
            metrics.record(result);
        }
        let counts = metrics.counts();
        info!(
            total = counts.total,
            hits = counts.retrieval_hits,
            faithful = counts.faithful,
            hallucinations = counts.hallucinations,
            no_answer = counts.no_answer,
            "evaluation finished"
        );
        metrics
    }
}
