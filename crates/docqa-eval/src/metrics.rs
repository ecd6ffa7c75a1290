//! Per-question results and their aggregation.

use serde::{Deserialize, Serialize};

use docqa_core::answer::is_fallback;
use docqa_core::types::RetrievedChunk;

use crate::heuristics::Verdict;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub question: String,
    pub category: String,
    pub answer: String,
    pub chunks: Vec<RetrievedChunk>,
    pub retrieval_hit: bool,
    pub faithful: bool,
    pub hallucinated: bool,
}

impl EvaluationResult {
    pub fn new(category: &str, question: &str, answer: String, chunks: Vec<RetrievedChunk>, verdict: Verdict) -> Self {
        Self {
            question: question.to_string(),
            category: category.to_string(),
            answer,
            chunks,
            retrieval_hit: verdict.hit,
            faithful: verdict.faithful,
            hallucinated: verdict.hallucinated,
        }
    }

    pub fn is_no_answer(&self) -> bool {
        is_fallback(&self.answer)
    }

    /// Hit, faithful and not hallucinated.
    pub fn passed(&self) -> bool {
        self.retrieval_hit && self.faithful && !self.hallucinated
    }

    /// Ranking key; `true` sorts above `false`.
    fn quality(&self) -> (bool, bool, bool) {
        (self.retrieval_hit, self.faithful, !self.hallucinated)
    }
}

/// Percentages in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub retrieval_hit_rate: f64,
    pub faithfulness_rate: f64,
    pub hallucination_rate: f64,
    pub no_answer_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub total: usize,
    pub retrieval_hits: usize,
    pub faithful: usize,
    pub hallucinations: usize,
    pub no_answer: usize,
}

impl Counts {
    fn add(&mut self, result: &EvaluationResult) {
        self.total += 1;
        self.retrieval_hits += usize::from(result.retrieval_hit);
        self.faithful += usize::from(result.faithful);
        self.hallucinations += usize::from(result.hallucinated);
        self.no_answer += usize::from(result.is_no_answer());
    }

    /// `None` when nothing was counted.
    pub fn rates(&self) -> Option<Rates> {
        if self.total == 0 {
            return None;
        }
        let pct = |n: usize| n as f64 / self.total as f64 * 100.0;
        Some(Rates {
            retrieval_hit_rate: pct(self.retrieval_hits),
            faithfulness_rate: pct(self.faithful),
            hallucination_rate: pct(self.hallucinations),
            no_answer_rate: pct(self.no_answer),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub counts: Counts,
    pub rates: Option<Rates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    results: Vec<EvaluationResult>,
    counts: Counts,
}

impl EvaluationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: EvaluationResult) {
        self.counts.add(&result);
        self.results.push(result);
    }

    pub fn results(&self) -> &[EvaluationResult] {
        &self.results
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn rates(&self) -> Option<Rates> {
        self.counts.rates()
    }

    /// Same counts and rates restricted to each category, in the order the
    /// categories were first evaluated.
    pub fn by_category(&self) -> Vec<CategoryBreakdown> {
        let mut out: Vec<CategoryBreakdown> = Vec::new();
        for result in &self.results {
            let idx = match out.iter().position(|b| b.category == result.category) {
                Some(i) => i,
                None => {
                    out.push(CategoryBreakdown { category: result.category.clone(), counts: Counts::default(), rates: None });
                    out.len() - 1
                }
            };
            out[idx].counts.add(result);
        }
        for b in &mut out {
            b.rates = b.counts.rates();
        }
        out
    }

    /// Top `n` by (hit, faithful, not hallucinated); ties keep evaluation order.
    pub fn best(&self, n: usize) -> Vec<&EvaluationResult> {
        let mut ranked: Vec<&EvaluationResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| b.quality().cmp(&a.quality()));
        ranked.truncate(n);
        ranked
    }

    /// Bottom `n` by (hit, faithful, not hallucinated); ties keep evaluation order.
    pub fn worst(&self, n: usize) -> Vec<&EvaluationResult> {
        let mut ranked: Vec<&EvaluationResult> = self.results.iter().collect();
        ranked.sort_by_key(|r| r.quality());
        ranked.truncate(n);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(question: &str, category: &str, hit: bool, faithful: bool, hallucinated: bool) -> EvaluationResult {
        EvaluationResult::new(category, question, "answer".into(), Vec::new(), Verdict { hit, faithful, hallucinated })
    }

    #[test]
    fn rates_are_percentages() {
        let mut m = EvaluationMetrics::new();
        assert!(m.rates().is_none());
        m.record(result("q1", "a", true, true, false));
        m.record(result("q2", "a", false, true, false));
        m.record(result("q3", "b", false, false, true));
        m.record(result("q4", "b", true, false, true));
        let r = m.rates().unwrap();
        assert_eq!(r.retrieval_hit_rate, 50.0);
        assert_eq!(r.faithfulness_rate, 50.0);
        assert_eq!(r.hallucination_rate, 50.0);
        assert_eq!(r.no_answer_rate, 0.0);

        let cats = m.by_category();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].category, "a");
        assert_eq!(cats[0].rates.unwrap().faithfulness_rate, 100.0);
        assert_eq!(cats[1].counts.hallucinations, 2);
    }

    #[test]
    fn best_and_worst_are_stable() {
        let mut m = EvaluationMetrics::new();
        m.record(result("bad1", "a", false, false, true));
        m.record(result("good1", "a", true, true, false));
        m.record(result("mid", "a", true, false, true));
        m.record(result("good2", "a", true, true, false));
        m.record(result("bad2", "a", false, false, true));

        let best: Vec<&str> = m.best(3).iter().map(|r| r.question.as_str()).collect();
        assert_eq!(best, vec!["good1", "good2", "mid"]);
        let worst: Vec<&str> = m.worst(3).iter().map(|r| r.question.as_str()).collect();
        assert_eq!(worst, vec!["bad1", "bad2", "mid"]);
        assert_eq!(m.best(10).len(), 5);
    }
}
