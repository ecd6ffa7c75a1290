use std::sync::Arc;

use docqa_core::answer::{ExtractiveGenerator, FALLBACK_ANSWER, GENERATION_ERROR_ANSWER};
use docqa_core::config::ChunkingSettings;
use docqa_core::traits::AnswerGenerator;
use docqa_core::types::{PageText, RetrievedChunk};
use docqa_embed::HashingEmbedder;
use docqa_eval::{
    check_faithfulness, check_hallucination, check_retrieval_hit, judge, write_reports, EvaluationHarness,
    QuestionCatalog, Verdict,
};
use docqa_vector::DocumentStore;
use tempfile::TempDir;

fn chunks(texts: &[&str]) -> Vec<RetrievedChunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| RetrievedChunk { text: t.to_string(), document: "manual".into(), page: 1, chunk_id: i as u64 })
        .collect()
}

const VFR_CHUNK: &str = "Visual Flight Rules (VFR) allows flight by visual reference";

#[test]
fn vfr_answer_is_hit_faithful_and_clean() {
    let c = chunks(&[VFR_CHUNK]);
    let verdict = judge("VFR means Visual Flight Rules", &c);
    assert_eq!(verdict, Verdict { hit: true, faithful: true, hallucinated: false });
}

#[test]
fn fallback_answer_scores_as_no_answer() {
    let c = chunks(&[VFR_CHUNK]);
    assert!(!check_retrieval_hit(FALLBACK_ANSWER, &c));
    assert!(check_faithfulness(FALLBACK_ANSWER, &c));
    assert!(!check_hallucination(FALLBACK_ANSWER, &c));
    // any casing of the marker counts
    assert!(!check_hallucination("Sorry, NOT AVAILABLE.", &[]));
}

#[test]
fn hedging_marks_grounded_answer_as_hallucinated() {
    let c = chunks(&[VFR_CHUNK]);
    let answer = "It might be the case that visual flight rules apply.";
    assert!(check_faithfulness(answer, &c), "content itself is grounded");
    assert!(check_hallucination(answer, &c));
    assert!(check_hallucination("Pilots Typically use visual flight rules by visual reference.", &c));
}

#[test]
fn heuristics_are_pure() {
    let c = chunks(&[VFR_CHUNK, "Fuel reserve must cover thirty minutes."]);
    let answer = "Fuel reserve covers thirty minutes. Visual reference matters.";
    let first = judge(answer, &c);
    for _ in 0..3 {
        assert_eq!(judge(answer, &c), first);
    }
}

#[test]
fn empty_answer_scores_as_miss() {
    let c = chunks(&[VFR_CHUNK]);
    assert_eq!(judge("", &c), Verdict { hit: false, faithful: false, hallucinated: true });
    assert_eq!(judge("VFR means VFR", &[]), Verdict { hit: false, faithful: false, hallucinated: true });
}

struct BrokenGenerator;

impl AnswerGenerator for BrokenGenerator {
    fn generate(&self, _chunks: &[RetrievedChunk], _question: &str) -> anyhow::Result<String> {
        anyhow::bail!("model not loaded")
    }
}

fn flight_store(dir: &std::path::Path) -> DocumentStore {
    let chunking = ChunkingSettings { chunk_size: 100, overlap: 10, chars_per_token: 4 };
    let store = DocumentStore::open_at(dir, &chunking, Arc::new(HashingEmbedder::new(128))).unwrap();
    store
        .ingest(
            "flight_planning",
            &[
                PageText::new("Visual Flight Rules (VFR) allows flight by visual reference. VFR requires good weather.", 1),
                PageText::new("A NOTAM is a notice to airmen about hazards along the route.", 2),
                PageText::new("Fuel reserve must cover the alternate aerodrome plus thirty minutes.", 3),
            ],
        )
        .unwrap();
    store
}

fn small_catalog() -> QuestionCatalog {
    QuestionCatalog::from_json(
        r#"[{"name": "simple_factual", "questions": ["What does VFR mean?", "What is the capital of Mars?"]},
            {"name": "applied", "questions": ["How much fuel reserve is required?"]}]"#,
    )
    .unwrap()
}

#[test]
fn harness_scores_each_question_in_order() {
    let tmp = TempDir::new().unwrap();
    let store = flight_store(tmp.path());
    let generator = ExtractiveGenerator::default();
    let mut seen = Vec::new();
    let metrics = EvaluationHarness::new(&store, &generator)
        .run_with_progress(&small_catalog(), |p| seen.push((p.position, p.total, p.result.question.clone())));

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], (1, 3, "What does VFR mean?".to_string()));
    assert_eq!(seen[2].0, 3);

    let results = metrics.results();
    assert_eq!(results[0].answer, "Visual Flight Rules (VFR) allows flight by visual reference.");
    assert!(results[0].passed());
    assert_eq!(results[0].chunks.len(), 3);

    assert_eq!(results[1].answer, FALLBACK_ANSWER);
    assert!(results[1].is_no_answer());
    assert_eq!(metrics.counts().no_answer, 1);

    let categories = metrics.by_category();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].category, "simple_factual");
    assert_eq!(categories[0].counts.total, 2);
    assert_eq!(metrics.best(5)[0].question, "What does VFR mean?");
    assert_eq!(metrics.worst(1)[0].question, "What is the capital of Mars?");
}

#[test]
fn generator_failure_records_error_answer() {
    let tmp = TempDir::new().unwrap();
    let store = flight_store(tmp.path());
    let result = EvaluationHarness::new(&store, &BrokenGenerator).evaluate("applied", "What does VFR mean?");
    assert_eq!(result.answer, GENERATION_ERROR_ANSWER);
    assert!(!result.retrieval_hit);
    assert!(result.hallucinated);
}

#[test]
fn empty_store_yields_only_fallbacks() {
    let tmp = TempDir::new().unwrap();
    let store = DocumentStore::open_at(tmp.path(), &ChunkingSettings::default(), Arc::new(HashingEmbedder::new(32))).unwrap();
    let generator = ExtractiveGenerator::default();
    let metrics = EvaluationHarness::new(&store, &generator).with_top_k(3).run(&small_catalog());
    let rates = metrics.rates().unwrap();
    assert_eq!(rates.no_answer_rate, 100.0);
    assert_eq!(rates.retrieval_hit_rate, 0.0);
    assert_eq!(rates.faithfulness_rate, 100.0);
    assert_eq!(rates.hallucination_rate, 0.0);
    assert!(metrics.results().iter().all(|r| r.chunks.is_empty()));
}

#[test]
fn reports_are_written_side_by_side() {
    let tmp = TempDir::new().unwrap();
    let store = flight_store(&tmp.path().join("index"));
    let generator = ExtractiveGenerator::default();
    let metrics = EvaluationHarness::new(&store, &generator).run(&small_catalog());

    let paths = write_reports(&metrics, &tmp.path().join("out/evaluation_report.txt")).unwrap();
    assert_eq!(paths.json, tmp.path().join("out/evaluation_report.json"));

    let text = std::fs::read_to_string(&paths.text).unwrap();
    assert!(text.contains("Total Questions Tested: 3"));
    assert!(text.contains("Simple Factual:"));
    assert!(text.contains("TOP 5 WORST ANSWERS"));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
    assert!(json["timestamp"].is_string());
    assert!(json["metrics"]["no_answer_rate"].as_f64().unwrap() > 0.0);
    assert_eq!(json["results"].as_array().unwrap().len(), 3);
    assert_eq!(json["results"][0]["retrieval_hit"], serde_json::Value::Bool(true));
}
