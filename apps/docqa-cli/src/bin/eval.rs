use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use docqa_core::config::expand_path;
use docqa_core::ExtractiveGenerator;
use docqa_eval::{write_reports, EvaluationHarness, QuestionCatalog};

#[derive(Parser)]
#[command(name = "docqa-eval", about = "Score retrieval and answers against a question catalog")]
struct Args {
    /// Text report path; the JSON report is written next to it (defaults to `eval.report_path`)
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON question catalog (defaults to `eval.catalog_path`, then the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Chunks retrieved per question (defaults to `eval.top_k`)
    #[arg(long)]
    top_k: Option<usize>,
}

fn main() -> Result<()> {
    docqa_cli::init_tracing();
    let args = Args::parse();
    let settings = docqa_cli::load_settings()?;

    let store = docqa_cli::open_store(&settings)?;
    if !store.is_loaded() {
        anyhow::bail!("No documents loaded. Ingest documents first with `docqa-ingest <paths>`.");
    }
    println!("Loaded {} chunks", store.chunk_count());

    let catalog = match args.catalog.or_else(|| settings.eval.catalog_path.as_deref().map(expand_path)) {
        Some(path) => QuestionCatalog::load(&path)?,
        None => QuestionCatalog::reference(),
    };
    let generator = ExtractiveGenerator::new(settings.retrieval.max_context_chars);
    let harness = EvaluationHarness::new(&store, &generator).with_top_k(args.top_k.unwrap_or(settings.eval.top_k).max(1));

    let pb = ProgressBar::new(catalog.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions {msg}")?
            .progress_chars("#>-"),
    );
    let metrics = harness.run_with_progress(&catalog, |p| {
        let mark = if p.result.passed() { "pass" } else { "fail" };
        pb.set_message(format!("{mark}: {}", p.result.question.chars().take(50).collect::<String>()));
        pb.set_position(p.position as u64);
    });
    pb.finish_and_clear();

    let output = args.output.unwrap_or_else(|| expand_path(&settings.eval.report_path));
    let paths = write_reports(&metrics, &output)?;
    if let Some(rates) = metrics.rates() {
        println!("Retrieval hit rate:  {:.2}%", rates.retrieval_hit_rate);
        println!("Faithfulness rate:   {:.2}%", rates.faithfulness_rate);
        println!("Hallucination rate:  {:.2}%", rates.hallucination_rate);
        println!("No-answer rate:      {:.2}%", rates.no_answer_rate);
    }
    println!("Report: {}\nDetails: {}", paths.text.display(), paths.json.display());
    Ok(())
}
