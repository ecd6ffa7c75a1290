use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use docqa_core::config::expand_path;
use docqa_core::ExtractiveGenerator;

#[derive(Parser)]
#[command(name = "docqa-ask", about = "Answer a question from the indexed documents")]
struct Args {
    question: String,

    /// Number of chunks to retrieve (defaults to `retrieval.top_k`)
    #[arg(long)]
    top_k: Option<usize>,

    /// Show the retrieved chunks
    #[arg(long)]
    debug: bool,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    docqa_cli::init_tracing();
    let args = Args::parse();
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("Question cannot be empty");
    }

    let settings = docqa_cli::load_settings()?;
    let store = docqa_cli::open_store(&settings)?;
    let generator = ExtractiveGenerator::new(settings.retrieval.max_context_chars);
    let top_k = args.top_k.unwrap_or(settings.retrieval.top_k).max(1);

    let response = docqa_cli::ask(&store, &generator, question, top_k, args.debug);
    if response.is_unanswered() {
        info!(question, "unanswered question");
        let log = expand_path(&settings.logging.unanswered_log);
        if let Err(err) = docqa_cli::log_unanswered(&log, question) {
            warn!(error = %err, "could not record unanswered question");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    println!("{}", response.answer);
    if !response.citations.is_empty() {
        println!("\nSources:\n{}", response.citations);
    }
    if let Some(snippets) = &response.debug {
        println!("\nRetrieved chunks:");
        for s in snippets {
            println!("\n  {}. {} (page {})\n     {}", s.rank, s.document, s.page, s.snippet);
        }
    }
    Ok(())
}
