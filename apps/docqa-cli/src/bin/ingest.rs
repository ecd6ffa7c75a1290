use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use docqa_core::extract::{document_name, list_documents, read_pages};
use docqa_vector::IngestResponse;

#[derive(Parser)]
#[command(name = "docqa-ingest", about = "Chunk, embed and index text documents")]
struct Args {
    /// Files or directories of extracted `.txt` documents (pages separated by form feeds)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Print one JSON response per document instead of a summary line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    docqa_cli::init_tracing();
    let args = Args::parse();
    let settings = docqa_cli::load_settings()?;
    let store = docqa_cli::open_store(&settings)?;

    let mut documents = Vec::new();
    for path in &args.paths {
        if path.is_dir() {
            documents.extend(list_documents(path));
        } else {
            documents.push(path.clone());
        }
    }
    if documents.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")?
            .progress_chars("#>-"),
    );

    let mut failures = 0usize;
    for path in &documents {
        let name = document_name(path);
        pb.set_message(name.clone());
        let response = match read_pages(path) {
            Ok(pages) => IngestResponse::from(&store.ingest(&name, &pages)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read document");
                IngestResponse {
                    success: false,
                    message: format!("Error during ingestion: {err}"),
                    chunk_count: 0,
                    committed: false,
                }
            }
        };
        if !response.success {
            failures += 1;
        }
        pb.suspend(|| {
            if args.json {
                match serde_json::to_string(&response) {
                    Ok(line) => println!("{line}"),
                    Err(err) => eprintln!("{}: {err}", path.display()),
                }
            } else {
                let mark = if response.success { "ok" } else { "FAILED" };
                println!("[{mark}] {}: {} (chunks in store: {})", path.display(), response.message, response.chunk_count);
            }
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "Ingested {}/{} documents; store holds {} chunks.",
        documents.len() - failures,
        documents.len(),
        store.chunk_count()
    );
    if failures > 0 {
        anyhow::bail!("{failures} document(s) failed to ingest");
    }
    Ok(())
}
