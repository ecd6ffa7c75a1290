use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "docqa-status", about = "Report what the document store holds")]
struct Args {
    /// Print the status as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    docqa_cli::init_tracing();
    let args = Args::parse();
    let settings = docqa_cli::load_settings()?;
    let status = docqa_cli::open_store(&settings)?.status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    println!("store:     {}", status.dir.display());
    println!("loaded:    {}", status.loaded);
    println!("documents: {}", status.documents);
    println!("chunks:    {}", status.chunk_count);
    match status.dim {
        Some(dim) => println!("dimension: {dim}"),
        None => println!("dimension: -"),
    }
    println!("embedder:  {}", status.embedder_id);
    Ok(())
}
