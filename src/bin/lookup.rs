use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spindle::gemini::GeminiClient;
use spindle::knowledge::{doc_type_for, KnowledgeStore};
use spindle::models::{KnowledgeDoc, Language, ThoughtRequest};
use spindle::thought::ThoughtService;
use spindle::AppConfig;

/// Run one thought lookup offline against an explicit reference document.
#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "Look up a die-roll sequence in a reference document")]
struct Cli {
    /// Digit sequence to look up (digits 1-4; other characters are stripped).
    #[arg(long)]
    sequence: String,
    /// Markdown document to search. Defaults to the configured knowledge doc.
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long, default_value = "en")]
    language: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let language = match cli.language.as_str() {
        "hi" => Language::Hi,
        _ => Language::En,
    };

    let knowledge = KnowledgeStore::new(&config);
    let gemini = GeminiClient::new(&config.gemini);
    let service = ThoughtService::new(config, knowledge, gemini);

    let request = ThoughtRequest {
        sequence: cli.sequence.clone(),
        human_seq: None,
        title: None,
        language,
    };

    let response = match &cli.file {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed reading {}", path.display()))?;
            let doc = KnowledgeDoc {
                text,
                source_path: Some(path.clone()),
                doc_type: Some(doc_type_for(path)),
            };
            let digits = spindle::sequence::normalize_sequence(&cli.sequence);
            service.lookup_in_document(&request, &digits, &doc).await?
        }
        None => service.lookup(request).await,
    };

    println!("Provenance: {}", response.from.as_str());
    println!("{}", response.text);

    Ok(())
}
