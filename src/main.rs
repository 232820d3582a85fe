use anyhow::Result;
use tracing_subscriber::EnvFilter;

use spindle::gemini::GeminiClient;
use spindle::knowledge::KnowledgeStore;
use spindle::thought::ThoughtService;
use spindle::{run_server, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();

    let knowledge = KnowledgeStore::new(&config);
    let gemini = GeminiClient::new(&config.gemini);
    let thoughts = ThoughtService::new(config.clone(), knowledge.clone(), gemini);

    run_server(config, knowledge, thoughts).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
