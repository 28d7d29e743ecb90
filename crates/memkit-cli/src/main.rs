// ============================================================================
// memkit: CLI for embedding and categorizing memories
// ============================================================================
// Usage:
//   memkit embed "some text" [--action add]     Print the embedding as JSON
//   memkit categorize "some memory"             Print the categories as JSON
//
// Credentials come from the environment (or .env):
//   QWEN_API_KEY      embeddings
//   OPENAI_API_KEY    categorization (OPENAI_BASE_URL optional)
// ============================================================================

use anyhow::Result;
use clap::{Parser, Subcommand};
use memkit_core::{
    config, get_categories_for_memory, Categorizer, EmbedderConfig, MemoryAction, QwenEmbedder,
};
use tracing::info;

/// Memory embedding and categorization tool
#[derive(Parser)]
#[command(name = "memkit", version, about = "Embed and categorize memories with remote models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an embedding vector for a text
    Embed {
        /// Text to embed
        text: String,

        /// Memory action the embedding is for: add, search, update
        #[arg(long)]
        action: Option<MemoryAction>,

        /// Embedding model (default: text-embedding-v4)
        #[arg(long)]
        model: Option<String>,

        /// OpenAI-compatible base URL (default: DashScope)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Assign categories to a memory
    Categorize {
        /// Memory text to categorize
        memory: String,

        /// Chat model (default: gpt-4o-mini)
        #[arg(long)]
        model: Option<String>,
    },
}

fn main() -> Result<()> {
    // Environment is mutated here, before the runtime spawns any threads
    config::load_environment();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("memkit_cli=info".parse()?)
                .add_directive("memkit_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Embed {
            text,
            action,
            model,
            base_url,
        } => cmd_embed(&text, action, model, base_url).await,
        Commands::Categorize { memory, model } => cmd_categorize(&memory, model).await,
    }
}

async fn cmd_embed(
    text: &str,
    action: Option<MemoryAction>,
    model: Option<String>,
    base_url: Option<String>,
) -> Result<()> {
    let config = EmbedderConfig {
        model,
        api_key: None,
        base_url,
    };
    let embedder = QwenEmbedder::new(Some(config))?;

    let vector = embedder.embed(text, action).await?;
    info!("Embedded with {} ({} dimensions)", embedder.model(), vector.len());

    println!("{}", serde_json::to_string(&vector)?);
    Ok(())
}

async fn cmd_categorize(memory: &str, model: Option<String>) -> Result<()> {
    let categories = match model {
        Some(model) => {
            let categorizer = Categorizer::new().with_model(model);
            info!("Categorizing with {}", categorizer.model());
            categorizer.categories_for_memory(memory).await?
        }
        None => get_categories_for_memory(memory).await?,
    };

    println!("{}", serde_json::to_string(&categories)?);
    Ok(())
}
