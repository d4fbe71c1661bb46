//! precept CLI - principle-grounded conversation dataset generation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use precept::{ChatClient, Config, Generator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "precept")]
#[command(version)]
#[command(about = "Generate principle-grounded conversation training data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "precept.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and parse the source document
    Fetch,

    /// Generate the training dataset
    Generate,

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn print_example_config() {
    let example = r#"# precept configuration file

[constitution]
url = "https://raw.githubusercontent.com/anthropics/claude-constitution/refs/heads/main/20260120-constitution.md"
cache_path = "data/constitution.md"
target_model_name = "Qwen"

[api]
# API key (can also use OPENROUTER_API_KEY env var)
# api_key = "sk-..."
base_url = "https://openrouter.ai/api/v1"
timeout_secs = 180

[datagen]
model = "anthropic/claude-sonnet-4"
examples_per_principle = 3
max_principles_per_category = 30
max_concurrency = 10
max_retries = 3
max_tokens = 2048
output_path = "data/training_data.jsonl"
"#;
    println!("{example}");
}

async fn load_constitution(config: &Config) -> Result<precept::Constitution> {
    let cfg = &config.constitution;
    let markdown = precept::fetch_constitution(&cfg.url, &cfg.cache_path)
        .await
        .context("Failed to fetch constitution")?;
    Ok(precept::parse_constitution(
        &markdown,
        &cfg.target_model_name,
        &cfg.url,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Example => {
            print_example_config();
            return Ok(());
        }

        Commands::Validate => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            config
                .resolve_api_key()
                .context("Failed to resolve API key")?;

            info!("Configuration is valid");
            info!("  Model: {}", config.datagen.model);
            info!(
                "  {} examples per principle, up to {} principles per category",
                config.datagen.examples_per_principle,
                config.datagen.max_principles_per_category
            );
            info!("  Concurrency: {}", config.datagen.max_concurrency);
        }

        Commands::Fetch => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            let constitution = load_constitution(&config).await?;

            println!(
                "Parsed {} principles across {} categories",
                constitution.len(),
                constitution.categories().len()
            );
            let mut categories: Vec<_> = constitution.categories().into_iter().collect();
            categories.sort_by_key(|c| c.as_str());
            for category in categories {
                println!(
                    "  {}: {} principles",
                    category,
                    constitution.by_category(category).len()
                );
            }
        }

        Commands::Generate => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            let api_key = config
                .resolve_api_key()
                .context("Failed to resolve API key")?;

            let constitution = load_constitution(&config).await?;
            info!(principles = constitution.len(), "Using parsed constitution");

            let client = Arc::new(ChatClient::new(
                api_key,
                config.api.base_url.clone(),
                config.api.timeout_secs,
            )?);

            let generator = Generator::new(client.clone(), config.datagen.clone());
            let conversations = generator.generate(&constitution).await;

            let stats =
                precept::postprocess_and_save(conversations, &config.datagen.output_path)?;

            let (requests, tokens_in, tokens_out) = client.usage();
            println!("\n=== Generation Complete ===");
            println!("Candidates:  {}", stats.total);
            println!("Invalid:     {}", stats.invalid);
            println!("Duplicates:  {}", stats.duplicates);
            println!("Saved:       {}", stats.written);
            println!("Requests:    {requests}");
            println!("Tokens:      {tokens_in} in / {tokens_out} out");
            println!("Output:      {:?}", config.datagen.output_path);
        }
    }

    Ok(())
}
