use advisor_core::analysis::AnalysisResult;
use advisor_core::config::{Config, StorageMode};
use advisor_core::knowledge::DatasetSource;
use advisor_core::provider::create_provider;
use advisor_core::{Advisor, Server};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "advisor")]
#[command(about = "Retrieval-grounded solution advisor", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Catalog and company dataset (YAML or JSON)
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Model management commands")]
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },

    #[command(about = "Index the product catalog and industry knowledge")]
    Populate,

    #[command(about = "Index a company's profile, files and deals")]
    Ingest {
        company_id: String,
    },

    #[command(about = "Remove a company's chunks from the index")]
    Remove {
        company_id: String,
    },

    #[command(about = "Generate a solution analysis for a company")]
    Analyze {
        company_id: String,

        /// Write the full analysis as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(about = "Show knowledge base statistics")]
    Stats,

    #[command(about = "Serve requests over a Unix socket")]
    Serve {
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    #[command(about = "Show current model")]
    Show,

    #[command(about = "Set the LLM model")]
    Set {
        #[arg(help = "Model name (e.g., 'gpt-4o' or 'llama3.1:8b')")]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("advisor=info,advisor_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show => show_config(&cli.config),
        Commands::Model { command } => match command {
            ModelCommands::Show => show_model(&cli.config),
            ModelCommands::Set { model } => set_model(&cli.config, &model),
        },
        Commands::Populate => populate(&cli.config, cli.dataset.as_deref()).await,
        Commands::Ingest { company_id } => ingest(&cli.config, cli.dataset.as_deref(), &company_id).await,
        Commands::Remove { company_id } => remove(&cli.config, cli.dataset.as_deref(), &company_id).await,
        Commands::Analyze { company_id, output } => {
            analyze(&cli.config, cli.dataset.as_deref(), &company_id, output.as_deref()).await
        }
        Commands::Stats => stats(&cli.config, cli.dataset.as_deref()).await,
        Commands::Serve { socket } => serve(&cli.config, cli.dataset.as_deref(), socket).await,
    }
}

fn load_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        Config::load(config_path).context("Failed to load config")
    } else {
        warn!(path = %config_path.display(), "Config file not found; using defaults");
        Ok(Config::default())
    }
}

fn build_advisor(config: &Config, dataset: Option<&Path>) -> Result<Advisor> {
    let source = match dataset {
        Some(path) => DatasetSource::load(path)?,
        None => DatasetSource::default(),
    };
    let provider = create_provider(&config.llm).context("Failed to create LLM provider")?;
    Advisor::from_config(config, provider, Arc::new(source)).context("Failed to open knowledge base")
}

/// Attaches to an existing index, or populates one when there is none.
async fn ready_advisor(config_path: &Path, dataset: Option<&Path>) -> Result<(Config, Advisor)> {
    let config = load_config(config_path)?;
    let advisor = build_advisor(&config, dataset)?;

    let attached = match config.storage.storage_mode {
        StorageMode::Memory => false,
        StorageMode::Grpc { .. } => match advisor.attach().await {
            Ok(stats) => stats.vector_count.unwrap_or(0) > 0,
            Err(e) => {
                warn!(error = %e, "Could not attach to index; populating");
                false
            }
        },
    };
    if !attached {
        println!("{} Populating knowledge base...", "→".blue());
        advisor.populate().await.context("Failed to populate knowledge base")?;
    }
    Ok((config, advisor))
}

fn show_config(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load config")?;

    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "LLM:".bold());
    println!("  Provider:       {:?}", config.llm.provider);
    println!("  Model:          {}", config.llm.model.cyan());
    println!("  Base URL:       {}", config.llm.base_url);
    println!("  API Key Env:    {}", config.llm.api_key_env);
    println!("  Temperature:    {}", config.llm.temperature);
    println!();
    println!("{}", "Generation:".bold());
    println!("  Vendor:          {}", config.generation.vendor_name.cyan());
    println!(
        "  Max Tokens:      {} / {} / {}",
        config.generation.solutions_max_tokens,
        config.generation.challenges_max_tokens,
        config.generation.narrative_max_tokens
    );
    println!();
    println!("{}", "RAG:".bold());
    println!("  Embedding Model: {}", config.rag.embedding_model.id.cyan());
    println!("  Chunk Size:      {}", config.rag.file_chunking.chunk_size);
    println!("  Chunk Overlap:   {}", config.rag.file_chunking.chunk_overlap);
    println!("  Products:        {}", config.retrieval.product_cap);
    println!();
    println!("{}", "Storage:".bold());
    match &config.storage.storage_mode {
        StorageMode::Memory => println!("  Mode:            memory"),
        StorageMode::Grpc { url, .. } => println!("  Mode:            grpc ({url})"),
    }
    println!("  Collection:      {}", config.storage.vector_db.collection_name);
    println!("  Socket:          {}", config.server.socket_path.display());

    Ok(())
}

fn show_model(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load config")?;

    println!("{}: {}", "Current model".bold(), config.llm.model.cyan());
    Ok(())
}

fn set_model(config_path: &Path, model: &str) -> Result<()> {
    let content = std::fs::read_to_string(config_path).context("Failed to read config file")?;

    let mut config: serde_yaml::Value = serde_yaml::from_str(&content).context("Failed to parse config")?;

    let root = config
        .as_mapping_mut()
        .context("Config file must be a YAML mapping")?;
    let llm = root
        .entry(serde_yaml::Value::String("llm".to_string()))
        .or_insert_with(|| serde_yaml::Value::Mapping(Default::default()));
    if let Some(llm_map) = llm.as_mapping_mut() {
        llm_map.insert(
            serde_yaml::Value::String("model".to_string()),
            serde_yaml::Value::String(model.to_string()),
        );
    }

    let updated_content = serde_yaml::to_string(&config).context("Failed to serialize config")?;

    std::fs::write(config_path, updated_content).context("Failed to write config file")?;

    println!("{} Model updated to: {}", "✓".green().bold(), model.cyan());

    Ok(())
}

async fn populate(config_path: &Path, dataset: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let advisor = build_advisor(&config, dataset)?;

    let report = advisor.populate().await?;
    println!("{} Knowledge base populated", "✓".green().bold());
    println!("  Products:        {}", report.products);
    println!("  Industries:      {}", report.industries);
    println!("  Best Practices:  {}", report.best_practices);
    println!("  Chunks:          {}", report.chunks);
    if report.removed > 0 {
        println!("  Stale Removed:   {}", report.removed);
    }
    Ok(())
}

async fn ingest(config_path: &Path, dataset: Option<&Path>, company_id: &str) -> Result<()> {
    let (_, advisor) = ready_advisor(config_path, dataset).await?;
    let chunks = advisor.ingest_company(company_id).await?;
    println!(
        "{} Indexed {} chunks for company {}",
        "✓".green().bold(),
        chunks,
        company_id.cyan()
    );
    Ok(())
}

async fn remove(config_path: &Path, dataset: Option<&Path>, company_id: &str) -> Result<()> {
    let (_, advisor) = ready_advisor(config_path, dataset).await?;
    let removed = advisor.remove_company(company_id).await?;
    println!(
        "{} Removed {} chunks for company {}",
        "✓".green().bold(),
        removed,
        company_id.cyan()
    );
    Ok(())
}

async fn analyze(config_path: &Path, dataset: Option<&Path>, company_id: &str, output: Option<&Path>) -> Result<()> {
    let (_, advisor) = ready_advisor(config_path, dataset).await?;
    advisor
        .ingest_company(company_id)
        .await
        .with_context(|| format!("Failed to index company {company_id}"))?;

    println!("{} Generating analysis for company {}...", "→".blue(), company_id.cyan());
    let analysis = match advisor.analyze_company(company_id).await {
        Ok(analysis) => analysis,
        Err(e) => {
            if let Some(raw) = e.raw_text() {
                eprintln!("{}", "Raw generated text:".yellow().bold());
                eprintln!("{raw}");
            }
            return Err(e.into());
        }
    };

    print_analysis(&analysis);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&analysis).context("Failed to serialize analysis")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!();
        println!("{} Analysis written to {}", "✓".green().bold(), path.display());
    }
    Ok(())
}

fn print_analysis(analysis: &AnalysisResult) {
    println!();
    println!("{}", analysis.company_name.bold().green());
    println!(
        "  Overall Fit:     {} ({:.2})",
        analysis.overall_fit.to_string().cyan(),
        analysis.fit_score
    );
    println!();
    println!("{}", "Recommended Solutions:".bold());
    if analysis.recommended_solutions.is_empty() {
        println!("  {}", "None".yellow());
    }
    for solution in &analysis.recommended_solutions {
        println!(
            "  {} {} {} ({:.0}, {})",
            format!("{}.", solution.priority).cyan(),
            solution.module.bold(),
            "•".cyan(),
            solution.fit_score,
            solution.time_to_value
        );
    }
    println!();
    println!("{}", "Business Challenges:".bold());
    for challenge in &analysis.business_challenges {
        println!("  {} {}", "•".cyan(), challenge);
    }
    println!();
    let case = &analysis.business_case;
    println!("{}", "Business Case:".bold());
    println!("  Investment:      ${:.0}", case.total_investment);
    println!("  Annual Savings:  ${:.0}", case.projected_savings);
    println!("  Payback:         {}", case.payback_period);
    println!("  NPV (5y, 8%):    ${:.0}", case.net_present_value);
    println!("  Risk-Adj. ROI:   {:.0}%", case.risk_adjusted_roi);
    println!();
    println!(
        "{} {} tokens, ${:.4} ({})",
        "Usage:".bold(),
        analysis.usage.total_tokens(),
        analysis.usage.total_cost(),
        analysis.usage.model
    );
}

async fn stats(config_path: &Path, dataset: Option<&Path>) -> Result<()> {
    let (_, advisor) = ready_advisor(config_path, dataset).await?;
    let stats = advisor.stats().await?;

    println!("{}", "Knowledge Base:".bold().green());
    println!("  State:           {}", stats.lifecycle.to_string().cyan());
    println!("  Index:           {}", stats.index.index_name);
    println!("  Dimension:       {}", stats.index.dimension);
    println!("  Metric:          {}", stats.index.metric);
    println!("  Status:          {}", stats.index.status);
    match stats.index.vector_count {
        Some(count) => println!("  Vectors:         {count}"),
        None => println!("  Vectors:         unknown"),
    }
    Ok(())
}

async fn serve(config_path: &Path, dataset: Option<&Path>, socket: Option<PathBuf>) -> Result<()> {
    let (config, advisor) = ready_advisor(config_path, dataset).await?;
    let socket = socket.unwrap_or(config.server.socket_path);

    println!("{} Listening on {}", "→".blue(), socket.display());
    Server::new(Arc::new(advisor), socket)
        .start()
        .await
        .context("Server failed")
}
