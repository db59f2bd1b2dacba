//! Gnosis CLI - real-time semantic mind-mapping engine

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gnosis_core::config::Config;
use gnosis_core::expansion::ExpansionService;
use gnosis_core::services::Services;
use gnosis_core::similarity::DEFAULT_THRESHOLD;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "gnosis")]
#[command(author, version, about = "Real-time semantic mind-mapping engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use the hashing embedder and an in-memory index instead of remote services
    #[arg(long, global = true)]
    local: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a root node for a topic
    Seed {
        /// Seed topic
        topic: String,
    },

    /// Generate concepts related to a topic
    Expand {
        /// Topic to expand
        topic: String,
        /// Previous concepts in the exploration path (repeatable)
        #[arg(short, long = "context")]
        context: Vec<String>,
        /// Number of concepts to generate (1-20)
        #[arg(short = 'n', long, default_value_t = 5)]
        num_expansions: usize,
        /// Existing node the new concepts attach to
        #[arg(short, long)]
        source_node_id: Option<String>,
    },

    /// Check whether a topic belongs to an existing graph
    CheckSimilarity {
        /// Topic to check
        topic: String,
        /// Existing node labels to compare against (repeatable)
        #[arg(short, long = "context", required = true)]
        context: Vec<String>,
        /// Similarity threshold (0-1)
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,
    },

    /// Check embedding provider and vector store health
    Health,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

/// Exit status for service-unavailable errors
const EXIT_SERVICE_UNAVAILABLE: u8 = 3;
/// Exit status for rejected input
const EXIT_INVALID_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let format = cli.format;

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            report_error(&e, format);
            exit_code_for(&e)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load()?;
    init_tracing(&config.log_level);
    debug!(path = ?Config::config_path().ok(), local = cli.local, "Configuration loaded");

    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Config { action } => {
            cmd_config(action, &out)?;
        }
        Commands::Seed { topic } => {
            let service = build_service(&config, cli.local)?;
            cmd_seed(&service, &topic, &out).await?;
        }
        Commands::Expand {
            topic,
            context,
            num_expansions,
            source_node_id,
        } => {
            let service = build_service(&config, cli.local)?;
            cmd_expand(
                &service,
                &topic,
                &context,
                num_expansions,
                source_node_id.as_deref(),
                &out,
            )
            .await?;
        }
        Commands::CheckSimilarity {
            topic,
            context,
            threshold,
        } => {
            let service = build_service(&config, cli.local)?;
            cmd_check_similarity(&service, &topic, &context, threshold, &out).await?;
        }
        Commands::Health => {
            let service = build_service(&config, cli.local)?;
            return cmd_health(&service, &out).await;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Build the workflow service once for this process
fn build_service(config: &Config, local: bool) -> anyhow::Result<ExpansionService> {
    let services = if local {
        Services::local(config)?
    } else {
        Services::from_config(config)?
    };
    Ok(services.expansion_service())
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("gnosis={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Map an error to the process exit status
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<gnosis_core::Error>() {
        Some(e) if e.is_service_unavailable() => ExitCode::from(EXIT_SERVICE_UNAVAILABLE),
        Some(gnosis_core::Error::InvalidInput(_)) => ExitCode::from(EXIT_INVALID_INPUT),
        _ => ExitCode::FAILURE,
    }
}

fn report_error(error: &anyhow::Error, format: OutputFormat) {
    let core = error.downcast_ref::<gnosis_core::Error>();

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "detail": error.to_string(),
                "error_code": core.map(|e| e.code()),
            });
            eprintln!("{}", body);
        }
        OutputFormat::Text => {
            eprintln!("Error: {:#}", error);
            if let Some(suggestion) = core.and_then(|e| e.suggestion()) {
                eprintln!("Hint: {}", suggestion);
            }
        }
    }
}

/// Output settings shared by every command
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_seed(service: &ExpansionService, topic: &str, out: &Output) -> anyhow::Result<()> {
    service.ensure_ready().await?;
    let result = service.seed(topic).await?;

    if out.is_json() {
        return out.json(&result);
    }

    if out.quiet {
        println!("{}", result.node.id);
    } else {
        println!("Root node created");
        println!("  ID: {}", result.node.id);
        println!("  Label: {}", result.node.label);
        println!();
        println!("{}", result.reasoning);
    }
    Ok(())
}

async fn cmd_expand(
    service: &ExpansionService,
    topic: &str,
    context: &[String],
    num_expansions: usize,
    source_node_id: Option<&str>,
    out: &Output,
) -> anyhow::Result<()> {
    if !out.quiet && !out.is_json() {
        println!("Expanding '{}'...", topic);
    }

    service.ensure_ready().await?;
    let result = service
        .expand(topic, context, num_expansions, source_node_id)
        .await?;
    info!(topic, nodes = result.nodes.len(), "Expansion complete");

    if out.is_json() {
        return out.json(&result);
    }

    if out.quiet {
        for node in &result.nodes {
            println!("{}", node.id);
        }
        return Ok(());
    }

    println!();
    println!("Nodes ({}):", result.nodes.len());
    for node in &result.nodes {
        match &node.reason {
            Some(reason) => println!("  + {} ({}) - {}", node.label, node.id, reason),
            None => println!("  + {} ({})", node.label, node.id),
        }
    }

    println!();
    println!("Edges ({}):", result.edges.len());
    for edge in &result.edges {
        match &edge.label {
            Some(label) => println!("  {} -[{}]-> {}", edge.source, label, edge.target),
            None => println!("  {} -> {}", edge.source, edge.target),
        }
    }

    if !result.reasoning.is_empty() {
        println!();
        println!("Reasoning: {}", result.reasoning);
    }
    Ok(())
}

async fn cmd_check_similarity(
    service: &ExpansionService,
    topic: &str,
    context: &[String],
    threshold: f32,
    out: &Output,
) -> anyhow::Result<()> {
    let result = service.check_similarity(topic, context, threshold).await?;

    if out.is_json() {
        return out.json(&result);
    }

    if out.quiet {
        println!("{}", result.suggested_action);
    } else {
        println!("Similarity check for '{}'", topic);
        println!(
            "  Related: {} (score {:.3}, threshold {:.2})",
            if result.is_related { "yes" } else { "no" },
            result.similarity_score,
            threshold
        );
        if let Some(closest) = &result.closest_match {
            println!("  Closest match: {}", closest);
        }
        println!("  Suggested action: {}", result.suggested_action);
    }
    Ok(())
}

async fn cmd_health(service: &ExpansionService, out: &Output) -> anyhow::Result<ExitCode> {
    let report = service.health().await;

    if out.is_json() {
        out.json(&report)?;
    } else if out.quiet {
        println!("{}", report.status);
    } else {
        println!("Gnosis Health Check");
        println!("===================");
        println!();
        for (name, up) in &report.services {
            println!("[{}] {}", if *up { "OK" } else { "!!" }, name);
        }
        println!();
        println!("Status: {} (v{})", report.status, report.version);
    }

    Ok(if report.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Works on the stored file only, never on environment overrides
fn cmd_config(action: ConfigAction, out: &Output) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_stored()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_stored()?;
            config.set(&key, &value)?;
            config.save()?;
            if !out.quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load_stored()?;
            let items = config.list()?;
            if out.is_json() {
                let map: serde_json::Map<String, serde_json::Value> = items
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                out.json(&map)?;
            } else {
                for (key, value) in items {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !out.quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
