use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use postags::doctor;
use postags::{
    CompletionClient, DEFAULT_PROCESSED_PATH, DEFAULT_RAW_PATH, EnrichError, GroqClientBuilder,
    Pipeline,
};

/// postags - enrich social-media posts with model-derived metadata and unified tags
#[derive(Parser)]
#[command(name = "postags")]
#[command(about = "Enrich social-media posts with line counts, languages and unified tags")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Enrich a JSON array of posts and write the result
    Process(ProcessCommand),
    /// Send a single prompt to the model and print the answer
    Ask(AskCommand),
    /// Check provider configuration and connectivity
    Doctor(ModelOptions),
}

/// Provider settings shared by every command that talks to the model
#[derive(Args, Clone, Default)]
struct ModelOptions {
    /// Model identifier (defaults to GROQ_MODEL, then llama-3.3-70b-versatile)
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Retry transient provider failures this many times (backoff capped at 30s)
    #[arg(long, value_name = "N", default_value_t = 0)]
    retries: u32,

    /// Abort a model call after this many seconds (no limit by default)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Sampling temperature (provider default if omitted)
    #[arg(long, value_name = "T")]
    temperature: Option<f32>,
}

impl ModelOptions {
    fn builder(&self) -> GroqClientBuilder {
        let mut builder = GroqClientBuilder::new().max_retries(self.retries);
        if let Some(model) = &self.model {
            builder = builder.model(model);
        }
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        builder
    }
}

/// Enrich posts
#[derive(Parser)]
struct ProcessCommand {
    /// Raw posts: a JSON array of objects with a "text" field
    #[arg(value_name = "RAW", default_value = DEFAULT_RAW_PATH)]
    raw: PathBuf,

    /// Where to write the enriched posts
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_PROCESSED_PATH)]
    output: PathBuf,

    /// Fail if the model labels a post with a language other than english or mixhindi
    #[arg(long)]
    strict_language: bool,

    #[command(flatten)]
    model: ModelOptions,
}

/// Ask the model a question
#[derive(Parser)]
struct AskCommand {
    /// The prompt to send
    #[arg(value_name = "PROMPT")]
    prompt: String,

    #[command(flatten)]
    model: ModelOptions,
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Process(cmd) => handle_process(cmd),
        Commands::Ask(cmd) => handle_ask(cmd),
        Commands::Doctor(opts) => handle_doctor(opts),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Installs a stderr subscriber; `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are problems with the input the user pointed at, such as a
/// missing or malformed raw file.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<EnrichError>()
        .is_some_and(EnrichError::is_user_error)
}

/// Handles the process command by enriching the raw posts file.
fn handle_process(cmd: &ProcessCommand) -> Result<()> {
    let client = cmd
        .model
        .builder()
        .build()
        .context("Failed to configure model client")?;

    let pipeline = Pipeline::new(Arc::new(client)).with_strict_language(cmd.strict_language);
    let summary = pipeline.process_posts(&cmd.raw, Some(cmd.output.as_path()))?;

    println!(
        "Enriched {} post(s) into {} ({} tag(s) unified into {})",
        summary.posts,
        summary.output_path.display(),
        summary.mapped_tags,
        summary.canonical_tags
    );
    Ok(())
}

/// Handles the ask command by printing a single completion.
fn handle_ask(cmd: &AskCommand) -> Result<()> {
    if cmd.prompt.trim().is_empty() {
        anyhow::bail!("Prompt cannot be empty");
    }

    let client = cmd
        .model
        .builder()
        .build()
        .context("Failed to configure model client")?;

    let answer = client.complete(&cmd.prompt).context("Model call failed")?;
    println!("{answer}");
    Ok(())
}

/// Handles the doctor command; fails if a run could not start.
fn handle_doctor(opts: &ModelOptions) -> Result<()> {
    let health = doctor::check_provider(opts.builder());
    doctor::print_health_report(&health);

    if !health.is_healthy() {
        anyhow::bail!("Provider is not usable with the current configuration");
    }
    Ok(())
}
