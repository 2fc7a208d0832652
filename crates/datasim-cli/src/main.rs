mod auth;
mod generate;
mod schema;
mod settings;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use datasim_client::ClientError;
use datasim_core::{Error as CoreError, OutputFormat};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("settings error: {0}")]
    Settings(#[from] settings::SettingsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid schema file: {0}")]
    SchemaFile(String),
    #[error("generation failed: {0}")]
    Generation(String),
}

#[derive(Parser, Debug)]
#[command(name = "datasim", version, about = "Synthetic data generation client")]
struct Cli {
    /// Backend endpoint override.
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Path to the config file (default: the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request a one-time code and exchange it for a session.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Schema file operations.
    Schema(schema::SchemaArgs),
    /// Submit a generation request.
    Generate(GenerateArgs),
    /// Fetch the status of an asynchronous job once.
    Status(StatusArgs),
    /// Download a generated file by its backend filename.
    Download(DownloadArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Email address the one-time code is sent to.
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Schema file (JSON).
    #[arg(long)]
    schema: PathBuf,
    /// Number of records to generate.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    count: u32,
    /// Output format.
    #[arg(long, default_value = "csv", value_parser = parse_output_format)]
    format: OutputFormat,
    /// Submit as a background job and poll it to completion.
    #[arg(long)]
    detach: bool,
    /// Directory for downloaded artifacts.
    #[arg(long, default_value = "artifacts")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Job identifier returned at submission.
    task_id: String,
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Backend filename, as referenced in a generation result.
    filename: String,
    /// Directory for downloaded artifacts.
    #[arg(long, default_value = "artifacts")]
    out: PathBuf,
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "json" => Ok(OutputFormat::Json),
        other => Err(format!("unknown output format '{other}' (csv or json)")),
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = settings::load(cli.config.as_deref(), cli.endpoint.as_deref())?;

    match cli.command {
        Command::Login(args) => auth::login(&settings, &args.email).await,
        Command::Logout => auth::logout(),
        Command::Schema(args) => schema::run(args),
        Command::Generate(args) => generate::run(&settings, args).await,
        Command::Status(args) => generate::status(&settings, &args.task_id).await,
        Command::Download(args) => generate::download(&settings, &args.filename, &args.out).await,
    }
}
