//! CLI binary for hc-metadata crate.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use hc_metadata::{MetadataClient, MetadataError, DEFAULT_BASE_URL};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "hc-metadata")]
#[command(
    author,
    version,
    about = "Query the instance metadata service from inside a cloud server"
)]
struct Cli {
    /// Base URL of the metadata service
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Log requests and responses to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the instance id
    InstanceId,

    /// Print the hostname
    Hostname,

    /// Print the user data
    UserData,

    /// Print the vendor data
    VendorData,

    /// Print the authorized SSH public keys, one per line
    PublicKeys,

    /// Print the instance tags, one per line
    Tags,

    /// Print the whole metadata document
    All {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("logging: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("invalid timeout: {} (expected seconds)", s))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid timeout: {}: {}", s, e))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> Result<(), CliError> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    init_logging(cli.verbose)?;

    let mut builder = MetadataClient::builder().base_url(&cli.base_url);
    if let Some(timeout) = cli.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    match cli.command {
        Commands::InstanceId => println!("{}", client.instance_id().await?),
        Commands::Hostname => println!("{}", client.hostname().await?),
        Commands::UserData => print!("{}", client.user_data().await?),
        Commands::VendorData => print!("{}", client.vendor_data().await?),
        Commands::PublicKeys => {
            for key in client.public_keys().await? {
                println!("{}", key);
            }
        }
        Commands::Tags => {
            for tag in client.tags().await? {
                println!("{}", tag);
            }
        }
        Commands::All { format } => {
            let metadata = client.metadata().await?;
            match format {
                OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&metadata)?),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&metadata)?),
            }
        }
    }
    Ok(())
}
