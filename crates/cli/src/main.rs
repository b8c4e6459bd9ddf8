mod browser_commands;
mod config_commands;
mod console;
mod run_command;
mod store_commands;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    pagekeep_config::PagekeepConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "pagekeep", about = "pagekeep: summarize and archive shared web pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of pagekeep.{toml,yaml,yml,json}).
    #[arg(long, global = true, env = "PAGEKEEP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read chat events from stdin and reply on stdout (default).
    Run,
    /// Render a page in the browser and print its HTML.
    Fetch {
        url: String,
        /// Emulate a mobile device.
        #[arg(long)]
        mobile: bool,
        /// Print extracted text instead of HTML.
        #[arg(long)]
        text: bool,
    },
    /// Print a file from the archive repository.
    Get { path: String },
    /// Create or replace a file in the archive repository.
    Put {
        path: String,
        /// Local file with the new content.
        file: PathBuf,
        #[arg(short, long)]
        message: Option<String>,
        /// Revision marker of the version being replaced.
        #[arg(long)]
        sha: Option<String>,
    },
    /// Delete a file from the archive repository.
    Delete {
        path: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Write several files as one commit.
    Commit {
        #[arg(short, long)]
        message: String,
        /// `repo/path=local/file` pairs.
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// File config (explicit path or discovered), then environment overrides.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<PagekeepConfig> {
    let mut config = match path {
        Some(path) => pagekeep_config::load_config(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => pagekeep_config::discover_and_load(),
    };
    pagekeep_config::apply_env_overrides(&mut config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "pagekeep starting");

    let path = cli.config.as_deref();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_command::run(load_config(path)?).await,
        Commands::Fetch { url, mobile, text } => {
            browser_commands::fetch(&load_config(path)?, &url, mobile, text).await
        },
        Commands::Get { path: file } => store_commands::get(&load_config(path)?, &file).await,
        Commands::Put {
            path: file,
            file: local,
            message,
            sha,
        } => store_commands::put(&load_config(path)?, &file, &local, message, sha).await,
        Commands::Delete {
            path: file,
            message,
        } => store_commands::delete(&load_config(path)?, &file, message).await,
        Commands::Commit { message, files } => {
            store_commands::commit(&load_config(path)?, &message, &files).await
        },
        Commands::Config { action } => config_commands::handle_config(action, path),
    }
}
