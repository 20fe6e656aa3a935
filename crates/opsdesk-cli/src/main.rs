use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod app;
mod commands;
mod logging;

use app::AppContext;
use commands::request::RequestArgs;

#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(about = "Opsdesk - command line client for the management console API", long_about = None)]
struct Cli {
    /// Directory holding config.toml and local_storage.toml
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Keep the session in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Read from OPSDESK_PASSWORD when omitted, then prompted for
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored identity
    Whoami,
    /// Send one request and print the response
    Request(RequestArgs),
    /// Save a binary response (e.g. a quotation PDF) to a file
    Download {
        path: String,
        file: PathBuf,
    },
    /// Interactive console
    Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        if let Some(hint) = commands::hint_for(&e) {
            eprintln!("{}", hint.bright_black());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::build(cli.config_dir.as_deref(), cli.ephemeral)?;
    let _log_guard = logging::init(&ctx.config.logging, ctx.logs_dir.as_deref())?;
    tracing::debug!(base_url = %ctx.config.api.base_url, ephemeral = cli.ephemeral, "opsdesk starting");

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&ctx, username, password).await
        }
        Commands::Logout => commands::session::logout(&ctx),
        Commands::Whoami => commands::session::whoami(&ctx),
        Commands::Request(args) => commands::request::run(&ctx, args).await,
        Commands::Download { path, file } => commands::request::download(&ctx, &path, &file).await,
        Commands::Shell => commands::shell::run(&ctx).await,
    }
}
