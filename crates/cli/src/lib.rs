use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;

mod config;
mod http_api;
mod serve;
mod server_security;
mod sync;

use sync::ProviderKind;

pub(crate) fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "catalog-bridge")]
#[command(about = "Argo CD lookup proxy and Okta catalog sync", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Argo CD lookup routes over HTTP under /api/argocd
    #[command(name = "serve-argocd")]
    ServeArgocd(ServeArgs),

    /// Run the Okta entity providers and print their full mutations as JSON
    #[command(name = "sync-okta")]
    SyncOkta(SyncArgs),

    /// Print the JSON Schema of the mutation document
    #[command(name = "print-schema")]
    PrintSchema,
}

#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Config file (env: CATALOG_BRIDGE_CONFIG)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Bind address, e.g. 127.0.0.1:7007
    #[arg(long, default_value = "127.0.0.1:7007")]
    pub(crate) bind: String,

    /// Allow binding to non-loopback addresses (requires --auth-token)
    #[arg(long)]
    pub(crate) public: bool,

    /// Require Authorization: Bearer <token> on all requests (env: CATALOG_BRIDGE_AUTH_TOKEN)
    #[arg(long)]
    pub(crate) auth_token: Option<String>,
}

#[derive(Args)]
pub(crate) struct SyncArgs {
    /// Config file (env: CATALOG_BRIDGE_CONFIG)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Which provider to run for every configured org
    #[arg(long, value_enum, default_value_t = ProviderKind::Org)]
    pub(crate) provider: ProviderKind,

    /// Write the mutation document here instead of stdout
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,

    /// Keep running, one pass every N seconds
    #[arg(long)]
    pub(crate) interval_secs: Option<u64>,

    /// Read the directory from a JSON snapshot instead of the Okta API
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean when it carries JSON.
    let json_output = match &cli.command {
        Commands::SyncOkta(args) => args.out.is_none(),
        Commands::PrintSchema => true,
        Commands::ServeArgocd(_) => false,
    };
    if json_output && !cli.verbose {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::ServeArgocd(args) => serve::serve_argocd(args).await?,
        Commands::SyncOkta(args) => sync::sync_okta(args).await?,
        Commands::PrintSchema => {
            let schema = catalog_model::mutation_schema()?;
            print_stdout(&catalog_model::serialize_json_pretty(&schema)?)?;
        }
    }
    Ok(())
}
