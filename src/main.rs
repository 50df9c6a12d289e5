use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;
use tokio::net::TcpListener;

use mojenx::config::{finalize, load_config, AppConfig};
use mojenx::lifecycle::{self, signals, Shutdown};
use mojenx::menu::{self, Menu};
use mojenx::observability::{logging, metrics};
use mojenx::HttpServer;

#[derive(Parser)]
#[command(name = "mojenx", version)]
#[command(about = "Manage a local Tor daemon's torrc from a menu or an HTTP API", long_about = None)]
struct Cli {
    /// Settings file (TOML). Flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to torrc
    #[arg(long)]
    torrc: Option<PathBuf>,

    /// Directory for timestamped torrc backups
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// HTTP listen address (empty = interactive menu)
    #[arg(long)]
    listen: Option<String>,

    /// API token
    #[arg(long, env = "MOJENX_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) {
        if let Some(path) = self.torrc {
            config.torrc.path = path;
        }
        if let Some(dir) = self.backup_dir {
            config.torrc.backup_dir = dir;
        }
        if let Some(listen) = self.listen {
            config.api.listen_address = listen;
        }
        if let Some(token) = self.token {
            config.api.token = token;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();

    let mut config = match cli.config.take() {
        Some(path) => load_config(&path)?,
        None => AppConfig::default(),
    };
    cli.apply(&mut config);
    let config = finalize(config)?;

    logging::init_logging(&config.observability.log_level);
    println!("{}", menu::banner());

    let manager = lifecycle::build_manager(&config).await;

    if !config.api.http_mode() {
        let input = BufReader::new(tokio::io::stdin());
        Menu::new(manager, input, tokio::io::stdout()).run().await?;
        return Ok(());
    }

    if let Err(e) = lifecycle::require_token(&config) {
        tracing::error!("{e}");
        std::process::exit(1);
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(config.api.bind_address()).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(manager, &config.api);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
