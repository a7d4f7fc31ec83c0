//! Stockroom Server
//!
//! HTTP server for the supply-chain back office API

use anyhow::Context;
use clap::Parser;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use std::convert::Infallible;
use std::path::PathBuf;
use stockroom::{App, ServerConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "stockroom-server")]
#[command(about = "Role-gated supply-chain back office API")]
struct Args {
    /// Path to a TOML config file
    #[arg(short = 'c', long, env = "STOCKROOM_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides config and STOCKROOM_HOST)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port number (overrides config and PORT)
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Directory holding the HTML pages
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Register `role: "admin"` requests as plain users
    #[arg(long)]
    no_admin_registration: bool,
}

impl Args {
    fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.public_dir {
            config.public_dir = dir.clone();
        }
        if self.no_admin_registration {
            config.allow_admin_registration = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting Stockroom Server");

    let config = ServerConfig::load(args.config.as_deref()).context("loading configuration")?;
    let config = args.apply(config);

    if config.allow_admin_registration {
        info!("Self-registration as admin is enabled");
    }
    info!("Serving pages from {:?}", config.public_dir);

    let addr = config.bind_addr();
    let app = App::in_memory(config).context("building application")?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    let local_addr = listener.local_addr()?;

    let http_server = ConnBuilder::new(TokioExecutor::new());

    info!("HTTP server running at http://{}", local_addr);

    loop {
        // Accept connection or wait for Ctrl+C
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((socket, peer)) => {
                        let app = app.clone();
                        let http_server = http_server.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let app = app.clone();
                                async move { Ok::<_, Infallible>(app.handle(req).await) }
                            });
                            if let Err(e) = http_server
                                .serve_connection(TokioIo::new(socket), service)
                                .await
                            {
                                warn!("Connection error from {}: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!("Server stopped");

    Ok(())
}
