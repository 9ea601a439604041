//! casement-server: WebSocket Dispatch Channel for window grouping.
//!
//! Accepts WebSocket clients, runs their requests against a shared
//! `GroupService`, and fans service events out to every connected client.

mod connection;
mod dispatch;
mod protocol;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use casement_common::Event;
use casement_config::{CasementConfig, LoggingConfig};
use casement_groups::host::memory::MemoryHost;
use casement_groups::{GroupService, ServiceSettings};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::connection::handle_connection;

#[derive(Parser)]
#[command(name = "casement-server", about = "Window grouping dispatch server")]
struct Args {
    /// Port to listen on. Overrides `server.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind. Overrides `server.bind`.
    #[arg(long)]
    bind: Option<String>,

    /// Config file to load instead of the platform default.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn settings_from_config(config: &CasementConfig) -> ServiceSettings {
    ServiceSettings {
        host_timeout: Duration::from_millis(u64::from(config.sync.host_timeout_ms)),
        tabstrip_url: config.tabstrip.url.clone(),
        tabstrip_height: config.tabstrip.height,
        event_capacity: config.sync.event_capacity as usize,
    }
}

fn init_tracing(directive: String) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| directive.into()),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => casement_config::load_config_from(path),
        None => casement_config::load_config(),
    };
    let mut config = match loaded {
        Ok(config) => {
            init_tracing(config.logging.filter_directive());
            config
        }
        Err(e) => {
            init_tracing(LoggingConfig::default().filter_directive());
            tracing::error!(error = %e, "Failed to load config");
            std::process::exit(1);
        }
    };

    if let Some(port) = args.port {
        config.server.port = u32::from(port);
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let settings = settings_from_config(&config);
    let host = Arc::new(MemoryHost::new(settings.event_capacity));
    let service = Arc::new(GroupService::new(host, settings));
    let _listener_task = service.spawn_host_listener();

    let addr = config.server.address();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    tracing::info!("casement-server listening on {}", addr);

    let hello_timeout = Duration::from_secs(u64::from(config.server.hello_timeout_secs));

    // Accept loop.
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let service = Arc::clone(&service);
                    tokio::spawn(async move {
                        match accept_async(stream).await {
                            Ok(ws) => handle_connection(ws, peer, service, hello_timeout).await,
                            Err(e) => {
                                tracing::warn!(peer = %peer, error = %e, "WS handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                let notified = service.events().publish(Event::Shutdown);
                tracing::debug!(clients = notified, "Shutdown published");
                // Let connection tasks flush the shutdown frame.
                tokio::time::sleep(Duration::from_millis(100)).await;
                break;
            }
        }
    }
}
