use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::path::PathBuf;

use ble_core::config::core_config::{self, AppConfig};
use ble_server::init::{initialize_core, trace_scan_events};
use ble_server::router::start_server;
use ble_server::stdio::StdioServer;
use ble_server::{ServerConfig, Transport};
use clap::Parser;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "SimpleBLE MCP Server", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    config: Option<Vec<PathBuf>>,

    #[arg(long)]
    transport: Option<Transport>,

    /// Host to bind to
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to bind to
    #[arg(long)]
    port: Option<u16>,
}

fn main() {
    let cli = Cli::parse();

    let mut config_files = cli.config.unwrap_or_default();
    config_files.insert(0, "config/config.yml".into());

    let mut app_config: AppConfig<ServerConfig> =
        core_config::AppConfig::from_files(&config_files).expect("Failed creating config");

    if let Some(transport) = cli.transport {
        app_config.app.transport = transport;
    }
    if let Some(host) = cli.host {
        app_config.app.server_ip = Some(host);
    }
    if let Some(port) = cli.port {
        app_config.app.server_port = Some(port);
    }

    initialize_tracing(&app_config.app);

    let core = initialize_core(&app_config);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime")
        .block_on(async move {
            if let Err(err) = trace_scan_events(&core).await {
                tracing::warn!("Scan events will not be traced: {err}");
            }

            match app_config.app.transport {
                Transport::Http => {
                    let addr = SocketAddr::new(
                        app_config
                            .app
                            .server_ip
                            .unwrap_or(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
                        app_config.app.server_port.unwrap_or(8000),
                    );
                    let listener = TcpListener::bind(addr).expect("Failed to bind to address");

                    start_server(listener, core, app_config.app).await
                }
                Transport::Stdio => {
                    let server = StdioServer::new(
                        core.tool_service,
                        app_config.app.hide_error_response_cause,
                    );

                    if let Err(err) = server.serve(tokio::io::stdin(), tokio::io::stdout()).await {
                        tracing::error!("stdio transport failed: {err}");
                    }
                }
            }
        })
}

fn initialize_tracing(config: &ServerConfig) {
    // Create a filter based on the log level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new(
                config.trace_level.as_deref().unwrap_or("info"),
            )
        })
        .expect("Failed to create env filter");

    let tracing_layer = tracing_subscriber::registry().with(filter);

    // stdout carries the stdio transport
    if config.trace_json.unwrap_or_default() {
        tracing_layer
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_layer
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    };
}
