use ble_core::BleCore;
use ble_server::router::start_server;
use ble_server::stdio::StdioServer;
use tokio::task::JoinHandle;

use super::api_clients::Client;
use crate::fixtures;

pub struct TestContext {
    pub api: Client,
    _handle: JoinHandle<()>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::new_with_hidden_cause(false).await
    }

    pub async fn new_with_hidden_cause(hide_error_response_cause: bool) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let config = fixtures::create_config(hide_error_response_cause);
        let core = BleCore::new(config.core);
        let _handle = tokio::spawn(async move { start_server(listener, core, config.app).await });

        Self {
            api: Client::new(base_url),
            _handle,
        }
    }
}

pub fn stdio_server() -> StdioServer {
    let config = fixtures::create_config(false);
    let core = BleCore::new(config.core);

    StdioServer::new(core.tool_service, config.app.hide_error_response_cause)
}
