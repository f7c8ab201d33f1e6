#![cfg_attr(feature = "strict", deny(warnings))]

use std::sync::Arc;

use config::core_config::{CoreConfig, EngineConfig};
use provider::bluetooth_low_energy::low_level::BleEngine;
use provider::bluetooth_low_energy::plain::PlainEngine;
use service::session::BleSession;
use service::tool::ToolService;

pub mod bridge;
pub mod config;
pub mod provider;
pub mod service;
pub mod util;

#[derive(Clone)]
pub struct BleCore {
    pub engine: Arc<dyn BleEngine>,
    pub session: Arc<BleSession>,
    pub tool_service: ToolService,
}

impl BleCore {
    pub fn new(config: CoreConfig) -> Self {
        let engine: Arc<dyn BleEngine> = match &config.engine {
            EngineConfig::Plain(params) => Arc::new(PlainEngine::new(params)),
        };

        Self::with_engine(engine, config)
    }

    /// Builds the core on top of an externally provided engine.
    pub fn with_engine(engine: Arc<dyn BleEngine>, config: CoreConfig) -> Self {
        let session = Arc::new(BleSession::new(engine.clone()));

        Self {
            engine,
            tool_service: ToolService::new(session.clone(), config.session),
            session,
        }
    }
}
