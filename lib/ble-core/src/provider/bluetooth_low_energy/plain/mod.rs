//! In-memory engine that simulates adapters and peripherals.
//!
//! Behaves like a real engine from the caller's point of view: calls block,
//! scan and notification callbacks arrive on threads owned by the engine.

use std::sync::Arc;

use self::adapter::PlainAdapter;
use super::BleError;
use super::low_level::{BleAdapter, BleEngine};
use crate::config::core_config::PlainEngineConfig;

pub mod adapter;
pub mod peripheral;

pub struct PlainEngine {
    adapters: Vec<Arc<PlainAdapter>>,
}

impl PlainEngine {
    pub fn new(config: &PlainEngineConfig) -> Self {
        let adapters = config
            .adapters
            .iter()
            .map(|adapter| Arc::new(PlainAdapter::new(adapter, config.notify_interval)))
            .collect();

        Self { adapters }
    }
}

impl BleEngine for PlainEngine {
    fn get_adapters(&self) -> Result<Vec<Arc<dyn BleAdapter>>, BleError> {
        Ok(self
            .adapters
            .iter()
            .map(|adapter| adapter.clone() as Arc<dyn BleAdapter>)
            .collect())
    }
}
