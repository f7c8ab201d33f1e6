//! Tool invocation surface over the session.
//!
//! Each tool call is stateless on its own; continuity between calls comes
//! from the shared [`BleSession`].

use std::sync::Arc;

use crate::config::core_config::SessionConfig;
use crate::service::session::BleSession;

mod descriptor;
pub mod dto;
pub mod mapper;
pub mod service;

#[derive(Clone)]
pub struct ToolService {
    session: Arc<BleSession>,
    defaults: SessionConfig,
}

impl ToolService {
    pub fn new(session: Arc<BleSession>, defaults: SessionConfig) -> Self {
        Self { session, defaults }
    }
}

#[cfg(test)]
mod test;
