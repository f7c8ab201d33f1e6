use ble_core::service::tool::dto::ToolDescriptorDTO;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct ToolListRestDTO {
    pub tools: Vec<ToolDescriptorDTO>,
}

impl From<Vec<ToolDescriptorDTO>> for ToolListRestDTO {
    fn from(tools: Vec<ToolDescriptorDTO>) -> Self {
        Self { tools }
    }
}
