use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    GetAdapters,
    ScanFor,
    Connect,
    Disconnect,
    Services,
    Read,
    Notify,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptorDTO {
    pub name: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub annotations: ToolAnnotationsDTO,
    #[serde(rename = "_meta")]
    pub meta: ToolMetaDTO,
    pub input_schema: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotationsDTO {
    pub title: String,
    pub read_only_hint: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    pub idempotent_hint: bool,
    pub open_world_hint: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolMetaDTO {
    pub version: String,
    pub role: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScanForArgumentsDTO {
    pub timeout_ms: Option<i64>,
    pub adapter_index: Option<i64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AddressArgumentsDTO {
    pub address: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReadArgumentsDTO {
    pub address: String,
    pub service_uuid: String,
    pub char_uuid: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NotifyArgumentsDTO {
    pub address: String,
    pub service_uuid: String,
    pub char_uuid: String,
    pub duration_ms: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdapterResponseDTO {
    pub identifier: String,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanResultResponseDTO {
    pub identifier: String,
    pub address: String,
    pub rssi: i16,
    pub connectable: bool,
    /// Company id and payload, both hex encoded.
    pub manufacturer_data: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConnectionResponseDTO {
    pub message: String,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServicesResponseDTO {
    Connected {
        identifier: String,
        address: String,
        connected: bool,
        mtu: u16,
        services: Vec<ServiceResponseDTO>,
    },
    Disconnected {
        address: String,
        connected: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceResponseDTO {
    pub uuid: String,
    pub characteristics: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReadResponseDTO {
    pub service_uuid: String,
    pub char_uuid: String,
    pub data_hex: String,
    pub data_utf8: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NotificationResponseDTO {
    pub service: String,
    pub characteristic: String,
    pub data_hex: String,
    pub data_utf8: String,
    #[serde(rename = "type")]
    pub r#type: NotificationType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Notification,
}
