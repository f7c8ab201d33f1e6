use serde_json::json;

use super::dto::{ToolAnnotationsDTO, ToolDescriptorDTO, ToolMetaDTO, ToolName};
use crate::config::core_config::SessionConfig;

struct Hints {
    read_only: bool,
    destructive: Option<bool>,
    idempotent: bool,
}

const READ_ONLY: Hints = Hints {
    read_only: true,
    destructive: None,
    idempotent: true,
};

const READ_ONLY_NON_IDEMPOTENT: Hints = Hints {
    read_only: true,
    destructive: None,
    idempotent: false,
};

const MUTATING: Hints = Hints {
    read_only: false,
    destructive: Some(false),
    idempotent: false,
};

fn descriptor(
    name: ToolName,
    title: &str,
    description: &str,
    tags: &[&str],
    hints: Hints,
    role: &str,
    input_schema: serde_json::Value,
) -> ToolDescriptorDTO {
    ToolDescriptorDTO {
        name: name.to_string(),
        title: title.to_owned(),
        description: description.to_owned(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        annotations: ToolAnnotationsDTO {
            title: title.to_owned(),
            read_only_hint: hints.read_only,
            destructive_hint: hints.destructive,
            idempotent_hint: hints.idempotent,
            open_world_hint: true,
        },
        meta: ToolMetaDTO {
            version: "1.0".to_owned(),
            role: role.to_owned(),
        },
        input_schema,
    }
}

fn address_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "address": { "type": "string" }
        },
        "required": ["address"]
    })
}

fn characteristic_schema(extra: Option<(&str, serde_json::Value)>) -> serde_json::Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "address": { "type": "string" },
            "service_uuid": { "type": "string" },
            "char_uuid": { "type": "string" }
        },
        "required": ["address", "service_uuid", "char_uuid"]
    });

    if let Some((name, property)) = extra {
        schema["properties"][name] = property;
    }

    schema
}

pub(super) fn describe(tool: ToolName, defaults: &SessionConfig) -> ToolDescriptorDTO {
    match tool {
        ToolName::GetAdapters => descriptor(
            tool,
            "Get Adapters",
            "List available Bluetooth adapters on the host.",
            &["adapter", "ble", "read"],
            READ_ONLY,
            "discovery",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolName::ScanFor => descriptor(
            tool,
            "Scan For",
            "Scan for nearby BLE peripherals using the selected adapter.",
            &["adapter", "scan", "ble", "read"],
            READ_ONLY_NON_IDEMPOTENT,
            "discovery",
            json!({
                "type": "object",
                "properties": {
                    "timeout_ms": {
                        "type": "integer",
                        "default": defaults.default_scan_timeout.as_millis() as u64
                    },
                    "adapter_index": {
                        "type": "integer",
                        "default": defaults.default_adapter_index
                    }
                }
            }),
        ),
        ToolName::Connect => descriptor(
            tool,
            "Connect",
            "Connect to a peripheral previously discovered in the last scan.",
            &["peripheral", "connect", "ble"],
            MUTATING,
            "connection",
            address_schema(),
        ),
        ToolName::Disconnect => descriptor(
            tool,
            "Disconnect",
            "Disconnect from a connected peripheral.",
            &["peripheral", "disconnect", "ble"],
            MUTATING,
            "connection",
            address_schema(),
        ),
        ToolName::Services => descriptor(
            tool,
            "Services",
            "List services and characteristics on a connected peripheral.",
            &["peripheral", "gatt", "ble", "read"],
            READ_ONLY,
            "gatt",
            address_schema(),
        ),
        ToolName::Read => descriptor(
            tool,
            "Read",
            "Read a characteristic value from a connected peripheral.",
            &["peripheral", "gatt", "ble", "read"],
            READ_ONLY_NON_IDEMPOTENT,
            "gatt",
            characteristic_schema(None),
        ),
        ToolName::Notify => descriptor(
            tool,
            "Notify",
            "Collect notifications from a characteristic for a fixed duration.",
            &["peripheral", "gatt", "ble", "notify"],
            MUTATING,
            "gatt",
            characteristic_schema(Some((
                "duration_ms",
                json!({
                    "type": "integer",
                    "default": defaults.default_notify_duration.as_millis() as u64
                }),
            ))),
        ),
    }
}
