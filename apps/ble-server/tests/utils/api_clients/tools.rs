use serde_json::{Value, json};

use super::{HttpClient, Response};
use crate::fixtures::{ADDRESS, CHARACTERISTIC, SERVICE};

pub struct ToolsApi {
    client: HttpClient,
}

impl ToolsApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Response {
        self.client.get("/api/tool/v1").await
    }

    pub async fn call(&self, name: &str, arguments: impl Into<Option<Value>>) -> Response {
        self.client
            .post(&format!("/api/tool/v1/{name}"), arguments)
            .await
    }

    pub async fn call_raw(&self, name: &str, body: &str) -> Response {
        self.client
            .post_raw(&format!("/api/tool/v1/{name}"), body)
            .await
    }

    pub async fn scan(&self) -> Response {
        self.call("scan_for", json!({})).await
    }

    pub async fn connect(&self, address: &str) -> Response {
        self.call("connect", json!({ "address": address })).await
    }

    pub async fn read_battery_level(&self) -> Response {
        self.call(
            "read",
            json!({ "address": ADDRESS, "service_uuid": SERVICE, "char_uuid": CHARACTERISTIC }),
        )
        .await
    }
}
