use serde_json::json;

use crate::fixtures::{ADDRESS, CHARACTERISTIC, SERVICE};
use crate::utils::context::TestContext;

#[tokio::test(flavor = "multi_thread")]
async fn test_get_adapters_without_body() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.tools.call("get_adapters", None).await;

    // THEN
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json_value().await,
        json!([{ "identifier": "Plain Adapter", "address": "AA:BB:CC:DD:EE:FF" }])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tool_flow() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.tools.scan().await;

    // THEN
    assert_eq!(resp.status(), 200);
    let resp = resp.json_value().await;
    assert_eq!(resp[0]["address"], ADDRESS);
    assert_eq!(resp[0]["manufacturer_data"], json!({ "004c": "74657374" }));

    let resp = context.api.tools.connect(ADDRESS).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json_value().await,
        json!({ "message": "Connected to Plain Peripheral", "address": ADDRESS })
    );

    let resp = context
        .api
        .tools
        .call("services", json!({ "address": ADDRESS }))
        .await;
    assert_eq!(resp.status(), 200);
    let resp = resp.json_value().await;
    assert_eq!(resp["connected"], true);
    assert_eq!(
        resp["services"],
        json!([{ "uuid": SERVICE, "characteristics": [CHARACTERISTIC] }])
    );

    let resp = context.api.tools.read_battery_level().await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json_value().await["data_hex"], "");

    let resp = context
        .api
        .tools
        .call(
            "notify",
            json!({
                "address": ADDRESS,
                "service_uuid": SERVICE,
                "char_uuid": CHARACTERISTIC,
                "duration_ms": 60
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let resp = resp.json_value().await;
    let samples = resp.as_array().unwrap();
    assert!(!samples.is_empty());
    assert_eq!(samples[0]["data_utf8"], "Hello from notify");
    assert_eq!(samples[0]["type"], "notification");

    let resp = context
        .api
        .tools
        .call("disconnect", json!({ "address": ADDRESS }))
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json_value().await,
        json!({ "message": "Disconnected from Plain Peripheral", "address": ADDRESS })
    );

    let resp = context.api.tools.read_battery_level().await;
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.json_value().await["code"], "BR_0003");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_without_scan_fails() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.tools.connect(ADDRESS).await;

    // THEN
    assert_eq!(resp.status(), 404);
    assert_eq!(
        resp.json_value().await,
        json!({
            "code": "BR_0003",
            "message": "Device not found",
            "cause": {
                "message": "Device 11:22:33:44:55:66 not found in scan results. Please scan first."
            }
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_cause_hidden() {
    // GIVEN
    let context = TestContext::new_with_hidden_cause(true).await;

    // WHEN
    let resp = context.api.tools.connect(ADDRESS).await;

    // THEN
    assert_eq!(resp.status(), 404);
    let resp = resp.json_value().await;
    assert_eq!(resp["code"], "BR_0003");
    assert!(resp.get("cause").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_requires_connection() {
    // GIVEN
    let context = TestContext::new().await;
    assert_eq!(context.api.tools.scan().await.status(), 200);

    // WHEN
    let resp = context.api.tools.read_battery_level().await;

    // THEN
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json_value().await["code"], "BR_0004");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scan_with_invalid_adapter_index() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context
        .api
        .tools
        .call("scan_for", json!({ "timeout_ms": 10, "adapter_index": 3 }))
        .await;

    // THEN
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json_value().await["code"], "BR_0002");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_tool() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.tools.call("write", json!({})).await;

    // THEN
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json_value().await["code"], "BR_0013");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_argument() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.tools.call("connect", json!({})).await;

    // THEN
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json_value().await["code"], "BR_0014");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_body() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.tools.call_raw("connect", "{\"address\":").await;

    // THEN
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json_value().await["code"], "BR_0016");
}
