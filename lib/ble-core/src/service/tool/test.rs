use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rstest::rstest;
use serde_json::json;

use super::ToolService;
use crate::config::core_config::{PlainEngineConfig, SessionConfig};
use crate::provider::bluetooth_low_energy::BleError;
use crate::provider::bluetooth_low_energy::low_level::{
    BleAdapter, BlePeripheral, MockBleAdapter, MockBleEngine, MockBlePeripheral,
};
use crate::provider::bluetooth_low_energy::plain::PlainEngine;
use crate::service::error::{ErrorCode, ServiceError};
use crate::service::session::BleSession;

const ADDRESS: &str = "11:22:33:44:55:66";
const SERVICE: &str = "0000180f-0000-1000-8000-00805f9b34fb";
const CHARACTERISTIC: &str = "00002a19-0000-1000-8000-00805f9b34fb";

fn tool_service() -> ToolService {
    let engine = PlainEngine::new(&PlainEngineConfig {
        notify_interval: Duration::from_millis(10),
        ..Default::default()
    });
    let session = Arc::new(BleSession::new(Arc::new(engine)));

    ToolService::new(
        session,
        SessionConfig {
            default_scan_timeout: Duration::from_millis(20),
            default_notify_duration: Duration::from_millis(50),
            default_adapter_index: 0,
        },
    )
}

async fn connected_tool_service() -> ToolService {
    let service = tool_service();
    service.call_tool("scan_for", json!({})).await.unwrap();
    service
        .call_tool("connect", json!({ "address": ADDRESS }))
        .await
        .unwrap();
    service
}

#[test]
fn test_list_tools() {
    let tools = tool_service().list_tools();

    let names: Vec<_> = tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "get_adapters",
            "scan_for",
            "connect",
            "disconnect",
            "services",
            "read",
            "notify"
        ]
    );

    let connect = serde_json::to_value(&tools[2]).unwrap();
    assert_eq!(connect["title"], "Connect");
    assert_eq!(connect["annotations"]["readOnlyHint"], false);
    assert_eq!(connect["annotations"]["destructiveHint"], false);
    assert_eq!(connect["_meta"]["role"], "connection");
    assert_eq!(connect["inputSchema"]["required"], json!(["address"]));

    let scan = serde_json::to_value(&tools[1]).unwrap();
    assert_eq!(
        scan["inputSchema"]["properties"]["timeout_ms"]["default"],
        20
    );
    assert!(scan["annotations"].get("destructiveHint").is_none());

    let notify = serde_json::to_value(&tools[6]).unwrap();
    assert_eq!(
        notify["inputSchema"]["properties"]["duration_ms"]["default"],
        50
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_adapters() {
    let result = tool_service()
        .call_tool("get_adapters", serde_json::Value::Null)
        .await
        .unwrap();

    assert_eq!(
        result,
        json!([{ "identifier": "Plain Adapter", "address": "AA:BB:CC:DD:EE:FF" }])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scan_for() {
    let result = tool_service()
        .call_tool("scan_for", json!({ "timeout_ms": 10, "adapter_index": 0 }))
        .await
        .unwrap();

    assert_eq!(
        result,
        json!([{
            "identifier": "Plain Peripheral",
            "address": ADDRESS,
            "rssi": -60,
            "connectable": true,
            "manufacturer_data": { "004c": "74657374" }
        }])
    );
}

#[rstest]
#[case(-1)]
#[case(1)]
#[tokio::test(flavor = "multi_thread")]
async fn test_scan_for_invalid_adapter_index(#[case] adapter_index: i64) {
    let error = tool_service()
        .call_tool(
            "scan_for",
            json!({ "timeout_ms": 10, "adapter_index": adapter_index }),
        )
        .await
        .unwrap_err();

    assert_eq!(error.error_code(), ErrorCode::BR_0002);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_twice() {
    let service = connected_tool_service().await;

    let result = service
        .call_tool("connect", json!({ "address": ADDRESS }))
        .await
        .unwrap();

    assert_eq!(
        result,
        json!({ "message": "Already connected to Plain Peripheral", "address": ADDRESS })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_requires_scan() {
    let error = tool_service()
        .call_tool("connect", json!({ "address": "AA:BB:CC:DD:EE:FF" }))
        .await
        .unwrap_err();

    assert!(matches!(error, ServiceError::DeviceNotScanned { .. }));
    assert_eq!(error.error_code(), ErrorCode::BR_0003);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_services_and_read() {
    let service = connected_tool_service().await;

    let services = service
        .call_tool("services", json!({ "address": ADDRESS }))
        .await
        .unwrap();
    assert_eq!(
        services,
        json!({
            "identifier": "Plain Peripheral",
            "address": ADDRESS,
            "connected": true,
            "mtu": 247,
            "services": [{ "uuid": SERVICE, "characteristics": [CHARACTERISTIC] }]
        })
    );

    let read = service
        .call_tool(
            "read",
            json!({ "address": ADDRESS, "service_uuid": SERVICE, "char_uuid": CHARACTERISTIC }),
        )
        .await
        .unwrap();
    assert_eq!(
        read,
        json!({
            "service_uuid": SERVICE,
            "char_uuid": CHARACTERISTIC,
            "data_hex": "",
            "data_utf8": ""
        })
    );

    let error = service
        .call_tool(
            "read",
            json!({ "address": ADDRESS, "service_uuid": SERVICE, "char_uuid": "invalid" }),
        )
        .await
        .unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::BR_0009);
    assert_eq!(
        error.to_string(),
        "Read failed: Characteristic with UUID invalid not found"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_notify_collects_samples() {
    let service = connected_tool_service().await;

    let result = service
        .call_tool(
            "notify",
            json!({ "address": ADDRESS, "service_uuid": SERVICE, "char_uuid": CHARACTERISTIC }),
        )
        .await
        .unwrap();

    let samples = result.as_array().unwrap();
    assert!(!samples.is_empty());
    assert_eq!(
        samples[0],
        json!({
            "service": SERVICE,
            "characteristic": CHARACTERISTIC,
            "data_hex": "48656c6c6f2066726f6d206e6f74696679",
            "data_utf8": "Hello from notify",
            "type": "notification"
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_notify_negative_duration_is_clamped() {
    let service = connected_tool_service().await;

    let result = service
        .call_tool(
            "notify",
            json!({
                "address": ADDRESS,
                "service_uuid": SERVICE,
                "char_uuid": CHARACTERISTIC,
                "duration_ms": -100
            }),
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_forgets_device() {
    let service = connected_tool_service().await;

    let result = service
        .call_tool("disconnect", json!({ "address": ADDRESS }))
        .await
        .unwrap();
    assert_eq!(
        result,
        json!({ "message": "Disconnected from Plain Peripheral", "address": ADDRESS })
    );

    let error = service
        .call_tool("services", json!({ "address": ADDRESS }))
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::DeviceNotFound { .. }));
}

#[tokio::test]
async fn test_unknown_tool() {
    let error = tool_service()
        .call_tool("write", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(error, ServiceError::UnknownTool(name) if name == "write"));
}

#[tokio::test]
async fn test_missing_argument() {
    let error = tool_service()
        .call_tool("connect", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(error, ServiceError::InvalidArguments(_)));
    assert_eq!(error.error_code(), ErrorCode::BR_0014);
}

fn mock_tool_service(peripheral: MockBlePeripheral) -> ToolService {
    let peripheral: Arc<dyn BlePeripheral> = Arc::new(peripheral);

    let mut adapter = MockBleAdapter::new();
    adapter.expect_scan_for().returning(|_| Ok(()));
    adapter
        .expect_scan_get_results()
        .returning(move || Ok(vec![peripheral.clone()]));
    let adapter: Arc<dyn BleAdapter> = Arc::new(adapter);

    let mut engine = MockBleEngine::new();
    engine
        .expect_get_adapters()
        .returning(move || Ok(vec![adapter.clone()]));

    ToolService::new(
        Arc::new(BleSession::new(Arc::new(engine))),
        SessionConfig::default(),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_notify_reports_unsubscribe_failure_with_samples() {
    let connected = Arc::new(AtomicBool::new(false));
    let mut peripheral = MockBlePeripheral::new();
    peripheral
        .expect_address()
        .return_const(ADDRESS.to_string());
    peripheral
        .expect_identifier()
        .return_const("Mock Peripheral".to_string());
    peripheral.expect_rssi().return_const(-60i16);
    peripheral.expect_is_connectable().return_const(true);
    peripheral
        .expect_manufacturer_data()
        .returning(HashMap::new);
    peripheral.expect_is_connected().returning({
        let connected = connected.clone();
        move || connected.load(Ordering::SeqCst)
    });
    peripheral.expect_connect().once().returning({
        let connected = connected.clone();
        move || {
            connected.store(true, Ordering::SeqCst);
            Ok(())
        }
    });
    peripheral.expect_notify().once().returning(|_, _, callback| {
        callback(b"x".to_vec());
        Ok(())
    });
    peripheral.expect_unsubscribe().once().returning(|_, _| {
        Err(BleError::Unknown {
            reason: "unsubscribe rejected".to_string(),
        })
    });

    let service = mock_tool_service(peripheral);
    service
        .call_tool("scan_for", json!({ "timeout_ms": 0 }))
        .await
        .unwrap();
    service
        .call_tool("connect", json!({ "address": ADDRESS }))
        .await
        .unwrap();

    let error = service
        .call_tool(
            "notify",
            json!({
                "address": ADDRESS,
                "service_uuid": SERVICE,
                "char_uuid": CHARACTERISTIC,
                "duration_ms": 0
            }),
        )
        .await
        .unwrap_err();

    assert_eq!(error.error_code(), ErrorCode::BR_0011);
    assert_eq!(
        error.to_string(),
        "Unsubscribe failed: Unknown BLE error: unsubscribe rejected"
    );
    assert_eq!(
        error.partial_result(),
        Some(&json!([{
            "service": SERVICE,
            "characteristic": CHARACTERISTIC,
            "data_hex": "78",
            "data_utf8": "x",
            "type": "notification"
        }]))
    );
}
