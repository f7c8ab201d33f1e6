use ble_core::config::core_config::AppConfig;
use ble_server::ServerConfig;

pub const ADDRESS: &str = "11:22:33:44:55:66";
pub const SERVICE: &str = "0000180f-0000-1000-8000-00805f9b34fb";
pub const CHARACTERISTIC: &str = "00002a19-0000-1000-8000-00805f9b34fb";

pub fn create_config(hide_error_response_cause: bool) -> AppConfig<ServerConfig> {
    let config = indoc::formatdoc! {"
        app:
            transport: HTTP
            hideErrorResponseCause: {hide_error_response_cause}
        session:
            defaultScanTimeout: 20
            defaultNotifyDuration: 50
        engine:
            type: PLAIN
            notifyInterval: 10
    "};

    AppConfig::from_yaml([config]).unwrap()
}
