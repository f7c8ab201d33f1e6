use ble_core::BleCore;
use ble_core::bridge::{AsyncAdapter, AsyncPeripheral, BridgeError, Handler};
use ble_core::config::core_config::AppConfig;

use crate::ServerConfig;

pub fn initialize_core(config: &AppConfig<ServerConfig>) -> BleCore {
    BleCore::new(config.core.clone())
}

/// Logs scan lifecycle events of every adapter. Must run inside the runtime
/// that serves requests, since handlers are dispatched on it.
pub async fn trace_scan_events(core: &BleCore) -> Result<(), BridgeError> {
    for adapter in AsyncAdapter::get_adapters(core.engine.clone()).await? {
        let identifier = adapter.identifier();

        adapter.set_callback_on_scan_start(Some(Handler::immediate({
            let identifier = identifier.clone();
            move |_: ()| tracing::debug!("Scan started on {identifier}")
        })))?;
        adapter.set_callback_on_scan_stop(Some(Handler::immediate({
            let identifier = identifier.clone();
            move |_: ()| tracing::debug!("Scan stopped on {identifier}")
        })))?;
        adapter.set_callback_on_scan_found(Some(Handler::immediate({
            let identifier = identifier.clone();
            move |peripheral: AsyncPeripheral| {
                tracing::debug!(
                    "{identifier} found {} [{}] rssi {}",
                    peripheral.identifier(),
                    peripheral.address(),
                    peripheral.rssi()
                )
            }
        })))?;
        adapter.set_callback_on_scan_updated(Some(Handler::immediate(
            move |peripheral: AsyncPeripheral| {
                tracing::trace!(
                    "{identifier} updated {} [{}] rssi {}",
                    peripheral.identifier(),
                    peripheral.address(),
                    peripheral.rssi()
                )
            },
        )))?;
    }

    Ok(())
}
