//! Capability surface of the native BLE engine.
//!
//! Every call here is blocking and may take as long as the radio needs.
//! Callbacks registered through the `set_callback_*` and `notify` methods are
//! invoked on threads owned by the engine, never on the registering thread.

use std::sync::Arc;
use std::time::Duration;

use self::dto::{GattService, ManufacturerData};
use super::{BleError, CharacteristicUUID, DeviceAddress, MacAddress, ServiceUUID};

pub mod dto;

pub type ScanEventCallback = Box<dyn Fn() + Send + Sync>;
pub type PeripheralEventCallback = Box<dyn Fn(Arc<dyn BlePeripheral>) + Send + Sync>;
pub type DataCallback = Box<dyn Fn(Vec<u8>) + Send + Sync>;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait BleEngine: Send + Sync {
    /// Enumerates the adapters currently present on the host.
    fn get_adapters(&self) -> Result<Vec<Arc<dyn BleAdapter>>, BleError>;
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait BleAdapter: Send + Sync {
    fn identifier(&self) -> String;
    fn address(&self) -> MacAddress;
    fn is_powered(&self) -> Result<bool, BleError>;
    fn bluetooth_enabled(&self) -> Result<bool, BleError>;

    fn power_on(&self) -> Result<(), BleError>;
    fn power_off(&self) -> Result<(), BleError>;

    fn scan_start(&self) -> Result<(), BleError>;
    fn scan_stop(&self) -> Result<(), BleError>;
    /// Starts a scan, blocks for `timeout` and stops it again.
    fn scan_for(&self, timeout: Duration) -> Result<(), BleError>;
    fn scan_is_active(&self) -> Result<bool, BleError>;
    /// Snapshot of the peripherals found by the most recent scan.
    fn scan_get_results(&self) -> Result<Vec<Arc<dyn BlePeripheral>>, BleError>;
    fn get_paired_peripherals(&self) -> Result<Vec<Arc<dyn BlePeripheral>>, BleError>;

    /// `None` unloads the callback. A new callback replaces the previous one.
    fn set_callback_on_scan_start(&self, callback: Option<ScanEventCallback>)
    -> Result<(), BleError>;
    fn set_callback_on_scan_stop(&self, callback: Option<ScanEventCallback>)
    -> Result<(), BleError>;
    fn set_callback_on_scan_found(
        &self,
        callback: Option<PeripheralEventCallback>,
    ) -> Result<(), BleError>;
    fn set_callback_on_scan_updated(
        &self,
        callback: Option<PeripheralEventCallback>,
    ) -> Result<(), BleError>;
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait BlePeripheral: Send + Sync {
    fn identifier(&self) -> String;
    fn address(&self) -> DeviceAddress;
    fn rssi(&self) -> i16;
    fn is_connectable(&self) -> bool;
    fn is_connected(&self) -> bool;
    /// Negotiated MTU, 0 while disconnected.
    fn mtu(&self) -> u16;
    fn manufacturer_data(&self) -> ManufacturerData;

    fn connect(&self) -> Result<(), BleError>;
    fn disconnect(&self) -> Result<(), BleError>;
    fn services(&self) -> Result<Vec<GattService>, BleError>;
    fn read(&self, service: &str, characteristic: &str) -> Result<Vec<u8>, BleError>;
    /// Subscribes to notifications, replacing any earlier subscription for
    /// the same characteristic.
    fn notify(
        &self,
        service: &str,
        characteristic: &str,
        callback: DataCallback,
    ) -> Result<(), BleError>;
    fn unsubscribe(&self, service: &str, characteristic: &str) -> Result<(), BleError>;
}

/// Identifies a single characteristic of a peripheral.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacteristicKey {
    pub service: ServiceUUID,
    pub characteristic: CharacteristicUUID,
}

impl CharacteristicKey {
    pub fn new(service: impl Into<ServiceUUID>, characteristic: impl Into<CharacteristicUUID>) -> Self {
        Self {
            service: service.into(),
            characteristic: characteristic.into(),
        }
    }
}
