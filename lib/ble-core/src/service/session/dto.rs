use crate::provider::bluetooth_low_energy::low_level::dto::{GattService, ManufacturerData};
use crate::provider::bluetooth_low_energy::{DeviceAddress, MacAddress};
use crate::service::error::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterDetails {
    pub identifier: String,
    pub address: MacAddress,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedPeripheral {
    pub identifier: String,
    pub address: DeviceAddress,
    pub rssi: i16,
    pub connectable: bool,
    pub manufacturer_data: ManufacturerData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub identifier: String,
    pub address: DeviceAddress,
    pub already_connected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisconnectOutcome {
    pub identifier: String,
    pub address: DeviceAddress,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServicesOutcome {
    Disconnected {
        address: DeviceAddress,
    },
    Connected {
        identifier: String,
        address: DeviceAddress,
        mtu: u16,
        services: Vec<GattService>,
    },
}

/// Payloads received during one collection window, oldest first.
#[derive(Debug)]
pub struct NotificationCollection {
    pub samples: Vec<Vec<u8>>,
    /// Set when releasing the subscription failed; the samples are still valid.
    pub unsubscribe_error: Option<ServiceError>,
}
