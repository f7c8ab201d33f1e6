use thiserror::Error;

pub mod low_level;
pub mod plain;

pub type MacAddress = String;
pub type ServiceUUID = String;
pub type CharacteristicUUID = String;
pub type DeviceAddress = String;

/// Errors reported by the native BLE engine.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BleError {
    #[error("BLE adapter not enabled")]
    AdapterNotEnabled,
    #[error("BLE scan already started")]
    ScanAlreadyStarted,
    #[error("No device with address {address} found")]
    DeviceAddressNotFound { address: String },
    #[error("Service with UUID {service} not found")]
    ServiceNotFound { service: String },
    #[error("Characteristic with UUID {characteristic} not found")]
    CharacteristicNotFound { characteristic: String },
    #[error("Not connected to device {address}")]
    DeviceNotConnected { address: String },
    #[error("Device {address} is not connectable")]
    DeviceNotConnectable { address: String },
    #[error(
        "Operation {operation} can not be performed on characteristic {characteristic}, service UUID {service}"
    )]
    InvalidCharacteristicOperation {
        service: String,
        characteristic: String,
        operation: String,
    },
    #[error("The device does not support BLE")]
    NotSupported,
    #[error("Unknown BLE error: {reason}")]
    Unknown { reason: String },
}
