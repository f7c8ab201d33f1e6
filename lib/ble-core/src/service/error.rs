use serde::Serialize;
use thiserror::Error;

use crate::bridge::WorkerError;
use crate::provider::bluetooth_low_energy::BleError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No Bluetooth adapter available")]
    AdapterUnavailable,
    #[error("No Bluetooth adapter available: {0}")]
    AdapterEnumerationFailed(BleError),
    #[error("Adapter index {index} out of range, {available} adapter(s) available")]
    AdapterIndexOutOfRange { index: i64, available: usize },

    #[error("Device {address} not found in scan results. Please scan first.")]
    DeviceNotScanned { address: String },
    #[error("Device {address} not found")]
    DeviceNotFound { address: String },
    #[error("Device {address} not connected")]
    DeviceNotConnected { address: String },

    #[error("Scan failed: {0}")]
    ScanFailed(BleError),
    #[error("Failed to connect: {0}")]
    ConnectionFailed(BleError),
    #[error("Failed to disconnect: {0}")]
    DisconnectFailed(BleError),
    #[error("Service discovery failed: {0}")]
    ServiceDiscoveryFailed(BleError),
    #[error("Read failed: {0}")]
    ReadFailed(BleError),
    #[error("Notify failed: {0}")]
    SubscribeFailed(BleError),
    #[error("Unsubscribe failed: {0}")]
    UnsubscribeFailed(BleError),

    #[error(transparent)]
    ResourceExhausted(#[from] WorkerError),

    #[error("Unknown tool `{0}`")]
    UnknownTool(String),
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Response mapping error: {0}")]
    ResponseMapping(String),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The operation failed after producing a result the caller still needs.
    #[error("{error}")]
    Incomplete {
        error: Box<ServiceError>,
        partial_result: serde_json::Value,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[allow(non_camel_case_types)]
pub enum ErrorCode {
    BR_0001,
    BR_0002,
    BR_0003,
    BR_0004,
    BR_0005,
    BR_0006,
    BR_0007,
    BR_0008,
    BR_0009,
    BR_0010,
    BR_0011,
    BR_0012,
    BR_0013,
    BR_0014,
    BR_0015,
    BR_0016,
}

/// Coarse classification used by transports to pick a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Unavailable,
    Range,
    NotFound,
    NotConnected,
    EngineFailure,
    ResourceExhausted,
    BadRequest,
    Internal,
}

impl ErrorCode {
    pub const fn msg(&self) -> &'static str {
        match self {
            ErrorCode::BR_0001 => "Bluetooth adapter unavailable",
            ErrorCode::BR_0002 => "Adapter index out of range",
            ErrorCode::BR_0003 => "Device not found",
            ErrorCode::BR_0004 => "Device not connected",
            ErrorCode::BR_0005 => "Scan failed",
            ErrorCode::BR_0006 => "Connection failed",
            ErrorCode::BR_0007 => "Disconnect failed",
            ErrorCode::BR_0008 => "Service discovery failed",
            ErrorCode::BR_0009 => "Read failed",
            ErrorCode::BR_0010 => "Subscribe failed",
            ErrorCode::BR_0011 => "Unsubscribe failed",
            ErrorCode::BR_0012 => "Worker unavailable",
            ErrorCode::BR_0013 => "Unknown tool",
            ErrorCode::BR_0014 => "Invalid tool arguments",
            ErrorCode::BR_0015 => "Response mapping error",
            ErrorCode::BR_0016 => "Malformed request",
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::BR_0001 => ErrorKind::Unavailable,
            ErrorCode::BR_0002 => ErrorKind::Range,
            ErrorCode::BR_0003 => ErrorKind::NotFound,
            ErrorCode::BR_0004 => ErrorKind::NotConnected,
            ErrorCode::BR_0005
            | ErrorCode::BR_0006
            | ErrorCode::BR_0007
            | ErrorCode::BR_0008
            | ErrorCode::BR_0009
            | ErrorCode::BR_0010
            | ErrorCode::BR_0011 => ErrorKind::EngineFailure,
            ErrorCode::BR_0012 => ErrorKind::ResourceExhausted,
            ErrorCode::BR_0013 | ErrorCode::BR_0014 | ErrorCode::BR_0016 => ErrorKind::BadRequest,
            ErrorCode::BR_0015 => ErrorKind::Internal,
        }
    }
}

impl ServiceError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ServiceError::AdapterUnavailable | ServiceError::AdapterEnumerationFailed(_) => {
                ErrorCode::BR_0001
            }
            ServiceError::AdapterIndexOutOfRange { .. } => ErrorCode::BR_0002,
            ServiceError::DeviceNotScanned { .. } | ServiceError::DeviceNotFound { .. } => {
                ErrorCode::BR_0003
            }
            ServiceError::DeviceNotConnected { .. } => ErrorCode::BR_0004,
            ServiceError::ScanFailed(_) => ErrorCode::BR_0005,
            ServiceError::ConnectionFailed(_) => ErrorCode::BR_0006,
            ServiceError::DisconnectFailed(_) => ErrorCode::BR_0007,
            ServiceError::ServiceDiscoveryFailed(_) => ErrorCode::BR_0008,
            ServiceError::ReadFailed(_) => ErrorCode::BR_0009,
            ServiceError::SubscribeFailed(_) => ErrorCode::BR_0010,
            ServiceError::UnsubscribeFailed(_) => ErrorCode::BR_0011,
            ServiceError::ResourceExhausted(_) => ErrorCode::BR_0012,
            ServiceError::UnknownTool(_) => ErrorCode::BR_0013,
            ServiceError::InvalidArguments(_) => ErrorCode::BR_0014,
            ServiceError::ResponseMapping(_) => ErrorCode::BR_0015,
            ServiceError::MalformedRequest(_) => ErrorCode::BR_0016,
            ServiceError::Incomplete { error, .. } => error.error_code(),
        }
    }

    pub fn partial_result(&self) -> Option<&serde_json::Value> {
        match self {
            ServiceError::Incomplete { partial_result, .. } => Some(partial_result),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(value: serde_json::Error) -> Self {
        ServiceError::ResponseMapping(value.to_string())
    }
}
