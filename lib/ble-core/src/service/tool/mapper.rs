use std::time::Duration;

use super::dto::{
    AdapterResponseDTO, ConnectionResponseDTO, NotificationResponseDTO, NotificationType,
    ReadResponseDTO, ScanResultResponseDTO, ServiceResponseDTO, ServicesResponseDTO,
};
use crate::service::session::dto::{
    AdapterDetails, ConnectOutcome, DisconnectOutcome, ScannedPeripheral, ServicesOutcome,
};
use crate::util::payload::{to_hex, to_utf8_ignore_invalid};

impl From<AdapterDetails> for AdapterResponseDTO {
    fn from(value: AdapterDetails) -> Self {
        Self {
            identifier: value.identifier,
            address: value.address,
        }
    }
}

impl From<ScannedPeripheral> for ScanResultResponseDTO {
    fn from(value: ScannedPeripheral) -> Self {
        Self {
            identifier: value.identifier,
            address: value.address,
            rssi: value.rssi,
            connectable: value.connectable,
            manufacturer_data: value
                .manufacturer_data
                .into_iter()
                .map(|(company_id, data)| (format!("{company_id:04x}"), to_hex(&data)))
                .collect(),
        }
    }
}

impl From<ConnectOutcome> for ConnectionResponseDTO {
    fn from(value: ConnectOutcome) -> Self {
        let message = if value.already_connected {
            format!("Already connected to {}", value.identifier)
        } else {
            format!("Connected to {}", value.identifier)
        };

        Self {
            message,
            address: value.address,
        }
    }
}

impl From<DisconnectOutcome> for ConnectionResponseDTO {
    fn from(value: DisconnectOutcome) -> Self {
        Self {
            message: format!("Disconnected from {}", value.identifier),
            address: value.address,
        }
    }
}

impl From<ServicesOutcome> for ServicesResponseDTO {
    fn from(value: ServicesOutcome) -> Self {
        match value {
            ServicesOutcome::Disconnected { address } => ServicesResponseDTO::Disconnected {
                address,
                connected: false,
            },
            ServicesOutcome::Connected {
                identifier,
                address,
                mtu,
                services,
            } => ServicesResponseDTO::Connected {
                identifier,
                address,
                connected: true,
                mtu,
                services: services
                    .into_iter()
                    .map(|service| ServiceResponseDTO {
                        uuid: service.uuid,
                        characteristics: service
                            .characteristics
                            .into_iter()
                            .map(|characteristic| characteristic.uuid)
                            .collect(),
                    })
                    .collect(),
            },
        }
    }
}

pub(super) fn read_response(service_uuid: String, char_uuid: String, data: &[u8]) -> ReadResponseDTO {
    ReadResponseDTO {
        service_uuid,
        char_uuid,
        data_hex: to_hex(data),
        data_utf8: to_utf8_ignore_invalid(data),
    }
}

pub(super) fn notification_response(
    service: &str,
    characteristic: &str,
    data: &[u8],
) -> NotificationResponseDTO {
    NotificationResponseDTO {
        service: service.to_owned(),
        characteristic: characteristic.to_owned(),
        data_hex: to_hex(data),
        data_utf8: to_utf8_ignore_invalid(data),
        r#type: NotificationType::Notification,
    }
}

/// Negative durations collapse to zero.
pub(super) fn duration_from_millis(millis: i64) -> Duration {
    Duration::from_millis(u64::try_from(millis).unwrap_or_default())
}
