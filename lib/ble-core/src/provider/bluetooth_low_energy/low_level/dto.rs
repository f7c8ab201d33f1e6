use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::provider::bluetooth_low_energy::{CharacteristicUUID, ServiceUUID};

pub type CompanyId = u16;
pub type ManufacturerData = HashMap<CompanyId, Vec<u8>>;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CharacteristicProperties {
    Read,
    WriteRequest,
    WriteCommand,
    Notify,
    Indicate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GattCharacteristic {
    pub uuid: CharacteristicUUID,
    pub properties: Vec<CharacteristicProperties>,
}

impl GattCharacteristic {
    pub fn supports(&self, property: CharacteristicProperties) -> bool {
        self.properties.contains(&property)
    }
}

/// A discovered GATT service with its characteristics in engine order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GattService {
    pub uuid: ServiceUUID,
    pub characteristics: Vec<GattCharacteristic>,
}
