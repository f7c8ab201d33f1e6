use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
#[cfg(feature = "config_env")]
use figment::providers::Env;
#[cfg(feature = "config_json")]
use figment::providers::Json;
#[cfg(feature = "config_yaml")]
use figment::providers::Yaml;
#[allow(unused_imports)]
use figment::providers::{Data, Format};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use super::ConfigParsingError;
use crate::provider::bluetooth_low_energy::low_level::dto::CharacteristicProperties;

const BATTERY_SERVICE_UUID: &str = "0000180f-0000-1000-8000-00805f9b34fb";
const BATTERY_CHARACTERISTIC_UUID: &str = "00002a19-0000-1000-8000-00805f9b34fb";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoCustomConfig;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppCustomConfigSerdeDTO<Custom> {
    #[serde(default)]
    pub(super) app: Custom,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig<Custom> {
    pub core: CoreConfig,
    #[serde(default)]
    pub app: Custom,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    pub session: SessionConfig,
    pub engine: EngineConfig,
}

/// Defaults applied to tool requests that omit the corresponding argument.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub default_scan_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub default_notify_duration: Duration,
    pub default_adapter_index: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_scan_timeout: Duration::from_millis(5000),
            default_notify_duration: Duration::from_millis(5000),
            default_adapter_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineConfig {
    Plain(PlainEngineConfig),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::Plain(PlainEngineConfig::default())
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlainEngineConfig {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub notify_interval: Duration,
    pub adapters: Vec<PlainAdapterConfig>,
}

impl Default for PlainEngineConfig {
    fn default() -> Self {
        Self {
            notify_interval: Duration::from_secs(1),
            adapters: vec![PlainAdapterConfig::default()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlainAdapterConfig {
    pub identifier: String,
    pub address: String,
    pub powered: bool,
    pub peripherals: Vec<PlainPeripheralConfig>,
}

impl Default for PlainAdapterConfig {
    fn default() -> Self {
        Self {
            identifier: "Plain Adapter".to_string(),
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            powered: true,
            peripherals: vec![PlainPeripheralConfig::default()],
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlainPeripheralConfig {
    pub identifier: String,
    pub address: String,
    pub rssi: i16,
    pub connectable: bool,
    pub mtu: u16,
    /// Scans shorter than this do not discover the peripheral.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub discovery_delay: Duration,
    pub manufacturer_data: Vec<PlainManufacturerDataConfig>,
    pub notify_payload: String,
    pub services: Vec<PlainServiceConfig>,
}

impl Default for PlainPeripheralConfig {
    fn default() -> Self {
        Self {
            identifier: "Plain Peripheral".to_string(),
            address: "11:22:33:44:55:66".to_string(),
            rssi: -60,
            connectable: true,
            mtu: 247,
            discovery_delay: Duration::ZERO,
            manufacturer_data: vec![PlainManufacturerDataConfig {
                company_id: 0x004C,
                data: "test".to_string(),
            }],
            notify_payload: "Hello from notify".to_string(),
            services: vec![PlainServiceConfig {
                uuid: BATTERY_SERVICE_UUID.to_string(),
                characteristics: vec![PlainCharacteristicConfig {
                    uuid: BATTERY_CHARACTERISTIC_UUID.to_string(),
                    properties: vec![
                        CharacteristicProperties::Read,
                        CharacteristicProperties::Notify,
                    ],
                    value: String::new(),
                }],
            }],
        }
    }
}

/// Advertised manufacturer payload, taken as raw UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainManufacturerDataConfig {
    pub company_id: u16,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainServiceConfig {
    pub uuid: String,
    #[serde(default)]
    pub characteristics: Vec<PlainCharacteristicConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainCharacteristicConfig {
    pub uuid: String,
    #[serde(default)]
    pub properties: Vec<CharacteristicProperties>,
    #[serde(default)]
    pub value: String,
}

pub enum InputFormat {
    #[cfg(feature = "config_yaml")]
    Yaml(Data<Yaml>),
    #[cfg(feature = "config_json")]
    Json(Data<Json>),
}

impl InputFormat {
    #[cfg(feature = "config_yaml")]
    pub fn yaml_file(p: impl AsRef<Path>) -> InputFormat {
        InputFormat::Yaml(Yaml::file(p))
    }

    #[cfg(feature = "config_yaml")]
    pub fn yaml_str(s: impl AsRef<str>) -> InputFormat {
        InputFormat::Yaml(Yaml::string(s.as_ref()))
    }

    #[cfg(feature = "config_json")]
    pub fn json_file(p: impl AsRef<Path>) -> InputFormat {
        InputFormat::Json(Json::file(p))
    }

    #[cfg(feature = "config_json")]
    pub fn json_str(s: impl AsRef<str>) -> InputFormat {
        InputFormat::Json(Json::string(s.as_ref()))
    }
}

impl<Custom> AppConfig<Custom>
where
    Custom: Serialize + DeserializeOwned + Default,
{
    pub fn from_files(files: &[impl AsRef<Path>]) -> Result<Self, ConfigParsingError> {
        let mut inputs: Vec<InputFormat> = Vec::with_capacity(files.len());

        for path in files {
            #[cfg(feature = "config_yaml")]
            if path
                .as_ref()
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
            {
                inputs.push(InputFormat::yaml_file(path));
                continue;
            }

            #[cfg(feature = "config_json")]
            if path.as_ref().extension() == Some("json".as_ref()) {
                inputs.push(InputFormat::json_file(path));
                continue;
            }

            return Err(ConfigParsingError::GeneralParsingError(format!(
                "Unsupported file or missing file extension: {:?}",
                path.as_ref().to_str()
            )));
        }

        AppConfig::parse(inputs)
    }

    #[cfg(feature = "config_yaml")]
    pub fn from_yaml(
        configs: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ConfigParsingError> {
        let inputs = configs.into_iter().map(InputFormat::yaml_str);

        AppConfig::parse(inputs)
    }

    pub fn parse(
        inputs: impl IntoIterator<Item = InputFormat>,
    ) -> Result<Self, ConfigParsingError> {
        let mut figment = Figment::new();

        for data in inputs {
            figment = match data {
                #[cfg(feature = "config_yaml")]
                InputFormat::Yaml(content) => figment.merge(content),
                #[cfg(feature = "config_json")]
                InputFormat::Json(content) => figment.merge(content),
            };
        }

        #[cfg(feature = "config_env")]
        {
            figment = figment.merge(Env::prefixed("BLE_").split("__").lowercase(false));
        }

        let core = figment
            .extract::<CoreConfig>()
            .map_err(|e| ConfigParsingError::GeneralParsingError(e.to_string()))?;
        let custom = figment
            .extract::<AppCustomConfigSerdeDTO<Custom>>()
            .map_err(|e| ConfigParsingError::GeneralParsingError(e.to_string()))?;
        Ok(Self {
            core,
            app: custom.app,
        })
    }
}
