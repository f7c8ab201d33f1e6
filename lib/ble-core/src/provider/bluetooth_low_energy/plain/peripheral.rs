use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::config::core_config::{PlainCharacteristicConfig, PlainPeripheralConfig};
use crate::provider::bluetooth_low_energy::low_level::dto::{
    CharacteristicProperties, GattCharacteristic, GattService, ManufacturerData,
};
use crate::provider::bluetooth_low_energy::low_level::{
    BlePeripheral, CharacteristicKey, DataCallback,
};
use crate::provider::bluetooth_low_energy::{BleError, DeviceAddress};
use crate::util::lock;

type SharedDataCallback = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

struct Subscription {
    id: u64,
    callback: SharedDataCallback,
}

pub struct PlainPeripheral {
    config: PlainPeripheralConfig,
    notify_interval: Duration,
    connected: AtomicBool,
    paired: AtomicBool,
    next_subscription_id: AtomicU64,
    subscriptions: Arc<Mutex<HashMap<CharacteristicKey, Subscription>>>,
}

impl PlainPeripheral {
    pub fn new(config: PlainPeripheralConfig, notify_interval: Duration) -> Self {
        Self {
            config,
            notify_interval,
            connected: AtomicBool::new(false),
            paired: AtomicBool::new(false),
            next_subscription_id: AtomicU64::new(0),
            subscriptions: Default::default(),
        }
    }

    pub fn discovery_delay(&self) -> Duration {
        self.config.discovery_delay
    }

    pub fn is_paired(&self) -> bool {
        self.paired.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<(), BleError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(BleError::DeviceNotConnected {
                address: self.address(),
            })
        }
    }

    fn find_characteristic(
        &self,
        service: &str,
        characteristic: &str,
    ) -> Result<&PlainCharacteristicConfig, BleError> {
        let service_config = self
            .config
            .services
            .iter()
            .find(|candidate| candidate.uuid.eq_ignore_ascii_case(service))
            .ok_or_else(|| BleError::ServiceNotFound {
                service: service.to_owned(),
            })?;

        service_config
            .characteristics
            .iter()
            .find(|candidate| candidate.uuid.eq_ignore_ascii_case(characteristic))
            .ok_or_else(|| BleError::CharacteristicNotFound {
                characteristic: characteristic.to_owned(),
            })
    }

    fn ensure_property(
        characteristic: &PlainCharacteristicConfig,
        service: &str,
        allowed: &[CharacteristicProperties],
        operation: &str,
    ) -> Result<(), BleError> {
        if allowed
            .iter()
            .any(|property| characteristic.properties.contains(property))
        {
            return Ok(());
        }

        Err(BleError::InvalidCharacteristicOperation {
            service: service.to_owned(),
            characteristic: characteristic.uuid.to_owned(),
            operation: operation.to_owned(),
        })
    }
}

impl BlePeripheral for PlainPeripheral {
    fn identifier(&self) -> String {
        self.config.identifier.to_owned()
    }

    fn address(&self) -> DeviceAddress {
        self.config.address.to_owned()
    }

    fn rssi(&self) -> i16 {
        self.config.rssi
    }

    fn is_connectable(&self) -> bool {
        self.config.connectable
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn mtu(&self) -> u16 {
        if self.is_connected() {
            self.config.mtu
        } else {
            0
        }
    }

    fn manufacturer_data(&self) -> ManufacturerData {
        self.config
            .manufacturer_data
            .iter()
            .map(|entry| (entry.company_id, entry.data.as_bytes().to_vec()))
            .collect()
    }

    fn connect(&self) -> Result<(), BleError> {
        if !self.config.connectable {
            return Err(BleError::DeviceNotConnectable {
                address: self.address(),
            });
        }

        self.connected.store(true, Ordering::SeqCst);
        self.paired.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BleError> {
        self.connected.store(false, Ordering::SeqCst);
        lock(&self.subscriptions).clear();
        Ok(())
    }

    fn services(&self) -> Result<Vec<GattService>, BleError> {
        if !self.is_connected() {
            return Ok(vec![]);
        }

        Ok(self
            .config
            .services
            .iter()
            .map(|service| GattService {
                uuid: service.uuid.to_owned(),
                characteristics: service
                    .characteristics
                    .iter()
                    .map(|characteristic| GattCharacteristic {
                        uuid: characteristic.uuid.to_owned(),
                        properties: characteristic.properties.to_owned(),
                    })
                    .collect(),
            })
            .collect())
    }

    fn read(&self, service: &str, characteristic: &str) -> Result<Vec<u8>, BleError> {
        self.ensure_connected()?;
        let config = self.find_characteristic(service, characteristic)?;
        Self::ensure_property(config, service, &[CharacteristicProperties::Read], "read")?;

        Ok(config.value.as_bytes().to_vec())
    }

    fn notify(
        &self,
        service: &str,
        characteristic: &str,
        callback: DataCallback,
    ) -> Result<(), BleError> {
        self.ensure_connected()?;
        let config = self.find_characteristic(service, characteristic)?;
        Self::ensure_property(
            config,
            service,
            &[
                CharacteristicProperties::Notify,
                CharacteristicProperties::Indicate,
            ],
            "notify",
        )?;

        let key = CharacteristicKey::new(service, characteristic);
        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscriptions).insert(
            key.clone(),
            Subscription {
                id,
                callback: Arc::from(callback),
            },
        );

        let subscriptions = self.subscriptions.clone();
        let interval = self.notify_interval;
        let payload = self.config.notify_payload.as_bytes().to_vec();
        thread::Builder::new()
            .name("plain-notify".to_owned())
            .spawn(move || {
                loop {
                    thread::sleep(interval);

                    let callback = match lock(&subscriptions).get(&key) {
                        Some(subscription) if subscription.id == id => {
                            subscription.callback.clone()
                        }
                        _ => return,
                    };
                    callback(payload.clone());
                }
            })
            .map(|_| ())
            .map_err(|err| BleError::Unknown {
                reason: format!("failed to spawn notification thread: {err}"),
            })
    }

    fn unsubscribe(&self, service: &str, characteristic: &str) -> Result<(), BleError> {
        lock(&self.subscriptions).remove(&CharacteristicKey::new(service, characteristic));
        Ok(())
    }
}
