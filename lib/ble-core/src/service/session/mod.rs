//! Process-wide BLE session state.
//!
//! Requests arrive as independent calls, so everything an interactive
//! session would keep implicitly lives here: the known adapters, the active
//! one, the last scan snapshot, the connected peripherals keyed by address
//! and the notification buffers of running collections.
//!
//! All operations block the calling thread. The state mutex is never held
//! across an engine call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

use self::dto::{
    AdapterDetails, ConnectOutcome, DisconnectOutcome, NotificationCollection,
    ScannedPeripheral, ServicesOutcome,
};
use crate::provider::bluetooth_low_energy::{BleError, DeviceAddress};
use crate::provider::bluetooth_low_energy::low_level::{
    BleAdapter, BleEngine, BlePeripheral, CharacteristicKey,
};
use crate::service::error::ServiceError;
use crate::util::lock;

pub mod dto;

type NotificationBuffers = HashMap<CharacteristicKey, Vec<Vec<u8>>>;

#[derive(Default)]
struct SessionState {
    adapters: Vec<Arc<dyn BleAdapter>>,
    active_adapter: Option<Arc<dyn BleAdapter>>,
    scan_results: Vec<Arc<dyn BlePeripheral>>,
    peripherals: HashMap<DeviceAddress, Arc<dyn BlePeripheral>>,
    notifications: HashMap<DeviceAddress, NotificationBuffers>,
}

pub struct BleSession {
    engine: Arc<dyn BleEngine>,
    state: Arc<Mutex<SessionState>>,
    address_locks: Mutex<HashMap<DeviceAddress, Arc<Mutex<()>>>>,
}

impl BleSession {
    pub fn new(engine: Arc<dyn BleEngine>) -> Self {
        Self {
            engine,
            state: Default::default(),
            address_locks: Default::default(),
        }
    }

    /// Re-enumerates adapters. The first adapter becomes active if none is;
    /// an existing selection is kept.
    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    pub fn refresh_adapters(&self) -> Result<Vec<Arc<dyn BleAdapter>>, ServiceError> {
        let adapters = self
            .engine
            .get_adapters()
            .map_err(ServiceError::AdapterEnumerationFailed)?;

        let mut state = lock(&self.state);
        if state.active_adapter.is_none() {
            state.active_adapter = adapters.first().cloned();
        }
        state.adapters = adapters.clone();

        Ok(adapters)
    }

    pub fn adapters(&self) -> Result<Vec<AdapterDetails>, ServiceError> {
        Ok(self
            .refresh_adapters()?
            .iter()
            .map(|adapter| AdapterDetails {
                identifier: adapter.identifier(),
                address: adapter.address(),
            })
            .collect())
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    pub fn select_adapter(&self, index: i64) -> Result<Arc<dyn BleAdapter>, ServiceError> {
        let adapters = self.refresh_adapters()?;
        if adapters.is_empty() {
            return Err(ServiceError::AdapterUnavailable);
        }

        let adapter = usize::try_from(index)
            .ok()
            .and_then(|index| adapters.get(index))
            .ok_or(ServiceError::AdapterIndexOutOfRange {
                index,
                available: adapters.len(),
            })?
            .clone();

        lock(&self.state).active_adapter = Some(adapter.clone());
        Ok(adapter)
    }

    pub fn active_adapter(&self) -> Result<Arc<dyn BleAdapter>, ServiceError> {
        lock(&self.state)
            .active_adapter
            .clone()
            .ok_or(ServiceError::AdapterUnavailable)
    }

    /// Selects the adapter at `adapter_index`, scans for `timeout` and
    /// replaces the cached scan results with the engine's snapshot.
    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    pub fn scan(
        &self,
        adapter_index: i64,
        timeout: Duration,
    ) -> Result<Vec<ScannedPeripheral>, ServiceError> {
        let adapter = self.select_adapter(adapter_index)?;

        adapter.scan_for(timeout).map_err(ServiceError::ScanFailed)?;
        let results = adapter
            .scan_get_results()
            .map_err(ServiceError::ScanFailed)?;

        lock(&self.state).scan_results = results.clone();
        tracing::debug!("Scan found {} peripheral(s)", results.len());

        Ok(results
            .iter()
            .map(|peripheral| ScannedPeripheral {
                identifier: peripheral.identifier(),
                address: peripheral.address(),
                rssi: peripheral.rssi(),
                connectable: peripheral.is_connectable(),
                manufacturer_data: peripheral.manufacturer_data(),
            })
            .collect())
    }

    /// Connects to a peripheral from the last scan, or reconnects a tracked
    /// one. Connecting an already connected address is a no-op.
    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    pub fn connect(&self, address: &str) -> Result<ConnectOutcome, ServiceError> {
        self.serialized(address, || self.connect_locked(address))
    }

    fn connect_locked(&self, address: &str) -> Result<ConnectOutcome, ServiceError> {
        let (tracked, scan_results) = {
            let state = lock(&self.state);
            (
                state.peripherals.get(address).cloned(),
                state.scan_results.clone(),
            )
        };

        if let Some(peripheral) = &tracked {
            if peripheral.is_connected() {
                return Ok(ConnectOutcome {
                    identifier: peripheral.identifier(),
                    address: address.to_owned(),
                    already_connected: true,
                });
            }
        }

        let target = scan_results
            .into_iter()
            .find(|peripheral| peripheral.address() == address)
            .or(tracked)
            .ok_or_else(|| ServiceError::DeviceNotScanned {
                address: address.to_owned(),
            })?;

        target.connect().map_err(ServiceError::ConnectionFailed)?;
        let identifier = target.identifier();

        let mut state = lock(&self.state);
        state.peripherals.insert(address.to_owned(), target);
        state.notifications.entry(address.to_owned()).or_default();

        Ok(ConnectOutcome {
            identifier,
            address: address.to_owned(),
            already_connected: false,
        })
    }

    /// Disconnects a tracked peripheral. Tracking ends only when the engine
    /// reports success, so a failed call can be retried.
    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    pub fn disconnect(&self, address: &str) -> Result<DisconnectOutcome, ServiceError> {
        self.serialized(address, || self.disconnect_locked(address))
    }

    fn disconnect_locked(&self, address: &str) -> Result<DisconnectOutcome, ServiceError> {
        let peripheral = self.tracked(address)?;
        peripheral
            .disconnect()
            .map_err(ServiceError::DisconnectFailed)?;

        {
            let mut state = lock(&self.state);
            state.peripherals.remove(address);
            state.notifications.remove(address);
        }

        Ok(DisconnectOutcome {
            identifier: peripheral.identifier(),
            address: address.to_owned(),
        })
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    pub fn services(&self, address: &str) -> Result<ServicesOutcome, ServiceError> {
        let peripheral = self.tracked(address)?;
        if !peripheral.is_connected() {
            return Ok(ServicesOutcome::Disconnected {
                address: address.to_owned(),
            });
        }

        let services = peripheral
            .services()
            .map_err(ServiceError::ServiceDiscoveryFailed)?;

        Ok(ServicesOutcome::Connected {
            identifier: peripheral.identifier(),
            address: address.to_owned(),
            mtu: peripheral.mtu(),
            services,
        })
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    pub fn read(
        &self,
        address: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        let peripheral = self.connected(address)?;

        peripheral
            .read(service, characteristic)
            .map_err(ServiceError::ReadFailed)
    }

    /// Subscribes to a characteristic, collects notifications for `duration`
    /// and unsubscribes again.
    ///
    /// The unsubscribe is issued whenever a subscribe was attempted, including
    /// when the subscribe itself failed or the wait unwinds.
    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    pub fn notify_collect(
        &self,
        address: &str,
        service: &str,
        characteristic: &str,
        duration: Duration,
    ) -> Result<NotificationCollection, ServiceError> {
        self.serialized(address, || {
            self.notify_collect_locked(address, service, characteristic, duration)
        })
    }

    fn notify_collect_locked(
        &self,
        address: &str,
        service: &str,
        characteristic: &str,
        duration: Duration,
    ) -> Result<NotificationCollection, ServiceError> {
        let peripheral = self.connected(address)?;
        let key = CharacteristicKey::new(service, characteristic);

        lock(&self.state)
            .notifications
            .entry(address.to_owned())
            .or_default()
            .insert(key.clone(), vec![]);

        let subscription = SubscriptionGuard::new(peripheral.clone(), key.clone());
        let collector = collector(Arc::downgrade(&self.state), address.to_owned(), key.clone());

        if let Err(err) = peripheral.notify(service, characteristic, collector) {
            drop(subscription);
            self.take_samples(address, &key);
            return Err(ServiceError::SubscribeFailed(err));
        }

        thread::sleep(duration);

        let unsubscribe_error = subscription.release().err().map(|err| {
            tracing::warn!("Failed to unsubscribe from {address}: {err}");
            ServiceError::UnsubscribeFailed(err)
        });

        Ok(NotificationCollection {
            samples: self.take_samples(address, &key),
            unsubscribe_error,
        })
    }

    /// Runs `operation` holding the lock of `address`. The entry is removed
    /// from the lock map once no other call holds or waits on it.
    fn serialized<T>(&self, address: &str, operation: impl FnOnce() -> T) -> T {
        let address_lock = lock(&self.address_locks)
            .entry(address.to_owned())
            .or_default()
            .clone();

        let result = {
            let _serial = lock(&address_lock);
            operation()
        };

        // clones are only taken under the map lock, so the count cannot grow here
        let mut address_locks = lock(&self.address_locks);
        if Arc::strong_count(&address_lock) == 2 {
            address_locks.remove(address);
        }

        result
    }

    fn tracked(&self, address: &str) -> Result<Arc<dyn BlePeripheral>, ServiceError> {
        lock(&self.state)
            .peripherals
            .get(address)
            .cloned()
            .ok_or_else(|| ServiceError::DeviceNotFound {
                address: address.to_owned(),
            })
    }

    fn connected(&self, address: &str) -> Result<Arc<dyn BlePeripheral>, ServiceError> {
        let peripheral = self.tracked(address)?;
        if !peripheral.is_connected() {
            return Err(ServiceError::DeviceNotConnected {
                address: address.to_owned(),
            });
        }

        Ok(peripheral)
    }

    fn take_samples(&self, address: &str, key: &CharacteristicKey) -> Vec<Vec<u8>> {
        lock(&self.state)
            .notifications
            .get_mut(address)
            .and_then(|buffers| buffers.remove(key))
            .unwrap_or_default()
    }
}

/// Engine-side notification callback. Appends to the buffer of a running
/// collection; payloads arriving after the collection ended are dropped.
fn collector(
    state: Weak<Mutex<SessionState>>,
    address: DeviceAddress,
    key: CharacteristicKey,
) -> Box<dyn Fn(Vec<u8>) + Send + Sync> {
    Box::new(move |data| {
        let Some(state) = state.upgrade() else {
            return;
        };

        if let Some(buffer) = lock(&state)
            .notifications
            .get_mut(&address)
            .and_then(|buffers| buffers.get_mut(&key))
        {
            buffer.push(data);
        }
    })
}

/// Unsubscribes on drop unless released explicitly.
struct SubscriptionGuard {
    peripheral: Arc<dyn BlePeripheral>,
    key: CharacteristicKey,
    released: bool,
}

impl SubscriptionGuard {
    fn new(peripheral: Arc<dyn BlePeripheral>, key: CharacteristicKey) -> Self {
        Self {
            peripheral,
            key,
            released: false,
        }
    }

    fn release(mut self) -> Result<(), BleError> {
        self.released = true;
        self.peripheral
            .unsubscribe(&self.key.service, &self.key.characteristic)
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        if let Err(err) = self
            .peripheral
            .unsubscribe(&self.key.service, &self.key.characteristic)
        {
            tracing::warn!(
                "Failed to unsubscribe from {}/{}: {err}",
                self.key.service,
                self.key.characteristic
            );
        }
    }
}
