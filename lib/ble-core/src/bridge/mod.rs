//! Async facade over the blocking capability surface.
//!
//! Blocking engine calls are moved onto tokio's blocking pool. Engine-driven
//! callbacks are handed over a channel to a dispatcher task running on the
//! runtime that registered them, so engine threads never run caller code.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub use self::handler::{EventKind, Handler};
use self::handler::Trampoline;
use crate::provider::bluetooth_low_energy::low_level::dto::{GattService, ManufacturerData};
use crate::provider::bluetooth_low_energy::low_level::{
    BleAdapter, BleEngine, BlePeripheral, DataCallback, PeripheralEventCallback,
    ScanEventCallback,
};
use crate::provider::bluetooth_low_energy::{BleError, DeviceAddress, MacAddress};

pub mod handler;

#[derive(Debug, Error)]
#[error("Blocking worker unavailable: {0}")]
pub struct WorkerError(String);

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Engine(#[from] BleError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error("Callback registration requires a running tokio runtime")]
    NoRuntime,
}

/// Runs a blocking task on the blocking pool and waits for it without
/// blocking the calling task.
pub async fn run_blocking<T, F>(task: F) -> Result<T, WorkerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| WorkerError(err.to_string()))
}

#[derive(Clone)]
pub struct AsyncAdapter {
    inner: Arc<dyn BleAdapter>,
}

impl AsyncAdapter {
    pub fn new(inner: Arc<dyn BleAdapter>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn BleAdapter> {
        &self.inner
    }

    pub async fn get_adapters(engine: Arc<dyn BleEngine>) -> Result<Vec<Self>, BridgeError> {
        let adapters = run_blocking(move || engine.get_adapters()).await??;
        Ok(adapters.into_iter().map(Self::new).collect())
    }

    pub fn identifier(&self) -> String {
        self.inner.identifier()
    }

    pub fn address(&self) -> MacAddress {
        self.inner.address()
    }

    async fn call<T, F>(&self, operation: &'static str, call: F) -> Result<T, BridgeError>
    where
        F: FnOnce(&dyn BleAdapter) -> Result<T, BleError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tracing::debug!("Adapter {}: {operation}", inner.identifier());
        Ok(run_blocking(move || call(inner.as_ref())).await??)
    }

    pub async fn is_powered(&self) -> Result<bool, BridgeError> {
        self.call("is_powered", |adapter| adapter.is_powered()).await
    }

    pub async fn bluetooth_enabled(&self) -> Result<bool, BridgeError> {
        self.call("bluetooth_enabled", |adapter| adapter.bluetooth_enabled())
            .await
    }

    pub async fn power_on(&self) -> Result<(), BridgeError> {
        self.call("power_on", |adapter| adapter.power_on()).await
    }

    pub async fn power_off(&self) -> Result<(), BridgeError> {
        self.call("power_off", |adapter| adapter.power_off()).await
    }

    pub async fn scan_start(&self) -> Result<(), BridgeError> {
        self.call("scan_start", |adapter| adapter.scan_start()).await
    }

    pub async fn scan_stop(&self) -> Result<(), BridgeError> {
        self.call("scan_stop", |adapter| adapter.scan_stop()).await
    }

    pub async fn scan_for(&self, timeout: Duration) -> Result<(), BridgeError> {
        self.call("scan_for", move |adapter| adapter.scan_for(timeout))
            .await
    }

    pub async fn scan_is_active(&self) -> Result<bool, BridgeError> {
        self.call("scan_is_active", |adapter| adapter.scan_is_active())
            .await
    }

    pub async fn scan_get_results(&self) -> Result<Vec<AsyncPeripheral>, BridgeError> {
        let results = self
            .call("scan_get_results", |adapter| adapter.scan_get_results())
            .await?;
        Ok(results.into_iter().map(AsyncPeripheral::new).collect())
    }

    pub async fn get_paired_peripherals(&self) -> Result<Vec<AsyncPeripheral>, BridgeError> {
        let paired = self
            .call("get_paired_peripherals", |adapter| {
                adapter.get_paired_peripherals()
            })
            .await?;
        Ok(paired.into_iter().map(AsyncPeripheral::new).collect())
    }

    pub fn set_callback_on_scan_start(
        &self,
        handler: Option<Handler<()>>,
    ) -> Result<(), BridgeError> {
        let callback = scan_trampoline(EventKind::ScanStart, handler)?;
        Ok(self.inner.set_callback_on_scan_start(callback)?)
    }

    pub fn set_callback_on_scan_stop(
        &self,
        handler: Option<Handler<()>>,
    ) -> Result<(), BridgeError> {
        let callback = scan_trampoline(EventKind::ScanStop, handler)?;
        Ok(self.inner.set_callback_on_scan_stop(callback)?)
    }

    pub fn set_callback_on_scan_found(
        &self,
        handler: Option<Handler<AsyncPeripheral>>,
    ) -> Result<(), BridgeError> {
        let callback = peripheral_trampoline(EventKind::ScanFound, handler)?;
        Ok(self.inner.set_callback_on_scan_found(callback)?)
    }

    pub fn set_callback_on_scan_updated(
        &self,
        handler: Option<Handler<AsyncPeripheral>>,
    ) -> Result<(), BridgeError> {
        let callback = peripheral_trampoline(EventKind::ScanUpdated, handler)?;
        Ok(self.inner.set_callback_on_scan_updated(callback)?)
    }
}

fn scan_trampoline(
    kind: EventKind,
    handler: Option<Handler<()>>,
) -> Result<Option<ScanEventCallback>, BridgeError> {
    let Some(handler) = handler else {
        return Ok(None);
    };

    let trampoline = Trampoline::spawn(kind, handler)?;
    Ok(Some(Box::new(move || trampoline.deliver(()))))
}

fn peripheral_trampoline(
    kind: EventKind,
    handler: Option<Handler<AsyncPeripheral>>,
) -> Result<Option<PeripheralEventCallback>, BridgeError> {
    let Some(handler) = handler else {
        return Ok(None);
    };

    let trampoline = Trampoline::spawn(kind, handler)?;
    Ok(Some(Box::new(move |peripheral| {
        trampoline.deliver(AsyncPeripheral::new(peripheral))
    })))
}

#[derive(Clone)]
pub struct AsyncPeripheral {
    inner: Arc<dyn BlePeripheral>,
}

impl AsyncPeripheral {
    pub fn new(inner: Arc<dyn BlePeripheral>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn BlePeripheral> {
        &self.inner
    }

    pub fn identifier(&self) -> String {
        self.inner.identifier()
    }

    pub fn address(&self) -> DeviceAddress {
        self.inner.address()
    }

    pub fn rssi(&self) -> i16 {
        self.inner.rssi()
    }

    pub fn is_connectable(&self) -> bool {
        self.inner.is_connectable()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub fn mtu(&self) -> u16 {
        self.inner.mtu()
    }

    pub fn manufacturer_data(&self) -> ManufacturerData {
        self.inner.manufacturer_data()
    }

    async fn call<T, F>(&self, operation: &'static str, call: F) -> Result<T, BridgeError>
    where
        F: FnOnce(&dyn BlePeripheral) -> Result<T, BleError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tracing::debug!("Peripheral {}: {operation}", inner.address());
        Ok(run_blocking(move || call(inner.as_ref())).await??)
    }

    pub async fn connect(&self) -> Result<(), BridgeError> {
        self.call("connect", |peripheral| peripheral.connect()).await
    }

    pub async fn disconnect(&self) -> Result<(), BridgeError> {
        self.call("disconnect", |peripheral| peripheral.disconnect())
            .await
    }

    pub async fn services(&self) -> Result<Vec<GattService>, BridgeError> {
        self.call("services", |peripheral| peripheral.services()).await
    }

    pub async fn read(
        &self,
        service: &str,
        characteristic: &str,
    ) -> Result<Vec<u8>, BridgeError> {
        let (service, characteristic) = (service.to_owned(), characteristic.to_owned());
        self.call("read", move |peripheral| {
            peripheral.read(&service, &characteristic)
        })
        .await
    }

    /// Subscribes `handler` to notifications of the characteristic. Payloads
    /// are delivered in arrival order on the calling runtime.
    pub async fn notify(
        &self,
        service: &str,
        characteristic: &str,
        handler: Handler<Vec<u8>>,
    ) -> Result<(), BridgeError> {
        let trampoline = Trampoline::spawn(EventKind::Notification, handler)?;
        let callback: DataCallback = Box::new(move |data| trampoline.deliver(data));

        let (service, characteristic) = (service.to_owned(), characteristic.to_owned());
        self.call("notify", move |peripheral| {
            peripheral.notify(&service, &characteristic, callback)
        })
        .await
    }

    pub async fn unsubscribe(&self, service: &str, characteristic: &str) -> Result<(), BridgeError> {
        let (service, characteristic) = (service.to_owned(), characteristic.to_owned());
        self.call("unsubscribe", move |peripheral| {
            peripheral.unsubscribe(&service, &characteristic)
        })
        .await
    }
}
