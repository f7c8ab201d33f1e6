use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::peripheral::PlainPeripheral;
use crate::config::core_config::PlainAdapterConfig;
use crate::provider::bluetooth_low_energy::low_level::{
    BleAdapter, BlePeripheral, PeripheralEventCallback, ScanEventCallback,
};
use crate::provider::bluetooth_low_energy::{BleError, DeviceAddress, MacAddress};
use crate::util::lock;

type SharedScanCallback = Arc<dyn Fn() + Send + Sync>;
type SharedPeripheralCallback = Arc<dyn Fn(Arc<dyn BlePeripheral>) + Send + Sync>;

#[derive(Default, Clone)]
struct ScanCallbacks {
    on_start: Option<SharedScanCallback>,
    on_stop: Option<SharedScanCallback>,
    on_found: Option<SharedPeripheralCallback>,
    on_updated: Option<SharedPeripheralCallback>,
}

#[derive(Default)]
struct ScanState {
    powered: bool,
    active: bool,
    generation: u64,
    results: Vec<Arc<PlainPeripheral>>,
    seen: HashSet<DeviceAddress>,
    callbacks: ScanCallbacks,
}

pub struct PlainAdapter {
    identifier: String,
    address: MacAddress,
    peripherals: Vec<Arc<PlainPeripheral>>,
    state: Arc<Mutex<ScanState>>,
}

impl PlainAdapter {
    pub fn new(config: &PlainAdapterConfig, notify_interval: Duration) -> Self {
        let mut peripherals: Vec<_> = config
            .peripherals
            .iter()
            .map(|peripheral| Arc::new(PlainPeripheral::new(peripheral.clone(), notify_interval)))
            .collect();
        peripherals.sort_by_key(|peripheral| peripheral.discovery_delay());

        Self {
            identifier: config.identifier.to_owned(),
            address: config.address.to_owned(),
            peripherals,
            state: Arc::new(Mutex::new(ScanState {
                powered: config.powered,
                ..Default::default()
            })),
        }
    }

    fn visible_at_start(&self) -> Vec<Arc<PlainPeripheral>> {
        self.peripherals
            .iter()
            .filter(|peripheral| peripheral.discovery_delay().is_zero())
            .cloned()
            .collect()
    }

    /// Adds a peripheral to the current results and picks the callback
    /// matching whether it was seen by an earlier scan.
    fn record(
        state: &Mutex<ScanState>,
        peripheral: &Arc<PlainPeripheral>,
    ) -> Option<SharedPeripheralCallback> {
        let mut state = lock(state);
        state.results.push(peripheral.clone());
        if state.seen.insert(peripheral.address()) {
            state.callbacks.on_found.clone()
        } else {
            state.callbacks.on_updated.clone()
        }
    }

    fn report(state: &Mutex<ScanState>, generation: u64, peripheral: Arc<PlainPeripheral>) {
        {
            let state = lock(state);
            if !state.active || state.generation != generation {
                return;
            }
        }

        if let Some(callback) = Self::record(state, &peripheral) {
            callback(peripheral as Arc<dyn BlePeripheral>);
        }
    }
}

fn spawn_engine_thread(
    name: &str,
    task: impl FnOnce() + Send + 'static,
) -> Result<(), BleError> {
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(task)
        .map(|_| ())
        .map_err(|err| BleError::Unknown {
            reason: format!("failed to spawn engine thread: {err}"),
        })
}

impl BleAdapter for PlainAdapter {
    fn identifier(&self) -> String {
        self.identifier.to_owned()
    }

    fn address(&self) -> MacAddress {
        self.address.to_owned()
    }

    fn is_powered(&self) -> Result<bool, BleError> {
        Ok(lock(&self.state).powered)
    }

    fn bluetooth_enabled(&self) -> Result<bool, BleError> {
        Ok(lock(&self.state).powered)
    }

    fn power_on(&self) -> Result<(), BleError> {
        lock(&self.state).powered = true;
        Ok(())
    }

    fn power_off(&self) -> Result<(), BleError> {
        if lock(&self.state).active {
            self.scan_stop()?;
        }
        lock(&self.state).powered = false;
        Ok(())
    }

    fn scan_start(&self) -> Result<(), BleError> {
        let (generation, on_start, visible) = {
            let mut state = lock(&self.state);
            if !state.powered {
                return Err(BleError::AdapterNotEnabled);
            }
            if state.active {
                return Err(BleError::ScanAlreadyStarted);
            }

            state.active = true;
            state.generation += 1;
            state.results.clear();
            (state.generation, state.callbacks.on_start.clone(), self.visible_at_start())
        };

        // advertisements already on air are part of the snapshot right away
        let visible: Vec<_> = visible
            .into_iter()
            .map(|peripheral| (Self::record(&self.state, &peripheral), peripheral))
            .collect();

        let state = self.state.clone();
        let delayed: Vec<_> = self
            .peripherals
            .iter()
            .filter(|peripheral| !peripheral.discovery_delay().is_zero())
            .cloned()
            .collect();
        spawn_engine_thread("plain-scan", move || {
            if let Some(on_start) = on_start {
                on_start();
            }

            for (callback, peripheral) in visible {
                if let Some(callback) = callback {
                    callback(peripheral as Arc<dyn BlePeripheral>);
                }
            }

            let started = Instant::now();
            for peripheral in delayed {
                if let Some(remaining) = peripheral.discovery_delay().checked_sub(started.elapsed())
                {
                    thread::sleep(remaining);
                }
                Self::report(&state, generation, peripheral);
            }
        })
    }

    fn scan_stop(&self) -> Result<(), BleError> {
        let on_stop = {
            let mut state = lock(&self.state);
            if !state.active {
                return Ok(());
            }
            state.active = false;
            state.callbacks.on_stop.clone()
        };

        match on_stop {
            Some(on_stop) => spawn_engine_thread("plain-scan-stop", move || on_stop()),
            None => Ok(()),
        }
    }

    fn scan_for(&self, timeout: Duration) -> Result<(), BleError> {
        self.scan_start()?;
        thread::sleep(timeout);
        self.scan_stop()
    }

    fn scan_is_active(&self) -> Result<bool, BleError> {
        Ok(lock(&self.state).active)
    }

    fn scan_get_results(&self) -> Result<Vec<Arc<dyn BlePeripheral>>, BleError> {
        Ok(lock(&self.state)
            .results
            .iter()
            .map(|peripheral| peripheral.clone() as Arc<dyn BlePeripheral>)
            .collect())
    }

    fn get_paired_peripherals(&self) -> Result<Vec<Arc<dyn BlePeripheral>>, BleError> {
        Ok(self
            .peripherals
            .iter()
            .filter(|peripheral| peripheral.is_paired())
            .map(|peripheral| peripheral.clone() as Arc<dyn BlePeripheral>)
            .collect())
    }

    fn set_callback_on_scan_start(
        &self,
        callback: Option<ScanEventCallback>,
    ) -> Result<(), BleError> {
        lock(&self.state).callbacks.on_start = callback.map(Arc::from);
        Ok(())
    }

    fn set_callback_on_scan_stop(
        &self,
        callback: Option<ScanEventCallback>,
    ) -> Result<(), BleError> {
        lock(&self.state).callbacks.on_stop = callback.map(Arc::from);
        Ok(())
    }

    fn set_callback_on_scan_found(
        &self,
        callback: Option<PeripheralEventCallback>,
    ) -> Result<(), BleError> {
        lock(&self.state).callbacks.on_found = callback.map(Arc::from);
        Ok(())
    }

    fn set_callback_on_scan_updated(
        &self,
        callback: Option<PeripheralEventCallback>,
    ) -> Result<(), BleError> {
        lock(&self.state).callbacks.on_updated = callback.map(Arc::from);
        Ok(())
    }
}
