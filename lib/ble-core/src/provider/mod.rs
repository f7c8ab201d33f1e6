pub mod bluetooth_low_energy;
