//! Pump affinity model: flow scales linearly with drive frequency and with
//! the number of pumps running in parallel.

use crate::domain::{PumpCount, PumpLoop};

/// Rated drive frequency at which `base_at_60hz_m3h` is delivered
pub const RATED_FREQ_HZ: f64 = 60.0;

/// Volumetric flow (m³/h) of `count` identical pumps running at `freq_hz`.
pub fn pump_flow_m3h(freq_hz: f64, count: PumpCount, base_at_60hz_m3h: f64) -> f64 {
    base_at_60hz_m3h * (freq_hz / RATED_FREQ_HZ) * count.factor()
}

/// Flow of one circuit using its rated single-pump capacity.
pub fn loop_flow(pump_loop: PumpLoop, freq_hz: f64, count: PumpCount) -> f64 {
    pump_flow_m3h(freq_hz, count, pump_loop.base_flow_m3h())
}
