use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{PumpCount, PumpLoop, SystemState};

/// Engine-load driven pump staging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Below this engine load only one pump runs per circuit (%)
    pub single_pump_below_percent: f64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            single_pump_below_percent: 10.0,
        }
    }
}

/// A change of the running pump count on one circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingChange {
    pub pump_loop: PumpLoop,
    pub from: PumpCount,
    pub to: PumpCount,
}

/// Stages pump counts from the engine load.
///
/// The threshold is strict and has no hysteresis, so a load hovering at the
/// threshold re-stages every cycle.
#[derive(Debug, Clone, Default)]
pub struct PumpCountScheduler {
    config: StagingConfig,
}

impl PumpCountScheduler {
    pub fn new(config: StagingConfig) -> Self {
        Self { config }
    }

    pub fn count_for_load(&self, engine_load_percent: f64) -> PumpCount {
        if engine_load_percent < self.config.single_pump_below_percent {
            PumpCount::One
        } else {
            PumpCount::Two
        }
    }

    /// Stage both circuits and cap both frequencies at the pump maximum.
    ///
    /// Frequencies are not re-derived from the new count; counts and
    /// frequencies only meet inside the flow model.
    pub fn apply(&self, state: &mut SystemState) -> Vec<StagingChange> {
        let engine_load_percent = state.engine_load_percent;
        let target = self.count_for_load(engine_load_percent);
        let mut changes = Vec::new();

        for (pump_loop, count) in [
            (PumpLoop::FreshWater, &mut state.fw_count),
            (PumpLoop::SeaWater, &mut state.sw_count),
        ] {
            if *count != target {
                info!(
                    pump_loop = %pump_loop,
                    engine_load_percent,
                    from = count.get(),
                    to = target.get(),
                    "pump staging changed"
                );
                changes.push(StagingChange {
                    pump_loop,
                    from: *count,
                    to: target,
                });
                *count = target;
            }
        }

        for (pump_loop, freq) in [
            (PumpLoop::FreshWater, &mut state.fw_freq_hz),
            (PumpLoop::SeaWater, &mut state.sw_freq_hz),
        ] {
            if *freq > pump_loop.max_freq_hz() {
                info!(pump_loop = %pump_loop, freq_hz = *freq, "frequency capped at pump maximum");
                *freq = pump_loop.max_freq_hz();
            }
        }

        changes
    }
}
