use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::{PumpLoop, SystemState};

/// Plausibility envelope for the four temperature sensors (°C)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorLimits {
    pub t1_c: (f64, f64),
    pub t2_c: (f64, f64),
    pub t4_c: (f64, f64),
    pub t5_c: (f64, f64),
}

impl Default for SensorLimits {
    fn default() -> Self {
        Self {
            t1_c: (0.0, 50.0),
            t2_c: (0.0, 60.0),
            t4_c: (0.0, 70.0),
            t5_c: (0.0, 70.0),
        }
    }
}

/// Fail-safe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailSafeConfig {
    pub enabled: bool,
    /// Frequency both circuits are forced to on a sensor fault (Hz),
    /// limited to each circuit's own range
    pub safe_frequency_hz: f64,
    pub limits: SensorLimits,
}

impl Default for FailSafeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            safe_frequency_hz: 45.0,
            limits: SensorLimits::default(),
        }
    }
}

/// A temperature reading outside its plausibility envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorFault {
    pub sensor: &'static str,
    pub value_c: f64,
    pub min_c: f64,
    pub max_c: f64,
}

impl std::fmt::Display for SensorFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} reading {:.1}°C outside {:.1}-{:.1}°C",
            self.sensor, self.value_c, self.min_c, self.max_c
        )
    }
}

/// Sensor-range fail-safe.
///
/// Runs after the normal control laws and independently of the alarm
/// monitor. When any temperature is implausible both pump frequencies are
/// overridden with a fixed safe value for this cycle.
#[derive(Debug, Clone, Default)]
pub struct SensorFailSafe {
    config: FailSafeConfig,
}

impl SensorFailSafe {
    pub fn new(config: FailSafeConfig) -> Self {
        Self { config }
    }

    /// First implausible reading, if any. NaN readings are always faults.
    pub fn check(&self, state: &SystemState) -> Option<SensorFault> {
        let limits = &self.config.limits;
        [
            ("T1", state.t1_c, limits.t1_c),
            ("T2", state.t2_c, limits.t2_c),
            ("T4", state.t4_c, limits.t4_c),
            ("T5", state.t5_c, limits.t5_c),
        ]
        .into_iter()
        .find(|(_, value, (min, max))| !(*min..=*max).contains(value))
        .map(|(sensor, value_c, (min_c, max_c))| SensorFault {
            sensor,
            value_c,
            min_c,
            max_c,
        })
    }

    /// Check the sensors and force the safe frequency on a fault.
    pub fn apply(&self, state: &mut SystemState) -> Option<SensorFault> {
        if !self.config.enabled {
            return None;
        }

        let fault = self.check(state)?;
        error!(
            sensor = fault.sensor,
            value_c = fault.value_c,
            min_c = fault.min_c,
            max_c = fault.max_c,
            safe_frequency_hz = self.config.safe_frequency_hz,
            "SENSOR FAULT: forcing pumps to fail-safe frequency"
        );
        state.fw_freq_hz = PumpLoop::FreshWater.clamp_freq(self.config.safe_frequency_hz);
        state.sw_freq_hz = PumpLoop::SeaWater.clamp_freq(self.config.safe_frequency_hz);
        Some(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_readings_untouched() {
        let fail_safe = SensorFailSafe::default();
        let mut state = SystemState {
            fw_freq_hz: 52.0,
            sw_freq_hz: 38.0,
            ..Default::default()
        };
        assert!(fail_safe.apply(&mut state).is_none());
        assert_eq!(state.fw_freq_hz, 52.0);
        assert_eq!(state.sw_freq_hz, 38.0);
    }

    #[test]
    fn test_fault_forces_safe_frequency() {
        let fail_safe = SensorFailSafe::default();
        let mut state = SystemState {
            t2_c: 61.0,
            fw_freq_hz: 52.0,
            sw_freq_hz: 38.0,
            ..Default::default()
        };
        let fault = fail_safe.apply(&mut state).unwrap();
        assert_eq!(fault.sensor, "T2");
        assert_eq!(state.fw_freq_hz, 45.0);
        assert_eq!(state.sw_freq_hz, 45.0);
    }

    #[test]
    fn test_first_fault_reported() {
        let fail_safe = SensorFailSafe::default();
        let state = SystemState {
            t1_c: -1.0,
            t5_c: 75.0,
            ..Default::default()
        };
        assert_eq!(fail_safe.check(&state).unwrap().sensor, "T1");
    }

    #[test]
    fn test_nan_is_a_fault() {
        let fail_safe = SensorFailSafe::default();
        let state = SystemState {
            t4_c: f64::NAN,
            ..Default::default()
        };
        assert_eq!(fail_safe.check(&state).unwrap().sensor, "T4");
    }

    #[test]
    fn test_safe_frequency_respects_loop_ranges() {
        let fail_safe = SensorFailSafe::new(FailSafeConfig {
            safe_frequency_hz: 35.0,
            ..Default::default()
        });
        let mut state = SystemState {
            t5_c: 72.0,
            ..Default::default()
        };
        fail_safe.apply(&mut state);
        assert_eq!(state.fw_freq_hz, 40.0);
        assert_eq!(state.sw_freq_hz, 35.0);
    }

    #[test]
    fn test_disabled_fail_safe_does_nothing() {
        let fail_safe = SensorFailSafe::new(FailSafeConfig {
            enabled: false,
            ..Default::default()
        });
        let mut state = SystemState {
            t1_c: 80.0,
            fw_freq_hz: 52.0,
            ..Default::default()
        };
        assert!(fail_safe.apply(&mut state).is_none());
        assert_eq!(state.fw_freq_hz, 52.0);
    }
}
