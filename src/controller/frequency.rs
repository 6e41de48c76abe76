//! # Pump Frequency Laws
//!
//! - **Fresh water**: proportional snap on the F.W. inlet excess over 36 °C,
//!   40 Hz at no excess and 60 Hz at 17 °C excess or more. Applied every
//!   cycle without smoothing. A rate-limited PID law is available as an
//!   alternative (see [`super::pid`]).
//! - **Sea water**: ±2 Hz steps driven by the F.W. outlet temperature with a
//!   34-36 °C dead zone. The law remembers the outlet trend and refuses to
//!   keep stepping in the same direction once the trend reverses.

use serde::{Deserialize, Serialize};

use super::pid::FreshWaterPid;
use crate::domain::PumpLoop;

/// F.W. inlet temperature at which the fresh-water pumps idle at minimum (°C)
pub const FW_INLET_SETPOINT_C: f64 = 36.0;

/// Inlet excess over the setpoint that commands full speed (°C)
pub const FW_FULL_SPEED_EXCESS_C: f64 = 17.0;

/// Fresh-water target frequency for a given F.W. inlet temperature.
pub fn fresh_water_target_hz(t4_c: f64) -> f64 {
    let lo = PumpLoop::FreshWater.min_freq_hz();
    let hi = PumpLoop::FreshWater.max_freq_hz();
    let excess = t4_c - FW_INLET_SETPOINT_C;

    let target = if excess >= FW_FULL_SPEED_EXCESS_C {
        hi
    } else if excess <= 0.0 {
        lo
    } else {
        lo + (excess / FW_FULL_SPEED_EXCESS_C) * (hi - lo)
    };
    PumpLoop::FreshWater.clamp_freq(target)
}

/// Selectable fresh-water control law.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshWaterLaw {
    /// Snap to the proportional target every cycle
    #[default]
    Proportional,
    /// Rate-limited PID on the inlet excess
    Pid,
}

#[derive(Debug, Clone)]
pub enum FreshWaterController {
    Proportional,
    Pid(FreshWaterPid),
}

impl FreshWaterController {
    pub fn new(law: FreshWaterLaw) -> Self {
        match law {
            FreshWaterLaw::Proportional => Self::Proportional,
            FreshWaterLaw::Pid => Self::Pid(FreshWaterPid::new()),
        }
    }

    /// Next fresh-water frequency; `dt_s` is only used by the PID law.
    pub fn update(&mut self, t4_c: f64, current_freq_hz: f64, dt_s: f64) -> f64 {
        match self {
            Self::Proportional => fresh_water_target_hz(t4_c),
            Self::Pid(pid) => pid.calculate(t4_c, current_freq_hz, dt_s),
        }
    }
}

/// Direction of travel of the F.W. outlet temperature or of the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

/// State the sea-water law carries from one cycle to the next.
///
/// `prev_t5_c` is empty until the law has seen its first outlet sample, so
/// the first cycle never reports a trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerMemory {
    pub prev_t5_c: Option<f64>,
    pub t5_trend: Option<Trend>,
    pub last_adjustment: Option<Trend>,
}

impl ControllerMemory {
    pub fn new() -> Self {
        Self {
            prev_t5_c: None,
            t5_trend: None,
            last_adjustment: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeaWaterLawConfig {
    /// Above this F.W. outlet temperature the S.W. pumps speed up (°C)
    pub high_c: f64,
    /// Below this F.W. outlet temperature the S.W. pumps slow down (°C)
    pub low_c: f64,
    /// Frequency change per cycle (Hz)
    pub step_hz: f64,
    /// Outlet movement ignored when classifying the trend (°C)
    pub trend_deadband_c: f64,
}

impl Default for SeaWaterLawConfig {
    fn default() -> Self {
        Self {
            high_c: 36.0,
            low_c: 34.0,
            step_hz: 2.0,
            trend_deadband_c: 0.05,
        }
    }
}

/// What the sea-water law decided in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeaWaterAction {
    Raise,
    Lower,
    /// Outlet out of band but its trend just reversed against the last step
    HoldOnReversal,
    /// Outlet inside the dead zone
    HoldInBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeaWaterAdjustment {
    pub freq_hz: f64,
    pub action: SeaWaterAction,
    pub t5_trend: Option<Trend>,
}

#[derive(Debug, Clone)]
pub struct SeaWaterLaw {
    config: SeaWaterLawConfig,
    memory: ControllerMemory,
}

impl Default for SeaWaterLaw {
    fn default() -> Self {
        Self::new(SeaWaterLawConfig::default())
    }
}

impl SeaWaterLaw {
    pub fn new(config: SeaWaterLawConfig) -> Self {
        Self {
            config,
            memory: ControllerMemory::new(),
        }
    }

    pub fn memory(&self) -> &ControllerMemory {
        &self.memory
    }

    pub fn update(&mut self, t5_c: f64, current_freq_hz: f64) -> SeaWaterAdjustment {
        let cfg = &self.config;
        let mem = &mut self.memory;

        let trend = match mem.prev_t5_c {
            None => None,
            Some(prev) if t5_c > prev + cfg.trend_deadband_c => Some(Trend::Up),
            Some(prev) if t5_c < prev - cfg.trend_deadband_c => Some(Trend::Down),
            Some(_) => mem.t5_trend,
        };
        let reversed = matches!((mem.t5_trend, trend), (Some(prev), Some(now)) if prev != now);

        let (desired_hz, action) = if t5_c > cfg.high_c {
            if mem.last_adjustment == Some(Trend::Up) && reversed {
                (current_freq_hz, SeaWaterAction::HoldOnReversal)
            } else {
                mem.last_adjustment = Some(Trend::Up);
                (current_freq_hz + cfg.step_hz, SeaWaterAction::Raise)
            }
        } else if t5_c < cfg.low_c {
            if mem.last_adjustment == Some(Trend::Down) && reversed {
                (current_freq_hz, SeaWaterAction::HoldOnReversal)
            } else {
                mem.last_adjustment = Some(Trend::Down);
                (current_freq_hz - cfg.step_hz, SeaWaterAction::Lower)
            }
        } else {
            (current_freq_hz, SeaWaterAction::HoldInBand)
        };

        mem.prev_t5_c = Some(t5_c);
        mem.t5_trend = trend;

        SeaWaterAdjustment {
            freq_hz: PumpLoop::SeaWater.clamp_freq(desired_hz),
            action,
            t5_trend: trend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    /// Law that has already seen one outlet sample inside the dead zone
    fn primed(t5_c: f64) -> SeaWaterLaw {
        let mut law = SeaWaterLaw::default();
        law.memory.prev_t5_c = Some(t5_c);
        law
    }

    #[rstest]
    #[case(30.0, 40.0)]
    #[case(36.0, 40.0)]
    #[case(44.5, 50.0)]
    #[case(53.0, 60.0)]
    #[case(70.0, 60.0)]
    fn test_fresh_water_target(#[case] t4_c: f64, #[case] expected_hz: f64) {
        assert!((fresh_water_target_hz(t4_c) - expected_hz).abs() < 1e-9);
    }

    #[test]
    fn test_fresh_water_target_at_38c() {
        let hz = fresh_water_target_hz(38.0);
        assert!((hz - 42.3529).abs() < 1e-3);
    }

    #[test]
    fn test_proportional_controller_ignores_history() {
        let mut fw = FreshWaterController::new(FreshWaterLaw::Proportional);
        assert_eq!(fw.update(53.0, 40.0, 0.5), 60.0);
        assert_eq!(fw.update(30.0, 60.0, 0.5), 40.0);
    }

    #[test]
    fn test_sea_water_raises_when_outlet_hot() {
        let mut law = primed(37.0);
        let adj = law.update(37.0, 50.0);
        assert_eq!(adj.action, SeaWaterAction::Raise);
        assert_eq!(adj.freq_hz, 52.0);
        assert_eq!(law.memory().last_adjustment, Some(Trend::Up));
    }

    #[test]
    fn test_sea_water_lowers_when_outlet_cold() {
        let mut law = primed(30.0);
        let adj = law.update(30.0, 50.0);
        assert_eq!(adj.action, SeaWaterAction::Lower);
        assert_eq!(adj.freq_hz, 48.0);
    }

    #[test]
    fn test_sea_water_holds_in_dead_zone() {
        let mut law = primed(35.0);
        for t5 in [34.0, 35.0, 36.0] {
            let adj = law.update(t5, 50.0);
            assert_eq!(adj.action, SeaWaterAction::HoldInBand);
            assert_eq!(adj.freq_hz, 50.0);
        }
    }

    #[test]
    fn test_sea_water_clamps_to_limits() {
        let mut law = primed(40.0);
        assert_eq!(law.update(40.0, 59.0).freq_hz, 60.0);
        let mut law = primed(30.0);
        assert_eq!(law.update(30.0, 36.0).freq_hz, 35.0);
    }

    #[test]
    fn test_sea_water_holds_when_trend_reverses_after_raise() {
        let mut law = primed(36.5);

        let adj = law.update(36.8, 50.0);
        assert_eq!(adj.action, SeaWaterAction::Raise);
        assert_eq!(adj.t5_trend, Some(Trend::Up));

        // still hot but now cooling: do not push further
        let adj = law.update(36.6, adj.freq_hz);
        assert_eq!(adj.action, SeaWaterAction::HoldOnReversal);
        assert_eq!(adj.freq_hz, 52.0);
        assert_eq!(adj.t5_trend, Some(Trend::Down));

        // trend is steady again, stepping resumes
        let adj = law.update(36.58, adj.freq_hz);
        assert_eq!(adj.action, SeaWaterAction::Raise);
        assert_eq!(adj.freq_hz, 54.0);
    }

    #[test]
    fn test_sea_water_holds_when_trend_reverses_after_lower() {
        let mut law = primed(33.5);
        let adj = law.update(33.2, 50.0);
        assert_eq!(adj.action, SeaWaterAction::Lower);

        let adj = law.update(33.4, adj.freq_hz);
        assert_eq!(adj.action, SeaWaterAction::HoldOnReversal);
        assert_eq!(adj.freq_hz, 48.0);
    }

    #[test]
    fn test_small_outlet_moves_keep_previous_trend() {
        let mut law = primed(35.0);
        law.update(35.2, 50.0);
        assert_eq!(law.memory().t5_trend, Some(Trend::Up));
        law.update(35.18, 50.0);
        assert_eq!(law.memory().t5_trend, Some(Trend::Up));
        assert_eq!(law.memory().prev_t5_c, Some(35.18));
    }

    #[test]
    fn test_first_sample_sets_no_trend() {
        let mut law = SeaWaterLaw::default();
        assert_eq!(law.memory().prev_t5_c, None);

        let adj = law.update(28.25, 60.0);
        assert_eq!(adj.action, SeaWaterAction::Lower);
        assert_eq!(adj.t5_trend, None);
        assert_eq!(law.memory().prev_t5_c, Some(28.25));
    }

    #[test]
    fn test_rise_after_first_step_is_not_a_reversal() {
        let mut law = SeaWaterLaw::default();
        let adj = law.update(28.25, 60.0);
        assert_eq!(adj.freq_hz, 58.0);

        // first trend seen is up; there is no earlier trend to reverse
        let adj = law.update(28.375, adj.freq_hz);
        assert_eq!(adj.t5_trend, Some(Trend::Up));
        assert_eq!(adj.action, SeaWaterAction::Lower);
        assert_eq!(adj.freq_hz, 56.0);
    }

    proptest! {
        #[test]
        fn prop_fresh_water_target_monotone(a in 20.0f64..70.0, b in 20.0f64..70.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(fresh_water_target_hz(lo) <= fresh_water_target_hz(hi));
            prop_assert!((40.0..=60.0).contains(&fresh_water_target_hz(a)));
        }

        #[test]
        fn prop_sea_water_steps_are_bounded(
            start in 35.0f64..=60.0,
            outlets in proptest::collection::vec(25.0f64..45.0, 1..60),
        ) {
            let mut law = SeaWaterLaw::default();
            let mut freq = start;
            for t5 in outlets {
                let next = law.update(t5, freq).freq_hz;
                let step = next - freq;
                prop_assert!((35.0..=60.0).contains(&next));
                let whole_step = step == 0.0 || (step.abs() - 2.0).abs() < 1e-9;
                let at_limit = next == 35.0 || next == 60.0;
                prop_assert!(whole_step || (at_limit && step.abs() < 2.0));
                freq = next;
            }
        }
    }
}
