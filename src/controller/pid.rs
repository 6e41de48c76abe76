//! PID (Proportional-Integral-Derivative) Controller
//!
//! Output = Kp * error + Ki * ∫error*dt + Kd * d(error)/dt
//!
//! A reverse-acting loop uses `error = setpoint - measured` (output rises
//! when the process runs below setpoint). A direct-acting loop uses
//! `error = measured - setpoint` (output rises when the process runs hot),
//! which is how the fresh-water pumps respond to the F.W. inlet temperature.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{info, warn};

use crate::domain::PumpLoop;

use super::frequency::FW_INLET_SETPOINT_C;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Direct,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    action: Action,
    setpoint: f64,

    /// Accumulated error·seconds, kept inside `integral_limits`
    integral: f64,
    previous_error: f64,

    integral_limits: (f64, f64),
    output_limits: (f64, f64),
}

impl PidController {
    /// Unbounded output, integral held to ±1000
    pub fn new(gains: PidGains, action: Action) -> Self {
        Self::with_limits(
            gains,
            action,
            (-1000.0, 1000.0),
            (f64::NEG_INFINITY, f64::INFINITY),
        )
    }

    pub fn with_limits(
        gains: PidGains,
        action: Action,
        integral_limits: (f64, f64),
        output_limits: (f64, f64),
    ) -> Self {
        Self {
            gains,
            action,
            setpoint: 0.0,
            integral: 0.0,
            previous_error: 0.0,
            integral_limits,
            output_limits,
        }
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
    }

    /// Output for `measured` after `dt_s` seconds. The derivative term is
    /// skipped when no time has passed.
    pub fn update(&mut self, measured: f64, dt_s: f64) -> f64 {
        let error = match self.action {
            Action::Direct => measured - self.setpoint,
            Action::Reverse => self.setpoint - measured,
        };

        let (i_lo, i_hi) = self.integral_limits;
        self.integral = (self.integral + error * dt_s).clamp(i_lo, i_hi);

        let derivative = if dt_s > 0.0 {
            (error - self.previous_error) / dt_s
        } else {
            0.0
        };
        self.previous_error = error;

        let g = self.gains;
        let (out_lo, out_hi) = self.output_limits;
        (g.kp * error + g.ki * self.integral + g.kd * derivative).clamp(out_lo, out_hi)
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }
}

/// Slew tightening while the F.W. inlet temperature is moving fast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RapidChangeGuard {
    /// Look-back window for the inlet change (s)
    pub window_s: f64,
    /// Inlet change within the window that tightens the slew (°C)
    pub threshold_c: f64,
    /// Slew limit while tightened (Hz/s)
    pub tightened_rate_hz_per_s: f64,
}

impl Default for RapidChangeGuard {
    fn default() -> Self {
        Self {
            window_s: 5.0,
            threshold_c: 3.0,
            tightened_rate_hz_per_s: 0.2,
        }
    }
}

/// Fresh-water pump PID law.
///
/// The PID output is a frequency increment, limited to `max_rate_hz_per_s * dt`
/// per cycle, added to the current frequency and clamped to the F.W. pump range.
/// While T4 has moved by the guard threshold or more within the guard window,
/// the tightened rate applies instead.
#[derive(Debug, Clone)]
pub struct FreshWaterPid {
    pid: PidController,
    max_rate_hz_per_s: f64,
    guard: RapidChangeGuard,
    /// (elapsed s, T4) samples inside the guard window, oldest first
    inlet_samples: VecDeque<(f64, f64)>,
    elapsed_s: f64,
    tightened: bool,
}

impl Default for FreshWaterPid {
    fn default() -> Self {
        Self::new()
    }
}

impl FreshWaterPid {
    pub fn new() -> Self {
        Self::with_gains(
            PidGains {
                kp: 1.5,
                ki: 0.05,
                kd: 0.02,
            },
            0.5,
        )
    }

    pub fn with_gains(gains: PidGains, max_rate_hz_per_s: f64) -> Self {
        let mut pid = PidController::new(gains, Action::Direct);
        pid.set_setpoint(FW_INLET_SETPOINT_C);
        Self {
            pid,
            max_rate_hz_per_s,
            guard: RapidChangeGuard::default(),
            inlet_samples: VecDeque::new(),
            elapsed_s: 0.0,
            tightened: false,
        }
    }

    pub fn calculate(&mut self, t4_c: f64, current_freq_hz: f64, dt_s: f64) -> f64 {
        if dt_s <= 0.0 {
            return current_freq_hz;
        }
        let rate = self.observe_inlet(t4_c, dt_s);
        let max_step = rate * dt_s;
        let step = self.pid.update(t4_c, dt_s).clamp(-max_step, max_step);
        PumpLoop::FreshWater.clamp_freq(current_freq_hz + step)
    }

    /// Record a T4 sample and return the slew limit for this cycle.
    fn observe_inlet(&mut self, t4_c: f64, dt_s: f64) -> f64 {
        self.elapsed_s += dt_s;
        self.inlet_samples.push_back((self.elapsed_s, t4_c));
        while let Some(&(at, _)) = self.inlet_samples.front() {
            if self.elapsed_s - at > self.guard.window_s {
                self.inlet_samples.pop_front();
            } else {
                break;
            }
        }

        let change_c = self
            .inlet_samples
            .front()
            .map_or(0.0, |&(_, oldest)| (t4_c - oldest).abs());
        let rapid = change_c >= self.guard.threshold_c;

        if rapid && !self.tightened {
            warn!(
                change_c,
                window_s = self.guard.window_s,
                rate_hz_per_s = self.guard.tightened_rate_hz_per_s,
                "rapid F.W. inlet change, slowing fresh-water pumps"
            );
        } else if !rapid && self.tightened {
            info!(rate_hz_per_s = self.max_rate_hz_per_s, "F.W. inlet steady, normal slew restored");
        }
        self.tightened = rapid;

        if rapid {
            self.guard.tightened_rate_hz_per_s.min(self.max_rate_hz_per_s)
        } else {
            self.max_rate_hz_per_s
        }
    }

    /// Whether the rapid-change slew limit is in force
    pub fn is_tightened(&self) -> bool {
        self.tightened
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(kp: f64, ki: f64, kd: f64) -> PidGains {
        PidGains { kp, ki, kd }
    }

    #[test]
    fn test_direct_action_pushes_output_up_when_hot() {
        let mut pid = PidController::new(gains(1.0, 0.0, 0.0), Action::Direct);
        pid.set_setpoint(36.0);
        assert!((pid.update(40.0, 1.0) - 4.0).abs() < 1e-9);
        assert!((pid.update(34.0, 1.0) + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_action_pushes_output_up_when_cold() {
        let mut pid = PidController::new(gains(2.0, 0.0, 0.0), Action::Reverse);
        pid.set_setpoint(36.0);
        assert!((pid.update(35.0, 1.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_integral_accumulates_error_seconds() {
        let mut pid = PidController::new(gains(0.0, 0.5, 0.0), Action::Direct);
        pid.set_setpoint(36.0);
        pid.update(38.0, 0.5);
        let output = pid.update(38.0, 0.5);
        assert!((pid.integral() - 2.0).abs() < 1e-9);
        assert!((output - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_derivative_reacts_to_falling_inlet() {
        let mut pid = PidController::new(gains(0.0, 0.0, 1.0), Action::Direct);
        pid.set_setpoint(36.0);
        pid.update(40.0, 1.0);
        let output = pid.update(38.0, 0.5);
        // error went 4 -> 2 in half a second
        assert!((output + 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_integral_and_output_limits() {
        let mut pid = PidController::with_limits(
            gains(0.0, 1.0, 0.0),
            Action::Direct,
            (-5.0, 5.0),
            (-3.0, 3.0),
        );
        pid.set_setpoint(36.0);
        for _ in 0..50 {
            pid.update(53.0, 1.0);
        }
        assert_eq!(pid.integral(), 5.0);
        assert_eq!(pid.update(53.0, 1.0), 3.0);
    }

    #[test]
    fn test_reset_clears_memory() {
        let mut pid = PidController::new(gains(1.0, 1.0, 1.0), Action::Direct);
        pid.set_setpoint(36.0);
        pid.update(45.0, 1.0);
        assert!(pid.integral() != 0.0);

        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.previous_error(), 0.0);
    }

    #[test]
    fn test_fresh_water_pid_is_slew_limited() {
        let mut law = FreshWaterPid::new();
        // large excess, but only 0.5 Hz/s * 0.5 s may be added
        let next = law.calculate(50.0, 45.0, 0.5);
        assert!((next - 45.25).abs() < 1e-9);
    }

    #[test]
    fn test_fresh_water_pid_slows_pumps_when_cool() {
        let mut law = FreshWaterPid::new();
        let next = law.calculate(30.0, 45.0, 1.0);
        assert!((next - 44.5).abs() < 1e-9);
    }

    #[test]
    fn test_fresh_water_pid_respects_pump_range() {
        let mut law = FreshWaterPid::new();
        let mut freq = 59.8;
        for _ in 0..10 {
            freq = law.calculate(55.0, freq, 1.0);
        }
        assert_eq!(freq, 60.0);
    }

    #[test]
    fn test_fresh_water_pid_holds_without_elapsed_time() {
        let mut law = FreshWaterPid::new();
        assert_eq!(law.calculate(50.0, 47.0, 0.0), 47.0);
        assert_eq!(law.pid().integral(), 0.0);
        assert_eq!(law.pid().setpoint(), 36.0);
    }

    #[test]
    fn test_rapid_inlet_rise_tightens_slew() {
        let mut law = FreshWaterPid::new();
        let freq = law.calculate(40.0, 45.0, 1.0);
        assert!((freq - 45.5).abs() < 1e-9);
        assert!(!law.is_tightened());

        // 4 °C in one second
        let freq = law.calculate(44.0, freq, 1.0);
        assert!(law.is_tightened());
        assert!((freq - 45.7).abs() < 1e-9);
    }

    #[test]
    fn test_normal_slew_returns_once_change_leaves_window() {
        let mut law = FreshWaterPid::new();
        let mut freq = law.calculate(40.0, 45.0, 1.0);
        for _ in 0..5 {
            let next = law.calculate(44.0, freq, 1.0);
            assert!(law.is_tightened());
            assert!((next - freq - 0.2).abs() < 1e-9);
            freq = next;
        }

        // the 40 °C sample is now older than the 5 s window
        let next = law.calculate(44.0, freq, 1.0);
        assert!(!law.is_tightened());
        assert!((next - freq - 0.5).abs() < 1e-9);
    }
}
