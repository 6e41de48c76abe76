use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::physics::flow;

/// One of the two pump circuits of the central cooling plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PumpLoop {
    /// Closed fresh-water circuit cooling the engine
    #[strum(to_string = "F.W.")]
    FreshWater,
    /// Open sea-water circuit carrying heat overboard
    #[strum(to_string = "S.W.")]
    SeaWater,
}

impl PumpLoop {
    /// Volumetric flow of one pump at 60 Hz (m³/h)
    pub fn base_flow_m3h(self) -> f64 {
        match self {
            Self::FreshWater => 1290.0,
            Self::SeaWater => 1500.0,
        }
    }

    pub fn min_freq_hz(self) -> f64 {
        match self {
            Self::FreshWater => 40.0,
            Self::SeaWater => 35.0,
        }
    }

    pub fn max_freq_hz(self) -> f64 {
        60.0
    }

    pub fn clamp_freq(self, freq_hz: f64) -> f64 {
        freq_hz.clamp(self.min_freq_hz(), self.max_freq_hz())
    }
}

/// Number of pumps running in parallel on one circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PumpCount {
    One,
    Two,
}

impl PumpCount {
    pub fn get(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Multiplier applied to single-pump flow
    pub fn factor(self) -> f64 {
        f64::from(self.get())
    }
}

impl From<PumpCount> for u8 {
    fn from(count: PumpCount) -> Self {
        count.get()
    }
}

impl TryFrom<u8> for PumpCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("pump count must be 1 or 2, got {}", other)),
        }
    }
}

impl std::fmt::Display for PumpCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Whether periodic ticks synthesize sensor drift or hold the last entered values.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperatingMode {
    #[default]
    Simulation,
    Manual,
}

/// Complete state of the cooling plant.
///
/// Flows are derived from actuator settings and are never assigned directly
/// by callers. After every pipeline run `t1 <= t5 <= t4` and `t1 <= t2 <= t4`
/// hold for physically ordered inlets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    /// S.W. inlet temperature (°C)
    pub t1_c: f64,
    /// S.W. outlet temperature (°C)
    pub t2_c: f64,
    /// F.W. inlet temperature (°C)
    pub t4_c: f64,
    /// F.W. outlet temperature (°C)
    pub t5_c: f64,
    /// S.W. inlet strainer differential pressure (bar)
    pub dp1_bar: f64,

    /// F.W. flow (m³/h)
    pub fw_flow_m3h: f64,
    /// S.W. flow (m³/h)
    pub sw_flow_m3h: f64,

    pub fw_freq_hz: f64,
    pub sw_freq_hz: f64,
    pub fw_count: PumpCount,
    pub sw_count: PumpCount,

    /// Heat exchanger effectiveness used by the last solve (0-1)
    pub heat_exchanger_efficiency: f64,
    pub engine_load_percent: f64,
    pub operating_hours: f64,

    pub alarm_active: bool,
    pub alarm_message: String,
}

impl Default for SystemState {
    fn default() -> Self {
        let fw_freq_hz = 45.0;
        let sw_freq_hz = 60.0;
        let fw_count = PumpCount::Two;
        let sw_count = PumpCount::Two;

        Self {
            t1_c: 25.0,
            t2_c: 30.0,
            t4_c: 36.0,
            t5_c: 32.0,
            dp1_bar: 1.5,
            fw_flow_m3h: flow::loop_flow(PumpLoop::FreshWater, fw_freq_hz, fw_count),
            sw_flow_m3h: flow::loop_flow(PumpLoop::SeaWater, sw_freq_hz, sw_count),
            fw_freq_hz,
            sw_freq_hz,
            fw_count,
            sw_count,
            heat_exchanger_efficiency: crate::physics::heat_exchanger::EFFECTIVENESS,
            engine_load_percent: 75.0,
            operating_hours: 0.0,
            alarm_active: false,
            alarm_message: String::new(),
        }
    }
}

impl SystemState {
    /// The values returned to callers of a control cycle
    pub fn readings(&self) -> Readings {
        Readings {
            t5_c: self.t5_c,
            t2_c: self.t2_c,
            dp1_bar: self.dp1_bar,
        }
    }
}

/// Outlet temperatures and strainer pressure reported after a control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub t5_c: f64,
    pub t2_c: f64,
    pub dp1_bar: f64,
}
