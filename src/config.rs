use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::controller::frequency::FreshWaterLaw;
use crate::controller::safety::FailSafeConfig;
use crate::domain::OperatingMode;
use crate::error::{CoolingError, CoolingResult};
use crate::export::ExportConfig;
use crate::simulation::{PerturbationConfig, Region, SensorWalkConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub simulation: SimulationConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub tick_millis: u64,
    pub history_capacity: usize,
    pub mode: OperatingMode,
    pub fresh_water_law: FreshWaterLaw,
    pub fail_safe_enabled: bool,
    pub fail_safe_frequency_hz: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_millis: 500,
            history_capacity: 1000,
            mode: OperatingMode::Simulation,
            fresh_water_law: FreshWaterLaw::Proportional,
            fail_safe_enabled: true,
            fail_safe_frequency_hz: 45.0,
        }
    }
}

impl ControllerConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn fail_safe(&self) -> FailSafeConfig {
        FailSafeConfig {
            enabled: self.fail_safe_enabled,
            safe_frequency_hz: self.fail_safe_frequency_hz,
            ..Default::default()
        }
    }
}

/// Where synthetic operator inputs come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputProvider {
    #[default]
    None,
    RandomWalk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub noise_std_dev_c: f64,
    pub random_seed: Option<u64>,
    pub input_provider: InputProvider,
    pub input_interval_millis: u64,
    pub region: Region,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            noise_std_dev_c: 0.05,
            random_seed: None,
            input_provider: InputProvider::None,
            input_interval_millis: 2000,
            region: Region::Default,
        }
    }
}

impl SimulationConfig {
    pub fn input_interval(&self) -> Duration {
        Duration::from_millis(self.input_interval_millis)
    }

    pub fn perturbation(&self) -> PerturbationConfig {
        PerturbationConfig {
            std_dev_c: self.noise_std_dev_c,
            random_seed: self.random_seed,
            ..Default::default()
        }
    }

    /// The walk gets its own seed stream so it does not mirror the tick drift.
    pub fn sensor_walk(&self) -> SensorWalkConfig {
        SensorWalkConfig {
            region: self.region,
            random_seed: self.random_seed.map(|seed| seed.wrapping_add(1)),
            ..Default::default()
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("CCS__").split("__"));
        Ok(Self::from_figment(figment)?)
    }

    pub fn from_figment(figment: Figment) -> CoolingResult<Self> {
        let cfg: Self = figment
            .extract()
            .map_err(|e| CoolingError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CoolingResult<()> {
        if self.controller.tick_millis == 0 {
            return Err(CoolingError::InvalidConfig(
                "controller.tick_millis must be positive".into(),
            ));
        }
        if self.controller.history_capacity == 0 {
            return Err(CoolingError::InvalidConfig(
                "controller.history_capacity must be positive".into(),
            ));
        }
        if !(35.0..=60.0).contains(&self.controller.fail_safe_frequency_hz) {
            return Err(CoolingError::InvalidConfig(format!(
                "controller.fail_safe_frequency_hz {} outside 35-60 Hz",
                self.controller.fail_safe_frequency_hz
            )));
        }
        if self.simulation.input_provider == InputProvider::RandomWalk
            && self.simulation.input_interval_millis == 0
        {
            return Err(CoolingError::InvalidConfig(
                "simulation.input_interval_millis must be positive".into(),
            ));
        }
        Ok(())
    }
}
