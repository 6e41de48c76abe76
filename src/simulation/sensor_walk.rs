//! # Sensor Random Walk
//!
//! Synthetic operator inputs for running the plant without real sensors.
//! T1 and T4 wander inside a per-region envelope: every step moves by a
//! random fraction (50-100 %) of a fixed rate in the current direction,
//! reflects at the envelope edges and occasionally turns around on its own.
//! Engine load and strainer pressure are drawn fresh on every step.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::domain::ManualInput;

/// Operating area of the vessel
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Region {
    #[default]
    Default,
    Polar,
    Temperate,
    Tropical,
}

/// Envelope and starting point of one walking signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkRange {
    pub min: f64,
    pub max: f64,
    pub start: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub t1_c: WalkRange,
    pub t4_c: WalkRange,
    /// Engine load band (%)
    pub engine_load_percent: (f64, f64),
}

impl Region {
    pub fn profile(self) -> RegionProfile {
        let walk = |min, max, start| WalkRange { min, max, start };
        match self {
            Self::Default => RegionProfile {
                t1_c: walk(0.0, 36.0, 25.0),
                t4_c: walk(36.0, 53.0, 40.0),
                engine_load_percent: (10.0, 100.0),
            },
            Self::Polar => RegionProfile {
                t1_c: walk(0.0, 10.0, 2.0),
                t4_c: walk(40.0, 53.0, 45.0),
                engine_load_percent: (60.0, 100.0),
            },
            Self::Temperate => RegionProfile {
                t1_c: walk(10.0, 25.0, 15.0),
                t4_c: walk(38.0, 48.0, 42.0),
                engine_load_percent: (40.0, 80.0),
            },
            Self::Tropical => RegionProfile {
                t1_c: walk(25.0, 36.0, 28.0),
                t4_c: walk(36.0, 45.0, 40.0),
                engine_load_percent: (20.0, 60.0),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorWalkConfig {
    pub region: Region,
    /// Maximum T1 move per step (°C)
    pub t1_rate_c: f64,
    /// Maximum T4 move per step (°C)
    pub t4_rate_c: f64,
    /// Chance of a spontaneous direction change per step
    pub flip_probability: f64,
    /// Strainer differential pressure band (bar)
    pub dp1_range_bar: (f64, f64),
    /// Random seed for reproducibility (None = random)
    pub random_seed: Option<u64>,
}

impl Default for SensorWalkConfig {
    fn default() -> Self {
        Self {
            region: Region::Default,
            t1_rate_c: 0.2,
            t4_rate_c: 0.3,
            flip_probability: 0.05,
            dp1_range_bar: (0.5, 2.5),
            random_seed: None,
        }
    }
}

/// One reflecting random walk.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Walker {
    range: WalkRange,
    rate: f64,
    value: f64,
    /// +1.0 rising, -1.0 falling
    direction: f64,
}

impl Walker {
    fn new(range: WalkRange, rate: f64) -> Self {
        Self {
            range,
            rate,
            value: range.start.clamp(range.min, range.max),
            direction: 1.0,
        }
    }

    fn step(&mut self, rng: &mut StdRng, flip_probability: f64) -> f64 {
        self.value += self.rate * self.direction * rng.gen_range(0.5..=1.0);

        if self.value >= self.range.max {
            self.value = self.range.max;
            self.direction = -1.0;
        } else if self.value <= self.range.min {
            self.value = self.range.min;
            self.direction = 1.0;
        }

        if rng.gen_bool(flip_probability) {
            self.direction = -self.direction;
        }
        self.value
    }
}

/// Random-walk input generator. Each instance owns its walk state.
pub struct SensorWalk {
    config: SensorWalkConfig,
    profile: RegionProfile,
    t1: Walker,
    t4: Walker,
    rng: StdRng,
}

impl SensorWalk {
    pub fn new(config: SensorWalkConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let profile = config.region.profile();

        Self {
            t1: Walker::new(profile.t1_c, config.t1_rate_c),
            t4: Walker::new(profile.t4_c, config.t4_rate_c),
            profile,
            config,
            rng,
        }
    }

    pub fn region(&self) -> Region {
        self.config.region
    }

    pub fn profile(&self) -> &RegionProfile {
        &self.profile
    }

    pub fn next_t1(&mut self) -> f64 {
        let p = self.flip_probability();
        self.t1.step(&mut self.rng, p)
    }

    pub fn next_t4(&mut self) -> f64 {
        let p = self.flip_probability();
        self.t4.step(&mut self.rng, p)
    }

    pub fn next_dp1(&mut self) -> f64 {
        let (lo, hi) = self.config.dp1_range_bar;
        self.rng.gen_range(lo..=hi)
    }

    /// Engine load for the region. The default region follows a
    /// 20/50/30 low/mid/high duty mix.
    pub fn next_engine_load(&mut self) -> f64 {
        match self.config.region {
            Region::Default => {
                let band: f64 = self.rng.gen();
                if band < 0.2 {
                    self.rng.gen_range(10.0..30.0)
                } else if band < 0.7 {
                    self.rng.gen_range(30.0..70.0)
                } else {
                    self.rng.gen_range(70.0..=100.0)
                }
            }
            _ => {
                let (lo, hi) = self.profile.engine_load_percent;
                self.rng.gen_range(lo..=hi)
            }
        }
    }

    /// A full set of synthetic inputs
    pub fn next_input(&mut self) -> ManualInput {
        let input = ManualInput::new(
            self.next_t4(),
            self.next_t1(),
            self.next_dp1(),
            self.next_engine_load(),
        );
        debug!(
            region = %self.config.region,
            t1_c = input.t1_c,
            t4_c = input.t4_c,
            dp1_bar = input.dp1_bar,
            engine_load_percent = input.engine_load_percent,
            "generated sensor inputs"
        );
        input
    }

    fn flip_probability(&self) -> f64 {
        self.config.flip_probability.clamp(0.0, 1.0)
    }
}
