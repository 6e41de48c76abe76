//! # Central cooler energy balance
//!
//! Effectiveness model of the plate cooler between the fresh-water and the
//! sea-water circuits. Given both inlet temperatures and both flows it yields
//! the two outlet temperatures such that the heat given up by the fresh water
//! equals the heat picked up by the sea water.
//!
//! ## Model
//!
//! - Capacity rate `C = flow · ρ · cp / 3600` (W/K) for each stream
//! - The stream with the smaller capacity rate limits heat transfer
//! - `T5` is kept inside `[T1, T4]`, then `T2` follows from
//!   `C_fw · (T4 - T5) = C_sw · (T2 - T1)` and is capped at `T4`
//!
//! The solve itself is closed-form. [`HeatExchanger::refine`] repeats it a
//! bounded number of times against the previous outlet values, stopping early
//! once both outlets move less than [`CONVERGENCE_TOLERANCE_C`].

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed heat exchanger effectiveness
pub const EFFECTIVENESS: f64 = 0.75;

/// Hard cap on solver passes per control cycle
pub const MAX_PASSES: u32 = 3;

/// Outlet movement below which the refinement stops (°C)
pub const CONVERGENCE_TOLERANCE_C: f64 = 0.01;

/// A T5 closer than this to T4 is treated as an unseeded outlet (°C)
pub const UNSEEDED_GAP_C: f64 = 0.1;

/// Offset below T4 used to seed an unseeded T5 (°C)
pub const SEED_OFFSET_C: f64 = 2.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Thermophysical constants of a coolant stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coolant {
    /// Density (kg/m³)
    pub density_kg_m3: f64,
    /// Specific heat (J/kg·K)
    pub specific_heat_j_kg_k: f64,
}

impl Coolant {
    pub const FRESH_WATER: Self = Self {
        density_kg_m3: 1000.0,
        specific_heat_j_kg_k: 4200.0,
    };

    pub const SEA_WATER: Self = Self {
        density_kg_m3: 1025.0,
        specific_heat_j_kg_k: 4000.0,
    };

    /// Capacity rate (W/K) of a stream flowing at `flow_m3h`
    pub fn capacity_rate_w_k(&self, flow_m3h: f64) -> f64 {
        flow_m3h * self.density_kg_m3 * self.specific_heat_j_kg_k / SECONDS_PER_HOUR
    }
}

/// Boundary conditions for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InletConditions {
    /// S.W. inlet (°C)
    pub t1_c: f64,
    /// F.W. inlet (°C)
    pub t4_c: f64,
    pub fw_flow_m3h: f64,
    pub sw_flow_m3h: f64,
}

/// Outlet temperatures produced by a solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outlets {
    /// F.W. outlet (°C)
    pub t5_c: f64,
    /// S.W. outlet (°C)
    pub t2_c: f64,
}

/// Result of the bounded refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refinement {
    pub outlets: Outlets,
    /// Number of solver passes actually run (1..=MAX_PASSES)
    pub passes: u32,
    /// False when the pass cap was reached without settling
    pub converged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatExchangerConfig {
    pub effectiveness: f64,
    pub fresh_water: Coolant,
    pub sea_water: Coolant,
}

impl Default for HeatExchangerConfig {
    fn default() -> Self {
        Self {
            effectiveness: EFFECTIVENESS,
            fresh_water: Coolant::FRESH_WATER,
            sea_water: Coolant::SEA_WATER,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeatExchanger {
    config: HeatExchangerConfig,
}

impl HeatExchanger {
    pub fn new(config: HeatExchangerConfig) -> Self {
        Self { config }
    }

    pub fn effectiveness(&self) -> f64 {
        self.config.effectiveness
    }

    /// Single closed-form solve of the energy balance.
    pub fn solve(&self, inlet: &InletConditions) -> Outlets {
        let c_fw = self.config.fresh_water.capacity_rate_w_k(inlet.fw_flow_m3h);
        let c_sw = self.config.sea_water.capacity_rate_w_k(inlet.sw_flow_m3h);
        let (t1, t4) = (inlet.t1_c, inlet.t4_c);

        // no flow on either side, nothing is exchanged
        if c_fw <= 0.0 || c_sw <= 0.0 {
            return Outlets { t5_c: t4, t2_c: t1 };
        }

        let eps = self.config.effectiveness;
        let t5 = if c_fw <= c_sw {
            t4 - eps * (t4 - t1)
        } else {
            t4 - (eps * c_sw * (t4 - t1)) / c_fw
        };

        // upper bound first so an inverted inlet pair (t1 > t4) resolves to t1
        // instead of panicking inside f64::clamp
        let t5 = t5.min(t4).max(t1);

        let t2 = (t1 + c_fw * (t4 - t5) / c_sw).min(t4);

        Outlets { t5_c: t5, t2_c: t2 }
    }

    /// Repeat [`solve`](Self::solve) against the previous outlets, at most
    /// [`MAX_PASSES`] times.
    pub fn refine(&self, inlet: &InletConditions, previous: Outlets) -> Refinement {
        let mut current = previous;
        if (current.t5_c - inlet.t4_c).abs() < UNSEEDED_GAP_C {
            current.t5_c = inlet.t4_c - SEED_OFFSET_C;
            debug!(t5_c = current.t5_c, "seeding F.W. outlet below inlet");
        }

        for pass in 1..=MAX_PASSES {
            let next = self.solve(inlet);
            let delta_t2 = (next.t2_c - current.t2_c).abs();
            let delta_t5 = (next.t5_c - current.t5_c).abs();
            current = next;

            if delta_t2 < CONVERGENCE_TOLERANCE_C && delta_t5 < CONVERGENCE_TOLERANCE_C {
                return Refinement {
                    outlets: current,
                    passes: pass,
                    converged: true,
                };
            }
        }

        Refinement {
            outlets: current,
            passes: MAX_PASSES,
            converged: false,
        }
    }
}
