//! # Tick Perturbation
//!
//! Small Gaussian drift applied to the inlet temperatures on every autonomous
//! tick, so the plant keeps moving when no operator input arrives.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::SystemState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerturbationConfig {
    /// Standard deviation of the per-tick drift (°C)
    pub std_dev_c: f64,
    /// Envelope for the S.W. inlet after drift (°C)
    pub t1_range_c: (f64, f64),
    /// Envelope for the F.W. inlet after drift (°C)
    pub t4_range_c: (f64, f64),
    /// Random seed for reproducibility (None = random)
    pub random_seed: Option<u64>,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            std_dev_c: 0.05,
            t1_range_c: (0.0, 36.0),
            t4_range_c: (36.0, 53.0),
            random_seed: None,
        }
    }
}

pub struct TickPerturbation {
    config: PerturbationConfig,
    noise: Option<Normal<f64>>,
    rng: StdRng,
}

impl TickPerturbation {
    pub fn new(config: PerturbationConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        // a non-positive or non-finite deviation disables the drift
        let noise = Normal::new(0.0, config.std_dev_c)
            .ok()
            .filter(|_| config.std_dev_c > 0.0);

        Self { config, noise, rng }
    }

    /// Drift T1 and T4, then clamp both into their envelopes.
    pub fn apply(&mut self, state: &mut SystemState) {
        if let Some(noise) = &self.noise {
            state.t1_c += noise.sample(&mut self.rng);
            state.t4_c += noise.sample(&mut self.rng);
        }

        let (t1_lo, t1_hi) = self.config.t1_range_c;
        let (t4_lo, t4_hi) = self.config.t4_range_c;
        state.t1_c = state.t1_c.clamp(t1_lo, t1_hi);
        state.t4_c = state.t4_c.clamp(t4_lo, t4_hi);
    }
}
