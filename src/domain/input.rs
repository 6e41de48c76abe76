use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{CoolingError, CoolingResult};

/// Operator-entered plant inputs.
///
/// T4 is deliberately unbounded; the solver clamps outlet temperatures to the
/// physical envelope on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ManualInput {
    pub t4_c: f64,
    #[validate(range(min = 0.0, max = 36.0))]
    pub t1_c: f64,
    #[validate(range(min = 0.1, max = 3.0))]
    pub dp1_bar: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub engine_load_percent: f64,
}

impl ManualInput {
    pub fn new(t4_c: f64, t1_c: f64, dp1_bar: f64, engine_load_percent: f64) -> Self {
        Self {
            t4_c,
            t1_c,
            dp1_bar,
            engine_load_percent,
        }
    }

    /// Boundary check applied before values reach the control core.
    pub fn check(&self) -> CoolingResult<()> {
        // range validation lets NaN through
        for (field, value) in [
            ("t4_c", self.t4_c),
            ("t1_c", self.t1_c),
            ("dp1_bar", self.dp1_bar),
            ("engine_load_percent", self.engine_load_percent),
        ] {
            if !value.is_finite() {
                return Err(CoolingError::NonFinite { field });
            }
        }
        self.validate()?;
        Ok(())
    }
}
