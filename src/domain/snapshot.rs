use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SystemState;

/// Immutable copy of the plant state taken at the end of a control cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    /// Sequence number of the control cycle that produced this snapshot
    pub cycle: u64,
    pub state: SystemState,
}

impl Snapshot {
    pub fn new(cycle: u64, state: SystemState, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cycle,
            state,
        }
    }
}
