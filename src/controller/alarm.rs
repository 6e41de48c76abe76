//! # Alarm Monitor
//!
//! Threshold alarms evaluated once per control cycle against the plant state:
//! - F.W. outlet temperature high
//! - S.W. outlet temperature high
//! - S.W. inlet strainer pressure low / high
//!
//! Conditions are checked in that fixed order and every one that fires
//! overwrites the alarm message, so the last firing condition is the one
//! reported. Transitions (raised, cleared, message changed while active) are
//! logged and broadcast to subscribers; they are purely observational.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::domain::SystemState;

/// Alarm thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmThresholds {
    /// F.W. outlet high limit (°C)
    pub fw_outlet_high_c: f64,
    /// S.W. outlet high limit (°C)
    pub sw_outlet_high_c: f64,
    /// Strainer differential pressure low limit (bar)
    pub dp1_low_bar: f64,
    /// Strainer differential pressure high limit (bar)
    pub dp1_high_bar: f64,
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            fw_outlet_high_c: 40.0,
            sw_outlet_high_c: 49.0,
            dp1_low_bar: 0.5,
            dp1_high_bar: 2.5,
        }
    }
}

/// Alarm condition, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmCondition {
    FwOutletHigh,
    SwOutletHigh,
    StrainerPressureLow,
    StrainerPressureHigh,
}

impl std::fmt::Display for AlarmCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FwOutletHigh => write!(f, "F.W. outlet temperature high"),
            Self::SwOutletHigh => write!(f, "S.W. outlet temperature high"),
            Self::StrainerPressureLow => write!(f, "S.W. inlet pressure low"),
            Self::StrainerPressureHigh => write!(f, "S.W. inlet pressure high"),
        }
    }
}

/// Alarm transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlarmEvent {
    Raised {
        condition: AlarmCondition,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Still active, but a different condition now carries the message
    Changed {
        condition: AlarmCondition,
        message: String,
        timestamp: DateTime<Utc>,
    },
    Cleared {
        timestamp: DateTime<Utc>,
    },
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEvaluation {
    /// Every condition that fired, in evaluation order
    pub fired: Vec<AlarmCondition>,
    pub event: Option<AlarmEvent>,
}

impl AlarmEvaluation {
    /// The condition whose message is reported
    pub fn reported(&self) -> Option<AlarmCondition> {
        self.fired.last().copied()
    }
}

pub struct AlarmMonitor {
    thresholds: AlarmThresholds,
    event_tx: broadcast::Sender<AlarmEvent>,
}

impl Default for AlarmMonitor {
    fn default() -> Self {
        Self::new(AlarmThresholds::default())
    }
}

impl AlarmMonitor {
    pub fn new(thresholds: AlarmThresholds) -> Self {
        let (event_tx, _) = broadcast::channel(32);
        Self {
            thresholds,
            event_tx,
        }
    }

    /// Subscribe to alarm transitions
    pub fn subscribe(&self) -> broadcast::Receiver<AlarmEvent> {
        self.event_tx.subscribe()
    }

    /// Conditions firing for `state`, in evaluation order
    pub fn check(&self, state: &SystemState) -> Vec<AlarmCondition> {
        let t = &self.thresholds;
        let mut fired = Vec::new();

        if state.t5_c > t.fw_outlet_high_c {
            fired.push(AlarmCondition::FwOutletHigh);
        }
        if state.t2_c > t.sw_outlet_high_c {
            fired.push(AlarmCondition::SwOutletHigh);
        }
        if state.dp1_bar < t.dp1_low_bar {
            fired.push(AlarmCondition::StrainerPressureLow);
        }
        if state.dp1_bar > t.dp1_high_bar {
            fired.push(AlarmCondition::StrainerPressureHigh);
        }

        fired
    }

    /// Evaluate alarms and latch the result into `state`.
    pub fn evaluate(&self, state: &mut SystemState) -> AlarmEvaluation {
        let was_active = state.alarm_active;
        let previous_message = std::mem::take(&mut state.alarm_message);

        let fired = self.check(state);
        let reported = fired.last().copied();

        state.alarm_active = reported.is_some();
        if let Some(condition) = reported {
            state.alarm_message = condition.to_string();
        }

        let now = Utc::now();
        let event = match (was_active, reported) {
            (false, Some(condition)) => {
                warn!(
                    alarm = %condition,
                    t5_c = state.t5_c,
                    t2_c = state.t2_c,
                    dp1_bar = state.dp1_bar,
                    "ALARM raised"
                );
                Some(AlarmEvent::Raised {
                    condition,
                    message: state.alarm_message.clone(),
                    timestamp: now,
                })
            }
            (true, Some(condition)) if state.alarm_message != previous_message => {
                warn!(alarm = %condition, previous = %previous_message, "ALARM changed");
                Some(AlarmEvent::Changed {
                    condition,
                    message: state.alarm_message.clone(),
                    timestamp: now,
                })
            }
            (true, None) => {
                info!(previous = %previous_message, "alarm cleared");
                Some(AlarmEvent::Cleared { timestamp: now })
            }
            _ => None,
        };

        if let Some(event) = &event {
            // no subscribers is fine, events are observational
            let _ = self.event_tx.send(event.clone());
        }

        AlarmEvaluation { fired, event }
    }
}
