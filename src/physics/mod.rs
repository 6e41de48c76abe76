//! # Plant Physics
//!
//! Steady-state models of the cooling plant hardware:
//!
//! - **Flow**: pump affinity law mapping frequency and pump count to flow
//! - **Heat exchanger**: effectiveness-based energy balance of the central cooler

pub mod flow;
pub mod heat_exchanger;

pub use flow::{loop_flow, pump_flow_m3h};
pub use heat_exchanger::{
    Coolant, HeatExchanger, HeatExchangerConfig, InletConditions, Outlets, Refinement,
};
