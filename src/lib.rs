//! # Central Cooling Controller
//!
//! Control core for a marine central cooling plant: the plate cooler between
//! the engine fresh-water circuit and the sea-water circuit, the pump
//! frequency laws of both circuits, engine-load pump staging, threshold
//! alarms and a bounded control history.
//!
//! ## Usage
//!
//! ```rust
//! use central_cooling_controller::controller::CoolingController;
//!
//! let controller = CoolingController::default();
//! let readings = controller.manual_update(38.0, 25.0, 1.5, 75.0);
//! assert!(readings.t5_c <= 38.0);
//! ```

pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod export;
pub mod physics;
pub mod simulation;
pub mod telemetry;
