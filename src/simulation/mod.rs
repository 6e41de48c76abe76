//! # Input Simulation Module
//!
//! Stand-ins for the plant sensors when no real instrumentation is attached.
//!
//! ## Components
//!
//! - **TickPerturbation**: Gaussian drift of T1/T4 applied on autonomous ticks
//! - **SensorWalk**: region-dependent random walk producing complete operator inputs
//!
//! Both own their random generator; pass a seed for reproducible runs.
//!
//! ## Usage
//!
//! ```rust
//! use central_cooling_controller::simulation::{Region, SensorWalk, SensorWalkConfig};
//!
//! let mut walk = SensorWalk::new(SensorWalkConfig {
//!     region: Region::Temperate,
//!     random_seed: Some(7),
//!     ..Default::default()
//! });
//!
//! let input = walk.next_input();
//! assert!(input.t1_c >= 10.0 && input.t1_c <= 25.0);
//! ```

pub mod perturbation;
pub mod sensor_walk;

pub use perturbation::{PerturbationConfig, TickPerturbation};
pub use sensor_walk::{Region, RegionProfile, SensorWalk, SensorWalkConfig, WalkRange};
