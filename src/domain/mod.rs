pub mod input;
pub mod plant;
pub mod snapshot;

pub use input::*;
pub use plant::*;
pub use snapshot::*;
