pub mod event_bus;
pub mod gate;
pub mod generation;

pub use event_bus::*;
pub use gate::*;
pub use generation::*;
