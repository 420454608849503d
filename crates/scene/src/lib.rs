pub mod selection;
pub mod visibility;

pub use selection::*;
pub use visibility::*;
