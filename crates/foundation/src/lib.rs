pub mod bounds;
pub mod geo;
pub mod html;
pub mod ids;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use geo::*;
pub use ids::*;
