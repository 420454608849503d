pub mod descriptor;
pub mod layer;
pub mod lifecycle;
pub mod popup;
pub mod raster;
pub mod reconcile;
pub mod recording;
pub mod surface;
pub mod symbology;
pub mod vector;
pub mod view;

pub use descriptor::*;
pub use layer::*;
pub use lifecycle::*;
pub use reconcile::*;
pub use recording::*;
pub use surface::*;
pub use symbology::*;
pub use view::*;
