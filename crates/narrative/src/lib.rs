pub mod camera;
pub mod chapter;
pub mod error;
pub mod footnotes;
pub mod info;
pub mod session;
pub mod sync;

pub use camera::*;
pub use chapter::*;
pub use error::*;
pub use footnotes::*;
pub use info::*;
pub use session::*;
pub use sync::*;
