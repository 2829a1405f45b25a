pub mod leaf;
pub mod presence;
pub mod surface;

pub use leaf::*;
pub use presence::*;
pub use surface::*;
