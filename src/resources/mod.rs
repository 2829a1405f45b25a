pub mod config;
pub mod pointer;
pub mod leaf_layer;
pub mod surface_material;
pub mod cli;

pub use config::*;
pub use pointer::*;
pub use leaf_layer::*;
pub use surface_material::*;
