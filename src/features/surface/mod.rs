pub mod height_field;
pub mod simulation;
pub mod background;
pub mod compositor;
pub mod leaf_render;
