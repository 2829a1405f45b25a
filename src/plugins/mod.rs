pub mod core;
pub mod input;
pub mod presence;
pub mod leaves;
pub mod surface;
pub mod debug_ui;
pub mod shell;
