pub mod leaves;
pub mod presence;
