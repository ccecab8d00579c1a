pub mod analyze;
pub mod core;
