//! CLI command implementations

pub mod domains;
pub mod predict;
pub mod records;
