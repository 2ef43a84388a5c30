//! Prediction service: HTTP shell over the diagnosis library

pub mod api;
pub mod config;
