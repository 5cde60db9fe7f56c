//! Core library for the dispatch matching service: configuration,
//! telemetry, and the shift-to-worker matching workflow.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
