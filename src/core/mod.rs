//! Core layer: configuration, network lookup context, environment-variable
//! mappings, and template synthesis.

pub mod config;
pub mod context;
pub mod template;
pub mod types;
