//! Configuration, request models and parameter loading

pub mod config;
pub mod models;
pub mod parameters;
