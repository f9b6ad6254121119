//! # Pure Data Module - Data Transfer Objects Only
//!
//! Defines the configuration data structures and the TOML → DTO mapping.
//!
//! No validation and no default value calculation happen here: a missing
//! value is an empty fact, and the wiring layer decides what an empty fact
//! means.

mod app_config;

pub use app_config::AppConfig;
