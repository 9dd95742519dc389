//! Configuration module
//!
//! Named devices and HTTP settings loaded from the user's config file.

pub mod config;

pub use config::{Config, DeviceConfig, DeviceKind, HttpConfig};
