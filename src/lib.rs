//! Livecam - camera live-stream driver
//!
//! This library crate exposes the driver, framework and service layers for
//! the binary and for integration testing.

pub mod config;
pub mod driver;
pub mod framework;
pub mod registry;
pub mod service;
pub mod sink;
