//! # Bot Sample App Library
//!
//! This library exposes the core modules of the application for integration testing.

pub mod config;
pub mod lifecycle;
pub mod runners;
