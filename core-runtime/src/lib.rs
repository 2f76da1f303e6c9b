//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the publisher media core:
//! - Logging and tracing infrastructure
//! - Typed event broadcasting
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the event broadcasting
//! mechanism used throughout the system.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
