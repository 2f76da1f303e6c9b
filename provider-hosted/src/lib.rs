//! # Hosted Transport Provider
//!
//! Implements the `MediaTransport` trait against the hosting platform's
//! public REST API, for sites with `is_hosted == true`.
//!
//! ## Overview
//!
//! This module provides:
//! - Bearer-token authenticated JSON calls to the platform media endpoints
//! - Paginated full-collection fetches
//! - Streaming uploads with byte-counted progress ticks
//! - Failure normalization into the unified media error taxonomy before
//!   result actions are resubmitted

pub mod client;
pub mod error;
pub mod types;

pub use client::{HostedClientConfig, HostedMediaClient};
pub use error::{HostedApiError, Result};
