//! # Self-Managed Transport Provider
//!
//! Implements the `MediaTransport` trait against a self-managed site's own
//! media endpoint, for sites with `is_hosted == false`.
//!
//! ## Overview
//!
//! This module provides:
//! - App-password (basic auth) JSON calls against the site's endpoint,
//!   rooted at the site's `base_url`
//! - Streaming uploads with byte-counted progress ticks
//! - Failure normalization into transport error categories before result
//!   actions are resubmitted

pub mod client;
pub mod error;
pub mod types;

pub use client::{SelfHostedClientConfig, SelfHostedMediaClient};
pub use error::{Result, SelfHostedApiError};
