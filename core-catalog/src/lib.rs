//! # Media Catalog Module
//!
//! Owns the canonical per-site media database and provides the repository
//! pattern for data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - The `MediaAsset` and `Site` domain models
//! - The `MediaRepository` trait and its SQLite implementation
//! - Read-only query APIs (by site, id, attachment state, title, upload
//!   state) consumed by host-application layers

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{CatalogError, Result};
pub use models::{MediaAsset, Site, UploadState};
pub use repositories::{MediaRepository, SqliteMediaRepository};
