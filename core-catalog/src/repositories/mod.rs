//! Repository traits and SQLite implementations

mod media;

pub use media::{MediaRepository, SqliteMediaRepository};
