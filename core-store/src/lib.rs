//! # Media Store Module
//!
//! Unidirectional-data-flow store keeping a local cache of remote media
//! asset metadata consistent with a remote content host.
//!
//! ## Overview
//!
//! Application code and transport backends submit [`action::MediaAction`]s
//! through a [`dispatcher::DispatcherHandle`]; a single FIFO loop routes
//! each action through the [`store::MediaStore`], which:
//!
//! - validates "perform" actions locally, short-circuiting network calls
//!   for malformed requests,
//! - hands valid requests to the transport backend owning the site
//!   (hosted vs self-managed),
//! - merges "handle" results idempotently into the media catalog,
//! - publishes one [`events::MediaChangeEvent`] per handled action.
//!
//! Transport failures travel as [`error::MediaError`] values inside result
//! payloads; the loop always completes and keeps processing.
//!
//! ## Wiring
//!
//! ```rust,ignore
//! use core_catalog::{create_pool, DatabaseConfig, SqliteMediaRepository};
//! use core_store::{Dispatcher, MediaStore};
//! use std::sync::Arc;
//!
//! let pool = create_pool(DatabaseConfig::new("sqlite:media.db")).await?;
//! let (dispatcher, handle) = Dispatcher::new();
//!
//! let hosted = Arc::new(HostedMediaClient::new(hosted_config, handle.clone()));
//! let self_managed = Arc::new(SelfHostedMediaClient::new(own_config, handle.clone()));
//!
//! let store = Arc::new(MediaStore::new(
//!     Arc::new(SqliteMediaRepository::new(pool)),
//!     hosted,
//!     self_managed,
//! ));
//! let mut changes = store.subscribe();
//! dispatcher.spawn(store);
//! ```

pub mod action;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod store;
pub mod transport;
pub mod validate;

pub use action::{
    MediaAction, MediaActionKind, MediaListPayload, ProgressPayload, UploadMediaPayload,
};
pub use dispatcher::{DispatchError, Dispatcher, DispatcherHandle};
pub use error::{MediaError, MediaErrorType, TransportError};
pub use events::MediaChangeEvent;
pub use store::MediaStore;
pub use transport::MediaTransport;
