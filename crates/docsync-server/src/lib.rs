//! # docsync Server
//!
//! HTTP transport over a single in-memory [`docsync_core::MemoryStore`].
//!
//! ## Routes
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | `GET`  | `/v1/docs` | ids of every document |
//! | `PUT`  | `/v1/docs/{id}` | create or replace a document |
//! | `GET`  | `/v1/docs/{id}` | current version and snapshot |
//! | `POST` | `/v1/docs/{id}/ops` | append a batch of operations |
//! | `GET`  | `/v1/docs/{id}/ops?since=N` | op-log after version `N` |
//! | `GET`  | `/health` | liveness and document count |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod service;

pub use api::router;
pub use config::ServerConfig;
pub use service::{DocService, ServiceError};
