//! # docsync Protocol
//!
//! JSON wire messages and route scheme shared by the docsync server and client.
//!
//! ## Messages
//!
//! - `PutDocRequest` / `DocResponse`: create or read a document
//! - `PostOpsRequest` / `PostOpsResponse`: append a batch of operations
//! - `OpsSinceResponse`: catch up on the op-log
//! - `DocListResponse`: ids of every held document
//!
//! ## Translation
//!
//! Incoming operations and seeds arrive as loosely-typed JSON. The
//! [`translate`] module coerces them into typed core values.
//!
//! ## Routes
//!
//! Route scheme: `{prefix}/v1/docs/{doc_id}[/ops]`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod messages;
pub mod routes;
pub mod translate;

pub use messages::{
    decode, encode, DocListResponse, DocResponse, ErrorBody, HealthResponse, MessageError,
    OpsSinceQuery, OpsSinceResponse, PostOpsRequest, PostOpsResponse, PutDocRequest,
};
pub use routes::RouteScheme;
pub use translate::{operation_from_json, seed_from_json};
