//! # docsync Client
//!
//! Async HTTP client for a docsync server, plus helpers that build
//! well-formed operations (fresh OR-Set tags, register writes).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod ops;

pub use client::{ClientConfig, ClientError, DocClient};
pub use ops::{lww_write, new_tag, observed_tags, orset_add, orset_remove};
