//! Module proxy query layer and HTTP transport
//!
//! # Modules
//!
//! - [`queries`]: The list/info/mod/zip queries over a module store
//! - [`request`]: Request path parsing and case-encoding
//! - [`handler`]: HTTP handlers and status-code mapping
//! - [`stream`]: Streaming of archive bytes into response bodies
//! - [`server`]: Router construction and server lifecycle

pub mod handler;
pub mod queries;
pub mod request;
pub mod server;
pub mod stream;
