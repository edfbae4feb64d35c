//! Module resolution and archive assembly
//!
//! This module answers module-proxy queries from a local directory of
//! pre-extracted module versions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ ModuleStore  │────▶│  Repository  │────▶│   Version   │
//! │   (trait)    │     │ (filesystem) │     │ (validator) │
//! └──────────────┘     └──────────────┘     └─────────────┘
//!                             │
//!                             ▼
//!                      ┌──────────────┐
//!                      │   Archive    │
//!                      │    (zip)     │
//!                      └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`archive`]: Zip archive of a module version's file tree
//! - [`cancel`]: Cancellation/deadline signal polled by blocking I/O
//! - [`error`]: Error type shared by every module operation
//! - [`repository`]: Filesystem-backed [`store::ModuleStore`]
//! - [`store`]: Store trait for module lookups
//! - [`types`]: The `Module` type
//! - [`version`]: Module version validation

pub mod archive;
pub mod cancel;
pub mod error;
pub mod repository;
pub mod store;
pub mod types;
pub mod version;
