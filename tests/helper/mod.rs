//! Shared test utilities

#![allow(dead_code)]

mod fixture;
mod http;

pub use fixture::*;
pub use http::*;
