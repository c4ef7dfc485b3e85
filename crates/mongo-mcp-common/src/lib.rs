//! Common utilities for the MongoDB MCP gateway
//!
//! This crate holds the error taxonomy for everything that happens *after*
//! validation: driver failures, connection problems, configuration and
//! (de)serialization errors. Validation rejections live in `mongo-guard`.

pub mod error;

pub use error::{MongoMcpError, Result};
