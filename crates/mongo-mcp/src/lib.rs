//! MongoDB MCP gateway
//!
//! Serves MongoDB to AI agents over the Model Context Protocol. Every
//! agent-supplied database name, collection name, filter, update and
//! pipeline passes through [`mongo_guard`] before it reaches the driver,
//! and write tools are refused unless the server runs in dangerous mode.
//!
//! # Layout
//!
//! - [`server`]: newline-delimited JSON-RPC over stdio
//! - [`tools`]: tool names and input schemas advertised by `tools/list`
//! - [`handlers`]: the [`Gateway`] that gates, validates and dispatches calls
//! - [`store`]: the [`DocumentStore`] seam, implemented by [`Connection`]
//! - [`config`]: environment configuration

pub mod config;
pub mod connection;
pub mod convert;
pub mod error;
pub mod handlers;
pub mod server;
pub mod store;
pub mod tools;

pub use config::Config;
pub use connection::{Connection, PoolConfig};
pub use error::{ToolError, ToolResult};
pub use handlers::{Arguments, Gateway};
pub use server::{McpServer, PROTOCOL_VERSION};
pub use store::{DatabaseInfo, DocumentStore, FindQuery, IndexSpec, UpdateSummary};
pub use tools::{MongoTools, ToolSchema};
