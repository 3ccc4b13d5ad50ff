//! JSON-RPC API Layer
//!
//! JSON-RPC 2.0 over HTTP for the Ninhydrin registry, task store and lease
//! operations. Every method takes one object parameter and carries a `.v1`
//! version suffix.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use jsonrpsee::server::ServerHandle;
pub use server::{RpcServer, RpcServerConfig, ServerError};
