//! Transports: MCP over stdio through rmcp, and plain JSON-RPC envelopes.

pub mod handler;
pub mod jsonrpc;

pub use handler::NatalisServer;
pub use jsonrpc::{serve_lines, Dispatcher, JsonRpcError, JsonRpcResponse, Method};
