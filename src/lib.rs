//! Natalis - Astrology MCP Server
//!
//! Serves natal, progressed, solar return, composite, synastry and transit
//! charts over the Model Context Protocol, with positions from the Swiss
//! Ephemeris library.

pub mod charts;
pub mod config;
pub mod engine;
pub mod ephemeris;
pub mod error;
pub mod logging;
pub mod models;
pub mod registry;
pub mod server;
pub mod validation;

pub use error::{AstroError, Result};
pub use registry::Registry;
pub use server::NatalisServer;
