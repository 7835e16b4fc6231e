//! Error taxonomy shared by the engine, the registry and the protocol layer.

use std::fmt;

use thiserror::Error;

use crate::ephemeris::EphemerisError;

/// JSON-RPC error codes used on the envelope transport.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Unknown resource or prompt.
    pub const NOT_FOUND: i32 = 404;
}

/// Which catalog a lookup failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Tool,
    Resource,
    Prompt,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CatalogKind::Tool => "Tool",
            CatalogKind::Resource => "Resource",
            CatalogKind::Prompt => "Prompt",
        };
        write!(f, "{}", name)
    }
}

/// Coarse classification used at the dispatch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    NotFound,
    Computation,
    Protocol,
}

#[derive(Debug, Error)]
pub enum AstroError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid coordinate format: {0}")]
    InvalidCoordinate(String),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: CatalogKind, name: String },

    #[error("{0}")]
    Computation(String),

    #[error("Chart assembly failed: {0}")]
    ChartAssembly(String),

    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(String),
}

pub type Result<T> = std::result::Result<T, AstroError>;

impl AstroError {
    pub fn validation(message: impl Into<String>) -> Self {
        AstroError::Validation(message.into())
    }

    pub fn computation(message: impl Into<String>) -> Self {
        AstroError::Computation(message.into())
    }

    pub fn not_found(kind: CatalogKind, name: impl Into<String>) -> Self {
        AstroError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            AstroError::Validation(_) | AstroError::InvalidCoordinate(_) => ErrorClass::Validation,
            AstroError::NotFound { .. } => ErrorClass::NotFound,
            AstroError::Computation(_)
            | AstroError::ChartAssembly(_)
            | AstroError::Ephemeris(_)
            | AstroError::Configuration(_) => ErrorClass::Computation,
            AstroError::MethodNotFound(_)
            | AstroError::InvalidParams(_)
            | AstroError::InvalidRequest(_)
            | AstroError::UnsupportedProtocolVersion(_) => ErrorClass::Protocol,
        }
    }

    /// Code reported in a JSON-RPC error object.
    pub fn rpc_code(&self) -> i32 {
        match self {
            AstroError::NotFound { .. } => codes::NOT_FOUND,
            AstroError::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            AstroError::InvalidRequest(_) => codes::INVALID_REQUEST,
            AstroError::Validation(_)
            | AstroError::InvalidCoordinate(_)
            | AstroError::InvalidParams(_)
            | AstroError::UnsupportedProtocolVersion(_) => codes::INVALID_PARAMS,
            AstroError::Computation(_)
            | AstroError::ChartAssembly(_)
            | AstroError::Ephemeris(_)
            | AstroError::Configuration(_) => codes::INTERNAL_ERROR,
        }
    }
}
