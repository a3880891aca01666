//! Error types for nfvis-declare

use crate::types::{Method, ResourceKind};
use thiserror::Error;

/// Result type alias using the nfvis-declare Error
pub type Result<T> = std::result::Result<T, Error>;

/// nfvis-declare error types
#[derive(Error, Debug)]
pub enum Error {
    /// The desired spec is structurally invalid. Raised before any request.
    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Request {method} {path} failed: {message}")]
    Transport {
        method: Method,
        path: String,
        message: String,
    },

    #[error("Request {method} {path} timed out after {seconds}s")]
    Timeout {
        method: Method,
        path: String,
        seconds: u64,
    },

    /// The appliance answered with a non-success status.
    #[error("Request {method} {path} returned status {status}")]
    Protocol {
        method: Method,
        path: String,
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("Could not decode response to {method} {path}: {message}")]
    Decode {
        method: Method,
        path: String,
        message: String,
    },

    #[error("{kind} does not support {operation}")]
    Unsupported {
        kind: ResourceKind,
        operation: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    /// Shorthand for a validation failure on a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the failure happened before the request reached the appliance
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Timeout { .. })
    }

    /// HTTP status carried by a protocol error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body carried by a protocol error, when it parsed
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            Error::Protocol { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_message_names_request() {
        let err = Error::Protocol {
            method: Method::Put,
            path: "/config/bridges/bridge/lan-br".to_string(),
            status: 409,
            body: Some(serde_json::json!({"errors": {"error": []}})),
        };
        assert_eq!(
            err.to_string(),
            "Request PUT /config/bridges/bridge/lan-br returned status 409"
        );
        assert_eq!(err.status(), Some(409));
        assert!(err.body().is_some());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_timeout_is_transport() {
        let err = Error::Timeout {
            method: Method::Get,
            path: "/config/networks?deep".to_string(),
            seconds: 60,
        };
        assert!(err.is_transport());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_unsupported_display() {
        let err = Error::Unsupported {
            kind: ResourceKind::SystemSettings,
            operation: "delete",
        };
        assert_eq!(err.to_string(), "system settings does not support delete");
    }
}
