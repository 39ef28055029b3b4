// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Hearth agent runtime.

use std::time::Duration;

use thiserror::Error;

/// HTTP-like status codes that mark a provider failure as transient.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// The primary error type used across all Hearth traits and core operations.
#[derive(Debug, Error)]
pub enum HearthError {
    /// Configuration errors (unknown model key, missing provider, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM provider errors. `status` is absent for transport-level failures.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request payload exceeded the model's context window.
    #[error("context length exceeded: {message}")]
    ContextLengthExceeded { message: String },

    /// Every candidate in the fallback chain failed.
    #[error("all providers failed (tried: {})", attempts.join(", "))]
    AllProvidersFailed { attempts: Vec<String> },

    /// The model kept requesting tools past the configured round limit.
    #[error("tool-call loop exceeded {max_rounds} rounds")]
    ToolLoopExceeded { max_rounds: u32 },

    /// A tool tried to touch a path outside its sandbox root.
    #[error("access denied: {path}")]
    AccessDenied { path: String },

    /// Tool execution errors.
    #[error("skill error: {message}")]
    Skill {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IPC / front-end channel errors.
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HearthError {
    /// Builds a provider error carrying an HTTP status code.
    pub fn provider_status(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            status: Some(status),
            source: None,
        }
    }

    /// Wraps a transport-level failure without leaking its message.
    ///
    /// Only the error's type name is surfaced; the original error is kept as
    /// the source for local debugging.
    pub fn provider_transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let class = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("transport")
            .to_string();
        Self::Provider {
            message: format!("transport failure ({class})"),
            status: None,
            source: Some(Box::new(err)),
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Whether the router should retry or fail over on this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { status: None, .. } => true,
            Self::Provider {
                status: Some(code), ..
            } => RETRYABLE_STATUSES.contains(code),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
