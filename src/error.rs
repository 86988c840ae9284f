use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetcherError>;

#[derive(Debug, Error)]
pub enum FetcherError {
    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("provider error: {}", provider_message(.status, .message))]
    Provider { status: Option<u16>, message: String },

    #[error("format error: proxy {id}: {message}")]
    Format { id: String, message: String },

    #[error("write error: {message}")]
    Write {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("path error: {message}")]
    Path {
        message: String,
        #[source]
        source: Option<io::Error>,
    },
}

fn provider_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("HTTP {status}: {message}"),
        None => message.to_string(),
    }
}

impl FetcherError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            status: None,
            message: message.into(),
        }
    }

    pub fn format(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this failure: `2` for usage/configuration
    /// problems, `1` for everything that went wrong while running.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}
