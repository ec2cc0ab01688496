use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TransportKind {
    Network,
    Auth,
    NotFound,
    Timeout,
    Other,
}

impl TransportKind {
    /// Buckets a raw client error message. Matching is on lowercase text
    /// because the kube client folds status codes into its messages.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("timed out") || lower.contains("timeout") || lower.contains("deadline")
        {
            Self::Timeout
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
        {
            Self::Auth
        } else if lower.contains("404") || lower.contains("not found") || lower.contains("notfound")
        {
            Self::NotFound
        } else if lower.contains("connection")
            || lower.contains("refused")
            || lower.contains("dns")
            || lower.contains("resolve")
            || lower.contains("certificate")
            || lower.contains("tls")
            || lower.contains("hyper")
        {
            Self::Network
        } else {
            Self::Other
        }
    }
}

impl Display for TransportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::NotFound => "not found",
            Self::Timeout => "timeout",
            Self::Other => "request",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum GatewayError {
    #[error("cluster connection failed: {0}")]
    Connection(String),
    #[error("{kind} error: {message}")]
    Transport {
        kind: TransportKind,
        message: String,
    },
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Transport {
            kind: TransportKind::classify(&message),
            message,
        }
    }

    pub fn timeout(what: impl Display) -> Self {
        Self::Transport {
            kind: TransportKind::Timeout,
            message: format!("{what} timed out"),
        }
    }
}

impl From<kube::Error> for GatewayError {
    fn from(error: kube::Error) -> Self {
        Self::transport(error.to_string())
    }
}
