//! Submission error types

use crate::response::NntpResponse;
use std::fmt;
use thiserror::Error;

/// Protocol phase in which a connected session failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading the server banner
    Greeting,
    /// Sending POST / IHAVE and reading the reply
    Command,
    /// Sending the article body and reading the confirmation
    Transfer,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Greeting => "greeting",
            Phase::Command => "command",
            Phase::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// Article submission errors
///
/// Every variant is terminal for the run; nothing is retried.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Article larger than the configured cap (detected before any network I/O)
    #[error("article size exceeds {} KB", .limit / 1024)]
    SizeExceeded {
        /// Configured cap in bytes
        limit: usize,
    },

    /// Failure reading the input stream
    #[error("error reading input: {0}")]
    Read(#[source] std::io::Error),

    /// SOCKS5 proxy unreachable or handshake rejected
    #[error("SOCKS5 proxy {proxy} failed: {reason}")]
    Proxy {
        /// Proxy address
        proxy: String,
        /// What went wrong
        reason: String,
    },

    /// Proxy could not relay the connection to the news server
    #[error("error connecting to {server} through the proxy: {reason}")]
    Connect {
        /// News server address
        server: String,
        /// SOCKS5 reply description
        reason: String,
    },

    /// Malformed `host:port` address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Proxy connection or handshake timed out
    #[error("Connection timeout")]
    Timeout,

    /// Failure reading the server's initial banner
    #[error("error reading server greeting: {0}")]
    Greeting(#[source] std::io::Error),

    /// IHAVE requires a Message-ID header
    #[error("could not find Message-ID in the raw article")]
    MissingMessageId,

    /// Server answered POST / IHAVE with an unexpected status
    #[error("server did not accept {command} command: {response}")]
    CommandRejected {
        /// Command name (`POST` or `IHAVE`)
        command: &'static str,
        /// Server reply
        response: NntpResponse,
    },

    /// Server rejected the article body after accepting the command
    #[error("article transfer failed: {0}")]
    TransferFailed(NntpResponse),

    /// IO error on an established session
    #[error("IO error during {phase}: {source}")]
    Io {
        /// Phase that failed
        phase: Phase,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl SubmitError {
    /// True when the failure happened while establishing the connection
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SubmitError::Proxy { .. }
                | SubmitError::Connect { .. }
                | SubmitError::InvalidAddress(_)
                | SubmitError::Timeout
        )
    }

    /// Phase of an established session the error belongs to, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SubmitError::Greeting(_) => Some(Phase::Greeting),
            SubmitError::CommandRejected { .. } => Some(Phase::Command),
            SubmitError::TransferFailed(_) => Some(Phase::Transfer),
            SubmitError::Io { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

/// Result type alias using SubmitError
pub type Result<T> = std::result::Result<T, SubmitError>;
