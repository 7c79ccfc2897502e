//! NNTP status lines and the response codes used by POST / IHAVE

use std::fmt;

/// Single-line NNTP response: 3-digit status code plus informational text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NntpResponse {
    /// 3-digit NNTP response code
    pub code: u16,
    /// Status message from server
    pub message: String,
}

impl NntpResponse {
    /// Create a response from its parts
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Parse a status line (trailing CRLF allowed)
    ///
    /// The code is the first three characters when they are ASCII digits,
    /// so `2400 posted` still reads as 240. A line without a leading code
    /// keeps `code` at 0 and the whole line as its message; it never
    /// matches an expected status.
    pub fn parse(line: &str) -> Self {
        // Strip UTF-8 BOM if present (some broken servers/proxies add it)
        let line = line.trim_start_matches('\u{FEFF}').trim_end_matches(['\r', '\n']);

        let code = line
            .get(..3)
            .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|prefix| prefix.parse::<u16>().ok());

        match code {
            Some(code) => {
                let rest = &line[3..];
                Self::new(code, rest.strip_prefix(' ').unwrap_or(rest))
            }
            None => Self::new(0, line),
        }
    }

    /// True when the line carried a numeric status code
    pub fn has_code(&self) -> bool {
        self.code != 0
    }
}

impl fmt::Display for NntpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_code() {
            f.write_str(&self.message)
        } else if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.message)
        }
    }
}

/// NNTP response codes (RFC 3977) relevant to article submission
pub mod codes {
    /// Article transferred OK (RFC 3977 Section 6.3.2)
    pub const ARTICLE_TRANSFERRED: u16 = 235;
    /// Article posted successfully (RFC 3977 Section 6.3.1)
    pub const ARTICLE_POSTED: u16 = 240;
    /// Send article to be transferred (RFC 3977 Section 6.3.2)
    pub const SEND_ARTICLE_TRANSFER: u16 = 335;
    /// Send article to be posted
    pub const SEND_ARTICLE: u16 = 340;
    /// Article not wanted (RFC 3977 Section 6.3.2)
    pub const ARTICLE_NOT_WANTED: u16 = 435;
    /// Transfer not possible; try again later (RFC 3977 Section 6.3.2)
    pub const TRANSFER_NOT_POSSIBLE: u16 = 436;
    /// Transfer rejected; do not retry (RFC 3977 Section 6.3.2)
    pub const TRANSFER_REJECTED: u16 = 437;
}
