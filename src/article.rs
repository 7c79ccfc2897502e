//! Raw article reading
//!
//! The article arrives pre-formatted on a byte stream. It is treated as an
//! opaque sequence of lines: each line is re-terminated with CRLF and the
//! running size is checked against the configured cap. Nothing else about
//! the content is interpreted, except the `Message-ID` header that IHAVE
//! needs to offer the article.

use crate::error::{Result, SubmitError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tracing::{debug, trace};

/// Immutable article with every line terminated by CRLF
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawArticle {
    data: Vec<u8>,
    line_count: usize,
}

impl RawArticle {
    /// Build an article from in-memory text
    ///
    /// Same line handling as [`read_article`] but without a size cap.
    pub fn from_text(text: impl AsRef<[u8]>) -> Self {
        let text = text.as_ref();
        let mut article = Self::default();
        if text.is_empty() {
            return article;
        }
        let body = text.strip_suffix(b"\n").unwrap_or(text);
        for line in body.split(|&b| b == b'\n') {
            article.push_line(strip_cr(line));
        }
        article
    }

    fn push_line(&mut self, line: &[u8]) {
        self.data.extend_from_slice(line);
        self.data.extend_from_slice(b"\r\n");
        self.line_count += 1;
    }

    /// Canonical bytes (CRLF line endings)
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Encoded length in bytes, CRLF included
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no line was read
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of lines
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Lines without their CRLF terminator
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.data
            .strip_suffix(b"\r\n")
            .map(|body| body.split(|&b| b == b'\n').map(strip_cr))
            .into_iter()
            .flatten()
    }

    /// Value of the `Message-ID` header, whitespace-trimmed
    ///
    /// The first line starting with the field name wins, wherever it sits in
    /// the article. The name is matched case-insensitively, so `Message-Id:`
    /// works too. An empty value counts as absent.
    pub fn message_id(&self) -> Option<String> {
        const FIELD: &[u8] = b"message-id:";

        self.lines()
            .find(|line| {
                line.len() >= FIELD.len() && line[..FIELD.len()].eq_ignore_ascii_case(FIELD)
            })
            .map(|line| {
                String::from_utf8_lossy(&line[FIELD.len()..])
                    .trim()
                    .to_string()
            })
            .filter(|id| !id.is_empty())
    }

    /// Wire form of the article body transfer, without the terminating dot line
    ///
    /// Lines beginning with `.` are dot-stuffed (RFC 3977 Section 3.1.1) so
    /// that the server cannot mistake article content for the terminator.
    pub fn to_wire(&self) -> Vec<u8> {
        let stuffed = self.lines().filter(|line| line.first() == Some(&b'.')).count();
        let mut wire = Vec::with_capacity(self.data.len() + stuffed);
        for line in self.lines() {
            if line.first() == Some(&b'.') {
                wire.push(b'.');
            }
            wire.extend_from_slice(line);
            wire.extend_from_slice(b"\r\n");
        }
        wire
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Read an article from `input`, enforcing `max_size`
///
/// The size counter is the sum of `line length + 1` over all lines read so
/// far, where the length excludes the `\n` and any `\r` before it. As soon as
/// the counter exceeds `max_size` the read fails with
/// [`SubmitError::SizeExceeded`] and no article is returned.
///
/// # Example
///
/// ```
/// # async fn example() -> nntp_submit::Result<()> {
/// let input: &[u8] = b"Subject: hi\nMessage-ID: <1@example>\n\nbody\n";
/// let article = nntp_submit::read_article(input, 32 * 1024).await?;
/// assert_eq!(article.line_count(), 4);
/// assert_eq!(article.message_id().as_deref(), Some("<1@example>"));
/// # Ok(())
/// # }
/// ```
pub async fn read_article<R>(mut input: R, max_size: usize) -> Result<RawArticle>
where
    R: AsyncBufRead + Unpin,
{
    let mut article = RawArticle::default();
    let mut size = 0usize;
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        // A line may use the remaining budget plus its terminator; anything
        // longer is over the cap regardless of what follows.
        let budget = u64::try_from(max_size - size)
            .unwrap_or(u64::MAX)
            .saturating_add(2);
        let n = (&mut input)
            .take(budget)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(SubmitError::Read)?;
        if n == 0 {
            break;
        }

        let line = strip_cr(buf.strip_suffix(b"\n").unwrap_or(&buf));
        size += line.len() + 1;
        if size > max_size {
            debug!("Article exceeds {} bytes", max_size);
            return Err(SubmitError::SizeExceeded { limit: max_size });
        }
        article.push_line(line);
    }

    trace!(
        "Read article: {} lines, {} bytes",
        article.line_count(),
        article.len()
    );
    Ok(article)
}
