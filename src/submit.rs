//! Article submission engine (RFC 3977 Sections 6.3.1 and 6.3.2)
//!
//! One engine drives both submission commands. The exchange is:
//!
//! 1. read the server greeting
//! 2. send `POST` or `IHAVE <message-id>` and check the status
//! 3. on 340 / 335 send the article and the terminating dot line
//! 4. check the final status (240 / 235)
//! 5. send `QUIT`
//!
//! IHAVE additionally treats 435 ("article not wanted") as a normal early
//! exit: the server already has the article, so nothing is transferred.

use crate::article::RawArticle;
use crate::config::SubmitConfig;
use crate::error::{Phase, Result, SubmitError};
use crate::normalize::NormalizedWriter;
use crate::response::{NntpResponse, codes};
use crate::socks::Dialer;
use std::fmt;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tracing::{debug, info, trace};

/// Longest status line accepted from the server, terminator included
const MAX_LINE_LENGTH: u64 = 4096;

/// Submission command variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// `POST`: client posting (340 then 240)
    Post,
    /// `IHAVE <id>`: peer transfer (335 then 235, 435 if already present)
    Ihave,
}

/// How the server answered the submission command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandReply {
    SendArticle,
    AlreadyHave,
    Rejected,
}

impl SubmitMode {
    /// Command verb as sent on the wire
    pub fn name(self) -> &'static str {
        match self {
            SubmitMode::Post => "POST",
            SubmitMode::Ihave => "IHAVE",
        }
    }

    /// Build the command line for `article`
    ///
    /// IHAVE needs the article's Message-ID; without one the article cannot
    /// be offered.
    pub fn command(self, article: &RawArticle) -> Result<String> {
        match self {
            SubmitMode::Post => Ok("POST\r\n".to_string()),
            SubmitMode::Ihave => {
                let message_id = article.message_id().ok_or(SubmitError::MissingMessageId)?;
                Ok(format!("IHAVE {}\r\n", message_id))
            }
        }
    }

    /// Status that asks for the article body
    pub fn send_article_code(self) -> u16 {
        match self {
            SubmitMode::Post => codes::SEND_ARTICLE,
            SubmitMode::Ihave => codes::SEND_ARTICLE_TRANSFER,
        }
    }

    /// Status confirming the transfer
    pub fn success_code(self) -> u16 {
        match self {
            SubmitMode::Post => codes::ARTICLE_POSTED,
            SubmitMode::Ihave => codes::ARTICLE_TRANSFERRED,
        }
    }

    fn classify(self, response: &NntpResponse) -> CommandReply {
        match (self, response.code) {
            (_, code) if code == self.send_article_code() => CommandReply::SendArticle,
            (SubmitMode::Ihave, codes::ARTICLE_NOT_WANTED) => CommandReply::AlreadyHave,
            _ => CommandReply::Rejected,
        }
    }
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal result of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Article posted (240) or transferred (235)
    Accepted,
    /// IHAVE answered with 435; nothing was transferred
    ServerAlreadyHasArticle,
}

/// What the server said during a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    /// How the run ended
    pub outcome: SubmitOutcome,
    /// Server banner, without line terminator
    pub greeting: String,
    /// Reply to POST / IHAVE
    pub command_reply: NntpResponse,
    /// Reply after the article body, if it was sent
    pub transfer_reply: Option<NntpResponse>,
}

/// Submission engine bound to a configuration and a dialer
///
/// # Example
///
/// ```no_run
/// use nntp_submit::{RawArticle, Socks5Dialer, SubmitConfig, SubmitMode, Submitter};
///
/// # async fn example() -> nntp_submit::Result<()> {
/// let config = SubmitConfig::post();
/// let dialer = Socks5Dialer::from_config(&config);
/// let submitter = Submitter::new(config, dialer);
///
/// let article = RawArticle::from_text("Newsgroups: alt.test\nSubject: hi\n\nhello\n");
/// let report = submitter.submit(SubmitMode::Post, &article).await?;
/// println!("{:?}", report.outcome);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Submitter<D> {
    config: SubmitConfig,
    dialer: D,
}

impl<D: Dialer> Submitter<D> {
    /// Create an engine that reaches `config.server` through `dialer`
    pub fn new(config: SubmitConfig, dialer: D) -> Self {
        Self { config, dialer }
    }

    /// Submit `article` using `mode`
    ///
    /// Pre-conditions (Message-ID for IHAVE) are checked before dialing. Once
    /// connected, the stream is shut down on every exit path.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::MissingMessageId`] - IHAVE without a Message-ID; no connection made
    /// - transport errors from the dialer
    /// - [`SubmitError::Greeting`] - banner could not be read
    /// - [`SubmitError::CommandRejected`] - unexpected reply to POST / IHAVE
    /// - [`SubmitError::TransferFailed`] - article refused after the body was sent
    pub async fn submit(&self, mode: SubmitMode, article: &RawArticle) -> Result<SubmitReport> {
        let command = mode.command(article)?;

        let stream = self.dialer.dial(&self.config.server).await?;
        debug!("Connected to {}", self.config.server);

        let mut session = Session::new(stream);
        let result = session.run(mode, &command, article).await;
        session.close().await;
        result
    }
}

/// One connected exchange
struct Session<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: NormalizedWriter<WriteHalf<S>>,
}

impl<S: AsyncRead + AsyncWrite> Session<S> {
    fn new(stream: S) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer: NormalizedWriter::new(write_half),
        }
    }

    async fn run(
        &mut self,
        mode: SubmitMode,
        command: &str,
        article: &RawArticle,
    ) -> Result<SubmitReport> {
        let greeting = self.read_line().await.map_err(SubmitError::Greeting)?;
        info!("Server greeting: {}", greeting);

        self.send(command.as_bytes(), Phase::Command).await?;
        let command_reply = self.read_response(Phase::Command).await?;
        debug!("{} reply: {}", mode, command_reply);

        match mode.classify(&command_reply) {
            CommandReply::SendArticle => {}
            CommandReply::AlreadyHave => {
                debug!("Article not wanted (code 435), skipping transfer");
                self.quit().await;
                return Ok(SubmitReport {
                    outcome: SubmitOutcome::ServerAlreadyHasArticle,
                    greeting,
                    command_reply,
                    transfer_reply: None,
                });
            }
            CommandReply::Rejected => {
                return Err(SubmitError::CommandRejected {
                    command: mode.name(),
                    response: command_reply,
                });
            }
        }

        debug!(
            "Sending article: {} lines, {} bytes",
            article.line_count(),
            article.len()
        );
        self.writer
            .write_all(&article.to_wire())
            .await
            .map_err(|source| SubmitError::Io {
                phase: Phase::Transfer,
                source,
            })?;
        self.send(b".\r\n", Phase::Transfer).await?;

        let transfer_reply = self.read_response(Phase::Transfer).await?;
        if transfer_reply.code != mode.success_code() {
            return Err(SubmitError::TransferFailed(transfer_reply));
        }
        debug!("Article accepted: {}", transfer_reply);

        self.quit().await;
        Ok(SubmitReport {
            outcome: SubmitOutcome::Accepted,
            greeting,
            command_reply,
            transfer_reply: Some(transfer_reply),
        })
    }

    /// Write and flush through the normalizer
    async fn send(&mut self, bytes: &[u8], phase: Phase) -> Result<()> {
        trace!("Sending: {}", String::from_utf8_lossy(bytes).trim_end());
        let result = async {
            self.writer.write_all(bytes).await?;
            self.writer.flush().await
        }
        .await;
        result.map_err(|source| SubmitError::Io { phase, source })
    }

    /// Read one line of at most [`MAX_LINE_LENGTH`] bytes; EOF before any
    /// byte is an error
    async fn read_line(&mut self) -> std::io::Result<String> {
        let mut line_bytes = Vec::with_capacity(512);
        let n = (&mut self.reader)
            .take(MAX_LINE_LENGTH)
            .read_until(b'\n', &mut line_bytes)
            .await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed",
            ));
        }
        if n as u64 == MAX_LINE_LENGTH && !line_bytes.ends_with(b"\n") {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("response line exceeds {} bytes", MAX_LINE_LENGTH),
            ));
        }
        let line = String::from_utf8_lossy(&line_bytes).trim_end().to_string();
        trace!("Received: {}", line);
        Ok(line)
    }

    async fn read_response(&mut self, phase: Phase) -> Result<NntpResponse> {
        let line = self
            .read_line()
            .await
            .map_err(|source| SubmitError::Io { phase, source })?;
        Ok(NntpResponse::parse(&line))
    }

    /// Best-effort QUIT; the outcome is already decided
    async fn quit(&mut self) {
        if let Err(e) = self.send(b"QUIT\r\n", Phase::Transfer).await {
            debug!("QUIT not sent: {}", e);
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!("Error closing connection: {}", e);
        }
    }
}
