//! SOCKS5 proxied transport
//!
//! Opens a TCP connection to a SOCKS5 proxy, negotiates the no-authentication
//! method and asks the proxy to relay a TCP connection to the news server
//! (RFC 1928). Target hostnames are sent to the proxy unresolved, so hidden
//! service addresses work when the proxy is Tor.

use crate::config::{DEFAULT_CONNECT_TIMEOUT, SubmitConfig};
use crate::error::{Result, SubmitError};
use socket2::SockRef;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

const SOCKS_VERSION: u8 = 0x05;
const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_NONE_ACCEPTABLE: u8 = 0xFF;
const CMD_CONNECT: u8 = 0x01;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;
const REPLY_SUCCEEDED: u8 = 0x00;

/// Capability to open a duplex byte stream to a server address
///
/// The submission engine only needs this; production code uses
/// [`Socks5Dialer`], tests plug in in-memory streams.
pub trait Dialer {
    /// Stream type produced by [`dial`](Self::dial)
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Open a connection to `server` (`host:port`)
    fn dial(&self, server: &str) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// Dials news servers through a SOCKS5 proxy without authentication
#[derive(Debug, Clone)]
pub struct Socks5Dialer {
    proxy: String,
    connect_timeout: Duration,
}

impl Socks5Dialer {
    /// Dialer for the proxy at `proxy` (`host:port`)
    pub fn new(proxy: impl Into<String>) -> Self {
        Self {
            proxy: proxy.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Dialer taking proxy address and timeout from `config`
    pub fn from_config(config: &SubmitConfig) -> Self {
        Self::new(config.proxy.clone()).with_timeout(config.connect_timeout)
    }

    /// Bound the proxy connect plus handshake
    pub fn with_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl Dialer for Socks5Dialer {
    type Stream = TcpStream;

    fn dial(&self, server: &str) -> impl Future<Output = Result<TcpStream>> + Send {
        let proxy = self.proxy.clone();
        let server = server.to_string();
        let connect_timeout = self.connect_timeout;
        async move { connect(&proxy, &server, connect_timeout).await }
    }
}

/// Connect to `server` through the SOCKS5 proxy at `proxy`
///
/// # Errors
///
/// - [`SubmitError::InvalidAddress`] - `server` is not a valid `host:port`
/// - [`SubmitError::Proxy`] - proxy unreachable or handshake rejected
/// - [`SubmitError::Connect`] - proxy could not reach `server`
/// - [`SubmitError::Timeout`] - the whole exchange exceeded `connect_timeout`
pub async fn connect(proxy: &str, server: &str, connect_timeout: Duration) -> Result<TcpStream> {
    let target = TargetAddr::parse(server)?;
    debug!("Connecting to {} through SOCKS5 proxy {}", server, proxy);

    timeout(connect_timeout, async {
        let mut stream = connect_proxy(proxy).await?;
        handshake(&mut stream, &target)
            .await
            .map_err(|failure| failure.into_error(proxy, server))?;
        Ok::<_, SubmitError>(stream)
    })
    .await
    .map_err(|_| SubmitError::Timeout)?
}

fn proxy_error(proxy: &str, reason: impl Into<String>) -> SubmitError {
    SubmitError::Proxy {
        proxy: proxy.to_string(),
        reason: reason.into(),
    }
}

async fn connect_proxy(proxy: &str) -> Result<TcpStream> {
    // Async connect so the surrounding timeout can abandon it
    let stream = TcpStream::connect(proxy)
        .await
        .map_err(|e| proxy_error(proxy, e.to_string()))?;

    // Request/response protocol: don't let Nagle hold back short commands
    if let Err(e) = SockRef::from(&stream).set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY on proxy socket: {}", e);
    }
    Ok(stream)
}

/// Destination as encoded in a CONNECT request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TargetAddr {
    Ip(SocketAddr),
    Domain(String, u16),
}

impl TargetAddr {
    /// Parse `host:port`, `a.b.c.d:port` or `[v6]:port`
    pub(crate) fn parse(addr: &str) -> Result<Self> {
        let invalid = || SubmitError::InvalidAddress(addr.to_string());

        if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
            return Ok(TargetAddr::Ip(socket_addr));
        }

        let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() || host.len() > 255 {
            return Err(invalid());
        }
        match host.parse::<IpAddr>() {
            Ok(ip) => Ok(TargetAddr::Ip(SocketAddr::new(ip, port))),
            Err(_) => Ok(TargetAddr::Domain(host.to_string(), port)),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => {
                out.push(ATYP_IPV4);
                out.extend_from_slice(&addr.ip().octets());
                out.extend_from_slice(&addr.port().to_be_bytes());
            }
            TargetAddr::Ip(SocketAddr::V6(addr)) => {
                out.push(ATYP_IPV6);
                out.extend_from_slice(&addr.ip().octets());
                out.extend_from_slice(&addr.port().to_be_bytes());
            }
            TargetAddr::Domain(host, port) => {
                out.push(ATYP_DOMAIN);
                // Length checked by parse()
                out.push(host.len() as u8);
                out.extend_from_slice(host.as_bytes());
                out.extend_from_slice(&port.to_be_bytes());
            }
        }
    }
}

/// Build the CONNECT request for `target`
pub(crate) fn connect_request(target: &TargetAddr) -> Vec<u8> {
    let mut request = vec![SOCKS_VERSION, CMD_CONNECT, 0x00];
    target.encode(&mut request);
    request
}

/// Human-readable text for a SOCKS5 reply code (RFC 1928 Section 6)
pub fn reply_message(code: u8) -> &'static str {
    match code {
        0x00 => "succeeded",
        0x01 => "general SOCKS server failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "TTL expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unassigned reply code",
    }
}

/// Why a handshake on an open proxy connection failed
#[derive(Debug)]
pub(crate) enum HandshakeFailure {
    /// Proxy misbehaved or refused the session
    Proxy(String),
    /// Proxy answered CONNECT with a failure reply
    Relay(u8),
}

impl HandshakeFailure {
    fn into_error(self, proxy: &str, server: &str) -> SubmitError {
        match self {
            HandshakeFailure::Proxy(reason) => proxy_error(proxy, reason),
            HandshakeFailure::Relay(code) => SubmitError::Connect {
                server: server.to_string(),
                reason: reply_message(code).to_string(),
            },
        }
    }
}

impl From<std::io::Error> for HandshakeFailure {
    fn from(e: std::io::Error) -> Self {
        HandshakeFailure::Proxy(format!("handshake I/O error: {}", e))
    }
}

/// Run method negotiation and CONNECT on an open proxy stream
pub(crate) async fn handshake<S>(
    stream: &mut S,
    target: &TargetAddr,
) -> std::result::Result<(), HandshakeFailure>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Method selection: offer "no authentication" only
    stream
        .write_all(&[SOCKS_VERSION, 1, METHOD_NO_AUTH])
        .await?;
    stream.flush().await?;

    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await?;
    trace!("SOCKS5 method reply: {:02x?}", choice);
    if choice[0] != SOCKS_VERSION {
        return Err(HandshakeFailure::Proxy(format!(
            "unexpected SOCKS version {:#04x}",
            choice[0]
        )));
    }
    match choice[1] {
        METHOD_NO_AUTH => {}
        METHOD_NONE_ACCEPTABLE => {
            return Err(HandshakeFailure::Proxy(
                "no acceptable authentication method".to_string(),
            ));
        }
        other => {
            return Err(HandshakeFailure::Proxy(format!(
                "proxy selected unsupported method {:#04x}",
                other
            )));
        }
    }

    stream.write_all(&connect_request(target)).await?;
    stream.flush().await?;

    // VER REP RSV ATYP
    let mut head = [0u8; 4];
    stream.read_exact(&mut head).await?;
    trace!("SOCKS5 connect reply: {:02x?}", head);
    if head[0] != SOCKS_VERSION {
        return Err(HandshakeFailure::Proxy(format!(
            "unexpected SOCKS version {:#04x}",
            head[0]
        )));
    }
    if head[1] != REPLY_SUCCEEDED {
        debug!("SOCKS5 CONNECT failed: {}", reply_message(head[1]));
        return Err(HandshakeFailure::Relay(head[1]));
    }

    // Drain BND.ADDR and BND.PORT so the stream starts at the server's bytes
    let bound_len = match head[3] {
        ATYP_IPV4 => 4,
        ATYP_IPV6 => 16,
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            usize::from(len[0])
        }
        other => {
            return Err(HandshakeFailure::Proxy(format!(
                "unknown bound address type {:#04x}",
                other
            )));
        }
    };
    let mut bound = vec![0u8; bound_len + 2];
    stream.read_exact(&mut bound).await?;

    debug!("SOCKS5 relay established");
    Ok(())
}
