#![doc = include_str!("../README.md")]

/// Raw article reading and size enforcement
pub mod article;
mod config;
mod error;
/// CRLF line-ending normalization
pub mod normalize;
mod response;
/// Process entry points for the bundled binaries
pub mod runner;
/// SOCKS5 proxied transport
pub mod socks;
mod submit;

pub use article::{RawArticle, read_article};
pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_IHAVE_SERVER, DEFAULT_MAX_ARTICLE_SIZE, DEFAULT_POST_SERVER,
    DEFAULT_PROXY, SubmitConfig,
};
pub use error::{Phase, Result, SubmitError};
pub use normalize::{LineEndingNormalizer, NormalizedWriter, normalize};
pub use response::{NntpResponse, codes};
pub use socks::{Dialer, Socks5Dialer};
pub use submit::{SubmitMode, SubmitOutcome, SubmitReport, Submitter};
