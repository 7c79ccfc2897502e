//! In-process fake transport and scripted NNTP server

#![allow(dead_code)]

use nntp_submit::{Dialer, Result, SubmitError};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

/// Hands out one end of a duplex pipe on the first dial
pub struct DuplexDialer {
    stream: Mutex<Option<DuplexStream>>,
    dials: Arc<AtomicUsize>,
}

impl DuplexDialer {
    /// Dialer whose single connection is `stream`, plus a dial counter
    pub fn new(stream: DuplexStream) -> (Self, Arc<AtomicUsize>) {
        let dials = Arc::new(AtomicUsize::new(0));
        let dialer = Self {
            stream: Mutex::new(Some(stream)),
            dials: Arc::clone(&dials),
        };
        (dialer, dials)
    }
}

impl Dialer for DuplexDialer {
    type Stream = DuplexStream;

    fn dial(&self, server: &str) -> impl Future<Output = Result<DuplexStream>> + Send {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let stream = self.stream.lock().unwrap().take();
        let server = server.to_string();
        async move {
            stream.ok_or_else(|| SubmitError::Connect {
                server,
                reason: "fake transport already used".to_string(),
            })
        }
    }
}

/// What the fake server answers at each step
#[derive(Clone, Copy)]
pub struct Script {
    pub greeting: Option<&'static str>,
    pub command_reply: &'static str,
    pub transfer_reply: &'static str,
}

impl Script {
    pub fn new(command_reply: &'static str, transfer_reply: &'static str) -> Self {
        Self {
            greeting: Some("200 news.example.com ready\r\n"),
            command_reply,
            transfer_reply,
        }
    }
}

/// Run `script` on the server end; resolves to every byte the client sent
pub fn serve(stream: DuplexStream, script: Script) -> JoinHandle<Vec<u8>> {
    tokio::spawn(async move {
        let mut stream = BufReader::new(stream);
        let mut received = Vec::new();

        let Some(greeting) = script.greeting else {
            return received;
        };
        stream.get_mut().write_all(greeting.as_bytes()).await.unwrap();

        // Submission command
        if stream.read_until(b'\n', &mut received).await.unwrap() == 0 {
            return received;
        }
        stream
            .get_mut()
            .write_all(script.command_reply.as_bytes())
            .await
            .unwrap();

        if script.command_reply.starts_with("340") || script.command_reply.starts_with("335") {
            loop {
                let start = received.len();
                if stream.read_until(b'\n', &mut received).await.unwrap() == 0 {
                    return received;
                }
                if &received[start..] == b".\r\n" {
                    break;
                }
            }
            stream
                .get_mut()
                .write_all(script.transfer_reply.as_bytes())
                .await
                .unwrap();
        }

        // QUIT (if any) until the client closes
        stream.read_to_end(&mut received).await.unwrap();
        received
    })
}

/// A small article with a Message-ID
pub const ARTICLE: &str = "From: poster@example.com\n\
Newsgroups: alt.test\n\
Subject: test\n\
Message-ID: <abc@example>\n\
\n\
Hello, world.\n";

/// ARTICLE as it appears on the wire
pub const ARTICLE_WIRE: &str = "From: poster@example.com\r\n\
Newsgroups: alt.test\r\n\
Subject: test\r\n\
Message-ID: <abc@example>\r\n\
\r\n\
Hello, world.\r\n";
