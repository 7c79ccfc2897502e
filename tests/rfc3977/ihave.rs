//! RFC 3977 Section 6.3.2 - IHAVE
//!
//! Peer transfer: `IHAVE <message-id>`, 335 (send it) or 435 (not wanted),
//! article + dot line, 235.
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc3977#section-6.3.2

use super::fake::{ARTICLE, ARTICLE_WIRE, DuplexDialer, Script, serve};
use nntp_submit::{
    Phase, RawArticle, SubmitConfig, SubmitError, SubmitMode, SubmitOutcome, Submitter, codes,
};
use std::sync::atomic::Ordering;

fn config() -> SubmitConfig {
    SubmitConfig::new("127.0.0.1:9050", "news.example.com:119")
}

#[tokio::test]
async fn test_ihave_transferred() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server = serve(server, Script::new("335 send it\r\n", "235 article transferred ok\r\n"));
    let (dialer, dials) = DuplexDialer::new(client);

    let article = RawArticle::from_text(ARTICLE);
    let report = Submitter::new(config(), dialer)
        .submit(SubmitMode::Ihave, &article)
        .await
        .unwrap();

    assert_eq!(report.outcome, SubmitOutcome::Accepted);
    assert_eq!(report.command_reply.code, codes::SEND_ARTICLE_TRANSFER);
    assert_eq!(
        report.transfer_reply.map(|r| r.code),
        Some(codes::ARTICLE_TRANSFERRED)
    );
    assert_eq!(dials.load(Ordering::SeqCst), 1);

    let received = String::from_utf8(server.await.unwrap()).unwrap();
    let expected = format!("IHAVE <abc@example>\r\n{}.\r\nQUIT\r\n", ARTICLE_WIRE);
    assert_eq!(received, expected);
}

#[tokio::test]
async fn test_ihave_not_wanted_is_success() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server = serve(server, Script::new("435 article not wanted\r\n", "unused\r\n"));
    let (dialer, _) = DuplexDialer::new(client);

    let article = RawArticle::from_text(ARTICLE);
    let report = Submitter::new(config(), dialer)
        .submit(SubmitMode::Ihave, &article)
        .await
        .unwrap();

    assert_eq!(report.outcome, SubmitOutcome::ServerAlreadyHasArticle);
    assert_eq!(report.command_reply.to_string(), "435 article not wanted");
    assert!(report.transfer_reply.is_none());

    // No body, just QUIT
    let received = server.await.unwrap();
    assert_eq!(received, b"IHAVE <abc@example>\r\nQUIT\r\n");
}

#[tokio::test]
async fn test_ihave_transfer_rejected() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server = serve(server, Script::new("335 send it\r\n", "437 article rejected\r\n"));
    let (dialer, _) = DuplexDialer::new(client);

    let article = RawArticle::from_text(ARTICLE);
    let err = Submitter::new(config(), dialer)
        .submit(SubmitMode::Ihave, &article)
        .await
        .unwrap_err();

    assert!(matches!(&err, SubmitError::TransferFailed(r) if r.code == codes::TRANSFER_REJECTED));
    assert_eq!(err.to_string(), "article transfer failed: 437 article rejected");
    server.await.unwrap();
}

#[tokio::test]
async fn test_ihave_try_later_is_rejection() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server = serve(server, Script::new("436 transfer not possible\r\n", "unused\r\n"));
    let (dialer, _) = DuplexDialer::new(client);

    let article = RawArticle::from_text(ARTICLE);
    let err = Submitter::new(config(), dialer)
        .submit(SubmitMode::Ihave, &article)
        .await
        .unwrap_err();

    match &err {
        SubmitError::CommandRejected { command, response } => {
            assert_eq!(*command, "IHAVE");
            assert_eq!(response.code, codes::TRANSFER_NOT_POSSIBLE);
        }
        other => panic!("expected CommandRejected, got {:?}", other),
    }
    assert_eq!(err.phase(), Some(Phase::Command));

    let received = server.await.unwrap();
    assert_eq!(received, b"IHAVE <abc@example>\r\n");
}

#[tokio::test]
async fn test_ihave_missing_message_id_never_dials() {
    let (client, _server) = tokio::io::duplex(1024);
    let (dialer, dials) = DuplexDialer::new(client);

    let article = RawArticle::from_text("Subject: anonymous\n\nno identifier here\n");
    let err = Submitter::new(config(), dialer)
        .submit(SubmitMode::Ihave, &article)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::MissingMessageId));
    assert_eq!(dials.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ihave_message_id_after_blank_line() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server = serve(server, Script::new("335 send it\r\n", "235 ok\r\n"));
    let (dialer, _) = DuplexDialer::new(client);

    let article = RawArticle::from_text("\nMessage-ID: <late@example>\n\nbody\n");
    let report = Submitter::new(config(), dialer)
        .submit(SubmitMode::Ihave, &article)
        .await
        .unwrap();
    assert_eq!(report.outcome, SubmitOutcome::Accepted);

    let received = server.await.unwrap();
    assert!(received.starts_with(b"IHAVE <late@example>\r\n"));
}

#[tokio::test]
async fn test_ihave_message_id_case_insensitive() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server = serve(server, Script::new("435 duplicate\r\n", "unused\r\n"));
    let (dialer, _) = DuplexDialer::new(client);

    let article = RawArticle::from_text("MESSAGE-ID:   <Mixed@Case.example>  \nSubject: x\n\nbody\n");
    Submitter::new(config(), dialer)
        .submit(SubmitMode::Ihave, &article)
        .await
        .unwrap();

    let received = server.await.unwrap();
    assert!(received.starts_with(b"IHAVE <Mixed@Case.example>\r\n"));
}
