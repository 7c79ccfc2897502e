//! Process exit status for each submission outcome
//!
//! Success and IHAVE 435 exit 0; every failure exits 1 with one
//! `Error: ...` line.

use super::fake::{ARTICLE, DuplexDialer, Script, serve};
use nntp_submit::runner::execute;
use nntp_submit::{SubmitConfig, SubmitMode};
use std::process::ExitCode;

struct Run {
    status: ExitCode,
    stdout: String,
    stderr: String,
}

async fn run(mode: SubmitMode, script: Script, input: &[u8]) -> Run {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server = serve(server, script);
    let (dialer, _) = DuplexDialer::new(client);

    let config = SubmitConfig::new("127.0.0.1:9050", "news.example.com:119");
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let status = execute(mode, config, input, dialer, &mut stdout, &mut stderr).await;
    server.await.unwrap();

    Run {
        status,
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
    }
}

#[tokio::test]
async fn test_post_success_exits_zero() {
    let run = run(
        SubmitMode::Post,
        Script::new("340 send article\r\n", "240 article posted ok\r\n"),
        ARTICLE.as_bytes(),
    )
    .await;
    assert_eq!(run.status, ExitCode::SUCCESS);
    assert_eq!(run.stdout, "240 article posted ok\n");
    assert!(run.stderr.is_empty());
}

#[tokio::test]
async fn test_post_rejection_exits_one() {
    let run = run(
        SubmitMode::Post,
        Script::new("440 posting not allowed\r\n", "unused\r\n"),
        ARTICLE.as_bytes(),
    )
    .await;
    assert_eq!(run.status, ExitCode::FAILURE);
    assert!(run.stdout.is_empty());
    assert_eq!(
        run.stderr,
        "Error: server did not accept POST command: 440 posting not allowed\n"
    );
}

#[tokio::test]
async fn test_ihave_not_wanted_exits_zero() {
    let run = run(
        SubmitMode::Ihave,
        Script::new("435 article not wanted\r\n", "unused\r\n"),
        ARTICLE.as_bytes(),
    )
    .await;
    assert_eq!(run.status, ExitCode::SUCCESS);
    assert_eq!(
        run.stdout,
        "200 news.example.com ready\n435 article not wanted\n"
    );
    assert!(run.stderr.is_empty());
}

#[tokio::test]
async fn test_ihave_transfer_failure_exits_one() {
    let run = run(
        SubmitMode::Ihave,
        Script::new("335 send it\r\n", "437 article rejected\r\n"),
        ARTICLE.as_bytes(),
    )
    .await;
    assert_eq!(run.status, ExitCode::FAILURE);
    assert!(run.stdout.is_empty());
    assert_eq!(run.stderr, "Error: article transfer failed: 437 article rejected\n");
}

#[tokio::test]
async fn test_oversized_article_exits_one() {
    let (client, _server) = tokio::io::duplex(1024);
    let (dialer, dials) = DuplexDialer::new(client);
    let config = SubmitConfig::new("127.0.0.1:9050", "news.example.com:119")
        .with_max_article_size(1024);
    let input = vec![b'x'; 2048];

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let status = execute(
        SubmitMode::Post,
        config,
        input.as_slice(),
        dialer,
        &mut stdout,
        &mut stderr,
    )
    .await;

    assert_eq!(status, ExitCode::FAILURE);
    assert_eq!(
        String::from_utf8(stderr).unwrap(),
        "Error: article size exceeds 1 KB\n"
    );
    assert_eq!(dials.load(std::sync::atomic::Ordering::SeqCst), 0);
}
