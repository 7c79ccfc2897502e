//! Process entry points shared by the `nntp-post` and `nntp-ihave` binaries

use crate::article::read_article;
use crate::config::SubmitConfig;
use crate::error::Result;
use crate::socks::{Dialer, Socks5Dialer};
use crate::submit::{SubmitMode, SubmitReport, Submitter};
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG` (default `warn`)
///
/// Stdout is reserved for server responses.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read an article from `input` and submit it with `mode` through `dialer`
///
/// The size cap is enforced while reading, before any connection is opened.
pub async fn submit_with<R, D>(
    mode: SubmitMode,
    config: SubmitConfig,
    input: R,
    dialer: D,
) -> Result<SubmitReport>
where
    R: AsyncBufRead + Unpin,
    D: Dialer,
{
    let article = read_article(input, config.max_article_size).await?;
    Submitter::new(config, dialer).submit(mode, &article).await
}

/// [`submit_with`] through the SOCKS5 proxy named in `config`
pub async fn submit_from<R>(
    mode: SubmitMode,
    config: SubmitConfig,
    input: R,
) -> Result<SubmitReport>
where
    R: AsyncBufRead + Unpin,
{
    let dialer = Socks5Dialer::from_config(&config);
    submit_with(mode, config, input, dialer).await
}

/// Echo the server's lines for a successful run
///
/// IHAVE shows the whole exchange; POST only the final confirmation.
pub fn print_report(
    mode: SubmitMode,
    report: &SubmitReport,
    out: &mut impl Write,
) -> std::io::Result<()> {
    if mode == SubmitMode::Ihave {
        writeln!(out, "{}", report.greeting)?;
        writeln!(out, "{}", report.command_reply)?;
    }
    if let Some(reply) = &report.transfer_reply {
        writeln!(out, "{}", reply)?;
    }
    Ok(())
}

/// Run one submission and map the result to an exit status
///
/// Server lines go to `out` on success; a single `Error: ...` line goes to
/// `err` on failure.
pub async fn execute<R, D>(
    mode: SubmitMode,
    config: SubmitConfig,
    input: R,
    dialer: D,
    out: &mut impl Write,
    err: &mut impl Write,
) -> ExitCode
where
    R: AsyncBufRead + Unpin,
    D: Dialer,
{
    match submit_with(mode, config, input, dialer).await {
        Ok(report) => {
            // Output is informational; a closed stdout doesn't fail the submission
            let _ = print_report(mode, &report, out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!(
                phase = ?e.phase(),
                transport = e.is_transport(),
                "{} failed",
                mode
            );
            let _ = writeln!(err, "Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Submit stdin with `mode` through the configured proxy
pub async fn run(mode: SubmitMode, config: SubmitConfig) -> ExitCode {
    let stdin = BufReader::new(tokio::io::stdin());
    let dialer = Socks5Dialer::from_config(&config);
    execute(
        mode,
        config,
        stdin,
        dialer,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await
}
