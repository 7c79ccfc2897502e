//! Offer a raw article read from stdin to a peer with the NNTP IHAVE command

use nntp_submit::{SubmitConfig, SubmitMode, runner};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    runner::init_tracing();
    runner::run(SubmitMode::Ihave, SubmitConfig::ihave()).await
}
