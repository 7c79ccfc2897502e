//! Post a raw article read from stdin with the NNTP POST command

use nntp_submit::{SubmitConfig, SubmitMode, runner};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    runner::init_tracing();
    runner::run(SubmitMode::Post, SubmitConfig::post()).await
}
