pub mod cli;
pub mod core;

use std::process::ExitCode;

use anyhow::Context;

use cli::Cli;

pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(cli::dispatch(cli))
}
