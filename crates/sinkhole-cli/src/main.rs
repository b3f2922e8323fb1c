//! sinkhole - settings and log ring tool for the sinkhole DNS engine.

use std::process::ExitCode;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    sinkhole_cli::run().await
}
