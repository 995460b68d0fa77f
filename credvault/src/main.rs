// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use clap::Parser;
use credvault::application::Application;
use credvault::configuration::VaultOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,credvault=info".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        // stdout carries command output, keep the log on stderr
        .with_writer(std::io::stderr)
        .with_ansi(false)
        // remove the name of the function from every log entry
        .with_target(false)
        .init();

    // get configuration options from arguments and environment variables
    let options = VaultOptions::parse();

    tracing::debug!("[credvault] {:?}", &options);

    let application = Application::build(options).await?;

    application.run().await
}
