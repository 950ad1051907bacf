// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use edgeproxy_daemon::{bootstrap, cli::Cli, config::ProxyConfig, install, logging};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    logging::init();
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => edgeproxy_core::ErrorCode::Ok,
        Err(code) => {
            tracing::error!(%code, "proxyd exited with an error");
            code
        }
    };
    std::process::ExitCode::from(code.as_i32() as u8)
}

async fn run(cli: Cli) -> Result<(), edgeproxy_core::ErrorCode> {
    let config = ProxyConfig::load(&cli).map_err(|e| {
        tracing::error!(error = %e, "failed to load configuration");
        e.code()
    })?;

    if cli.install {
        return install::install(&config).map_err(|e| e.code());
    }
    if cli.uninstall {
        return install::uninstall(&config).map_err(|e| e.code());
    }

    bootstrap::run(config).await.map_err(|e| e.code())
}
