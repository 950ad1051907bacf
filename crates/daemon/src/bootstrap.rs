// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process bootstrap (§2, §6): wires the scheduler, transport connection,
//! socket-link server, and browse server into one running proxy, the way
//! §2's data-flow diagram describes it end to end.

use std::sync::Arc;

use edgeproxy_browse::{BrowseCaps, BrowseServer};
use edgeproxy_core::{Address, ErrorCode};
use edgeproxy_link::LinkServer;
use edgeproxy_pal::fs::TokioFs;
use edgeproxy_pal::scan::TcpConnectScan;
use edgeproxy_pal::sd::UnavailableSdClient;
use edgeproxy_pal::socket::tokio_impl::TokioSocketFactory;
use edgeproxy_pal::{PalFs, PalScan, PalSdClient, PalSocket, PalSocketFactory, SocketSpec};
use edgeproxy_scheduler::Scheduler;
use edgeproxy_storage::Registry;
use edgeproxy_transport::{Transport, WsTransport};
use edgeproxy_wire::MessageFactory;
use tokio::sync::mpsc;

use crate::config::ProxyConfig;
use crate::error::DaemonError;
use crate::heartbeat::Heartbeat;

/// Runs the daemon until the broker connection is torn down (§2 SYSTEM
/// OVERVIEW), at which point the process self-releases (§8 S6).
pub async fn run(config: ProxyConfig) -> Result<(), DaemonError> {
    let local_registry = Registry::load(&config.local_registry_path)?;
    let hub_registry = Registry::load(&config.hub_registry_path)?;
    tracing::info!(local = local_registry.len(), hub = hub_registry.len(), "name-service registries loaded");

    let scheduler = Scheduler::create(None);
    let self_address = Address::random();

    let (events_tx, events_rx) = mpsc::channel(256);
    let transport = WsTransport;
    let connection = transport
        .create_connection(&config.connection_string, events_tx)
        .await
        .map_err(DaemonError::Transport)?;

    let message_factory = Arc::new(MessageFactory::new(config.inflight_cap));
    let heartbeat = Heartbeat::new(
        scheduler.clone(),
        connection.clone(),
        message_factory,
        self_address,
        config.connection_string.clone(),
        config.heartbeat_interval,
    );
    heartbeat.arm();

    let socket_factory: Arc<dyn PalSocketFactory> = Arc::new(TokioSocketFactory);
    let link_server = LinkServer::new(connection, socket_factory.clone(), self_address);

    let browse_server = spawn_browse_server(&config, scheduler.clone());
    let browse_listener = bind_browse_listener(socket_factory, &config).await?;
    tokio::spawn(browse_server.run(browse_listener));

    spawn_telemetry(link_server.clone(), config.telemetry_log_interval);

    tracing::info!(name = %config.name, address = %self_address, "proxy started");
    link_server.run(events_rx).await;
    tracing::info!("broker connection closed; proxy shutting down");
    Ok(())
}

fn spawn_browse_server(config: &ProxyConfig, scheduler: Arc<Scheduler>) -> Arc<BrowseServer> {
    let fs: Arc<dyn PalFs> = Arc::new(TokioFs);
    let scan: Arc<dyn PalScan> = Arc::new(TcpConnectScan::default());
    let caps = BrowseCaps { fs_enabled: config.browse_fs_enabled, scan_enabled: config.scan_enabled };
    let sd_factory: Arc<dyn Fn() -> Result<Arc<dyn PalSdClient>, ErrorCode> + Send + Sync> =
        Arc::new(|| Ok(Arc::new(UnavailableSdClient) as Arc<dyn PalSdClient>));

    BrowseServer::new(fs, scan, scheduler, caps, config.browse_timings, sd_factory)
}

async fn bind_browse_listener(
    factory: Arc<dyn PalSocketFactory>,
    config: &ProxyConfig,
) -> Result<Arc<dyn PalSocket>, DaemonError> {
    let socket = factory.create(SocketSpec { stream: true }).await.map_err(DaemonError::Transport)?;
    socket.bind(config.browse_listen_addr).await.map_err(DaemonError::Transport)?;
    socket.listen(16).await.map_err(DaemonError::Transport)?;
    Ok(Arc::from(socket))
}

/// A periodic `info`-level status line (§9(b): the original's 2s
/// log-telemetry interval, promoted to configuration alongside the
/// heartbeat). Pure observability, so it runs on a plain `tokio::time`
/// interval rather than through the scheduler's `do-later` debounce, which
/// is reserved for state the core itself must act on.
fn spawn_telemetry(link_server: Arc<LinkServer>, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            tracing::info!(links = link_server.link_count(), "proxy status");
        }
    });
}
