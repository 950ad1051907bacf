// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal, non-TLS WebSocket reference adapter (§4.3, §6).
//!
//! Each codec-encoded [`Message`] is sent as exactly one WS binary frame —
//! WebSocket's own framing supplies the boundary the length-delimited
//! framing in `edgeproxy-wire` exists for on a raw byte stream, so this
//! adapter calls `rmp-serde` directly rather than going through
//! `edgeproxy_wire::codec`'s length-prefixed helpers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use edgeproxy_core::ErrorCode;
use edgeproxy_wire::Message;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::connection::{Connection, ConnectionEvent};
use crate::error::TransportError;
use crate::transport::Transport;

enum OutCmd {
    Send(Message),
    Close,
}

pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn create_connection(
        &self,
        entry: &str,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn Connection>, ErrorCode> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(entry).await.map_err(|e| {
            let err = TransportError::from(e);
            tracing::warn!(%entry, error = %err, "ws connect failed");
            err.code()
        })?;
        let (mut sink, mut stream) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<OutCmd>(64);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    incoming = stream.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Binary(bytes))) => {
                                match rmp_serde::from_slice::<Message>(&bytes) {
                                    Ok(msg) => {
                                        if events.send(ConnectionEvent::Received(msg)).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(e) => {
                                        tracing::warn!(error = %TransportError::from(e), "failed to decode ws frame")
                                    }
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "ws read error");
                                break;
                            }
                        }
                    }
                    cmd = out_rx.recv() => {
                        match cmd {
                            Some(OutCmd::Send(msg)) => match rmp_serde::to_vec_named(&msg) {
                                Ok(bytes) => {
                                    if sink.send(WsMessage::Binary(bytes)).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!(error = %TransportError::from(e), "failed to encode ws frame")
                                }
                            },
                            Some(OutCmd::Close) | None => {
                                let _ = sink.close().await;
                                break;
                            }
                        }
                    }
                }
            }
            let _ = events.send(ConnectionEvent::Closed).await;
        });

        Ok(Arc::new(WsConnection { out_tx, closed: Arc::new(AtomicBool::new(false)) }))
    }
}

struct WsConnection {
    out_tx: mpsc::Sender<OutCmd>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&self, message: Message) -> Result<(), ErrorCode> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ErrorCode::Closed);
        }
        self.out_tx.send(OutCmd::Send(message)).await.map_err(|_| ErrorCode::Closed)
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.out_tx.send(OutCmd::Close).await;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
