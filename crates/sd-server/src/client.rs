//! Client side of the TCP connection, for driving a `ReplicatedLog`.
//!
//! `connect` splits the socket into two tasks. Outbound messages go through
//! `ChannelTransport`, which never blocks the caller; inbound messages
//! arrive on the returned receiver and should be passed to
//! `ReplicatedLog::handle` in order.

use crate::error::ServerError;
use crate::net::write_line;
use sd_editor::protocol::{decode_line, encode_line};
use sd_editor::{ClientMessage, ServerMessage, Transport, TransportError};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// `Transport` that queues messages for the connection's writer task.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl Transport for ChannelTransport {
    fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .map_err(|_| TransportError("connection closed".to_string()))
    }
}

pub async fn connect(
    addr: SocketAddr,
) -> Result<(ChannelTransport, mpsc::UnboundedReceiver<ServerMessage>), ServerError> {
    let stream = TcpStream::connect(addr).await?;
    let (read, mut write) = stream.into_split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
    let (in_tx, in_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let line = match encode_line(&message) {
                Ok(line) => line,
                Err(err) => {
                    log::error!("cannot encode request: {err}");
                    continue;
                }
            };
            if let Err(err) = write_line(&mut write, &line).await {
                log::debug!("write failed: {err}");
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut lines = BufReader::new(read).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match decode_line::<ServerMessage>(&line) {
                Ok(message) => {
                    if in_tx.send(message).is_err() {
                        break;
                    }
                }
                Err(err) => log::warn!("dropping malformed server message: {err}"),
            }
        }
        log::info!("disconnected from {addr}");
    });

    Ok((ChannelTransport { tx: out_tx }, in_rx))
}
