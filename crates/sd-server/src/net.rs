//! TCP transport for `ServerSession`.
//!
//! Messages are newline-delimited JSON. One loop owns the session and
//! handles every inbound message in arrival order; per-connection tasks
//! only move lines between sockets and channels.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::session::{Outgoing, ServerSession};
use sd_editor::protocol::{decode_line, encode_line, request_seq};
use sd_editor::{ClientMessage, ServerMessage, UserId};
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

enum Inbound {
    Message(UserId, ClientMessage),
    /// A request whose command did not decode.
    Malformed(UserId, u64, String),
    Closed(UserId),
}

/// Bind `config.listen` and serve until the task is dropped.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.listen).await?;
    log::info!(
        "listening on {} (undo policy: {})",
        listener.local_addr()?,
        config.policy
    );
    serve(listener, ServerSession::new(&config)).await;
    Ok(())
}

/// Accept connections on `listener` and drive `session`. Never returns.
pub async fn serve(listener: TcpListener, mut session: ServerSession) {
    let (inbox_tx, mut inbox) = mpsc::unbounded_channel();
    let mut peers: HashMap<UserId, mpsc::UnboundedSender<String>> = HashMap::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let (user, greeting) = session.connect();
                    log::info!("{user} connected from {addr}");
                    let outbox = spawn_peer(stream, user.clone(), inbox_tx.clone());
                    for message in &greeting {
                        push(&outbox, message);
                    }
                    peers.insert(user, outbox);
                }
                Err(err) => log::warn!("accept failed: {err}"),
            },
            Some(event) = inbox.recv() => match event {
                Inbound::Message(user, message) => {
                    for out in session.handle(&user, message) {
                        route(&peers, &out);
                    }
                }
                Inbound::Malformed(user, seq, reason) => {
                    for out in session.reject_malformed(&user, seq, reason) {
                        route(&peers, &out);
                    }
                }
                Inbound::Closed(user) => {
                    peers.remove(&user);
                    session.disconnect(&user);
                    log::info!("{user} disconnected");
                }
            },
        }
    }
}

fn route(peers: &HashMap<UserId, mpsc::UnboundedSender<String>>, out: &Outgoing) {
    let line = match encode_line(out.message()) {
        Ok(line) => line,
        Err(err) => {
            log::error!("cannot encode outgoing message: {err}");
            return;
        }
    };
    for (user, outbox) in peers {
        if out.includes(user) {
            // A closed outbox means the peer is going away; its reader
            // reports that separately.
            let _ = outbox.send(line.clone());
        }
    }
}

fn push(outbox: &mpsc::UnboundedSender<String>, message: &ServerMessage) {
    match encode_line(message) {
        Ok(line) => {
            let _ = outbox.send(line);
        }
        Err(err) => log::error!("cannot encode outgoing message: {err}"),
    }
}

/// Start the reader and writer tasks for one connection. Returns the
/// channel that feeds its writer.
fn spawn_peer(
    stream: TcpStream,
    user: UserId,
    inbox: mpsc::UnboundedSender<Inbound>,
) -> mpsc::UnboundedSender<String> {
    let (read, mut write) = stream.into_split();
    let (outbox, mut lines_out) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(line) = lines_out.recv().await {
            if let Err(err) = write_line(&mut write, &line).await {
                log::debug!("write failed: {err}");
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut lines = BufReader::new(read).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    let event = match decode_line::<ClientMessage>(&line) {
                        Ok(message) => Inbound::Message(user.clone(), message),
                        Err(err) => match request_seq(&line) {
                            Some(seq) => Inbound::Malformed(user.clone(), seq, err.to_string()),
                            None => {
                                log::warn!("{user}: dropping malformed message: {err}");
                                continue;
                            }
                        },
                    };
                    if inbox.send(event).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    log::debug!("{user}: read failed: {err}");
                    break;
                }
            }
        }
        let _ = inbox.send(Inbound::Closed(user));
    });

    outbox
}

/// Write one message line and flush.
pub(crate) async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
