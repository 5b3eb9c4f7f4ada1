use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tracing::{debug, error, info, warn};

use super::actor::RoomManagerHandle;
use super::messages::{ClientMessage, ServerMessage};
use super::types::{ConnectionId, NegotiationKind, OutboundMessage, RoomId, parse_display_name};
use crate::config::Config;

#[derive(Debug, Clone, Copy)]
struct Keepalive {
    ping_interval: Duration,
    pong_timeout: Duration,
}

pub struct SignalingServer {
    listener: TcpListener,
    handle: RoomManagerHandle,
    keepalive: Keepalive,
}

impl SignalingServer {
    /// Bind the listener and start the room manager
    pub async fn bind(config: &Config) -> std::io::Result<Self> {
        let listener = TcpListener::bind(&config.bind_address).await?;
        info!("Signaling server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            handle: RoomManagerHandle::spawn(config.command_queue_capacity),
            keepalive: Keepalive {
                ping_interval: config.ping_interval,
                pong_timeout: config.pong_timeout,
            },
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> RoomManagerHandle {
        self.handle.clone()
    }

    pub async fn run(self) -> std::io::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let handle = self.handle.clone();
            let keepalive = self.keepalive;

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, handle, keepalive).await {
                    error!("Connection error from {}: {}", addr, e);
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handle: RoomManagerHandle,
    keepalive: Keepalive,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ctrl_tx, mut ctrl_rx) = mpsc::unbounded_channel::<Message>();

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    let ws_msg = Message::Text(msg.into_inner());
                    if ws_tx.send(ws_msg).await.is_err() {
                        break;
                    }
                }
                Some(ctrl_msg) = ctrl_rx.recv() => {
                    if ws_tx.send(ctrl_msg).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    let connection_id = handle.connect(tx.clone()).await?;
    info!("WebSocket connection from {} as {}", addr, connection_id);

    let start = tokio::time::Instant::now() + keepalive.ping_interval;
    let mut ping_interval = tokio::time::interval_at(start, keepalive.ping_interval);
    let mut waiting_for_pong = false;
    let mut pong_deadline: Option<tokio::time::Instant> = None;

    loop {
        let pong_timeout = async {
            match pong_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = ping_interval.tick() => {
                if waiting_for_pong {
                    warn!("No Pong received, disconnecting {}", connection_id);
                    break;
                }
                if ctrl_tx.send(Message::Ping(Bytes::new())).is_err() {
                    break;
                }
                waiting_for_pong = true;
                pong_deadline = Some(tokio::time::Instant::now() + keepalive.pong_timeout);
                debug!("Ping sent to {}", connection_id);
            }

            _ = pong_timeout => {
                warn!("Pong timeout, disconnecting {}", connection_id);
                break;
            }

            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", connection_id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        if let Err(e) =
                            handle_text_message(&text, &tx, &handle, connection_id).await
                        {
                            warn!("Message handling error for {}: {}", connection_id, e);
                        }
                    }
                    Message::Pong(_) => {
                        waiting_for_pong = false;
                        pong_deadline = None;
                        debug!("Pong received from {}", connection_id);
                    }
                    Message::Close(_) => {
                        info!("Close received from {}", connection_id);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    handle.disconnect(connection_id).await;

    send_task.abort();
    info!("WebSocket disconnected: {} ({})", connection_id, addr);

    Ok(())
}

/// Dispatch one client frame. Membership is always resolved by the actor at
/// the time the command is applied, never cached here.
async fn handle_text_message(
    text: &str,
    tx: &mpsc::UnboundedSender<OutboundMessage>,
    handle: &RoomManagerHandle,
    connection_id: ConnectionId,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            send_error(tx, format!("Invalid message: {}", e))?;
            return Ok(());
        }
    };

    match client_msg {
        ClientMessage::JoinRoom {
            room_id,
            display_name,
        } => {
            let joined = match (RoomId::parse(&room_id), parse_display_name(&display_name)) {
                (Ok(room_id), Ok(display_name)) => {
                    handle.join_room(connection_id, room_id, display_name).await
                }
                (Err(e), _) | (_, Err(e)) => Err(e),
            };
            if let Err(e) = joined {
                send_error(tx, e.to_string())?;
            }
        }

        ClientMessage::LeaveRoom => {
            handle.leave_room(connection_id).await;
        }

        ClientMessage::SendMessage { text } => {
            handle.send_chat(connection_id, text).await;
        }

        ClientMessage::Offer { target_id, payload } => {
            handle
                .relay(NegotiationKind::Offer, payload, connection_id, target_id)
                .await;
        }

        ClientMessage::Answer { target_id, payload } => {
            handle
                .relay(NegotiationKind::Answer, payload, connection_id, target_id)
                .await;
        }

        ClientMessage::IceCandidate { target_id, payload } => {
            handle
                .relay(NegotiationKind::IceCandidate, payload, connection_id, target_id)
                .await;
        }
    }

    Ok(())
}

fn send_error(
    tx: &mpsc::UnboundedSender<OutboundMessage>,
    message: String,
) -> Result<(), serde_json::Error> {
    let err = ServerMessage::Error { message };
    let _ = tx.send(err.encode()?);
    Ok(())
}
