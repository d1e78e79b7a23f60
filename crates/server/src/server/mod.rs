//! Game server implementation.

use crate::config::Config;
use crate::events::{Audience, Outbound};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast};
use tokio_tungstenite::tungstenite::{Message, Utf8Bytes};
use tokio_tungstenite::accept_async;
use tracing::{debug, error, info, warn};

pub mod client;
pub mod game;

pub use game::{GameState, run_game_loop};

/// An encoded packet on its way to the connections in its audience.
#[derive(Debug, Clone)]
pub struct Frame {
    pub audience: Audience,
    pub text: Utf8Bytes,
}

/// Encode drained events once and hand them to every connection task.
pub fn publish(frames: &broadcast::Sender<Frame>, events: Vec<Outbound>) {
    for event in events {
        match event.packet.encode() {
            Ok(text) => {
                // No receivers just means nobody is connected.
                let _ = frames.send(Frame {
                    audience: event.audience,
                    text: Utf8Bytes::from(text),
                });
            }
            Err(e) => error!("Failed to encode {:?}: {}", event.packet, e),
        }
    }
}

/// Connection tracking state (shared across connection handlers).
struct ConnectionState {
    /// Total number of connections.
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self { total_connections: 0 }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, max_total: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }
        self.total_connections += 1;
        true
    }

    /// Remove a connection.
    fn remove_connection(&mut self) {
        self.total_connections = self.total_connections.saturating_sub(1);
    }
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("{} listening on ws://{}", config.server.name, addr);

    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));

    // Sized for a few ticks' worth of per-bot movement events.
    let (frames_tx, _frames_rx) = broadcast::channel::<Frame>(1024);

    let max_connections = config.server.max_connections;
    let tick_interval = config.tick_interval_ms();

    // Shared game state
    let game_state = Arc::new(RwLock::new(GameState::new(config)));

    // Start the game loop
    let game_loop_state = Arc::clone(&game_state);
    let loop_tx = frames_tx.clone();
    tokio::spawn(async move {
        run_game_loop(game_loop_state, tick_interval, loop_tx).await;
    });

    loop {
        let (stream, addr) = listener.accept().await?;

        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(max_connections) {
                warn!("Connection rejected (limit reached): {}", addr);
                continue;
            }
        }

        let game_state = Arc::clone(&game_state);
        let conn_state = Arc::clone(&conn_state);
        let frames_tx = frames_tx.clone();

        tokio::spawn(async move {
            let result = handle_connection(stream, addr, game_state, frames_tx).await;

            // Always remove from connection tracking when done
            conn_state.write().await.remove_connection();

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    frames_tx: broadcast::Sender<Frame>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    debug!("WebSocket handshake completed with {}", addr);

    let (mut write, mut read) = ws_stream.split();

    // Subscribe before registering so the handshake frames are not missed.
    let mut frames_rx = frames_tx.subscribe();
    let client_id = {
        let mut state = game_state.write().await;
        let id = state.add_client(addr);
        let events = state.drain_events();
        drop(state);
        publish(&frames_tx, events);
        id
    };

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let events = {
                            let mut state = game_state.write().await;
                            if let Err(e) = state.handle_packet(client_id, text.as_str()) {
                                debug!("Dropped frame from client {}: {}", client_id, e);
                            }
                            state.drain_events()
                        };
                        publish(&frames_tx, events);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    _ => {}
                }
            }
            frame = frames_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if !frame.audience.includes(client_id) {
                            continue;
                        }
                        if let Err(e) = write.send(Message::Text(frame.text)).await {
                            warn!("Failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Client {} lagged, skipped {} frames", client_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let events = {
        let mut state = game_state.write().await;
        state.remove_client(client_id);
        state.drain_events()
    };
    publish(&frames_tx, events);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::packets::ServerPacket;

    #[test]
    fn test_connection_limit() {
        let mut state = ConnectionState::new();
        assert!(state.try_add_connection(2));
        assert!(state.try_add_connection(2));
        assert!(!state.try_add_connection(2));
        state.remove_connection();
        assert!(state.try_add_connection(2));
    }

    #[test]
    fn test_publish_encodes_with_audience() {
        let (tx, mut rx) = broadcast::channel(8);
        publish(
            &tx,
            vec![Outbound {
                audience: Audience::Only(4),
                packet: ServerPacket::EntityDied { id: 9 },
            }],
        );
        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.audience, Audience::Only(4));
        assert_eq!(frame.text.as_str(), r#"{"type":"entityDied","data":{"id":9}}"#);
    }
}
