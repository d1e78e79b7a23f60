//! Client session state.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected client session. The client's vehicle, once joined, lives in
/// the world under the same id.
#[derive(Debug)]
pub struct Client {
    /// Unique client ID.
    pub id: u32,
    /// Remote address.
    pub addr: SocketAddr,
    /// Number of join requests handled.
    pub joins: u32,
    pub connected_at: Instant,
    /// Last activity timestamp.
    pub last_activity: Instant,
}

impl Client {
    /// Create a new client.
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        let now = Instant::now();
        Self {
            id,
            addr,
            joins: 0,
            connected_at: now,
            last_activity: now,
        }
    }

    /// Update last activity time.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Time since the last frame from this client.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Time since the connection was accepted.
    pub fn session_length(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
