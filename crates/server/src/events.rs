//! Outbound event queue.
//!
//! Simulation code appends packets here; the transport drains the queue once
//! the lock on the game state is released and fans the packets out.

use protocol::packets::ServerPacket;

/// Who should receive a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    All,
    AllExcept(u32),
    Only(u32),
}

impl Audience {
    #[inline]
    pub fn includes(&self, client_id: u32) -> bool {
        match *self {
            Audience::All => true,
            Audience::AllExcept(id) => id != client_id,
            Audience::Only(id) => id == client_id,
        }
    }
}

/// A packet and its audience.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub packet: ServerPacket,
}

/// Fire-and-forget notifications produced while mutating the world.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<Outbound>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(128),
        }
    }

    pub fn broadcast(&mut self, packet: ServerPacket) {
        self.push(Audience::All, packet);
    }

    pub fn broadcast_except(&mut self, client_id: u32, packet: ServerPacket) {
        self.push(Audience::AllExcept(client_id), packet);
    }

    pub fn send_to(&mut self, client_id: u32, packet: ServerPacket) {
        self.push(Audience::Only(client_id), packet);
    }

    #[inline]
    pub fn push(&mut self, audience: Audience, packet: ServerPacket) {
        self.events.push(Outbound { audience, packet });
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outbound> {
        self.events.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience() {
        assert!(Audience::All.includes(3));
        assert!(!Audience::AllExcept(3).includes(3));
        assert!(Audience::AllExcept(3).includes(4));
        assert!(Audience::Only(3).includes(3));
        assert!(!Audience::Only(3).includes(4));
    }

    #[test]
    fn test_drain_preserves_order() {
        let mut queue = EventQueue::new();
        queue.broadcast(ServerPacket::EntityDied { id: 1 });
        queue.send_to(2, ServerPacket::EntityRemoved { id: 9 });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(drained[0].packet, ServerPacket::EntityDied { id: 1 });
        assert_eq!(drained[1].audience, Audience::Only(2));
    }
}
