//! Game state and main loop.

use crate::ai::{BotController, PopulationManager};
use crate::clock::{Clock, SystemClock};
use crate::collision::CollisionResolver;
use crate::config::Config;
use crate::damage::DamageSystem;
use crate::entity::Player;
use crate::events::{EventQueue, Outbound};
use crate::filter::{NameFilter, WordListFilter};
use crate::leaderboard::Leaderboard;
use crate::map::{BuildingLayout, CityLayout};
use crate::world::World;
use protocol::ProtocolError;
use protocol::packets::{ClientPacket, ServerPacket};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use super::client::Client;
use super::{Frame, publish};

/// Ticks between performance summaries.
const SUMMARY_INTERVAL: u64 = 300;

/// Main game state.
pub struct GameState {
    pub config: Config,
    pub tick_count: u64,

    // Connected clients; their ids come from the world's shared id space
    pub clients: HashMap<u32, Client>,

    // Game world (vehicles and buildings)
    pub world: World,
    pub leaderboard: Leaderboard,

    // Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,

    events: EventQueue,
    rng: StdRng,
    clock: Box<dyn Clock>,
    filter: Box<dyn NameFilter>,

    population: PopulationManager,
    controller: BotController,
    resolver: CollisionResolver,
    damage: DamageSystem,
}

impl GameState {
    /// Create a game state with a generated city, the system clock and the
    /// default name filter.
    pub fn new(config: Config) -> Self {
        let layout = CityLayout::new(&config.map, &config.world);
        let filter = WordListFilter::new(config.player.max_name_length);
        let rng = StdRng::seed_from_u64(rand::random());
        Self::with_parts(config, layout, rng, Box::new(SystemClock), Box::new(filter))
    }

    /// Create a game state from explicit collaborators.
    pub fn with_parts(
        config: Config,
        mut layout: impl BuildingLayout,
        rng: StdRng,
        clock: Box<dyn Clock>,
        filter: Box<dyn NameFilter>,
    ) -> Self {
        let world = World::new(&config.world, layout.generate());

        Self {
            tick_count: 0,
            clients: HashMap::new(),
            world,
            leaderboard: Leaderboard::new(),
            update_time_avg: 0.0,
            events: EventQueue::new(),
            rng,
            clock,
            filter,
            population: PopulationManager::new(&config.bots, config.player.max_hp),
            controller: BotController::new(&config.bots),
            resolver: CollisionResolver::new(&config.bots),
            damage: DamageSystem::new(&config.player),
            config,
        }
    }

    /// Add a new client and queue its handshake: id, city map and
    /// leaderboard.
    pub fn add_client(&mut self, addr: SocketAddr) -> u32 {
        let id = self.world.reserve_id();
        self.clients.insert(id, Client::new(id, addr));
        info!("Client {} connected from {}", id, addr);

        self.events.send_to(id, ServerPacket::Welcome { id });
        self.events.send_to(
            id,
            ServerPacket::MapSnapshot {
                buildings: self.world.buildings().iter().map(|b| b.record()).collect(),
            },
        );
        self.events.send_to(
            id,
            ServerPacket::LeaderboardSnapshot {
                entries: self.leaderboard.records(),
            },
        );
        id
    }

    /// Remove a client and its vehicle.
    pub fn remove_client(&mut self, id: u32) {
        if let Some(client) = self.clients.remove(&id) {
            info!(
                "Client {} ({}) disconnected after {:.1}s, idle {:.1}s",
                id,
                client.addr,
                client.session_length().as_secs_f64(),
                client.idle_for().as_secs_f64()
            );
        }
        if self.world.remove_player(id).is_some() {
            self.events.broadcast(ServerPacket::EntityRemoved { id });
        }
        self.world.release_id(id);
    }

    /// Handle a text frame from a client. Frames from unknown clients and
    /// frames that fail to parse change nothing.
    pub fn handle_packet(&mut self, client_id: u32, text: &str) -> Result<(), ProtocolError> {
        let Some(client) = self.clients.get_mut(&client_id) else {
            debug!("Frame from unknown client {}", client_id);
            return Ok(());
        };
        client.touch();

        match ClientPacket::parse(text)? {
            ClientPacket::Join { name } => self.handle_join(client_id, &name),
            ClientPacket::ReportMovement { x, z, heading } => self.handle_movement(client_id, x, z, heading),
            ClientPacket::ReportContact => self.handle_contact(client_id),
        }
        Ok(())
    }

    /// Spawn (or respawn) the client's vehicle.
    fn handle_join(&mut self, client_id: u32, requested: &str) {
        let name = match self.filter.clean(requested) {
            Ok(name) => name,
            Err(e) => {
                debug!("Name {:?} rejected by filter: {}", requested, e);
                self.config.player.fallback_name.clone()
            }
        };

        if self.world.remove_player(client_id).is_some() {
            self.events.broadcast_except(client_id, ServerPacket::EntityRemoved { id: client_id });
        }
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.joins += 1;
        }

        let now = self.clock.now_ms();
        let player = Player::spawn(client_id, name, &self.config.player, now, &mut self.rng);
        let record = player.vehicle.record(false);
        info!(
            "Client {} joined as {:?} at ({:.1}, {:.1})",
            client_id, player.vehicle.name, player.vehicle.position.x, player.vehicle.position.y
        );
        self.world.add_player(player);

        self.events.send_to(
            client_id,
            ServerPacket::EntitySnapshot {
                entities: self.world.all_for_broadcast_snapshot(),
            },
        );
        self.events.send_to(
            client_id,
            ServerPacket::LeaderboardSnapshot {
                entries: self.leaderboard.records(),
            },
        );
        self.events.broadcast_except(
            client_id,
            ServerPacket::EntityCreated {
                id: client_id,
                entity: record,
            },
        );
    }

    fn handle_movement(&mut self, client_id: u32, x: f32, z: f32, heading: f32) {
        if !self.world.upsert_player_position(client_id, x, z, heading) {
            debug!("Dropped movement from client {}", client_id);
            return;
        }
        if let Some(player) = self.world.player(client_id) {
            let entity = player.vehicle.record(false);
            self.events
                .broadcast_except(client_id, ServerPacket::EntityMoved { id: client_id, entity });
        }
    }

    fn handle_contact(&mut self, client_id: u32) {
        let now = self.clock.now_ms();
        self.damage.apply_contact(
            &mut self.world,
            &mut self.leaderboard,
            &mut self.events,
            client_id,
            None,
            now,
        );
    }

    /// Run a single game tick and return the events it produced, along with
    /// anything handlers queued since the last drain.
    pub fn tick(&mut self) -> Vec<Outbound> {
        let tick_start = std::time::Instant::now();
        let now = self.clock.now_ms();
        self.tick_count += 1;

        self.world.rebuild_grid();

        self.population.despawn_strays(&mut self.world, &mut self.events);
        self.population
            .adjust(&mut self.world, &mut self.events, &mut self.rng);

        let bot_ids = self.world.bot_ids().to_vec();
        for id in bot_ids {
            if self.controller.think(&mut self.world, id, &mut self.rng).is_none() {
                continue;
            }
            let Some(outcome) = self.resolver.resolve_move(&mut self.world, id, &mut self.rng) else {
                continue;
            };
            if let Some(victim) = outcome.hit_player {
                self.damage.apply_contact(
                    &mut self.world,
                    &mut self.leaderboard,
                    &mut self.events,
                    victim,
                    Some(outcome.heading),
                    now,
                );
            }
            if let Some(bot) = self.world.bot(id) {
                let entity = bot.vehicle.record(true);
                self.events.broadcast(ServerPacket::EntityMoved { id, entity });
            }
        }

        if self.tick_count % SUMMARY_INTERVAL == 0 {
            debug!(
                "Tick #{}: {:.2}ms (avg {:.2}ms) | {} clients, {} players, {} bots",
                self.tick_count,
                tick_start.elapsed().as_secs_f64() * 1000.0,
                self.update_time_avg,
                self.clients.len(),
                self.world.player_count(),
                self.world.live_bot_count()
            );
        }

        self.events.drain()
    }

    /// Take events queued by handlers.
    pub fn drain_events(&mut self) -> Vec<Outbound> {
        self.events.drain()
    }
}

/// Run the main game loop.
///
/// Each tick holds the write lock for the whole simulation step; the produced
/// events are published after the lock is released.
pub async fn run_game_loop(state: Arc<RwLock<GameState>>, tick_interval_ms: u64, frames: broadcast::Sender<Frame>) {
    let period = Duration::from_millis(tick_interval_ms.max(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    // Late ticks are pushed back rather than bunched up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    {
        let game = state.read().await;
        info!(
            "Game loop started: {} buildings, {}ms per tick",
            game.world.buildings().len(),
            tick_interval_ms
        );
    }

    let tick_budget = tick_interval_ms as f64 * 0.9;
    loop {
        ticker.tick().await;

        let events = {
            let mut game = state.write().await;
            let tick_start = std::time::Instant::now();
            let events = game.tick();
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

            game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

            if tick_ms > tick_budget {
                warn!(
                    "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} players, {} bots",
                    game.tick_count,
                    tick_ms,
                    tick_budget,
                    game.world.player_count(),
                    game.world.live_bot_count()
                );
            }

            events
        }; // Write lock released here

        publish(&frames, events);
    }
}
