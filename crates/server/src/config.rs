//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub bots: BotConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let mut config: Self = toml::from_str(&contents)?;
            let map = config.map.sanitized();
            if map.road_building_chance != config.map.road_building_chance
                || map.skip_chance != config.map.skip_chance
            {
                warn!(
                    "Map chances clamped to [0, 1]: road_building_chance={}, skip_chance={}",
                    map.road_building_chance, map.skip_chance
                );
            }
            config.map = map;
            Ok(config)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Tick period in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        (1000 / self.server.tick_rate.max(1)) as u64
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Simulation ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Server name shown in logs.
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            tick_rate: default_tick_rate(),
            name: default_name(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_tick_rate() -> u32 {
    30
}
fn default_name() -> String {
    "Iron Arena".to_string()
}

/// World geometry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    /// The world spans `-half_size..=half_size` on both axes and wraps.
    #[serde(default = "default_half_size")]
    pub half_size: f32,
    /// Spatial grid cell size. Must be at least the pursuit radius.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Collision padding around building rectangles.
    #[serde(default = "default_building_margin")]
    pub building_margin: f32,
    /// Inset of the building rectangle from its render footprint.
    #[serde(default = "default_building_inset")]
    pub building_inset: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            half_size: default_half_size(),
            cell_size: default_cell_size(),
            building_margin: default_building_margin(),
            building_inset: default_building_inset(),
        }
    }
}

fn default_half_size() -> f32 {
    1000.0
}
fn default_cell_size() -> f32 {
    200.0
}
fn default_building_margin() -> f32 {
    1.0
}
fn default_building_inset() -> f32 {
    0.5
}

/// Procedural city layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    /// Blocks generated in each direction from the origin.
    #[serde(default = "default_city_radius")]
    pub city_radius: i32,
    #[serde(default = "default_block_size")]
    pub block_size: f32,
    /// Blocks around the origin that stay empty.
    #[serde(default = "default_clear_radius")]
    pub clear_radius: i32,
    /// Every n-th row and column is a road.
    #[serde(default = "default_road_every")]
    pub road_every: i32,
    #[serde(default = "default_road_building_chance")]
    pub road_building_chance: f64,
    #[serde(default = "default_skip_chance")]
    pub skip_chance: f64,
    /// Fixed seed for a reproducible layout.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            city_radius: default_city_radius(),
            block_size: default_block_size(),
            clear_radius: default_clear_radius(),
            road_every: default_road_every(),
            road_building_chance: default_road_building_chance(),
            skip_chance: default_skip_chance(),
            seed: None,
        }
    }
}

impl MapConfig {
    /// Copy with both chances forced into `0.0..=1.0`; NaN becomes 0.
    pub fn sanitized(&self) -> Self {
        Self {
            road_building_chance: probability(self.road_building_chance),
            skip_chance: probability(self.skip_chance),
            ..self.clone()
        }
    }
}

fn probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

fn default_city_radius() -> i32 {
    25
}
fn default_block_size() -> f32 {
    40.0
}
fn default_clear_radius() -> i32 {
    3
}
fn default_road_every() -> i32 {
    4
}
fn default_road_building_chance() -> f64 {
    0.1
}
fn default_skip_chance() -> f64 {
    0.3
}

/// Player configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_max_hp")]
    pub max_hp: u8,
    /// Grace period after a hit during which damage is ignored.
    #[serde(default = "default_invulnerability_ms")]
    pub invulnerability_ms: u64,
    #[serde(default = "default_knockback_force")]
    pub knockback_force: f32,
    /// Players spawn uniformly inside this square around the origin.
    #[serde(default = "default_spawn_half_extent")]
    pub spawn_half_extent: f32,
    /// Display name used when the name filter fails.
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_hp: default_max_hp(),
            invulnerability_ms: default_invulnerability_ms(),
            knockback_force: default_knockback_force(),
            spawn_half_extent: default_spawn_half_extent(),
            fallback_name: default_fallback_name(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_max_hp() -> u8 {
    5
}
fn default_invulnerability_ms() -> u64 {
    1000
}
fn default_knockback_force() -> f32 {
    2.0
}
fn default_spawn_half_extent() -> f32 {
    50.0
}
fn default_fallback_name() -> String {
    "User".to_string()
}
fn default_max_name_length() -> usize {
    24
}

/// Bot population and AI tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    /// Absolute cap on live bots.
    #[serde(default = "default_max_bots")]
    pub max_bots: usize,
    /// Bots wanted per world on top of one per player.
    #[serde(default = "default_bots_per_player_bonus")]
    pub bots_per_player_bonus: usize,
    /// Bots farther than this from every live player are removed.
    #[serde(default = "default_despawn_distance")]
    pub despawn_distance: f32,
    #[serde(default = "default_pursuit_radius")]
    pub pursuit_radius: f32,
    #[serde(default = "default_pursuit_speed")]
    pub pursuit_speed: f32,
    #[serde(default = "default_cruise_speed")]
    pub cruise_speed: f32,
    /// Fraction of the angular error corrected per tick while pursuing.
    #[serde(default = "default_turn_damping")]
    pub turn_damping: f32,
    /// Width of the random heading perturbation while wandering.
    #[serde(default = "default_wander_jitter")]
    pub wander_jitter: f32,
    #[serde(default = "default_wander_ticks_min")]
    pub wander_ticks_min: u32,
    #[serde(default = "default_wander_ticks_max")]
    pub wander_ticks_max: u32,
    #[serde(default = "default_stun_ticks")]
    pub stun_ticks: u32,
    /// Speed multiplier applied each stunned tick.
    #[serde(default = "default_stun_decay")]
    pub stun_decay: f32,
    /// Speed given to a bot when it is stunned (along its reversed heading).
    #[serde(default = "default_recoil_speed")]
    pub recoil_speed: f32,
    #[serde(default = "default_repulse_distance")]
    pub repulse_distance: f32,
    /// Minimum clearance between vehicle centers.
    #[serde(default = "default_collision_radius")]
    pub collision_radius: f32,
    #[serde(default = "default_spawn_attempts")]
    pub spawn_attempts: u32,
    #[serde(default = "default_spawn_min_distance")]
    pub spawn_min_distance: f32,
    #[serde(default = "default_spawn_max_distance")]
    pub spawn_max_distance: f32,
    /// Minimum distance between a fresh bot and any live vehicle.
    #[serde(default = "default_spawn_clearance")]
    pub spawn_clearance: f32,
    /// Used when no clear spawn point was found.
    #[serde(default = "default_fallback_spawn")]
    pub fallback_spawn: [f32; 2],
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            max_bots: default_max_bots(),
            bots_per_player_bonus: default_bots_per_player_bonus(),
            despawn_distance: default_despawn_distance(),
            pursuit_radius: default_pursuit_radius(),
            pursuit_speed: default_pursuit_speed(),
            cruise_speed: default_cruise_speed(),
            turn_damping: default_turn_damping(),
            wander_jitter: default_wander_jitter(),
            wander_ticks_min: default_wander_ticks_min(),
            wander_ticks_max: default_wander_ticks_max(),
            stun_ticks: default_stun_ticks(),
            stun_decay: default_stun_decay(),
            recoil_speed: default_recoil_speed(),
            repulse_distance: default_repulse_distance(),
            collision_radius: default_collision_radius(),
            spawn_attempts: default_spawn_attempts(),
            spawn_min_distance: default_spawn_min_distance(),
            spawn_max_distance: default_spawn_max_distance(),
            spawn_clearance: default_spawn_clearance(),
            fallback_spawn: default_fallback_spawn(),
        }
    }
}

fn default_max_bots() -> usize {
    50
}
fn default_bots_per_player_bonus() -> usize {
    3
}
fn default_despawn_distance() -> f32 {
    300.0
}
fn default_pursuit_radius() -> f32 {
    250.0
}
fn default_pursuit_speed() -> f32 {
    1.7
}
fn default_cruise_speed() -> f32 {
    0.5
}
fn default_turn_damping() -> f32 {
    0.3
}
fn default_wander_jitter() -> f32 {
    1.0
}
fn default_wander_ticks_min() -> u32 {
    50
}
fn default_wander_ticks_max() -> u32 {
    100
}
fn default_stun_ticks() -> u32 {
    30
}
fn default_stun_decay() -> f32 {
    0.8
}
fn default_recoil_speed() -> f32 {
    1.5
}
fn default_repulse_distance() -> f32 {
    5.0
}
fn default_collision_radius() -> f32 {
    5.0
}
fn default_spawn_attempts() -> u32 {
    100
}
fn default_spawn_min_distance() -> f32 {
    80.0
}
fn default_spawn_max_distance() -> f32 {
    120.0
}
fn default_spawn_clearance() -> f32 {
    10.0
}
fn default_fallback_spawn() -> [f32; 2] {
    [0.0, 0.0]
}
