//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    ///
    /// The listen port additionally honors the `PORT` environment variable,
    /// so hosting services can override it without touching the file.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        let mut config: Self = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.parse()?;
        }

        Ok(config)
    }

    /// Simulation ticks per second.
    pub fn ticks_per_second(&self) -> f32 {
        1000.0 / self.server.tick_interval_ms as f32
    }

    /// Convert a duration in seconds to whole ticks (at least one).
    pub fn ticks_for_secs(&self, secs: f32) -> u64 {
        ((secs * self.ticks_per_second()).round() as u64).max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            world: WorldConfig::default(),
            player: PlayerConfig::default(),
            food: FoodConfig::default(),
            combat: CombatConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Networking and scheduling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on (overridden by the `PORT` environment variable).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Seconds a session may stay connected without an accepted join.
    #[serde(default = "default_join_timeout")]
    pub join_timeout_secs: u64,
    /// Outbound frames a session may fall behind before it is closed.
    #[serde(default = "default_broadcast_buffer")]
    pub broadcast_buffer: usize,
    /// Bound on the shutdown drain, in milliseconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
    /// Leaderboard rows kept per tick.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            tick_interval_ms: default_tick_interval(),
            join_timeout_secs: default_join_timeout(),
            broadcast_buffer: default_broadcast_buffer(),
            shutdown_grace_ms: default_shutdown_grace(),
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

fn default_port() -> u16 {
    8080
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_tick_interval() -> u64 {
    50
}
fn default_join_timeout() -> u64 {
    10
}
fn default_broadcast_buffer() -> usize {
    64
}
fn default_shutdown_grace() -> u64 {
    2000
}
fn default_leaderboard_size() -> usize {
    10
}

/// World border and spatial index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_size")]
    pub width: f32,
    #[serde(default = "default_world_size")]
    pub height: f32,
    /// Spatial grid cell size; must be at least the largest expected
    /// blob radius or neighbor queries start missing candidates.
    #[serde(default = "default_grid_cell")]
    pub grid_cell: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_size(),
            height: default_world_size(),
            grid_cell: default_grid_cell(),
        }
    }
}

fn default_world_size() -> f32 {
    4000.0
}
fn default_grid_cell() -> f32 {
    250.0
}

/// Player and blob configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Mass of the starter blob created on join.
    #[serde(default = "default_start_mass")]
    pub start_mass: f32,
    /// Maximum display name length in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Minimum blob mass required to split.
    #[serde(default = "default_min_split_mass")]
    pub min_split_mass: f32,
    /// Outward impulse distance given to a freshly split sibling.
    #[serde(default = "default_split_impulse")]
    pub split_impulse: f32,
    /// Seconds before split siblings may merge back together.
    #[serde(default = "default_merge_cooldown")]
    pub merge_cooldown_secs: f32,
    /// Movement speed scale (30 is the reference speed).
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Passive mass decay per decay step (0 disables decay).
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f32,
    /// Ticks between decay steps.
    #[serde(default = "default_decay_interval")]
    pub decay_interval_ticks: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_mass: default_start_mass(),
            max_name_length: default_max_name_length(),
            min_split_mass: default_min_split_mass(),
            split_impulse: default_split_impulse(),
            merge_cooldown_secs: default_merge_cooldown(),
            speed: default_speed(),
            decay_rate: default_decay_rate(),
            decay_interval_ticks: default_decay_interval(),
        }
    }
}

fn default_start_mass() -> f32 {
    10.0
}
fn default_max_name_length() -> usize {
    16
}
fn default_min_split_mass() -> f32 {
    32.0
}
fn default_split_impulse() -> f32 {
    160.0
}
fn default_merge_cooldown() -> f32 {
    10.0
}
fn default_speed() -> f32 {
    30.0
}
fn default_decay_rate() -> f32 {
    0.002
}
fn default_decay_interval() -> u64 {
    25
}

/// Food economy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Fixed mass of every pellet.
    #[serde(default = "default_food_mass")]
    pub mass: f32,
    #[serde(default = "default_food_min_amount")]
    pub min_amount: usize,
    #[serde(default = "default_food_max_amount")]
    pub max_amount: usize,
    /// Spawn budget per tick; keeps a near-empty world from doing
    /// unbounded work in one step.
    #[serde(default = "default_food_spawn_per_tick")]
    pub spawn_per_tick: usize,
    /// Pellets never spawn within this distance of a blob's edge.
    #[serde(default = "default_food_safety_margin")]
    pub safety_margin: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            mass: default_food_mass(),
            min_amount: default_food_min_amount(),
            max_amount: default_food_max_amount(),
            spawn_per_tick: default_food_spawn_per_tick(),
            safety_margin: default_food_safety_margin(),
        }
    }
}

fn default_food_mass() -> f32 {
    1.0
}
fn default_food_min_amount() -> usize {
    300
}
fn default_food_max_amount() -> usize {
    600
}
fn default_food_spawn_per_tick() -> usize {
    20
}
fn default_food_safety_margin() -> f32 {
    12.0
}

/// Consumption rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CombatConfig {
    /// An attacker must outweigh its target by this factor.
    #[serde(default = "default_eat_mass_ratio")]
    pub eat_mass_ratio: f32,
    /// Fraction of a consumed blob's mass the attacker actually gains.
    #[serde(default = "default_eat_efficiency")]
    pub eat_efficiency: f32,
    /// Overlap requirement: centers must be closer than
    /// `attacker_radius - target_radius / eat_depth_div`.
    #[serde(default = "default_eat_depth_div")]
    pub eat_depth_div: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            eat_mass_ratio: default_eat_mass_ratio(),
            eat_efficiency: default_eat_efficiency(),
            eat_depth_div: default_eat_depth_div(),
        }
    }
}

fn default_eat_mass_ratio() -> f32 {
    1.2
}
fn default_eat_efficiency() -> f32 {
    0.8
}
fn default_eat_depth_div() -> f32 {
    3.0
}

/// Chat limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    /// Maximum message length in characters after sanitizing.
    #[serde(default = "default_chat_max_length")]
    pub max_length: usize,
    /// Minimum seconds between accepted messages per player.
    #[serde(default = "default_chat_interval")]
    pub interval_secs: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_length: default_chat_max_length(),
            interval_secs: default_chat_interval(),
        }
    }
}

fn default_chat_max_length() -> usize {
    120
}
fn default_chat_interval() -> f32 {
    2.0
}
