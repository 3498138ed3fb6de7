//! Engine state and the fixed-rate tick loop.
//!
//! The engine owns the world exclusively. Sessions enqueue intents; the
//! tick loop drains them at the start of each tick, advances the
//! simulation through a fixed phase order, and broadcasts one snapshot.

use crate::collision::{consumes, covers, radius_for_mass, speed_for_mass};
use crate::command::{CommandError, Intent, SessionId, sanitize_chat, validate_name};
use crate::config::Config;
use crate::entity::{EntityId, PlayerId};
use crate::snapshot::{self, Snapshot};
use crate::world::World;
use fixedbitset::FixedBitSet;
use glam::Vec2;
use protocol::{LeaderboardEntry, ServerMessage, encode_server};
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use super::session::{Session, SessionState};
use super::{Frame, TargetedFrame};

/// The simulation engine: world, sessions, and broadcast handles.
pub struct Engine {
    config: Config,
    pub world: World,
    pub tick_count: u64,

    /// Engine-side session records, keyed by session id.
    sessions: HashMap<SessionId, Session>,

    frame_tx: broadcast::Sender<Frame>,
    targeted_tx: broadcast::Sender<TargetedFrame>,

    // Durations converted to ticks once at startup.
    merge_cooldown_ticks: u64,
    chat_interval_ticks: u64,
    decay_interval_ticks: u64,

    // Reusable per-tick buffers.
    consumed: FixedBitSet,
    query_buf: Vec<EntityId>,
    blob_order: Vec<EntityId>,
}

impl Engine {
    pub fn new(
        config: Config,
        frame_tx: broadcast::Sender<Frame>,
        targeted_tx: broadcast::Sender<TargetedFrame>,
    ) -> Self {
        let world = World::new(&config.world);
        let merge_cooldown_ticks = config.ticks_for_secs(config.player.merge_cooldown_secs);
        let chat_interval_ticks = config.ticks_for_secs(config.chat.interval_secs);
        let decay_interval_ticks = config.player.decay_interval_ticks.max(1);
        Self {
            config,
            world,
            tick_count: 0,
            sessions: HashMap::new(),
            frame_tx,
            targeted_tx,
            merge_cooldown_ticks,
            chat_interval_ticks,
            decay_interval_ticks,
            consumed: FixedBitSet::with_capacity(4096),
            query_buf: Vec::with_capacity(64),
            blob_order: Vec::with_capacity(256),
        }
    }

    /// The player bound to a session, if it has joined.
    pub fn player_of(&self, session: SessionId) -> Option<PlayerId> {
        self.sessions.get(&session).and_then(|s| s.player)
    }

    fn joined_player(&self, session: SessionId) -> Result<PlayerId, CommandError> {
        let record = self
            .sessions
            .get(&session)
            .ok_or(CommandError::UnknownSession)?;
        record.player.ok_or(CommandError::NotJoined)
    }

    /// Validate and apply one intent against the world.
    ///
    /// Runs inside the drain phase of a tick; a rejection is reported to
    /// the caller for logging and the world is left untouched.
    pub fn apply(&mut self, intent: Intent) -> Result<(), CommandError> {
        match intent {
            Intent::Connect { session } => {
                self.sessions.insert(session, Session::new(session));
                debug!("session {session} registered");
            }
            Intent::Join { session, name } => {
                match self.sessions.get(&session) {
                    None => return Err(CommandError::UnknownSession),
                    Some(s) if s.state == SessionState::Joined => {
                        return Err(CommandError::AlreadyJoined);
                    }
                    Some(_) => {}
                }
                let name = validate_name(&name, self.config.player.max_name_length)
                    .ok_or(CommandError::InvalidName)?;
                let start_mass = self.config.player.start_mass;
                let position = self.world.spawn_position(radius_for_mass(start_mass) * 2.0);
                let player = self.world.add_player(name.clone());
                self.world.spawn_blob(player, position, start_mass);
                if let Some(record) = self.sessions.get_mut(&session) {
                    record.state = SessionState::Joined;
                    record.player = Some(player);
                }
                self.send_targeted(
                    session,
                    &ServerMessage::Init {
                        player_id: player.to_string(),
                    },
                );
                info!("session {session} joined as {name:?} (player {player})");
            }
            Intent::Target { session, x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(CommandError::BadCoordinates);
                }
                let player = self.joined_player(session)?;
                let target = self.world.border.clamp(Vec2::new(x, y));
                let blob_ids = self
                    .world
                    .players
                    .get(&player)
                    .ok_or(CommandError::StalePlayer)?
                    .blobs
                    .clone();
                for id in blob_ids {
                    if let Some(blob) = self.world.blobs.get_mut(&id) {
                        blob.target = target;
                    }
                }
            }
            Intent::Split { session } => {
                let player = self.joined_player(session)?;
                self.split_player(player)?;
            }
            Intent::Chat { session, text } => {
                let player_id = self.joined_player(session)?;
                let Some(text) = sanitize_chat(&text, self.config.chat.max_length) else {
                    return Ok(()); // nothing left to say
                };
                let player = self
                    .world
                    .players
                    .get_mut(&player_id)
                    .ok_or(CommandError::StalePlayer)?;
                if let Some(last) = player.last_chat_tick {
                    if self.tick_count.saturating_sub(last) < self.chat_interval_ticks {
                        return Ok(()); // over the rate limit: dropped silently
                    }
                }
                player.last_chat_tick = Some(self.tick_count);
                let name = player.name.clone();
                let color = player.color;
                self.broadcast_message(&ServerMessage::Chat { name, text, color });
            }
            Intent::Disconnect { session } => {
                let Some(mut record) = self.sessions.remove(&session) else {
                    return Err(CommandError::UnknownSession);
                };
                record.state = SessionState::Closing;
                debug!("session {} is {:?}", record.id, record.state);
                if let Some(player) = record.player.take() {
                    self.world.remove_player(player);
                }
                record.state = SessionState::Closed;
                info!("session {} {:?}", record.id, record.state);
            }
        }
        Ok(())
    }

    /// Split every blob of `player` that meets the mass threshold.
    fn split_player(&mut self, player: PlayerId) -> Result<(), CommandError> {
        let blob_ids = self
            .world
            .players
            .get(&player)
            .ok_or(CommandError::StalePlayer)?
            .blobs
            .clone();
        let min_split = self.config.player.min_split_mass;
        let impulse = self.config.player.split_impulse;
        let merge_at = self.tick_count + self.merge_cooldown_ticks;

        for id in blob_ids {
            let (half, position, target) = {
                let Some(blob) = self.world.blobs.get_mut(&id) else {
                    continue;
                };
                if blob.mass < min_split {
                    continue;
                }
                blob.mass /= 2.0;
                blob.merge_at = merge_at;
                (blob.mass, blob.position, blob.target)
            };
            self.world.sync_blob(id);

            // Sibling launches toward the current steering target; with
            // no meaningful direction it goes straight along +x.
            let direction = {
                let d = target - position;
                if d.length_squared() < 1.0 {
                    Vec2::X
                } else {
                    d / d.length()
                }
            };
            if let Some(sibling_id) = self.world.spawn_blob(player, position, half) {
                if let Some(sibling) = self.world.blobs.get_mut(&sibling_id) {
                    sibling.target = target;
                    sibling.merge_at = merge_at;
                    sibling.set_boost(impulse, direction);
                }
            }
        }
        Ok(())
    }

    /// Run a single simulation tick.
    pub fn tick(&mut self, intents: Vec<Intent>) {
        self.tick_count += 1;

        // 1. Drain queued commands. A failing command is logged and
        // skipped; it never aborts the tick.
        for intent in intents {
            let session = intent.session();
            if let Err(e) = self.apply(intent) {
                debug!("session {session}: command skipped: {e}");
            }
        }

        // 2-7. Fixed phase order keeps outcomes deterministic.
        self.integrate_movement();
        self.merge_siblings();
        self.resolve_collisions();
        self.apply_decay();
        self.world.replenish_food(&self.config.food);
        let leaderboard = snapshot::leaderboard(&self.world, self.config.server.leaderboard_size);

        self.broadcast_snapshot(leaderboard);
    }

    /// Phase 2: advance split impulses and steer every blob toward its
    /// target. Heavier blobs move slower; positions clamp to the border.
    fn integrate_movement(&mut self) {
        let border = self.world.border;
        let speed_scale = self.config.player.speed;

        let mut order = std::mem::take(&mut self.blob_order);
        order.clear();
        order.extend(self.world.blobs.keys().copied());
        order.sort_unstable();

        for &id in &order {
            {
                let Some(blob) = self.world.blobs.get_mut(&id) else {
                    continue;
                };
                blob.update_boost();
                let to_target = blob.target - blob.position;
                let dist = to_target.length();
                if dist >= 1.0 {
                    let speed = speed_for_mass(blob.mass, speed_scale) * (dist.min(32.0) / 32.0);
                    blob.position += to_target / dist * speed;
                }
                blob.position = border.clamp(blob.position);
            }
            self.world.sync_blob(id);
        }

        self.blob_order = order;
    }

    /// Phase 3: recombine sibling blobs whose cooldown has expired and
    /// whose centers are within the larger radius.
    fn merge_siblings(&mut self) {
        let now = self.tick_count;
        let player_ids: Vec<PlayerId> = self
            .world
            .players
            .iter()
            .filter(|(_, p)| p.blobs.len() > 1)
            .map(|(&id, _)| id)
            .collect();

        for player_id in player_ids {
            let mut ids = match self.world.players.get(&player_id) {
                Some(p) => p.blobs.clone(),
                None => continue,
            };
            ids.sort_unstable();

            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    let (a, b) = (ids[i], ids[j]);
                    let Some((pos_a, r_a, mass_a, merge_a)) = self.blob_merge_view(a) else {
                        continue;
                    };
                    let Some((pos_b, r_b, mass_b, merge_b)) = self.blob_merge_view(b) else {
                        continue;
                    };
                    if merge_a > now || merge_b > now {
                        continue;
                    }
                    let reach = r_a.max(r_b);
                    if pos_a.distance_squared(pos_b) >= reach * reach {
                        continue;
                    }

                    // Heavier side survives; ties keep the older id.
                    let (survivor, absorbed, gained) = if mass_a >= mass_b {
                        (a, b, mass_b)
                    } else {
                        (b, a, mass_a)
                    };
                    self.world.remove_blob(absorbed);
                    if let Some(blob) = self.world.blobs.get_mut(&survivor) {
                        blob.mass += gained;
                    }
                    self.world.sync_blob(survivor);
                }
            }
        }
    }

    fn blob_merge_view(&self, id: EntityId) -> Option<(Vec2, f32, f32, u64)> {
        self.world
            .blobs
            .get(&id)
            .map(|b| (b.position, b.radius(), b.mass, b.merge_at))
    }

    /// Phase 4: resolve blob-food and blob-blob overlaps using the
    /// spatial index. Blobs are processed in id order so outcomes are
    /// deterministic.
    fn resolve_collisions(&mut self) {
        let ratio = self.config.combat.eat_mass_ratio;
        let depth_div = self.config.combat.eat_depth_div;
        let efficiency = self.config.combat.eat_efficiency;

        self.consumed.clear();

        let mut order = std::mem::take(&mut self.blob_order);
        order.clear();
        order.extend(self.world.blobs.keys().copied());
        order.sort_unstable();
        let mut nearby = std::mem::take(&mut self.query_buf);

        for &id in &order {
            if self.is_consumed(id) {
                continue;
            }
            let Some((pos, owner, mut mass)) = self
                .world
                .blobs
                .get(&id)
                .map(|b| (b.position, b.owner, b.mass))
            else {
                continue;
            };

            self.world
                .grid
                .query_circle(pos, radius_for_mass(mass), &mut nearby);

            let mut eaten = false;
            for &other in &nearby {
                if other == id || self.is_consumed(other) {
                    continue;
                }

                // Blob-food: a covered pellet is absorbed whole.
                if let Some(food) = self.world.food.get(&other) {
                    if covers(pos, radius_for_mass(mass), food.position) {
                        mass += food.mass;
                        self.world.remove_food(other);
                    }
                    continue;
                }

                let Some((other_pos, other_owner, other_mass)) = self
                    .world
                    .blobs
                    .get(&other)
                    .map(|b| (b.position, b.owner, b.mass))
                else {
                    continue;
                };
                // Same-owner contact is the merge phase's business.
                if other_owner == owner {
                    continue;
                }

                if mass > other_mass {
                    if consumes(pos, mass, other_pos, other_mass, ratio, depth_div) {
                        mass += other_mass * efficiency;
                        self.mark_consumed(other);
                    }
                } else if other_mass > mass
                    && consumes(other_pos, other_mass, pos, mass, ratio, depth_div)
                {
                    if let Some(other_blob) = self.world.blobs.get_mut(&other) {
                        other_blob.mass += mass * efficiency;
                    }
                    self.world.sync_blob(other);
                    self.mark_consumed(id);
                    eaten = true;
                    break;
                }
            }

            if !eaten {
                if let Some(blob) = self.world.blobs.get_mut(&id) {
                    blob.mass = mass;
                }
                self.world.sync_blob(id);
            }
        }

        for &id in &order {
            if self.is_consumed(id) {
                self.world.remove_blob(id);
            }
        }

        self.query_buf = nearby;
        self.blob_order = order;
    }

    fn mark_consumed(&mut self, id: EntityId) {
        let idx = id as usize;
        if idx >= self.consumed.len() {
            self.consumed.grow(idx + 1);
        }
        self.consumed.insert(idx);
    }

    fn is_consumed(&self, id: EntityId) -> bool {
        let idx = id as usize;
        idx < self.consumed.len() && self.consumed.contains(idx)
    }

    /// Phase 5: proportional mass decay, floored at the starter mass so
    /// decay alone can never push a blob out of the world.
    fn apply_decay(&mut self) {
        let rate = self.config.player.decay_rate;
        if rate <= 0.0 || self.tick_count % self.decay_interval_ticks != 0 {
            return;
        }
        let floor = self.config.player.start_mass;
        let factor = 1.0 - rate;

        let mut order = std::mem::take(&mut self.blob_order);
        order.clear();
        order.extend(self.world.blobs.keys().copied());
        for &id in &order {
            {
                let Some(blob) = self.world.blobs.get_mut(&id) else {
                    continue;
                };
                if blob.mass <= floor {
                    continue;
                }
                blob.mass = (blob.mass * factor).max(floor);
            }
            self.world.sync_blob(id);
        }
        self.blob_order = order;
    }

    /// Capture one immutable snapshot, serialize it once, and hand the
    /// same frames to every session.
    fn broadcast_snapshot(&mut self, leaderboard: Vec<LeaderboardEntry>) {
        let snapshot = Snapshot::capture(self.tick_count, &self.world, leaderboard);
        match snapshot.into_frames() {
            Ok((state, lb)) => {
                let _ = self.frame_tx.send(Frame::from(state));
                let _ = self.frame_tx.send(Frame::from(lb));
            }
            Err(e) => warn!("failed to encode snapshot: {e}"),
        }
    }

    fn send_targeted(&self, session: SessionId, msg: &ServerMessage) {
        if let Some(frame) = encode_frame(msg) {
            let _ = self.targeted_tx.send(TargetedFrame { session, frame });
        }
    }

    fn broadcast_message(&self, msg: &ServerMessage) {
        if let Some(frame) = encode_frame(msg) {
            let _ = self.frame_tx.send(frame);
        }
    }
}

fn encode_frame(msg: &ServerMessage) -> Option<Frame> {
    match encode_server(msg) {
        Ok(text) => Some(Frame::from(text)),
        Err(e) => {
            warn!("failed to encode frame: {e}");
            None
        }
    }
}

/// Drive the engine at the configured fixed rate until shutdown.
///
/// Missed ticks are skipped, not replayed: an overrunning tick is logged
/// and the next one lands on the next regular boundary.
pub async fn run_engine_loop(
    mut engine: Engine,
    mut intents: mpsc::Receiver<Intent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = Duration::from_millis(engine.config.server.tick_interval_ms);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "tick loop running at {:.0} Hz",
        1000.0 / period.as_millis() as f64
    );

    let mut queue: Vec<Intent> = Vec::new();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        while let Ok(intent) = intents.try_recv() {
            queue.push(intent);
        }

        let started = Instant::now();
        engine.tick(std::mem::take(&mut queue));
        let elapsed = started.elapsed();
        if elapsed > period {
            warn!(
                "tick {} overran its budget ({:?} > {:?})",
                engine.tick_count, elapsed, period
            );
        }
    }

    info!("tick loop stopped after {} ticks", engine.tick_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Color;
    use std::collections::HashSet;

    fn test_config() -> Config {
        let mut config = Config::default();
        // Keep the economy quiet unless a test opts in.
        config.food.min_amount = 0;
        config.food.max_amount = 0;
        config.player.decay_rate = 0.0;
        config
    }

    struct Harness {
        engine: Engine,
        frames: broadcast::Receiver<Frame>,
        targeted: broadcast::Receiver<TargetedFrame>,
    }

    fn harness(config: Config) -> Harness {
        let (frame_tx, frames) = broadcast::channel(256);
        let (targeted_tx, targeted) = broadcast::channel(64);
        Harness {
            engine: Engine::new(config, frame_tx, targeted_tx),
            frames,
            targeted,
        }
    }

    fn join(h: &mut Harness, session: SessionId, name: &str) -> PlayerId {
        h.engine.apply(Intent::Connect { session }).unwrap();
        h.engine
            .apply(Intent::Join {
                session,
                name: name.into(),
            })
            .unwrap();
        h.engine.player_of(session).unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<Frame>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            out.push(serde_json::from_str(frame.as_str()).unwrap());
        }
        out
    }

    /// Pin a blob somewhere specific so the movement phase holds still.
    fn place(h: &mut Harness, blob: EntityId, position: Vec2, mass: f32) {
        {
            let b = h.engine.world.blobs.get_mut(&blob).unwrap();
            b.position = position;
            b.target = position;
            b.mass = mass;
            b.boost = None;
        }
        h.engine.world.sync_blob(blob);
    }

    #[test]
    fn test_join_creates_starter_blob_and_replies_init() {
        let mut h = harness(test_config());
        let player = join(&mut h, 1, "Ann");

        let blobs = &h.engine.world.players[&player].blobs;
        assert_eq!(blobs.len(), 1);
        let blob = &h.engine.world.blobs[&blobs[0]];
        assert!((blob.mass - 10.0).abs() < f32::EPSILON);

        let reply = h.targeted.try_recv().unwrap();
        assert_eq!(reply.session, 1);
        let msg: ServerMessage = serde_json::from_str(reply.frame.as_str()).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Init {
                player_id: player.to_string()
            }
        );
    }

    #[test]
    fn test_join_rejects_bad_names() {
        let mut h = harness(test_config());
        h.engine.apply(Intent::Connect { session: 1 }).unwrap();
        assert_eq!(
            h.engine.apply(Intent::Join {
                session: 1,
                name: "   ".into()
            }),
            Err(CommandError::InvalidName)
        );
        assert_eq!(
            h.engine.apply(Intent::Join {
                session: 1,
                name: "seventeen-chars-x".into()
            }),
            Err(CommandError::InvalidName)
        );
        assert!(h.engine.world.players.is_empty());

        // The session stays in Connecting and may retry.
        assert!(
            h.engine
                .apply(Intent::Join {
                    session: 1,
                    name: "Ann".into()
                })
                .is_ok()
        );
    }

    #[test]
    fn test_duplicate_join_is_rejected() {
        let mut h = harness(test_config());
        join(&mut h, 1, "Ann");
        assert_eq!(
            h.engine.apply(Intent::Join {
                session: 1,
                name: "Bob".into()
            }),
            Err(CommandError::AlreadyJoined)
        );
        assert_eq!(h.engine.world.players.len(), 1);
    }

    #[test]
    fn test_target_is_clamped_to_border() {
        let mut h = harness(test_config());
        let player = join(&mut h, 1, "Ann");
        h.engine
            .apply(Intent::Target {
                session: 1,
                x: 99999.0,
                y: -99999.0,
            })
            .unwrap();

        let blob_id = h.engine.world.players[&player].blobs[0];
        let target = h.engine.world.blobs[&blob_id].target;
        assert_eq!(target, Vec2::new(2000.0, -2000.0));
    }

    #[test]
    fn test_commands_from_unjoined_sessions_are_rejected() {
        let mut h = harness(test_config());
        assert_eq!(
            h.engine.apply(Intent::Target {
                session: 9,
                x: 0.0,
                y: 0.0
            }),
            Err(CommandError::UnknownSession)
        );
        h.engine.apply(Intent::Connect { session: 9 }).unwrap();
        assert_eq!(
            h.engine.apply(Intent::Split { session: 9 }),
            Err(CommandError::NotJoined)
        );
    }

    #[test]
    fn test_food_consumption_adds_full_pellet_mass() {
        let mut h = harness(test_config());
        let player = join(&mut h, 1, "Ann");
        let blob_id = h.engine.world.players[&player].blobs[0];
        place(&mut h, blob_id, Vec2::new(100.0, 100.0), 10.0);
        let food_id = h
            .engine
            .world
            .spawn_food_at(Vec2::new(100.0, 100.0), 5.0);

        h.engine.tick(Vec::new());

        assert!(h.engine.world.food.get(&food_id).is_none());
        let blob = &h.engine.world.blobs[&blob_id];
        assert!((blob.mass - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_consumption_conserves_mass_modulo_efficiency() {
        let mut h = harness(test_config());
        let px = join(&mut h, 1, "X");
        let py = join(&mut h, 2, "Y");
        let bx = h.engine.world.players[&px].blobs[0];
        let by = h.engine.world.players[&py].blobs[0];

        let at = Vec2::new(100.0, 100.0);
        place(&mut h, bx, at, 100.0);
        place(&mut h, by, at, 50.0);

        h.engine.tick(Vec::new());

        // Ratio 2.0 over the 1.2 threshold: Y is consumed, X gains
        // 50 * 0.8 = 40.
        assert!(h.engine.world.blobs.get(&by).is_none());
        assert!(h.engine.world.players[&py].blobs.is_empty());
        let attacker = &h.engine.world.blobs[&bx];
        assert!((attacker.mass - 140.0).abs() < 1e-3);
        for blob in h.engine.world.blobs.values() {
            assert!(blob.mass > 0.0);
        }

        // The consumed blob is absent from the snapshot.
        let messages = drain(&mut h.frames);
        let state = messages
            .iter()
            .rev()
            .find_map(|m| match m {
                ServerMessage::GameState { blobs, .. } => Some(blobs),
                _ => None,
            })
            .unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].id, bx);
    }

    #[test]
    fn test_near_equal_masses_never_resolve() {
        let mut h = harness(test_config());
        let px = join(&mut h, 1, "X");
        let py = join(&mut h, 2, "Y");
        let bx = h.engine.world.players[&px].blobs[0];
        let by = h.engine.world.players[&py].blobs[0];

        let at = Vec2::new(-200.0, 300.0);
        place(&mut h, bx, at, 80.0);
        place(&mut h, by, at, 80.0);

        h.engine.tick(Vec::new());

        let x = &h.engine.world.blobs[&bx];
        let y = &h.engine.world.blobs[&by];
        assert!((x.mass - 80.0).abs() < f32::EPSILON);
        assert!((y.mass - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_chat_is_rate_limited_and_sanitized() {
        let mut h = harness(test_config());
        let player = join(&mut h, 1, "Ann");

        for _ in 0..5 {
            h.engine
                .apply(Intent::Chat {
                    session: 1,
                    text: "  hello\u{0} world  ".into(),
                })
                .unwrap();
        }

        let chats: Vec<_> = drain(&mut h.frames)
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::Chat { name, text, color } => Some((name, text, color)),
                _ => None,
            })
            .collect();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].0, "Ann");
        assert_eq!(chats[0].1, "hello world");
        assert_eq!(chats[0].2, Color::from_id(player));
    }

    #[test]
    fn test_join_then_disconnect_leaves_no_blobs() {
        let mut h = harness(test_config());
        h.engine.tick(vec![
            Intent::Connect { session: 1 },
            Intent::Join {
                session: 1,
                name: "Ann".into(),
            },
            Intent::Disconnect { session: 1 },
        ]);

        assert!(h.engine.world.players.is_empty());
        assert!(h.engine.world.blobs.is_empty());
        assert!(h.engine.player_of(1).is_none());
    }

    #[test]
    fn test_concurrent_joins_get_distinct_ids() {
        let mut h = harness(test_config());
        let mut intents = Vec::new();
        for session in 1..=10 {
            intents.push(Intent::Connect { session });
            intents.push(Intent::Join {
                session,
                name: format!("p{session}"),
            });
        }
        h.engine.tick(intents);

        let player_ids: HashSet<PlayerId> = h.engine.world.players.keys().copied().collect();
        assert_eq!(player_ids.len(), 10);
        let blob_ids: HashSet<EntityId> = h.engine.world.blobs.keys().copied().collect();
        assert_eq!(blob_ids.len(), 10);
    }

    #[test]
    fn test_food_count_stays_within_bounds() {
        let mut config = test_config();
        config.food.min_amount = 40;
        config.food.max_amount = 50;
        config.food.spawn_per_tick = 15;
        let mut h = harness(config);

        for _ in 0..4 {
            h.engine.tick(Vec::new());
            assert!(h.engine.world.food.len() <= 50);
        }
        assert!(h.engine.world.food.len() >= 40);
    }

    #[test]
    fn test_split_requires_threshold_and_halves_mass() {
        let mut h = harness(test_config());
        let player = join(&mut h, 1, "Ann");
        let blob_id = h.engine.world.players[&player].blobs[0];

        // Below the threshold: no-op.
        h.engine.apply(Intent::Split { session: 1 }).unwrap();
        assert_eq!(h.engine.world.players[&player].blobs.len(), 1);

        place(&mut h, blob_id, Vec2::new(0.0, 0.0), 64.0);
        h.engine.apply(Intent::Split { session: 1 }).unwrap();

        let blobs = h.engine.world.players[&player].blobs.clone();
        assert_eq!(blobs.len(), 2);
        for id in &blobs {
            let blob = &h.engine.world.blobs[id];
            assert!((blob.mass - 32.0).abs() < f32::EPSILON);
            assert!(blob.merge_at > h.engine.tick_count);
        }
        // The sibling got the outward impulse.
        let sibling = &h.engine.world.blobs[blobs.last().unwrap()];
        assert!(sibling.boost.is_some());
    }

    #[test]
    fn test_siblings_merge_after_cooldown() {
        let mut h = harness(test_config());
        let player = join(&mut h, 1, "Ann");
        let blob_id = h.engine.world.players[&player].blobs[0];
        place(&mut h, blob_id, Vec2::new(50.0, 50.0), 64.0);
        h.engine.apply(Intent::Split { session: 1 }).unwrap();

        let blobs = h.engine.world.players[&player].blobs.clone();
        assert_eq!(blobs.len(), 2);

        // Cooldown still running: a tick must not merge them.
        for &id in &blobs {
            place(&mut h, id, Vec2::new(50.0, 50.0), 32.0);
        }
        h.engine.tick(Vec::new());
        assert_eq!(h.engine.world.players[&player].blobs.len(), 2);

        // Expire the cooldown; the next tick merges mass back into one.
        for &id in &blobs {
            if let Some(blob) = h.engine.world.blobs.get_mut(&id) {
                blob.merge_at = 0;
            }
        }
        h.engine.tick(Vec::new());

        let remaining = h.engine.world.players[&player].blobs.clone();
        assert_eq!(remaining.len(), 1);
        let merged = &h.engine.world.blobs[&remaining[0]];
        assert!((merged.mass - 64.0).abs() < 1e-3);
    }

    #[test]
    fn test_decay_is_proportional_and_floored() {
        let mut config = test_config();
        config.player.decay_rate = 0.1;
        config.player.decay_interval_ticks = 1;
        let mut h = harness(config);

        let fat = join(&mut h, 1, "Fat");
        let lean = join(&mut h, 2, "Lean");
        let fat_blob = h.engine.world.players[&fat].blobs[0];
        let lean_blob = h.engine.world.players[&lean].blobs[0];
        place(&mut h, fat_blob, Vec2::new(-1000.0, -1000.0), 100.0);
        place(&mut h, lean_blob, Vec2::new(1000.0, 1000.0), 10.0);

        h.engine.tick(Vec::new());

        assert!((h.engine.world.blobs[&fat_blob].mass - 90.0).abs() < 1e-3);
        // Already at the starter mass: decay never pushes below it.
        assert!((h.engine.world.blobs[&lean_blob].mass - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_each_tick_broadcasts_one_snapshot() {
        let mut h = harness(test_config());
        join(&mut h, 1, "Ann");
        drain(&mut h.frames);

        h.engine.tick(Vec::new());

        let messages = drain(&mut h.frames);
        let states = messages
            .iter()
            .filter(|m| matches!(m, ServerMessage::GameState { .. }))
            .count();
        let leaderboards: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                ServerMessage::Leaderboard { entries } => Some(entries),
                _ => None,
            })
            .collect();
        assert_eq!(states, 1);
        assert_eq!(leaderboards.len(), 1);
        assert_eq!(leaderboards[0].len(), 1);
        assert_eq!(leaderboards[0][0].name, "Ann");
    }
}
