//! Session state and message handling.
//!
//! A [`Session`] owns the registry, the phase clock, and the authorization
//! policy, and turns every inbound event into a list of outbound messages
//! tagged with their audience. It performs no I/O of its own; the network
//! layer owns exactly one `Session` and is the only caller, so all
//! mutations are naturally linearized.

use crate::auth::{AuthorizationPolicy, LobbyAction, Permissive};
use crate::phase::{Phase, PhaseClock, PhaseTable};
use crate::registry::PlayerRegistry;
use crate::roles;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::message::Message;
use shared::{ClientKind, Role};

/// Who should receive one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Every live connection.
    All,
    /// Everyone except the named player (echo suppression).
    AllExcept(u32),
    /// One specific player's connection.
    To(u32),
}

/// TIME_SYNC is emitted at most this often outside phase changes.
pub const TIME_SYNC_INTERVAL: f32 = 1.0;

pub struct Session {
    registry: PlayerRegistry,
    clock: PhaseClock,
    policy: Box<dyn AuthorizationPolicy>,
    rng: StdRng,
    /// Seconds since the last TIME_SYNC broadcast
    since_sync: f32,
}

impl Session {
    pub fn new(table: PhaseTable) -> Self {
        Self::with_parts(table, Box::new(Permissive), StdRng::from_entropy())
    }

    /// Full constructor for tests: inject a policy and a seeded rng.
    pub fn with_parts(
        table: PhaseTable,
        policy: Box<dyn AuthorizationPolicy>,
        rng: StdRng,
    ) -> Self {
        Self {
            registry: PlayerRegistry::new(),
            clock: PhaseClock::new(table),
            policy,
            rng,
            since_sync: 0.0,
        }
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &PhaseClock {
        &self.clock
    }

    /// A new connection was accepted: allocate its record, greet it, and
    /// tell everyone about the new roster.
    pub fn accept(&mut self) -> (u32, Vec<(Outbound, Message)>) {
        let id = self.registry.insert_human();
        let out = vec![
            (Outbound::To(id), Message::Welcome { my_id: id }),
            (Outbound::All, self.roster_message()),
        ];
        (id, out)
    }

    /// A connection went away: drop its record and rebroadcast the roster.
    pub fn disconnect(&mut self, id: u32) -> Vec<(Outbound, Message)> {
        self.registry.remove(id);
        vec![(Outbound::All, self.roster_message())]
    }

    /// Dispatches one decoded message from `sender`. Logically impossible
    /// requests (unknown targets, wrong kinds) are silent no-ops.
    pub fn handle_message(&mut self, sender: u32, message: Message) -> Vec<(Outbound, Message)> {
        match message {
            Message::UpdateRole { id, role } => {
                if !self.policy.allows(sender, LobbyAction::UpdateRole) {
                    return Vec::new();
                }
                let target = id.unwrap_or(sender);
                match self.registry.get_mut(target) {
                    Some(record) => {
                        record.role = role;
                        vec![(Outbound::All, self.roster_message())]
                    }
                    None => {
                        debug!("UPDATE_ROLE for unknown id {}", target);
                        Vec::new()
                    }
                }
            }

            Message::ChangeGroup { target_id, group } => {
                if !self.policy.allows(sender, LobbyAction::ChangeGroup) {
                    return Vec::new();
                }
                match self.registry.get_mut(target_id) {
                    Some(record) => {
                        record.group = group;
                        vec![(Outbound::All, self.roster_message())]
                    }
                    None => {
                        debug!("CHANGE_GROUP for unknown id {}", target_id);
                        Vec::new()
                    }
                }
            }

            Message::AddBot { name, group } => {
                if !self.policy.allows(sender, LobbyAction::AddBot) {
                    return Vec::new();
                }
                // A bot joining mid-game would otherwise sit unassigned, so
                // it gets a job immediately once the session is running.
                let role = if self.registry.started() {
                    *Role::CITIZEN_JOBS
                        .choose(&mut self.rng)
                        .unwrap_or(&Role::Farmer)
                } else {
                    Role::Random
                };
                self.registry.insert_bot(name, group, role);
                vec![(Outbound::All, self.roster_message())]
            }

            Message::RemoveBot { target_id } => {
                if !self.policy.allows(sender, LobbyAction::RemoveBot) {
                    return Vec::new();
                }
                let is_bot = self
                    .registry
                    .get(target_id)
                    .map(|record| record.kind == ClientKind::Bot)
                    .unwrap_or(false);
                if !is_bot {
                    debug!("REMOVE_BOT ignored for non-bot id {}", target_id);
                    return Vec::new();
                }
                self.registry.remove(target_id);
                vec![(Outbound::All, self.roster_message())]
            }

            Message::StartGame => {
                if !self.policy.allows(sender, LobbyAction::StartGame) {
                    return Vec::new();
                }
                if self.registry.started() {
                    debug!("START_GAME ignored: session already running");
                    return Vec::new();
                }

                {
                    let mut records = self.registry.records_by_id_mut();
                    roles::distribute_roles(&mut records, &mut self.rng);
                }
                self.registry.mark_started();
                self.clock.reset();
                self.since_sync = 0.0;
                info!("Game started with {} participants", self.registry.len());

                vec![(
                    Outbound::All,
                    Message::GameStart {
                        players: self.registry.roster(),
                    },
                )]
            }

            Message::SkipPhase => {
                if !self.policy.allows(sender, LobbyAction::SkipPhase) {
                    return Vec::new();
                }
                self.clock.skip();
                Vec::new()
            }

            Message::Move {
                id,
                x,
                y,
                is_moving,
                facing,
            } => {
                let target = id.unwrap_or(sender);
                match self.registry.get_mut(target) {
                    Some(record) => {
                        record.x = x;
                        record.y = y;
                        record.is_moving = Some(is_moving);
                        record.facing = facing.clone();
                        vec![(
                            Outbound::AllExcept(sender),
                            Message::Move {
                                id: Some(target),
                                x,
                                y,
                                is_moving,
                                facing,
                            },
                        )]
                    }
                    None => Vec::new(),
                }
            }

            Message::Chat { message, .. } => {
                let sender_name = self
                    .registry
                    .get(sender)
                    .map(|record| record.name.clone())
                    .unwrap_or_else(|| format!("System {}", sender));
                vec![(
                    Outbound::All,
                    Message::Chat {
                        message,
                        sender_name: Some(sender_name),
                    },
                )]
            }

            Message::UpdateStats {
                id,
                hp,
                max_hp,
                ap,
                max_ap,
                coins,
                emotion,
                action,
            } => {
                let target = id.unwrap_or(sender);
                match self.registry.get_mut(target) {
                    Some(record) => {
                        record.merge_stats(hp, max_hp, ap, max_ap, coins, emotion, action);
                        let stats = record.clone();
                        vec![(Outbound::All, Message::StatsUpdate { id: target, stats })]
                    }
                    None => Vec::new(),
                }
            }

            Message::UpdateProfile { name, custom } => match self.registry.get_mut(sender) {
                Some(record) => {
                    record.name = name;
                    record.custom = if custom.is_null() { None } else { Some(custom) };
                    vec![(Outbound::All, self.roster_message())]
                }
                None => Vec::new(),
            },

            Message::EntityDied { victim, reason } => {
                let name = match self.registry.get_mut(victim) {
                    Some(record) => {
                        record.alive = false;
                        record.name.clone()
                    }
                    None => return Vec::new(),
                };
                let reason = reason.unwrap_or_else(|| "natural causes".to_string());
                self.registry.push_news(format!("{} has died of {}.", name, reason));
                vec![(Outbound::All, self.roster_message())]
            }

            // Server-to-client tags arriving inbound carry no meaning here,
            // and unknown tags are dropped by policy.
            Message::Welcome { .. }
            | Message::PlayerList { .. }
            | Message::TimeSync { .. }
            | Message::GameStart { .. }
            | Message::DailyNews { .. }
            | Message::GameOver { .. }
            | Message::StatsUpdate { .. }
            | Message::Unknown => {
                debug!("Dropping inbound message with no server-side handler");
                Vec::new()
            }
        }
    }

    /// Advances the clock by `dt` elapsed seconds. Emits TIME_SYNC at a
    /// bounded rate plus immediately on every phase change, and flushes
    /// the news log when a new morning begins. Idle until the game starts.
    pub fn tick(&mut self, dt: f32) -> Vec<(Outbound, Message)> {
        if !self.registry.started() {
            return Vec::new();
        }

        let entered = self.clock.tick(dt);
        let mut out = Vec::new();

        for phase in &entered {
            if *phase == Phase::Morning {
                let mut news = self.registry.take_news();
                if news.is_empty() {
                    news.push("No special news today.".to_string());
                }
                out.push((Outbound::All, Message::DailyNews { news }));
            }
        }

        self.since_sync += dt;
        if !entered.is_empty() || self.since_sync >= TIME_SYNC_INTERVAL {
            self.since_sync = 0.0;
            out.push((Outbound::All, self.time_sync_message()));
        }

        out
    }

    fn roster_message(&self) -> Message {
        Message::PlayerList {
            participants: self.registry.roster(),
        }
    }

    fn time_sync_message(&self) -> Message {
        Message::TimeSync {
            phase_idx: self.clock.phase_idx(),
            timer: self.clock.timer(),
            day: self.clock.day(),
            roles: self.registry.roles(),
        }
    }
}
