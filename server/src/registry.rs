//! Player registry: the authoritative roster for one session
//!
//! This module owns the id-to-record mapping that every broadcast is built
//! from, including:
//! - Sequential id allocation (ids are never reused while the process runs)
//! - Human and bot record insertion and removal
//! - The one-way `started` flag flipped by the first accepted START_GAME
//! - The pending news log flushed each morning
//!
//! The registry itself is not synchronized; the server's single state-owning
//! loop is the only code that touches it.

use log::info;
use shared::{Group, PlayerRecord, Role};
use std::collections::HashMap;

/// Authoritative mapping of player id to record, plus the session flags
/// that travel with it.
pub struct PlayerRegistry {
    /// Records indexed by their unique id
    players: HashMap<u32, PlayerRecord>,
    /// Next id handed out; monotonically increasing
    next_id: u32,
    /// Set once by START_GAME, never cleared
    started: bool,
    /// News lines accumulated since the last morning flush
    news: Vec<String>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            next_id: 0,
            started: false,
            news: Vec::new(),
        }
    }

    /// Inserts a default human record for a freshly accepted connection
    /// and returns its id.
    pub fn insert_human(&mut self) -> u32 {
        let id = self.allocate_id();
        info!("Player {} joined the session", id);
        self.players.insert(id, PlayerRecord::human(id));
        id
    }

    /// Inserts a bot record with the given identity and returns its id.
    pub fn insert_bot(&mut self, name: String, group: Group, role: Role) -> u32 {
        let id = self.allocate_id();
        info!("Bot '{}' added with id {}", name, id);
        self.players.insert(id, PlayerRecord::bot(id, name, group, role));
        id
    }

    /// Removes a record, returning it if it existed.
    pub fn remove(&mut self, id: u32) -> Option<PlayerRecord> {
        let removed = self.players.remove(&id);
        if let Some(record) = &removed {
            info!("Removed {} (id {})", record.name, id);
        }
        removed
    }

    pub fn get(&self, id: u32) -> Option<&PlayerRecord> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut PlayerRecord> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.players.contains_key(&id)
    }

    /// Roster snapshot sorted by id, the shape every PLAYER_LIST and
    /// GAME_START broadcast carries.
    pub fn roster(&self) -> Vec<PlayerRecord> {
        let mut roster: Vec<PlayerRecord> = self.players.values().cloned().collect();
        roster.sort_by_key(|record| record.id);
        roster
    }

    /// Mutable references to every record, in id order. Used by role
    /// distribution so "original order" is deterministic.
    pub fn records_by_id_mut(&mut self) -> Vec<&mut PlayerRecord> {
        let mut records: Vec<&mut PlayerRecord> = self.players.values_mut().collect();
        records.sort_by_key(|record| record.id);
        records
    }

    /// Current id-to-role assignments, as carried by TIME_SYNC.
    pub fn roles(&self) -> HashMap<u32, Role> {
        self.players
            .iter()
            .map(|(id, record)| (*id, record.role))
            .collect()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// Flips the one-way started flag.
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    pub fn push_news(&mut self, line: String) {
        self.news.push(line);
    }

    /// Takes the accumulated news lines, leaving the log empty.
    pub fn take_news(&mut self) -> Vec<String> {
        std::mem::take(&mut self.news)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
