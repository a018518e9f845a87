//! Local mirror of the authoritative session state.
//!
//! Every server broadcast lands here; nothing in this module decides
//! state on its own. Client-to-server requests (MOVE and friends) carry
//! no meaning inbound and are ignored.

use log::debug;
use shared::message::Message;
use shared::{PlayerRecord, Role, PHASE_NAMES};
use std::collections::HashMap;

/// One line of chat as the mirror saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub sender: String,
    pub text: String,
}

/// The client's view of the session, rebuilt from broadcasts.
#[derive(Default)]
pub struct World {
    my_id: Option<u32>,
    players: HashMap<u32, PlayerRecord>,
    phase_idx: usize,
    timer: f32,
    day: u32,
    roles: HashMap<u32, Role>,
    started: bool,
    news: Vec<String>,
    chat: Vec<ChatLine>,
    winner: Option<String>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn my_id(&self) -> Option<u32> {
        self.my_id
    }

    pub fn me(&self) -> Option<&PlayerRecord> {
        self.my_id.and_then(|id| self.players.get(&id))
    }

    pub fn player(&self, id: u32) -> Option<&PlayerRecord> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Roster sorted by id, mirroring the server's broadcast order.
    pub fn roster(&self) -> Vec<&PlayerRecord> {
        let mut roster: Vec<&PlayerRecord> = self.players.values().collect();
        roster.sort_by_key(|record| record.id);
        roster
    }

    pub fn phase_idx(&self) -> usize {
        self.phase_idx
    }

    pub fn phase_name(&self) -> &'static str {
        PHASE_NAMES.get(self.phase_idx).copied().unwrap_or("DAWN")
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn role_of(&self, id: u32) -> Option<Role> {
        self.roles.get(&id).copied()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn latest_news(&self) -> &[String] {
        &self.news
    }

    pub fn chat_log(&self) -> &[ChatLine] {
        &self.chat
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Applies one server broadcast to the mirror.
    pub fn apply(&mut self, message: Message) {
        match message {
            Message::Welcome { my_id } => {
                self.my_id = Some(my_id);
            }

            Message::PlayerList { participants } => {
                self.replace_roster(participants);
            }

            Message::GameStart { players } => {
                self.replace_roster(players);
                self.started = true;
            }

            Message::TimeSync {
                phase_idx,
                timer,
                day,
                roles,
            } => {
                self.phase_idx = phase_idx;
                self.timer = timer;
                self.day = day;
                for (id, role) in &roles {
                    if let Some(record) = self.players.get_mut(id) {
                        record.role = *role;
                    }
                }
                self.roles = roles;
            }

            Message::DailyNews { news } => {
                self.news = news;
            }

            Message::GameOver { winner } => {
                self.winner = Some(winner);
            }

            Message::StatsUpdate { id, stats } => {
                self.players.insert(id, stats);
            }

            Message::Move {
                id,
                x,
                y,
                is_moving,
                facing,
            } => {
                let Some(id) = id else { return };
                if let Some(record) = self.players.get_mut(&id) {
                    record.x = x;
                    record.y = y;
                    record.is_moving = Some(is_moving);
                    record.facing = facing;
                }
            }

            Message::Chat {
                message,
                sender_name,
            } => {
                self.chat.push(ChatLine {
                    sender: sender_name.unwrap_or_else(|| "???".to_string()),
                    text: message,
                });
            }

            other => {
                debug!("Ignoring non-broadcast message: {:?}", other);
            }
        }
    }

    fn replace_roster(&mut self, participants: Vec<PlayerRecord>) {
        self.players = participants
            .into_iter()
            .map(|record| (record.id, record))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ClientKind, Group};

    fn record(id: u32) -> PlayerRecord {
        PlayerRecord::human(id)
    }

    #[test]
    fn test_welcome_sets_identity() {
        let mut world = World::new();
        assert!(world.my_id().is_none());

        world.apply(Message::Welcome { my_id: 4 });
        assert_eq!(world.my_id(), Some(4));
    }

    #[test]
    fn test_player_list_replaces_roster() {
        let mut world = World::new();
        world.apply(Message::PlayerList {
            participants: vec![record(0), record(1), record(2)],
        });
        assert_eq!(world.player_count(), 3);

        world.apply(Message::PlayerList {
            participants: vec![record(1)],
        });
        assert_eq!(world.player_count(), 1);
        assert!(world.player(0).is_none());
    }

    #[test]
    fn test_time_sync_updates_clock_and_roles() {
        let mut world = World::new();
        world.apply(Message::PlayerList {
            participants: vec![record(0)],
        });

        let mut roles = HashMap::new();
        roles.insert(0, Role::Mafia);
        world.apply(Message::TimeSync {
            phase_idx: 2,
            timer: 12.5,
            day: 3,
            roles,
        });

        assert_eq!(world.phase_idx(), 2);
        assert_eq!(world.phase_name(), "NOON");
        assert_eq!(world.day(), 3);
        assert_eq!(world.role_of(0), Some(Role::Mafia));
        assert_eq!(world.player(0).unwrap().role, Role::Mafia);
    }

    #[test]
    fn test_game_start_flips_flag() {
        let mut world = World::new();
        world.apply(Message::GameStart {
            players: vec![record(0), record(1)],
        });
        assert!(world.started());
        assert_eq!(world.player_count(), 2);
    }

    #[test]
    fn test_move_updates_known_player_only() {
        let mut world = World::new();
        world.apply(Message::PlayerList {
            participants: vec![record(0)],
        });

        world.apply(Message::Move {
            id: Some(0),
            x: 10.0,
            y: 20.0,
            is_moving: true,
            facing: Some("left".into()),
        });
        let me = world.player(0).unwrap();
        assert_eq!(me.x, 10.0);
        assert_eq!(me.facing.as_deref(), Some("left"));

        // Unknown id and missing id are both ignored.
        world.apply(Message::Move {
            id: Some(9),
            x: 1.0,
            y: 1.0,
            is_moving: false,
            facing: None,
        });
        world.apply(Message::Move {
            id: None,
            x: 1.0,
            y: 1.0,
            is_moving: false,
            facing: None,
        });
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_stats_update_replaces_record() {
        let mut world = World::new();
        world.apply(Message::PlayerList {
            participants: vec![record(0)],
        });

        let mut updated = record(0);
        updated.hp = Some(3);
        updated.coins = Some(12);
        world.apply(Message::StatsUpdate {
            id: 0,
            stats: updated,
        });

        let me = world.player(0).unwrap();
        assert_eq!(me.hp, Some(3));
        assert_eq!(me.coins, Some(12));
        assert_eq!(me.kind, ClientKind::Human);
        assert_eq!(me.group, Group::Player);
    }

    #[test]
    fn test_news_and_chat_accumulate() {
        let mut world = World::new();
        world.apply(Message::DailyNews {
            news: vec!["No special news today.".into()],
        });
        assert_eq!(world.latest_news().len(), 1);

        world.apply(Message::Chat {
            message: "hi".into(),
            sender_name: Some("Alice".into()),
        });
        world.apply(Message::Chat {
            message: "yo".into(),
            sender_name: None,
        });
        assert_eq!(world.chat_log().len(), 2);
        assert_eq!(world.chat_log()[0].sender, "Alice");
        assert_eq!(world.chat_log()[1].sender, "???");
    }

    #[test]
    fn test_game_over_records_winner() {
        let mut world = World::new();
        world.apply(Message::GameOver {
            winner: "MAFIA".into(),
        });
        assert_eq!(world.winner(), Some("MAFIA"));
    }

    #[test]
    fn test_client_requests_ignored_inbound() {
        let mut world = World::new();
        world.apply(Message::StartGame);
        world.apply(Message::Unknown);
        assert!(!world.started());
        assert_eq!(world.player_count(), 0);
    }
}
