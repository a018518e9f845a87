//! The session protocol's message union.
//!
//! Every frame payload is one UTF-8 JSON object carrying a `"type"` tag
//! that selects the variant. Tags and field names are part of the wire
//! contract; unknown tags decode to [`Message::Unknown`] and are dropped
//! by handlers so older servers and newer clients can coexist.

use crate::{Group, PlayerRecord, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Server greeting carrying the id assigned to the new connection.
    #[serde(rename = "WELCOME")]
    Welcome { my_id: u32 },

    /// Full roster broadcast after any lobby mutation.
    #[serde(rename = "PLAYER_LIST")]
    PlayerList { participants: Vec<PlayerRecord> },

    /// Periodic clock sync; `roles` lets late observers resync assignments.
    #[serde(rename = "TIME_SYNC")]
    TimeSync {
        phase_idx: usize,
        timer: f32,
        day: u32,
        #[serde(with = "roles_wire")]
        roles: HashMap<u32, Role>,
    },

    /// Roster snapshot with freshly assigned roles.
    #[serde(rename = "GAME_START")]
    GameStart { players: Vec<PlayerRecord> },

    /// Accumulated overnight news, flushed each morning.
    #[serde(rename = "DAILY_NEWS")]
    DailyNews { news: Vec<String> },

    #[serde(rename = "GAME_OVER")]
    GameOver { winner: String },

    /// Targeted stat refresh for one record.
    #[serde(rename = "STATS_UPDATE")]
    StatsUpdate { id: u32, stats: PlayerRecord },

    /// Position update; `id` may be omitted by the sender and defaults to
    /// the server-recognized sender id (the host also moves its bots).
    #[serde(rename = "MOVE")]
    Move {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u32>,
        x: f32,
        y: f32,
        #[serde(default)]
        is_moving: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        facing: Option<String>,
    },

    /// Chat line; the server stamps `sender_name` before rebroadcast.
    #[serde(rename = "CHAT")]
    Chat {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_name: Option<String>,
    },

    /// Lobby role pick; `id` defaults to the sender.
    #[serde(rename = "UPDATE_ROLE")]
    UpdateRole {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u32>,
        role: Role,
    },

    #[serde(rename = "CHANGE_GROUP")]
    ChangeGroup { target_id: u32, group: Group },

    #[serde(rename = "ADD_BOT")]
    AddBot { name: String, group: Group },

    #[serde(rename = "REMOVE_BOT")]
    RemoveBot { target_id: u32 },

    #[serde(rename = "START_GAME")]
    StartGame,

    /// Forces the phase timer to zero; the advance happens on the next tick.
    #[serde(rename = "SKIP_PHASE")]
    SkipPhase,

    #[serde(rename = "UPDATE_STATS")]
    UpdateStats {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hp: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_hp: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ap: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_ap: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coins: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emotion: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<String>,
    },

    #[serde(rename = "UPDATE_PROFILE")]
    UpdateProfile {
        name: String,
        #[serde(default)]
        custom: serde_json::Value,
    },

    #[serde(rename = "ENTITY_DIED")]
    EntityDied {
        victim: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Catch-all for tags this build does not know; always dropped.
    #[serde(other)]
    Unknown,
}

/// Bridges the `roles` map across the internally tagged enum: JSON keys
/// are strings, and the tag buffering cannot parse them back into `u32`
/// on its own, so the conversion is spelled out here.
mod roles_wire {
    use super::Role;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        roles: &HashMap<u32, Role>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(roles.iter().map(|(id, role)| (id.to_string(), role)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<u32, Role>, D::Error> {
        HashMap::<String, Role>::deserialize(deserializer)?
            .into_iter()
            .map(|(id, role)| id.parse::<u32>().map(|id| (id, role)).map_err(Error::custom))
            .collect()
    }
}

impl Message {
    /// Serializes to the JSON payload carried inside one frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parses a frame payload. A failure here is a decode error: the
    /// message is dropped but the connection stays usable.
    pub fn from_bytes(data: &[u8]) -> Result<Message, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Fills in the sender id on variants that allow omitting it.
    pub fn stamp_sender(&mut self, sender: u32) {
        match self {
            Message::Move { id, .. }
            | Message::UpdateRole { id, .. }
            | Message::UpdateStats { id, .. } => {
                if id.is_none() {
                    *id = Some(sender);
                }
            }
            _ => {}
        }
    }
}
