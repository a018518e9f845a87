use serde::{Deserialize, Serialize};

pub mod frame;
pub mod message;

/// Sentinel position for records that have not reported a location yet.
pub const OFF_MAP: f32 = -1000.0;

/// The six recurring segments of one in-game day, in cycle order.
pub const PHASE_NAMES: [&str; 6] = ["DAWN", "MORNING", "NOON", "AFTERNOON", "EVENING", "NIGHT"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Placeholder meaning "assign me during role distribution".
    Random,
    Citizen,
    Mafia,
    Police,
    Doctor,
    Farmer,
    Miner,
    Fisher,
}

impl Role {
    /// The unconstrained citizen jobs, in round-robin fill order.
    pub const CITIZEN_JOBS: [Role; 3] = [Role::Farmer, Role::Miner, Role::Fisher];

    /// True for the jobs that count as plain citizens against no quota.
    pub fn is_citizen_job(self) -> bool {
        matches!(self, Role::Farmer | Role::Miner | Role::Fisher)
    }
}

/// Whether a record participates in-world or only observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Group {
    Player,
    Spectator,
}

/// Who drives a record: a connected human or a server-side bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientKind {
    Human,
    Bot,
}

/// One roster entry as it travels on the wire.
///
/// Required fields are always present in broadcasts; the transient stats
/// only appear once a client has reported them via UPDATE_STATS, and the
/// movement fields once a MOVE has been seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: u32,
    pub name: String,
    pub role: Role,
    pub group: Group,
    #[serde(rename = "type")]
    pub kind: ClientKind,
    pub x: f32,
    pub y: f32,
    pub alive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ap: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Opaque character-customization blob, set via UPDATE_PROFILE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
}

impl PlayerRecord {
    /// Default record for a freshly accepted human connection.
    pub fn human(id: u32) -> Self {
        Self::with_identity(id, format!("Player {}", id + 1), Role::Citizen, Group::Player, ClientKind::Human)
    }

    /// Record for a server-side bot added from the lobby.
    pub fn bot(id: u32, name: String, group: Group, role: Role) -> Self {
        Self::with_identity(id, name, role, group, ClientKind::Bot)
    }

    fn with_identity(id: u32, name: String, role: Role, group: Group, kind: ClientKind) -> Self {
        Self {
            id,
            name,
            role,
            group,
            kind,
            x: OFF_MAP,
            y: OFF_MAP,
            alive: true,
            facing: None,
            is_moving: None,
            hp: None,
            max_hp: None,
            ap: None,
            max_ap: None,
            coins: None,
            emotion: None,
            action: None,
            custom: None,
        }
    }

    /// Merges an UPDATE_STATS report into the record. Absent fields keep
    /// their previous value.
    #[allow(clippy::too_many_arguments)]
    pub fn merge_stats(
        &mut self,
        hp: Option<i32>,
        max_hp: Option<i32>,
        ap: Option<i32>,
        max_ap: Option<i32>,
        coins: Option<i32>,
        emotion: Option<String>,
        action: Option<String>,
    ) {
        if hp.is_some() {
            self.hp = hp;
        }
        if max_hp.is_some() {
            self.max_hp = max_hp;
        }
        if ap.is_some() {
            self.ap = ap;
        }
        if max_ap.is_some() {
            self.max_ap = max_ap;
        }
        if coins.is_some() {
            self.coins = coins;
        }
        if emotion.is_some() {
            self.emotion = emotion;
        }
        if action.is_some() {
            self.action = action;
        }
    }
}
