//! Authorization seam for privileged lobby actions.
//!
//! The wire protocol itself carries no credentials, so the default policy
//! allows every caller. Gating all lobby
//! administration through this trait means a stricter deployment swaps one
//! value instead of touching protocol logic.

/// Lobby actions that mutate shared session state on behalf of others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyAction {
    UpdateRole,
    ChangeGroup,
    AddBot,
    RemoveBot,
    StartGame,
    SkipPhase,
}

pub trait AuthorizationPolicy: Send {
    fn allows(&self, sender: u32, action: LobbyAction) -> bool;
}

/// Every caller may perform every lobby action.
pub struct Permissive;

impl AuthorizationPolicy for Permissive {
    fn allows(&self, _sender: u32, _action: LobbyAction) -> bool {
        true
    }
}

/// Only the first connected player (id 0) may administer the lobby.
pub struct HostOnly;

impl AuthorizationPolicy for HostOnly {
    fn allows(&self, sender: u32, _action: LobbyAction) -> bool {
        sender == 0
    }
}
