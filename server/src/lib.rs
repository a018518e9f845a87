//! # Session Server Library
//!
//! This library provides the authoritative server implementation for the
//! social-deduction town game. It owns the canonical player roster and the
//! day clock, applies every client request in one total order, and
//! rebroadcasts state so all connected clients converge on the same view.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server keeps the only trusted copy of the roster, role assignments,
//! and the phase clock. Clients mirror what the server broadcasts; they
//! never decide state themselves.
//!
//! ### Connection Management
//! Handles the complete lifecycle of TCP connections:
//! - Accept, id assignment, and the WELCOME greeting
//! - Frame decoding with per-frame error isolation
//! - Disconnection cleanup and roster rebroadcast
//!
//! ### Session Logic
//! Lobby administration (roles, groups, bots), the game start with
//! quota-constrained random role assignment, the six-phase day cycle, and
//! the morning news digest.

pub mod auth;
pub mod network;
pub mod phase;
pub mod registry;
pub mod roles;
pub mod session;
