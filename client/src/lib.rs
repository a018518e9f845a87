//! # Session Client Library
//!
//! This library provides the client-side implementation for the town game.
//! It keeps a local mirror of the authoritative session state and exposes
//! the pieces the terminal binary wires together:
//!
//! ### Connection
//! [`network::ClientLink`] frames messages over TCP. Inbound broadcasts
//! land on an unbounded queue that the application drains once per update
//! step, so a burst of server traffic never blocks the socket reader.
//!
//! ### State Mirror
//! [`world::World`] applies drained broadcasts in arrival order. It never
//! invents state; whatever the server last said is what the mirror shows.

pub mod network;
pub mod world;
