//! # Relay Server Library
//!
//! The authoritative half of the platform fighter. The server owns every
//! room's canonical state, consumes client inputs, runs the shared rule
//! engine at a fixed tick rate, and broadcasts snapshots that clients
//! reconcile against.
//!
//! ## Architecture
//!
//! A single `tokio::select!` loop owns all mutable game state. Network
//! receive, packet send and timeout sweeping run as separate tasks, but they
//! only talk to the loop through channels, so a room's tick handler and the
//! message handlers can never interleave. One shared interval drives every
//! active room; destroying a room is just removing it from the map the
//! interval iterates, which is why there is no repeating timer to cancel.
//!
//! ## Module Organization
//!
//! - [`connections`] — transport id assignment, addr lookup, timeout sweep
//! - [`room`] — one match: roster, phase machine, standings
//! - [`room_manager`] — room assignment plus the per-connection operations,
//!   with a direct connection-to-room index
//! - [`simulation`] — the per-tick room update and its emitted events
//! - [`network`] — UDP transport, packet dispatch, the shared tick loop
//!
//! ## Authority Model
//!
//! Clients predict locally but the server's simulation is the only one that
//! counts: every snapshot carries the full authoritative player state plus
//! the highest input sequence consumed per player, which is all a client
//! needs to reconcile.

pub mod connections;
pub mod network;
pub mod room;
pub mod room_manager;
pub mod simulation;
