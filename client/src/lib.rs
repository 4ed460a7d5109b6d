//! # Game Client Library
//!
//! The player-facing half of the platform fighter. The client samples input,
//! applies it to its own copy of the shared rule engine immediately, and
//! corrects itself whenever an authoritative snapshot arrives.
//!
//! ## Prediction and Reconciliation
//!
//! Waiting a round trip before moving would make the game feel underwater,
//! so the local fighter is simulated optimistically: every captured input is
//! applied at once and kept in a pending queue. When the server's snapshot
//! lands, the local fighter is rebased onto the authoritative state and the
//! still-unacknowledged inputs are replayed on top. Remote fighters are never
//! predicted; they snap to the last authoritative state.
//!
//! ## Module Organization
//!
//! - [`engine`] — the prediction/reconciliation state machine
//! - [`input`] — keyboard sampling and input sequencing
//! - [`network`] — nonblocking UDP adapter, polled once per frame
//! - [`rendering`] — macroquad draw pass for stage, fighters and HUD
//!
//! Everything runs on macroquad's single frame loop, so snapshot application
//! and prediction can never interleave mid-update.

pub mod engine;
pub mod input;
pub mod network;
pub mod rendering;
