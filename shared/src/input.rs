//! The semantic input vector exchanged between client and server.

use serde::{Deserialize, Serialize};

/// One sampled control frame.
///
/// `sequence` is assigned by the sender and increases monotonically; the
/// server echoes the highest consumed sequence back so the client can prune
/// its replay queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub sequence: u32,
    pub timestamp: u64,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub light: bool,
    pub heavy: bool,
}

impl InputState {
    /// A frame with nothing held, used as the default control state before
    /// a player's first input arrives.
    pub fn idle() -> Self {
        Self::default()
    }
}
