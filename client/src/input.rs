//! Client input management with sequencing and change detection

use macroquad::prelude::{is_key_down, KeyCode};
use shared::InputState;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// How often an unchanged control state is re-sent as a keep-alive.
const KEEP_ALIVE: Duration = Duration::from_millis(16);

/// Samples the keyboard into sequenced input frames.
///
/// A frame goes out whenever the control state changed or the keep-alive
/// interval elapsed, so the server's stored control state never goes stale
/// even over a lossy transport.
pub struct InputCapture {
    next_sequence: u32,
    current: InputState,
    last_sent: Instant,
}

impl InputCapture {
    pub fn new() -> Self {
        Self {
            next_sequence: 1,
            current: InputState::idle(),
            last_sent: Instant::now(),
        }
    }

    /// Samples the key map (A/D move, Space jump, J light, K heavy) and
    /// returns the next frame to send, if any.
    pub fn update(&mut self) -> Option<InputState> {
        let left = is_key_down(KeyCode::A) || is_key_down(KeyCode::Left);
        let right = is_key_down(KeyCode::D) || is_key_down(KeyCode::Right);
        let jump = is_key_down(KeyCode::Space);
        let light = is_key_down(KeyCode::J);
        let heavy = is_key_down(KeyCode::K);

        self.frame(left, right, jump, light, heavy)
    }

    /// Change detection and keep-alive cadence, separated from the macroquad
    /// sampling so it can run under test.
    fn frame(
        &mut self,
        left: bool,
        right: bool,
        jump: bool,
        light: bool,
        heavy: bool,
    ) -> Option<InputState> {
        let changed = left != self.current.left
            || right != self.current.right
            || jump != self.current.jump
            || light != self.current.light
            || heavy != self.current.heavy;
        let keep_alive_due = self.last_sent.elapsed() >= KEEP_ALIVE;

        if !changed && !keep_alive_due {
            return None;
        }

        self.current = InputState {
            sequence: self.next_sequence,
            timestamp: now_millis(),
            left,
            right,
            jump,
            light,
            heavy,
        };
        self.next_sequence += 1;
        self.last_sent = Instant::now();
        Some(self.current.clone())
    }
}

impl Default for InputCapture {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_starts_at_sequence_one() {
        let capture = InputCapture::new();
        assert_eq!(capture.next_sequence, 1);
        assert_eq!(capture.current.sequence, 0);
    }

    #[test]
    fn test_changed_state_emits_frame() {
        let mut capture = InputCapture::new();
        // Fresh capture: last_sent is "now", so only a change triggers.
        capture.last_sent = Instant::now();

        let frame = capture.frame(true, false, false, false, false);
        let frame = frame.expect("a changed control state must emit");
        assert_eq!(frame.sequence, 1);
        assert!(frame.left);

        // Same state again, inside the keep-alive window: nothing to send.
        capture.last_sent = Instant::now();
        assert!(capture.frame(true, false, false, false, false).is_none());
    }

    #[test]
    fn test_keep_alive_resends_unchanged_state() {
        let mut capture = InputCapture::new();
        capture.frame(false, true, false, false, false);

        capture.last_sent = Instant::now() - Duration::from_millis(50);
        let frame = capture.frame(false, true, false, false, false);
        assert!(frame.is_some());
    }

    #[test]
    fn test_sequences_increase_monotonically() {
        let mut capture = InputCapture::new();
        let a = capture.frame(true, false, false, false, false).unwrap();
        let b = capture.frame(false, false, false, false, false).unwrap();
        let c = capture.frame(false, false, true, false, false).unwrap();
        assert!(a.sequence < b.sequence && b.sequence < c.sequence);
    }

    #[test]
    fn test_timestamp_is_monotonic() {
        let a = now_millis();
        std::thread::sleep(Duration::from_millis(2));
        let b = now_millis();
        assert!(b > a);
    }
}
