//! Macroquad draw pass for stage, fighters and HUD.
//!
//! Pure presentation: this module consumes whatever the engine holds and
//! draws it, nothing more.

use macroquad::prelude::*;
use shared::{Player, Stage, PLAYER_HALF_HEIGHT, PLAYER_HALF_WIDTH};

const BACKGROUND: Color = Color::new(0.10, 0.10, 0.14, 1.0);
const PLATFORM_COLOR: Color = Color::new(0.27, 0.27, 0.30, 1.0);

/// Fighter fill colors by roster slot.
const PLAYER_COLORS: [Color; 4] = [GREEN, SKYBLUE, ORANGE, PINK];

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    /// Draws one frame: stage, fighters, HUD, and an optional banner line
    /// (lobby status, countdown, results).
    pub fn render(
        &self,
        stage: &Stage,
        players: &[&Player],
        local_id: Option<u32>,
        banner: Option<&str>,
    ) {
        clear_background(BACKGROUND);

        self.draw_stage(stage);
        for (slot, player) in players.iter().enumerate() {
            self.draw_player(player, slot, Some(player.id) == local_id);
        }
        self.draw_hud(players, local_id);

        if let Some(text) = banner {
            self.draw_banner(text);
        }
    }

    fn draw_stage(&self, stage: &Stage) {
        for platform in &stage.platforms {
            draw_rectangle(
                platform.x,
                platform.y,
                platform.width,
                platform.height,
                PLATFORM_COLOR,
            );
        }
    }

    fn draw_player(&self, player: &Player, slot: usize, is_local: bool) {
        if player.is_out() {
            return;
        }

        let color = PLAYER_COLORS[slot % PLAYER_COLORS.len()];
        let x = player.position.x - PLAYER_HALF_WIDTH;
        let y = player.position.y - PLAYER_HALF_HEIGHT;
        draw_rectangle(x, y, PLAYER_HALF_WIDTH * 2.0, PLAYER_HALF_HEIGHT * 2.0, color);
        if is_local {
            draw_rectangle_lines(x, y, PLAYER_HALF_WIDTH * 2.0, PLAYER_HALF_HEIGHT * 2.0, 3.0, WHITE);
        }

        // Facing marker on the leading edge.
        let edge_x = player.position.x + player.direction * PLAYER_HALF_WIDTH;
        draw_rectangle(edge_x - 4.0, y + 10.0, 8.0, 8.0, WHITE);

        // Active attack shown as its range circle.
        if let Some(attack) = player.attack {
            draw_circle_lines(
                player.position.x,
                player.position.y,
                attack.range(),
                2.0,
                RED,
            );
        }

        draw_text(
            &player.username,
            x,
            y - 10.0,
            18.0,
            WHITE,
        );
    }

    fn draw_hud(&self, players: &[&Player], local_id: Option<u32>) {
        for (row, player) in players.iter().enumerate() {
            let marker = if Some(player.id) == local_id { ">" } else { " " };
            let line = format!(
                "{} {:<12} {}  {:.0}%",
                marker,
                player.username,
                "o".repeat(player.stocks as usize),
                player.damage,
            );
            draw_text(&line, 16.0, 24.0 + row as f32 * 22.0, 20.0, WHITE);
        }
    }

    fn draw_banner(&self, text: &str) {
        let size = 32.0;
        let dims = measure_text(text, None, size as u16, 1.0);
        draw_text(
            text,
            (screen_width() - dims.width) / 2.0,
            screen_height() / 3.0,
            size,
            YELLOW,
        );
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
