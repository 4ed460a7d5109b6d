use clap::Parser;
use client::engine::ClientEngine;
use client::input::InputCapture;
use client::network::NetworkClient;
use client::rendering::Renderer;
use log::info;
use macroquad::prelude::*;
use shared::{Packet, PlayerResult};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name to join with
    #[arg(short, long, default_value = "anon")]
    username: String,

    /// Character to pick after joining
    #[arg(short, long)]
    character: Option<String>,

    /// Stage to vote for after joining
    #[arg(long)]
    stage: Option<String>,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Brawl".to_string(),
        window_width: 1280,
        window_height: 800,
        ..Default::default()
    }
}

fn results_banner(results: &[PlayerResult]) -> String {
    match results.first() {
        Some(winner) => format!("{} wins! Next match shortly...", winner.username),
        None => "Match over".to_string(),
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    info!("Connecting to {}", args.server);
    info!("Controls: A/D move, Space jump, J light attack, K heavy attack, Esc quit");

    let mut network = match NetworkClient::connect(&args.server) {
        Ok(network) => network,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            return;
        }
    };

    let mut engine = ClientEngine::new();
    let mut capture = InputCapture::new();
    let renderer = Renderer::new();
    let mut results: Option<Vec<PlayerResult>> = None;
    let mut disconnected: Option<String> = None;

    loop {
        for packet in network.poll() {
            match packet {
                Packet::Connected { client_id } => {
                    info!("Connected with client id {}", client_id);
                    engine.local_id = Some(client_id);
                    network.join_lobby(&args.username);
                    if let Some(character) = &args.character {
                        network.select_character(character);
                    }
                    if let Some(stage) = &args.stage {
                        network.select_stage(stage);
                    }
                }
                Packet::LobbyUpdate { players, stage, .. } => {
                    engine.stop();
                    engine.load_roster(players, &stage);
                    results = None;
                }
                Packet::GameStart { players, stage, .. } => {
                    info!("Match starting");
                    engine.load_roster(players, &stage);
                    engine.start();
                    results = None;
                }
                Packet::GameUpdate { players, .. } => {
                    engine.apply_snapshot(players);
                }
                Packet::InputRelay { player_id, input } => {
                    engine.note_remote_input(player_id, input);
                }
                Packet::GameEnd { results: standings } => {
                    engine.stop();
                    results = Some(standings);
                }
                Packet::Disconnected { reason } => {
                    info!("Disconnected by server: {}", reason);
                    disconnected = Some(reason);
                }
                _ => {}
            }
        }

        if engine.running {
            if let Some(input) = capture.update() {
                network.send_input(input.clone());
                engine.predict(&input);
            }
        }

        let banner = if let Some(reason) = &disconnected {
            Some(format!("Disconnected: {}", reason))
        } else if let Some(standings) = &results {
            Some(results_banner(standings))
        } else if !engine.running {
            match engine.players.len() {
                0 => Some("Joining lobby...".to_string()),
                1 => Some("Waiting for players...".to_string()),
                _ => Some("Get ready...".to_string()),
            }
        } else {
            None
        };

        renderer.render(
            &engine.stage,
            &engine.render_players(),
            engine.local_id,
            banner.as_deref(),
        );

        if is_key_pressed(KeyCode::Escape) {
            network.disconnect();
            break;
        }

        next_frame().await;
    }
}
