//! Headless test client: joins a lobby and mashes buttons.
//!
//! Useful for smoke-testing a live server or filling a room during
//! development. Run a couple of these against a local server and watch the
//! match play itself.

use bincode::{deserialize, serialize};
use rand::Rng;
use shared::{InputState, Packet};
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::time::interval;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string())
        .parse::<SocketAddr>()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Bot socket bound to {}", socket.local_addr()?);

    socket
        .send_to(&serialize(&Packet::Connect { client_version: 1 })?, server_addr)
        .await?;

    let mut buf = [0u8; 2048];
    let (len, _) = socket.recv_from(&mut buf).await?;
    let client_id = match deserialize::<Packet>(&buf[0..len])? {
        Packet::Connected { client_id } => client_id,
        other => {
            println!("Expected Connected but got: {:?}", other);
            return Ok(());
        }
    };
    println!("Connected with client id {}", client_id);

    let username = format!("bot-{}", client_id);
    socket
        .send_to(&serialize(&Packet::JoinLobby { username })?, server_addr)
        .await?;

    let mut rng = rand::thread_rng();
    let mut sequence: u32 = 0;
    let mut send_interval = interval(Duration::from_millis(16));

    // Hold each random control state for a short while so the bot actually
    // runs and jumps instead of vibrating.
    let mut held = InputState::idle();
    let mut hold_ticks: u32 = 0;

    // Play for about a minute, then disconnect.
    for _ in 0..(60 * 60) {
        send_interval.tick().await;

        if hold_ticks == 0 {
            held = InputState {
                left: rng.gen_bool(0.4),
                right: rng.gen_bool(0.4),
                jump: rng.gen_bool(0.2),
                light: rng.gen_bool(0.15),
                heavy: rng.gen_bool(0.05),
                ..InputState::idle()
            };
            hold_ticks = rng.gen_range(5..30);
        }
        hold_ticks -= 1;

        sequence += 1;
        let input = InputState {
            sequence,
            timestamp: now_millis(),
            ..held.clone()
        };
        socket
            .send_to(&serialize(&Packet::PlayerInput { input })?, server_addr)
            .await?;

        // Drain whatever the server sent without blocking the cadence.
        loop {
            match socket.try_recv_from(&mut buf) {
                Ok((len, _)) => match deserialize::<Packet>(&buf[0..len]) {
                    Ok(Packet::GameStart { room_id, .. }) => {
                        println!("Match started in room {}", room_id);
                    }
                    Ok(Packet::GameEnd { results }) => {
                        println!("Match over:");
                        for (place, result) in results.iter().enumerate() {
                            println!(
                                "  {}. {} ({} stocks, {:.0}% damage)",
                                place + 1,
                                result.username,
                                result.stocks,
                                result.damage
                            );
                        }
                    }
                    _ => {}
                },
                Err(_) => break,
            }
        }
    }

    socket
        .send_to(&serialize(&Packet::Disconnect)?, server_addr)
        .await?;
    println!("Bot finished");
    Ok(())
}
