//! Integration tests for the platform-fighter netcode
//!
//! These tests validate cross-crate interactions: the wire protocol, the
//! shared rule engine driving both the server simulation and the client
//! prediction, and whole-match lifecycles.

use bincode::{deserialize, serialize};
use shared::{InputState, Packet, Player, Vec2, NOMINAL_DT};
use std::net::UdpSocket;
use std::thread;
use std::time::Duration;
use tokio::time::sleep;

/// NETWORK PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    /// Packet round-trips through the wire codec without losing meaning.
    #[tokio::test]
    async fn packet_serialization_roundtrip() {
        let test_packets = vec![
            Packet::Connect { client_version: 1 },
            Packet::JoinLobby {
                username: "ada".to_string(),
            },
            Packet::SelectCharacter {
                character: "ninja".to_string(),
            },
            Packet::PlayerInput {
                input: InputState {
                    sequence: 42,
                    timestamp: 123_456_789,
                    left: true,
                    right: false,
                    jump: true,
                    light: true,
                    heavy: false,
                },
            },
            Packet::Connected { client_id: 42 },
            Packet::Disconnected {
                reason: "Test".to_string(),
            },
        ];

        for packet in test_packets {
            let bytes = serialize(&packet).unwrap();
            let decoded: Packet = deserialize(&bytes).unwrap();

            match (&packet, &decoded) {
                (Packet::Connect { .. }, Packet::Connect { .. }) => {}
                (Packet::JoinLobby { .. }, Packet::JoinLobby { .. }) => {}
                (Packet::SelectCharacter { .. }, Packet::SelectCharacter { .. }) => {}
                (Packet::PlayerInput { .. }, Packet::PlayerInput { .. }) => {}
                (Packet::Connected { .. }, Packet::Connected { .. }) => {}
                (Packet::Disconnected { .. }, Packet::Disconnected { .. }) => {}
                _ => panic!("Packet type mismatch after serialization"),
            }
        }
    }

    /// A full snapshot survives a real UDP hop.
    #[tokio::test]
    async fn snapshot_over_udp_socket() {
        let server_socket = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind server socket");
        let server_addr = server_socket.local_addr().unwrap();

        // Echo server
        let server_socket_clone = server_socket.try_clone().unwrap();
        thread::spawn(move || {
            let mut buf = [0; 2048];
            if let Ok((size, client_addr)) = server_socket_clone.recv_from(&mut buf) {
                let _ = server_socket_clone.send_to(&buf[..size], client_addr);
            }
        });

        sleep(Duration::from_millis(10)).await;

        let client_socket = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind client socket");
        client_socket
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();

        let mut player = Player::new(1, "ada", 3, Vec2::new(640.0, 100.0));
        player.damage = 12.5;
        let packet = Packet::GameUpdate {
            players: vec![player.clone()],
            timestamp: 1_700_000_000_000,
        };

        let bytes = serialize(&packet).unwrap();
        client_socket.send_to(&bytes, server_addr).unwrap();

        let mut buf = [0; 2048];
        let (size, _) = client_socket.recv_from(&mut buf).unwrap();
        match deserialize::<Packet>(&buf[..size]).unwrap() {
            Packet::GameUpdate { players, timestamp } => {
                assert_eq!(timestamp, 1_700_000_000_000);
                assert_eq!(players[0], player);
            }
            _ => panic!("Wrong packet type received"),
        }
    }
}

/// SHARED RULE ENGINE TESTS
mod rule_engine_tests {
    use super::*;
    use shared::{advance, resolve_attack, stage_or_default, AttackKind, DEFAULT_STAGE};

    /// The documented light-attack scenario: A at x=100 facing right, B at
    /// x=140, one light hit.
    #[test]
    fn light_attack_scenario() {
        let mut attacker = Player::new(1, "a", 3, Vec2::new(100.0, 460.0));
        attacker.direction = 1.0;
        attacker.attack = Some(AttackKind::Light);
        attacker.attack_timer = AttackKind::Light.duration();
        let defender = Player::new(2, "b", 3, Vec2::new(140.0, 460.0));

        let hit = resolve_attack(&attacker, &defender);
        assert_eq!(hit.damage, 5.0);
        let multiplier = 1.0 + hit.damage / 100.0;
        assert!((hit.velocity.x - 200.0 * multiplier).abs() < 1e-3);
        assert!((hit.velocity.y - -300.0 * multiplier).abs() < 1e-3);
        assert!(hit.is_jumping);
    }

    /// Identical inputs through the engine on "both sides" agree bit for bit.
    #[test]
    fn client_and_server_simulations_agree() {
        let stage = stage_or_default(DEFAULT_STAGE);
        let start = Player::new(1, "ada", 3, Vec2::new(300.0, 460.0));

        let inputs: Vec<InputState> = (1..=60)
            .map(|seq| InputState {
                sequence: seq,
                right: seq % 3 != 0,
                jump: seq % 10 == 0,
                light: seq % 7 == 0,
                ..InputState::default()
            })
            .collect();

        let run = |mut player: Player| {
            for input in &inputs {
                player = advance(&player, input, NOMINAL_DT, &stage.platforms, &stage.bounds);
            }
            player
        };

        assert_eq!(run(start.clone()), run(start));
    }
}

/// MATCH LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;
    use server::room::{RoomConfig, RoomPhase};
    use server::room_manager::RoomManager;
    use server::simulation::{step, StepEvent};

    fn seated_manager() -> (RoomManager, u32) {
        let mut rooms = RoomManager::new(RoomConfig::default());
        let room_id = rooms.join_lobby(1, "ada");
        rooms.join_lobby(2, "bo");
        (rooms, room_id)
    }

    /// Two joins arm the countdown and the countdown starts the match.
    #[test]
    fn lobby_to_active_transition() {
        let (mut rooms, room_id) = seated_manager();
        assert_eq!(rooms.room(room_id).unwrap().phase, RoomPhase::Countdown);

        let events = step(rooms.room_mut(room_id).unwrap(), 3.0);
        assert_eq!(events, vec![StepEvent::Started]);
        assert_eq!(rooms.room(room_id).unwrap().phase, RoomPhase::Active);
    }

    /// A room with stockCount=3 ends when one player runs out, well before
    /// the time limit.
    #[test]
    fn stock_exhaustion_terminates_early() {
        let (mut rooms, room_id) = seated_manager();
        step(rooms.room_mut(room_id).unwrap(), 3.0);

        // Burn all of player 2's stocks by repeatedly dropping them past the
        // kill line.
        let mut ended = None;
        for _ in 0..10_000 {
            {
                let room = rooms.room_mut(room_id).unwrap();
                let player = room.players.get_mut(&2).unwrap();
                if !player.is_out() {
                    player.position.y = 795.0;
                    player.velocity.y = 1000.0;
                    player.is_jumping = true;
                }
            }
            let events = step(rooms.room_mut(room_id).unwrap(), NOMINAL_DT);
            if let Some(StepEvent::Ended(results)) = events
                .into_iter()
                .find(|e| matches!(e, StepEvent::Ended(_)))
            {
                ended = Some(results);
                break;
            }
        }

        let results = ended.expect("match should end on stock exhaustion");
        let room = rooms.room(room_id).unwrap();
        assert!(room.elapsed < room.config.time_limit as f32);
        assert_eq!(results[0].id, 1);
        assert_eq!(results[1].id, 2);
        assert_eq!(results[1].stocks, 0);
    }

    /// After 180 simulated seconds with no eliminations the room ends on
    /// time.
    #[test]
    fn time_limit_terminates_the_match() {
        let (mut rooms, room_id) = seated_manager();
        step(rooms.room_mut(room_id).unwrap(), 3.0);

        let mut saw_end = false;
        for _ in 0..181 {
            let events = step(rooms.room_mut(room_id).unwrap(), 1.0);
            if events.iter().any(|e| matches!(e, StepEvent::Ended(_))) {
                saw_end = true;
                break;
            }
        }
        assert!(saw_end);
        assert_eq!(rooms.room(room_id).unwrap().phase, RoomPhase::Ended);
    }

    /// Disconnecting mid-match hands the win to the last player standing.
    #[test]
    fn disconnect_forces_last_player_standing() {
        let (mut rooms, room_id) = seated_manager();
        step(rooms.room_mut(room_id).unwrap(), 3.0);

        let outcome = rooms.leave(2).unwrap();
        let results = outcome.results.expect("active room must force an end");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
        assert_eq!(rooms.room(room_id).unwrap().phase, RoomPhase::Ended);

        // The survivor leaving deletes the room entirely.
        let outcome = rooms.leave(1).unwrap();
        assert!(outcome.room_deleted);
        assert!(rooms.is_empty());
    }
}

/// PREDICTION / RECONCILIATION TESTS
mod reconciliation_tests {
    use super::*;
    use client::engine::ClientEngine;
    use server::room::{RoomConfig, RoomPhase};
    use server::room_manager::RoomManager;
    use server::simulation::step;

    /// The client's replayed state matches the server exactly when both
    /// consume the same inputs at the nominal step.
    #[test]
    fn prediction_converges_on_authoritative_state() {
        // Server side: one room, match live.
        let mut rooms = RoomManager::new(RoomConfig::default());
        let room_id = rooms.join_lobby(1, "ada");
        rooms.join_lobby(2, "bo");
        step(rooms.room_mut(room_id).unwrap(), 3.0);
        assert_eq!(rooms.room(room_id).unwrap().phase, RoomPhase::Active);

        // Client side: mirrors the starting roster.
        let mut engine = ClientEngine::new();
        engine.local_id = Some(1);
        let roster: Vec<Player> = rooms
            .room(room_id)
            .unwrap()
            .players
            .values()
            .cloned()
            .collect();
        engine.load_roster(roster, "battlefield");
        engine.start();

        // Run thirty frames of identical traffic on both sides.
        for seq in 1..=30u32 {
            let input = InputState {
                sequence: seq,
                right: true,
                jump: seq == 5,
                ..InputState::default()
            };
            engine.predict(&input);
            rooms.submit_input(1, input);
            step(rooms.room_mut(room_id).unwrap(), NOMINAL_DT);
        }

        // Deliver the authoritative snapshot; everything is acked, so the
        // replay queue empties and the local player sits exactly on the
        // server state.
        let snapshot: Vec<Player> = rooms
            .room(room_id)
            .unwrap()
            .players
            .values()
            .cloned()
            .collect();
        engine.apply_snapshot(snapshot.clone());

        let server_local = snapshot.iter().find(|p| p.id == 1).unwrap();
        let client_local = engine.local_player().unwrap();
        assert_eq!(client_local.position, server_local.position);
        assert_eq!(client_local.stocks, server_local.stocks);
        assert_eq!(client_local.damage, server_local.damage);
    }

    /// Replaying one pending queue from one base is idempotent.
    #[test]
    fn reconciliation_replay_is_idempotent() {
        let build = || {
            let mut engine = ClientEngine::new();
            engine.local_id = Some(1);
            engine.load_roster(
                vec![Player::new(1, "ada", 3, Vec2::new(300.0, 460.0))],
                "battlefield",
            );
            engine.start();
            for seq in 1..=12u32 {
                engine.predict(&InputState {
                    sequence: seq,
                    left: seq > 6,
                    right: seq <= 6,
                    ..InputState::default()
                });
            }
            engine
        };

        let mut snapshot_player = Player::new(1, "ada", 3, Vec2::new(310.0, 460.0));
        snapshot_player.last_processed_input = 6;

        let mut first = build();
        let mut second = build();
        first.apply_snapshot(vec![snapshot_player.clone()]);
        second.apply_snapshot(vec![snapshot_player]);

        assert_eq!(first.players[&1], second.players[&1]);
    }
}
