//! Server network layer handling UDP communications and room tick coordination

use crate::connections::ConnectionTable;
use crate::room::{Room, RoomConfig};
use crate::room_manager::RoomManager;
use crate::simulation::{self, StepEvent};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Ticks longer than this are capped to keep the integration stable after a
/// stall.
const MAX_DELTA: f32 = 1.0 / 20.0;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ConnectionTimeout {
        client_id: u32,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum OutboundMessage {
    Send {
        packet: Packet,
        addr: SocketAddr,
    },
    /// One packet fanned out to a resolved set of addresses (a room).
    SendMany {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

/// Server-wide tunables, filled from the command line.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub max_clients: usize,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_clients: 64,
            room: RoomConfig::default(),
        }
    }
}

/// Main server coordinating the transport and every room's simulation.
///
/// All mutable state (rooms, rosters) is owned by the select loop in `run`,
/// so packet handling and room ticks never interleave. The connection table
/// is shared with the timeout checker behind a lock; nothing else is.
pub struct Server {
    socket: Arc<UdpSocket>,
    connections: Arc<RwLock<ConnectionTable>>,
    rooms: RoomManager,
    tick_duration: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        config: ServerConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            connections: Arc::new(RwLock::new(ConnectionTable::new(config.max_clients))),
            rooms: RoomManager::new(config.room),
            tick_duration: Duration::from_secs_f32(1.0 / config.tick_rate as f32),
            server_tx,
            server_rx,
            out_tx,
            out_rx,
        })
    }

    /// Spawns the task that continuously listens for incoming packets.
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if server_tx
                                .send(ServerMessage::PacketReceived { packet, addr })
                                .is_err()
                            {
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outgoing packet queue.
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut out_rx = std::mem::replace(&mut self.out_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                match message {
                    OutboundMessage::Send { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    OutboundMessage::SendMany { packet, addrs } => {
                        for addr in addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send packet to {}: {}", addr, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns the task that sweeps silent connections.
    fn spawn_timeout_checker(&self) {
        let connections = Arc::clone(&self.connections);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut sweep = interval(Duration::from_secs(1));

            loop {
                sweep.tick().await;

                let timed_out = {
                    let mut table = connections.write().await;
                    table.check_timeouts()
                };

                for client_id in timed_out {
                    if server_tx
                        .send(ServerMessage::ConnectionTimeout { client_id })
                        .is_err()
                    {
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn queue_send(&self, packet: Packet, addr: SocketAddr) {
        if self.out_tx.send(OutboundMessage::Send { packet, addr }).is_err() {
            error!("Failed to queue packet for sending");
        }
    }

    /// Fans one packet out to every member of a room, optionally excluding
    /// the sender.
    async fn broadcast_room(&self, room_id: u32, packet: Packet, exclude: Option<u32>) {
        let Some(room) = self.rooms.room(room_id) else {
            return;
        };
        let ids: Vec<u32> = room
            .players
            .keys()
            .copied()
            .filter(|id| Some(*id) != exclude)
            .collect();

        let addrs: Vec<SocketAddr> = {
            let table = self.connections.read().await;
            ids.iter().filter_map(|id| table.addr_of(*id)).collect()
        };
        if addrs.is_empty() {
            return;
        }

        if self.out_tx.send(OutboundMessage::SendMany { packet, addrs }).is_err() {
            error!("Failed to queue broadcast");
        }
    }

    fn lobby_packet(room: &Room) -> Packet {
        Packet::LobbyUpdate {
            room_id: room.id,
            players: room.players.values().cloned().collect(),
            stage: room.stage.clone(),
            stock_count: room.config.stock_count,
            time_limit: room.config.time_limit,
        }
    }

    fn start_packet(room: &Room) -> Packet {
        Packet::GameStart {
            room_id: room.id,
            players: room.players.values().cloned().collect(),
            stage: room.stage.clone(),
            stock_count: room.config.stock_count,
            time_limit: room.config.time_limit,
        }
    }

    /// Resolves the connection behind an address and refreshes its activity
    /// clock.
    async fn conn_for(&self, addr: SocketAddr) -> Option<u32> {
        let mut table = self.connections.write().await;
        let id = table.id_for(addr);
        if let Some(id) = id {
            table.touch(id);
        }
        id
    }

    /// Processes one incoming packet. Out-of-context messages are dropped
    /// without touching any state.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!("Connection request from {} (version {})", addr, client_version);

                // A reconnect from the same address replaces the old session.
                let existing = {
                    let table = self.connections.read().await;
                    table.id_for(addr)
                };
                if let Some(existing_id) = existing {
                    {
                        let mut table = self.connections.write().await;
                        table.remove(existing_id);
                    }
                    self.handle_leave(existing_id).await;
                }

                let assigned = {
                    let mut table = self.connections.write().await;
                    table.add(addr)
                };
                match assigned {
                    Some(client_id) => {
                        self.queue_send(Packet::Connected { client_id }, addr);
                    }
                    None => {
                        self.queue_send(
                            Packet::Disconnected {
                                reason: "Server full".to_string(),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::JoinLobby { username } => {
                let Some(conn_id) = self.conn_for(addr).await else {
                    warn!("join_lobby from unknown address {}", addr);
                    return;
                };
                let room_id = self.rooms.join_lobby(conn_id, &username);
                if let Some(room) = self.rooms.room(room_id) {
                    let packet = Self::lobby_packet(room);
                    self.broadcast_room(room_id, packet, None).await;
                }
            }

            Packet::SelectCharacter { character } => {
                let Some(conn_id) = self.conn_for(addr).await else {
                    return;
                };
                if let Some(room_id) = self.rooms.select_character(conn_id, &character) {
                    if let Some(room) = self.rooms.room(room_id) {
                        let packet = Self::lobby_packet(room);
                        self.broadcast_room(room_id, packet, None).await;
                    }
                }
            }

            Packet::SelectStage { stage } => {
                let Some(conn_id) = self.conn_for(addr).await else {
                    return;
                };
                if let Some(room_id) = self.rooms.select_stage(conn_id, &stage) {
                    if let Some(room) = self.rooms.room(room_id) {
                        let packet = Self::lobby_packet(room);
                        self.broadcast_room(room_id, packet, None).await;
                    }
                }
            }

            Packet::PlayerInput { input } => {
                let Some(conn_id) = self.conn_for(addr).await else {
                    return;
                };
                let relayed = input.clone();
                if let Some(room_id) = self.rooms.submit_input(conn_id, input) {
                    // Peer visibility: the rest of the room sees the raw input.
                    self.broadcast_room(
                        room_id,
                        Packet::InputRelay {
                            player_id: conn_id,
                            input: relayed,
                        },
                        Some(conn_id),
                    )
                    .await;
                }
            }

            Packet::Disconnect => {
                let Some(conn_id) = self.conn_for(addr).await else {
                    return;
                };
                {
                    let mut table = self.connections.write().await;
                    table.remove(conn_id);
                }
                self.handle_leave(conn_id).await;
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Runs the leave path for a connection that is gone: roster removal,
    /// roster rebroadcast, and a forced match end when only one player stays
    /// behind.
    async fn handle_leave(&mut self, conn_id: u32) {
        let Some(outcome) = self.rooms.leave(conn_id) else {
            return;
        };
        if outcome.room_deleted {
            return;
        }

        if let Some(room) = self.rooms.room(outcome.room_id) {
            let packet = Self::lobby_packet(room);
            self.broadcast_room(outcome.room_id, packet, None).await;
        }
        if let Some(results) = outcome.results {
            self.broadcast_room(outcome.room_id, Packet::GameEnd { results }, None)
                .await;
        }
    }

    /// Advances every room by one tick and broadcasts whatever the steps
    /// produced.
    async fn tick(&mut self, dt: f32) {
        for room_id in self.rooms.room_ids() {
            let events = match self.rooms.room_mut(room_id) {
                Some(room) => simulation::step(room, dt),
                None => continue,
            };

            for event in events {
                match event {
                    StepEvent::Started => {
                        if let Some(room) = self.rooms.room(room_id) {
                            let packet = Self::start_packet(room);
                            self.broadcast_room(room_id, packet, None).await;
                        }
                    }
                    StepEvent::Snapshot => {
                        if let Some(room) = self.rooms.room(room_id) {
                            let packet = Packet::GameUpdate {
                                players: room.players.values().cloned().collect(),
                                timestamp: now_millis(),
                            };
                            self.broadcast_room(room_id, packet, None).await;
                        }
                    }
                    StepEvent::Ended(results) => {
                        self.broadcast_room(room_id, Packet::GameEnd { results }, None)
                            .await;
                    }
                    StepEvent::BackToLobby => {
                        if let Some(room) = self.rooms.room(room_id) {
                            let packet = Self::lobby_packet(room);
                            self.broadcast_room(room_id, packet, None).await;
                        }
                    }
                    StepEvent::Destroy => {
                        self.rooms.remove_room(room_id);
                        info!("Room {} destroyed after cooldown", room_id);
                    }
                }
            }
        }
    }

    /// Main loop: packet dispatch and the shared room tick, interleaved on
    /// one task so room state is never contended.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        }
                        Some(ServerMessage::ConnectionTimeout { client_id }) => {
                            debug!("Connection {} timed out", client_id);
                            self.handle_leave(client_id).await;
                        }
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let mut dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;
                    if dt > MAX_DELTA {
                        debug!("Capping large tick delta ({:.3}s)", dt);
                        dt = MAX_DELTA;
                    }

                    self.tick(dt).await;
                },
            }
        }

        Ok(())
    }
}

fn now_millis() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis();
    millis.min(u64::MAX as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_server_message_carries_packet() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);
        let msg = ServerMessage::PacketReceived {
            packet: Packet::Connect { client_version: 1 },
            addr,
        };

        match msg {
            ServerMessage::PacketReceived { packet, addr: a } => {
                assert_eq!(a, addr);
                assert!(matches!(packet, Packet::Connect { client_version: 1 }));
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_outbound_fanout_message() {
        let addrs: Vec<SocketAddr> = vec![
            "127.0.0.1:9001".parse().unwrap(),
            "127.0.0.1:9002".parse().unwrap(),
        ];
        let msg = OutboundMessage::SendMany {
            packet: Packet::Disconnect,
            addrs: addrs.clone(),
        };

        match msg {
            OutboundMessage::SendMany { addrs: a, .. } => assert_eq!(a, addrs),
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
        tx.send(ServerMessage::ConnectionTimeout { client_id: 7 })
            .unwrap();

        match rx.try_recv().unwrap() {
            ServerMessage::ConnectionTimeout { client_id } => assert_eq!(client_id, 7),
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_lobby_packet_contents() {
        let mut room = Room::new(9, RoomConfig::default());
        room.add_player(1, "ada");
        room.add_player(2, "bo");
        room.stage = "castle".to_string();

        match Server::lobby_packet(&room) {
            Packet::LobbyUpdate {
                room_id,
                players,
                stage,
                stock_count,
                time_limit,
            } => {
                assert_eq!(room_id, 9);
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].username, "ada");
                assert_eq!(stage, "castle");
                assert_eq!(stock_count, 3);
                assert_eq!(time_limit, 180);
            }
            _ => panic!("Wrong packet type"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert!(config.max_clients >= config.room.max_players);
    }

    #[test]
    fn test_tick_duration_from_rate() {
        let config = ServerConfig::default();
        let duration = Duration::from_secs_f32(1.0 / config.tick_rate as f32);
        assert!(duration.as_millis() >= 16 && duration.as_millis() <= 17);
    }
}
