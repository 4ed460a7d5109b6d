//! Nonblocking UDP adapter, polled once per frame.
//!
//! The frame loop owns all game state, so the socket never blocks: `poll`
//! drains whatever arrived since the previous frame and hands it back as
//! decoded packets. Send failures degrade to logged no-ops; the server's
//! timeout sweep handles the rest.

use bincode::{deserialize, serialize};
use log::{error, warn};
use shared::{InputState, Packet};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

pub struct NetworkClient {
    socket: UdpSocket,
    server_addr: SocketAddr,
    pub client_id: Option<u32>,
}

impl NetworkClient {
    /// Binds an ephemeral local port and sends the connection handshake.
    pub fn connect(server: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        let server_addr = server.parse()?;

        let client = Self {
            socket,
            server_addr,
            client_id: None,
        };
        client.send(&Packet::Connect { client_version: 1 })?;
        Ok(client)
    }

    pub fn send(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr)?;
        Ok(())
    }

    fn send_or_log(&self, packet: &Packet) {
        if let Err(e) = self.send(packet) {
            error!("Failed to send packet: {}", e);
        }
    }

    pub fn join_lobby(&self, username: &str) {
        self.send_or_log(&Packet::JoinLobby {
            username: username.to_string(),
        });
    }

    pub fn select_character(&self, character: &str) {
        self.send_or_log(&Packet::SelectCharacter {
            character: character.to_string(),
        });
    }

    pub fn select_stage(&self, stage: &str) {
        self.send_or_log(&Packet::SelectStage {
            stage: stage.to_string(),
        });
    }

    pub fn send_input(&self, input: InputState) {
        self.send_or_log(&Packet::PlayerInput { input });
    }

    pub fn disconnect(&self) {
        self.send_or_log(&Packet::Disconnect);
    }

    /// Drains every packet that arrived since the previous frame. Notes the
    /// assigned client id on the way through so callers can read it off the
    /// adapter.
    pub fn poll(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        let mut buffer = [0u8; 2048];

        loop {
            match self.socket.recv_from(&mut buffer) {
                Ok((len, _)) => match deserialize::<Packet>(&buffer[0..len]) {
                    Ok(packet) => {
                        if let Packet::Connected { client_id } = &packet {
                            self.client_id = Some(*client_id);
                        }
                        packets.push(packet);
                    }
                    Err(_) => warn!("Dropping malformed packet"),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!("Socket receive failed: {}", e);
                    break;
                }
            }
        }

        packets
    }
}
