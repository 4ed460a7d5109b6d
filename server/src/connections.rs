//! Connection lifecycle management for the relay server
//!
//! This module tracks every live transport connection, including:
//! - Transport id assignment (stable for the connection's lifetime)
//! - Address lookup in both directions for packet routing
//! - Connection health monitoring and automatic timeout cleanup
//! - Server capacity enforcement
//!
//! Room membership and input state live on the room's players, not here; a
//! connection entry is purely the wire-level identity of a participant.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Connections that stay silent this long are treated as gone.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// One live transport connection.
#[derive(Debug)]
pub struct Connection {
    /// Unique id assigned by the server; doubles as the player id.
    pub id: u32,
    /// Network address for sending responses.
    pub addr: SocketAddr,
    /// Last time any packet arrived from this address.
    pub last_seen: Instant,
}

impl Connection {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// True when no packet has arrived within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Tracks all live connections with lookup by id and by address.
///
/// Ids are handed out monotonically starting from 1, which is what lets the
/// room roster treat id order as join order.
pub struct ConnectionTable {
    by_id: HashMap<u32, Connection>,
    by_addr: HashMap<SocketAddr, u32>,
    next_id: u32,
    max_connections: usize,
}

impl ConnectionTable {
    pub fn new(max_connections: usize) -> Self {
        Self {
            by_id: HashMap::new(),
            by_addr: HashMap::new(),
            next_id: 1,
            max_connections,
        }
    }

    /// Registers a new connection, returning its assigned id, or `None` when
    /// the server is at capacity.
    pub fn add(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.by_id.len() >= self.max_connections {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;

        info!("Connection {} established from {}", id, addr);
        self.by_addr.insert(addr, id);
        self.by_id.insert(id, Connection::new(id, addr));
        Some(id)
    }

    /// Drops a connection and both of its index entries. Returns true if it
    /// was still present.
    pub fn remove(&mut self, id: u32) -> bool {
        if let Some(connection) = self.by_id.remove(&id) {
            self.by_addr.remove(&connection.addr);
            info!("Connection {} closed", id);
            true
        } else {
            false
        }
    }

    /// Resolves the connection id behind an address, if any.
    pub fn id_for(&self, addr: SocketAddr) -> Option<u32> {
        self.by_addr.get(&addr).copied()
    }

    /// Resolves the send address of a connection id, if it is still live.
    pub fn addr_of(&self, id: u32) -> Option<SocketAddr> {
        self.by_id.get(&id).map(|c| c.addr)
    }

    /// Marks a connection as recently active.
    pub fn touch(&mut self, id: u32) {
        if let Some(connection) = self.by_id.get_mut(&id) {
            connection.last_seen = Instant::now();
        }
    }

    /// Removes every connection that exceeded the silence threshold and
    /// returns their ids so the caller can run the leave path for each.
    pub fn check_timeouts(&mut self) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .by_id
            .values()
            .filter(|c| c.is_timed_out(CONNECTION_TIMEOUT))
            .map(|c| c.id)
            .collect();

        for id in &timed_out {
            self.remove(*id);
        }
        timed_out
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_connection_creation() {
        let connection = Connection::new(1, test_addr());
        assert_eq!(connection.id, 1);
        assert_eq!(connection.addr, test_addr());
        assert!(!connection.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_connection_timeout() {
        let mut connection = Connection::new(1, test_addr());
        connection.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(connection.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut table = ConnectionTable::new(8);
        let first = table.add(test_addr()).unwrap();
        let second = table.add(test_addr2()).unwrap();
        assert!(second > first);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_capacity_limit() {
        let mut table = ConnectionTable::new(1);
        assert!(table.add(test_addr()).is_some());
        assert!(table.add(test_addr2()).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookup_both_ways() {
        let mut table = ConnectionTable::new(4);
        let id = table.add(test_addr()).unwrap();

        assert_eq!(table.id_for(test_addr()), Some(id));
        assert_eq!(table.addr_of(id), Some(test_addr()));
        assert_eq!(table.id_for(test_addr2()), None);
        assert_eq!(table.addr_of(99), None);
    }

    #[test]
    fn test_remove_clears_both_indexes() {
        let mut table = ConnectionTable::new(4);
        let id = table.add(test_addr()).unwrap();

        assert!(table.remove(id));
        assert!(!table.remove(id));
        assert_eq!(table.id_for(test_addr()), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_timeout_sweep() {
        let mut table = ConnectionTable::new(4);
        let stale = table.add(test_addr()).unwrap();
        let fresh = table.add(test_addr2()).unwrap();

        if let Some(connection) = table.by_id.get_mut(&stale) {
            connection.last_seen = Instant::now() - Duration::from_secs(10);
        }

        let removed = table.check_timeouts();
        assert_eq!(removed, vec![stale]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.addr_of(fresh), Some(test_addr2()));
    }

    #[test]
    fn test_touch_resets_the_clock() {
        let mut table = ConnectionTable::new(4);
        let id = table.add(test_addr()).unwrap();
        if let Some(connection) = table.by_id.get_mut(&id) {
            connection.last_seen = Instant::now() - Duration::from_secs(10);
        }

        table.touch(id);
        assert!(table.check_timeouts().is_empty());
    }
}
