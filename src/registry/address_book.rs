//! Address book
//!
//! The topology builder assigns addresses to nodes; the registry only reads
//! them. Anything that can answer "which IPs does node X have" will do.

use std::collections::HashMap;
use std::net::IpAddr;

/// Node addresses as assigned by the topology
pub trait AddressBook {
    /// Addresses of `node_id`, first interface first. Empty if unknown.
    fn addresses(&self, node_id: &str) -> Vec<IpAddr>;
}

/// Address book backed by a map
#[derive(Debug, Clone, Default)]
pub struct StaticAddressBook {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the addresses of a node, replacing earlier ones
    pub fn insert(&mut self, node_id: impl Into<String>, addresses: Vec<IpAddr>) {
        self.entries.insert(node_id.into(), addresses);
    }

    pub fn with(mut self, node_id: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        self.insert(node_id, addresses);
        self
    }
}

impl AddressBook for StaticAddressBook {
    fn addresses(&self, node_id: &str) -> Vec<IpAddr> {
        self.entries.get(node_id).cloned().unwrap_or_default()
    }
}
