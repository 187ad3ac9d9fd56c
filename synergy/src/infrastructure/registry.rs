// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory registry of synergy networks
//!
//! The registry is the shared collection both the activity path and the
//! evaluation timer walk. Lookups are lock-free; each network carries
//! its own `RwLock` so multi-field graph mutation (node/link tables plus
//! the adjacency index) is single-writer per network.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::network::{NetworkId, SynergyNetwork};

/// Shared handle to one registered network
pub type NetworkHandle = Arc<RwLock<SynergyNetwork>>;

/// Thread-safe id-keyed collection of networks
#[derive(Default)]
pub struct NetworkRegistry {
    networks: DashMap<NetworkId, NetworkHandle>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self {
            networks: DashMap::new(),
        }
    }

    /// Register a network and return its shared handle
    pub fn insert(&self, network: SynergyNetwork) -> NetworkHandle {
        let id = network.id;
        let handle = Arc::new(RwLock::new(network));
        self.networks.insert(id, Arc::clone(&handle));
        handle
    }

    pub fn get(&self, id: &NetworkId) -> Option<NetworkHandle> {
        self.networks.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &NetworkId) -> bool {
        self.networks.contains_key(id)
    }

    /// Snapshot of all handles, detached from the map's shard locks
    ///
    /// Callers iterate the snapshot so shard locks are never held across
    /// an await.
    pub fn snapshot(&self) -> Vec<(NetworkId, NetworkHandle)> {
        self.networks
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
