// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the synergy bounded context
//! Published on the event bus for observability and host integration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::link::LinkId;
use super::network::NetworkId;
use super::node::NodeId;

/// Synergy domain events
///
/// Emergence and autogenesis notifications are the contract with the
/// hosting runtime; the remaining variants exist for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SynergyEvent {
    /// A network was registered with the orchestrator
    NetworkCreated {
        network_id: NetworkId,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// A node was added through the orchestrator surface
    NodeAdded {
        network_id: NetworkId,
        node_id: NodeId,
        node_type: String,
        timestamp: DateTime<Utc>,
    },

    /// A link was added through the orchestrator surface
    LinkAdded {
        network_id: NetworkId,
        link_id: LinkId,
        source_node_id: NodeId,
        target_node_id: NodeId,
        link_type: String,
        timestamp: DateTime<Utc>,
    },

    /// A network's synergy score crossed its emergence threshold
    EmergenceDetected {
        network_id: NetworkId,
        network_name: String,
        synergy_score: f64,
        capabilities: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// An autogenesis cycle generated candidate components
    ///
    /// Raised whenever generation produced anything, accepted or not;
    /// `accepted` records the fitness-gate outcome.
    AutogenesisTriggered {
        network_id: NetworkId,
        network_name: String,
        generated_node_ids: Vec<NodeId>,
        generated_link_ids: Vec<LinkId>,
        accepted: bool,
        fitness_score: f64,
        trigger_snapshot: serde_json::Value,
        timestamp: DateTime<Utc>,
    },

    /// Weak links were pruned during network optimization
    LinksPruned {
        network_id: NetworkId,
        pruned_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// One pass of the background evaluation loop finished
    EvaluationCycleCompleted {
        networks_evaluated: usize,
        overall_synergy_score: f64,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl SynergyEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SynergyEvent::NetworkCreated { timestamp, .. } => *timestamp,
            SynergyEvent::NodeAdded { timestamp, .. } => *timestamp,
            SynergyEvent::LinkAdded { timestamp, .. } => *timestamp,
            SynergyEvent::EmergenceDetected { timestamp, .. } => *timestamp,
            SynergyEvent::AutogenesisTriggered { timestamp, .. } => *timestamp,
            SynergyEvent::LinksPruned { timestamp, .. } => *timestamp,
            SynergyEvent::EvaluationCycleCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            SynergyEvent::NetworkCreated { .. } => "network_created",
            SynergyEvent::NodeAdded { .. } => "node_added",
            SynergyEvent::LinkAdded { .. } => "link_added",
            SynergyEvent::EmergenceDetected { .. } => "emergence_detected",
            SynergyEvent::AutogenesisTriggered { .. } => "autogenesis_triggered",
            SynergyEvent::LinksPruned { .. } => "links_pruned",
            SynergyEvent::EvaluationCycleCompleted { .. } => "evaluation_cycle_completed",
        }
    }
}
