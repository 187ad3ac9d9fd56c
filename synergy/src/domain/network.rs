// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Synergy network aggregate owning node and link tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::link::{LinkId, SynergyLink};
use crate::domain::node::{CognitiveNode, NodeId};

/// Network identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub Uuid);

impl NetworkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NetworkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

pub const DEFAULT_EMERGENCE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// A mutable graph of cognitive nodes and synergy links
///
/// The network exclusively owns its nodes and links; neither outlives
/// the network or is shared across networks. Adding a link appends its
/// id to the source node's outgoing set and the target node's incoming
/// set. When an endpoint id is not present in the node table the link is
/// still stored and the adjacency update for that endpoint is skipped,
/// leaving a dangling reference the caller tolerates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyNetwork {
    pub id: NetworkId,
    pub name: String,
    pub nodes: HashMap<NodeId, CognitiveNode>,
    pub links: HashMap<LinkId, SynergyLink>,
    pub emergence_threshold: f64,
    pub learning_rate: f64,
    pub synergy_score: f64,
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SynergyNetwork {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NetworkId::new(),
            name: name.into(),
            nodes: HashMap::new(),
            links: HashMap::new(),
            emergence_threshold: DEFAULT_EMERGENCE_THRESHOLD,
            learning_rate: DEFAULT_LEARNING_RATE,
            synergy_score: 0.0,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_emergence_threshold(mut self, threshold: f64) -> Self {
        self.emergence_threshold = threshold;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Insert a node into the node table
    ///
    /// A nil-id node is ignored. Inserting an existing id replaces the
    /// stored node.
    pub fn add_node(&mut self, node: CognitiveNode) {
        if node.id.is_nil() {
            return;
        }
        self.nodes.insert(node.id, node);
        self.updated_at = Utc::now();
    }

    /// Insert a link and index it on both endpoint nodes
    ///
    /// A nil-id link is ignored. The adjacency update is skipped for any
    /// endpoint missing from the node table; the link itself is stored
    /// regardless.
    pub fn add_link(&mut self, link: SynergyLink) {
        if link.id.is_nil() {
            return;
        }
        if let Some(source) = self.nodes.get_mut(&link.source_node_id) {
            if !source.outgoing_links.contains(&link.id) {
                source.outgoing_links.push(link.id);
            }
        }
        if let Some(target) = self.nodes.get_mut(&link.target_node_id) {
            if !target.incoming_links.contains(&link.id) {
                target.incoming_links.push(link.id);
            }
        }
        self.links.insert(link.id, link);
        self.updated_at = Utc::now();
    }

    /// Remove a link and its adjacency references
    pub fn remove_link(&mut self, link_id: LinkId) -> Option<SynergyLink> {
        let link = self.links.remove(&link_id)?;
        if let Some(source) = self.nodes.get_mut(&link.source_node_id) {
            source.outgoing_links.retain(|id| *id != link_id);
        }
        if let Some(target) = self.nodes.get_mut(&link.target_node_id) {
            target.incoming_links.retain(|id| *id != link_id);
        }
        self.updated_at = Utc::now();
        Some(link)
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&CognitiveNode> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: &NodeId) -> Option<&mut CognitiveNode> {
        self.nodes.get_mut(id)
    }

    pub fn get_link(&self, id: &LinkId) -> Option<&SynergyLink> {
        self.links.get(id)
    }

    pub fn get_link_mut(&mut self, id: &LinkId) -> Option<&mut SynergyLink> {
        self.links.get_mut(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = &CognitiveNode> {
        self.nodes.values().filter(|n| n.is_active)
    }

    pub fn active_links(&self) -> impl Iterator<Item = &SynergyLink> {
        self.links.values().filter(|l| l.is_active)
    }

    /// Recompute, cache and return the network synergy score
    ///
    /// Blend of connectivity over active nodes/links, mean active-node
    /// attention and mean active-link strength. Zero when the network
    /// has no nodes or no links; the connectivity term is zero when one
    /// or fewer nodes are active.
    pub fn calculate_synergy_score(&mut self) -> f64 {
        if self.nodes.is_empty() || self.links.is_empty() {
            self.synergy_score = 0.0;
            return 0.0;
        }

        let active_node_count = self.active_nodes().count();
        let active_link_count = self.active_links().count();

        let connectivity = if active_node_count > 1 {
            active_link_count as f64 / (active_node_count as f64 * (active_node_count as f64 - 1.0))
        } else {
            0.0
        };

        let avg_attention = if active_node_count > 0 {
            self.active_nodes().map(|n| n.attention_value).sum::<f64>() / active_node_count as f64
        } else {
            0.0
        };

        let avg_link_strength = if active_link_count > 0 {
            self.active_links().map(|l| l.strength).sum::<f64>() / active_link_count as f64
        } else {
            0.0
        };

        let score = 0.4 * connectivity + 0.3 * avg_attention + 0.3 * avg_link_strength;
        self.synergy_score = score;
        self.updated_at = Utc::now();
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::link::LinkType;
    use crate::domain::node::NodeType;

    fn node_with_attention(attention: f64) -> CognitiveNode {
        CognitiveNode::new(NodeType::Concept).with_attention(attention)
    }

    #[test]
    fn test_score_zero_without_links() {
        let mut network = SynergyNetwork::new("test");
        network.add_node(node_with_attention(0.9));
        network.add_node(node_with_attention(0.9));

        assert_eq!(network.calculate_synergy_score(), 0.0);
    }

    #[test]
    fn test_score_zero_without_nodes() {
        let mut network = SynergyNetwork::new("test");
        network.add_link(SynergyLink::new(NodeId::new(), NodeId::new(), LinkType::Association));

        assert_eq!(network.calculate_synergy_score(), 0.0);
    }

    #[test]
    fn test_single_active_node_has_no_connectivity_term() {
        let mut network = SynergyNetwork::new("test");
        let node = node_with_attention(0.6);
        let node_id = node.id;
        network.add_node(node);
        network.add_link(
            SynergyLink::new(node_id, NodeId::new(), LinkType::Association).with_strength(0.8),
        );

        // 0.4 * 0 + 0.3 * 0.6 + 0.3 * 0.8
        let score = network.calculate_synergy_score();
        assert!((score - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_score_blends_connectivity_attention_and_strength() {
        let mut network = SynergyNetwork::new("test");
        let a = node_with_attention(0.8);
        let b = node_with_attention(0.9);
        let (a_id, b_id) = (a.id, b.id);
        network.add_node(a);
        network.add_node(b);
        network.add_link(
            SynergyLink::new(a_id, b_id, LinkType::Association)
                .with_strength(0.9)
                .with_bidirectional(true),
        );

        // connectivity 1/(2*1) = 0.5, avg attention 0.85, avg strength 0.9
        let score = network.calculate_synergy_score();
        assert!((score - 0.725).abs() < 1e-9);
        assert!(score >= network.emergence_threshold);
        assert_eq!(network.synergy_score, score);
    }

    #[test]
    fn test_add_link_indexes_both_endpoints() {
        let mut network = SynergyNetwork::new("test");
        let a = CognitiveNode::new(NodeType::Concept);
        let b = CognitiveNode::new(NodeType::Schema);
        let (a_id, b_id) = (a.id, b.id);
        network.add_node(a);
        network.add_node(b);

        let link = SynergyLink::new(a_id, b_id, LinkType::Execution);
        let link_id = link.id;
        network.add_link(link);

        assert_eq!(network.nodes[&a_id].outgoing_links, vec![link_id]);
        assert_eq!(network.nodes[&b_id].incoming_links, vec![link_id]);
    }

    #[test]
    fn test_add_link_with_missing_endpoint_stores_link_without_adjacency() {
        let mut network = SynergyNetwork::new("test");
        let a = CognitiveNode::new(NodeType::Concept);
        let a_id = a.id;
        network.add_node(a);

        let dangling_target = NodeId::new();
        let link = SynergyLink::new(a_id, dangling_target, LinkType::Association);
        let link_id = link.id;
        network.add_link(link);

        // Link is stored, source adjacency updated, missing target skipped
        assert!(network.links.contains_key(&link_id));
        assert_eq!(network.nodes[&a_id].outgoing_links, vec![link_id]);
        assert!(!network.nodes.contains_key(&dangling_target));
    }

    #[test]
    fn test_nil_id_arguments_are_ignored() {
        let mut network = SynergyNetwork::new("test");

        let mut node = CognitiveNode::new(NodeType::Concept);
        node.id = NodeId(Uuid::nil());
        network.add_node(node);
        assert_eq!(network.node_count(), 0);

        let mut link = SynergyLink::new(NodeId::new(), NodeId::new(), LinkType::Association);
        link.id = LinkId(Uuid::nil());
        network.add_link(link);
        assert_eq!(network.link_count(), 0);
    }

    #[test]
    fn test_duplicate_node_id_replaces() {
        let mut network = SynergyNetwork::new("test");
        let node = node_with_attention(0.2);
        let node_id = node.id;
        network.add_node(node);

        let mut replacement = node_with_attention(0.9);
        replacement.id = node_id;
        network.add_node(replacement);

        assert_eq!(network.node_count(), 1);
        assert_eq!(network.nodes[&node_id].attention_value, 0.9);
    }

    #[test]
    fn test_remove_link_cleans_adjacency() {
        let mut network = SynergyNetwork::new("test");
        let a = CognitiveNode::new(NodeType::Concept);
        let b = CognitiveNode::new(NodeType::Concept);
        let (a_id, b_id) = (a.id, b.id);
        network.add_node(a);
        network.add_node(b);

        let link = SynergyLink::new(a_id, b_id, LinkType::Association);
        let link_id = link.id;
        network.add_link(link);

        let removed = network.remove_link(link_id);
        assert!(removed.is_some());
        assert!(network.nodes[&a_id].outgoing_links.is_empty());
        assert!(network.nodes[&b_id].incoming_links.is_empty());
        assert!(network.remove_link(link_id).is_none());
    }
}
