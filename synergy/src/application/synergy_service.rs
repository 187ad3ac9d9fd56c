// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # SynergyService — Activity Processing & Emergence Detection (ADR-031)
//!
//! Application service driving per-interaction adaptation of a synergy
//! network. Every external activity runs one pass of:
//!
//! 1. **Activation** — nodes whose relevance to the activity reaches 0.5
//!    gain attention scaled by the network learning rate.
//! 2. **Propagation** — activated nodes push attention along their active
//!    outgoing links, incrementing each link's activation count.
//! 3. **Decay** — every node not activated this round loses 5% attention,
//!    floored at 0.1 so dormant capabilities stay recoverable.
//! 4. **Reinforcement** — links adjacent to activated nodes that have
//!    fired at least once are strengthened by `learning_rate * 0.01`.
//!
//! ## Emergence Heuristics
//!
//! [`SynergyService::identify_emergent_capabilities`] combines three
//! naive detectors: recurring same-type activation patterns, high-attention
//! node pairs with no direct link ("novel combinations"), and connected
//! clusters of three or more active nodes. Descriptions are human-readable
//! and unordered; the orchestrator attaches them to emergence events.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{CognitiveNode, ExternalActivity, LinkId, NodeId, SynergyNetwork};

/// Relevance required before an activity activates a node
const ACTIVATION_RELEVANCE_THRESHOLD: f64 = 0.5;

/// Multiplicative attention decay for nodes skipped by an activity
const ATTENTION_DECAY_FACTOR: f64 = 0.95;

/// Attention never decays below this floor
const ATTENTION_FLOOR: f64 = 0.1;

/// Scale applied to attention pushed across a link
const PROPAGATION_FACTOR: f64 = 0.1;

/// A recurring same-type activation group
#[derive(Debug, Clone)]
pub(crate) struct ActivationPattern {
    pub node_type_label: String,
    pub node_ids: Vec<NodeId>,
    pub strength: f64,
}

/// A connected component of active, linked nodes
#[derive(Debug, Clone)]
pub(crate) struct SynergyCluster {
    pub node_ids: Vec<NodeId>,
    pub score: f64,
}

/// Load analysis over a network's active nodes
#[derive(Debug, Clone)]
pub struct CognitiveLoadReport {
    pub overall_load: f64,
    pub node_loads: HashMap<NodeId, f64>,
    pub bottleneck_node_ids: Vec<NodeId>,
    pub underutilized_node_ids: Vec<NodeId>,
    pub recommendations: Vec<String>,
}

/// Outcome of one optimization pass
#[derive(Debug, Clone)]
pub struct NetworkOptimization {
    pub pruned_link_ids: Vec<LinkId>,
    pub rebalanced_bottlenecks: usize,
    pub boosted_underutilized: usize,
    pub strengthened_links: usize,
    pub weakened_links: usize,
}

/// SynergyService interface
#[async_trait]
pub trait SynergyService: Send + Sync {
    /// Run one adaptation pass for an inbound activity
    ///
    /// Mutates node and link state in place. The token is checked between
    /// phases; cancellation stops cleanly after the current phase.
    async fn process_activity(
        &self,
        network: &mut SynergyNetwork,
        activity: &ExternalActivity,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Describe capabilities the network appears to have developed
    ///
    /// Never fails the caller; an empty list means nothing notable.
    async fn identify_emergent_capabilities(&self, network: &SynergyNetwork) -> Vec<String>;

    /// Prune weak links, rebalance attention and adjust link strengths
    async fn optimize_network(&self, network: &mut SynergyNetwork) -> Result<NetworkOptimization>;

    /// Compute per-node and overall load over active nodes
    async fn analyze_cognitive_load(&self, network: &SynergyNetwork) -> Result<CognitiveLoadReport>;
}

/// Standard implementation of SynergyService
#[derive(Default)]
pub struct StandardSynergyService;

impl StandardSynergyService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SynergyService for StandardSynergyService {
    async fn process_activity(
        &self,
        network: &mut SynergyNetwork,
        activity: &ExternalActivity,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let learning_rate = network.learning_rate;

        // Phase 1: relevance-gated activation
        let mut activated: Vec<NodeId> = Vec::new();
        for node in network.nodes.values_mut() {
            let relevance = activity_relevance(node, activity);
            if relevance >= ACTIVATION_RELEVANCE_THRESHOLD {
                node.attention_value = (node.attention_value + relevance * learning_rate).min(1.0);
                node.activate();
                activated.push(node.id);
            }
        }
        debug!(
            network = %network.name,
            activated = activated.len(),
            correlation_id = %activity.correlation_id,
            "Activity activation complete"
        );

        if cancel.is_cancelled() {
            return Ok(());
        }

        // Phase 2: propagation along active outgoing links
        for node_id in &activated {
            let (outgoing, source_attention) = match network.get_node(node_id) {
                Some(node) => (node.outgoing_links.clone(), node.attention_value),
                None => continue,
            };
            for link_id in outgoing {
                let (strength, target_id) = match network.get_link_mut(&link_id) {
                    Some(link) if link.is_active => {
                        link.activate();
                        (link.strength, link.target_node_id)
                    }
                    _ => continue,
                };
                if let Some(target) = network.get_node_mut(&target_id) {
                    target.attention_value = (target.attention_value
                        + strength * source_attention * PROPAGATION_FACTOR)
                        .min(1.0);
                    target.touch();
                }
            }
        }

        if cancel.is_cancelled() {
            return Ok(());
        }

        // Phase 3: decay everything the activity did not touch
        let activated_set: HashSet<NodeId> = activated.iter().copied().collect();
        for node in network.nodes.values_mut() {
            if !activated_set.contains(&node.id) {
                node.attention_value =
                    (node.attention_value * ATTENTION_DECAY_FACTOR).max(ATTENTION_FLOOR);
            }
        }

        if cancel.is_cancelled() {
            return Ok(());
        }

        // Phase 4: reinforce links touched by activated nodes
        let mut touched: HashSet<LinkId> = HashSet::new();
        for node_id in &activated {
            if let Some(node) = network.get_node(node_id) {
                touched.extend(node.incoming_links.iter().copied());
                touched.extend(node.outgoing_links.iter().copied());
            }
        }
        let reinforcement = learning_rate * 0.01;
        for link_id in touched {
            if let Some(link) = network.get_link_mut(&link_id) {
                if link.activation_count >= 1 {
                    link.strengthen(reinforcement);
                }
            }
        }

        Ok(())
    }

    async fn identify_emergent_capabilities(&self, network: &SynergyNetwork) -> Vec<String> {
        let mut capabilities = Vec::new();

        for pattern in detect_activation_patterns(network) {
            if pattern.strength >= network.emergence_threshold {
                capabilities.push(format!(
                    "Recurring {} activation across {} nodes (strength {:.2})",
                    pattern.node_type_label,
                    pattern.node_ids.len(),
                    pattern.strength
                ));
            }
        }

        // High-attention pairs with no direct link in either direction
        let linked: HashSet<(NodeId, NodeId)> = network
            .links
            .values()
            .flat_map(|l| {
                [
                    (l.source_node_id, l.target_node_id),
                    (l.target_node_id, l.source_node_id),
                ]
            })
            .collect();
        let hot: Vec<&CognitiveNode> = network
            .active_nodes()
            .filter(|n| n.attention_value > 0.7)
            .collect();
        for (i, first) in hot.iter().enumerate() {
            for second in hot.iter().skip(i + 1) {
                if !linked.contains(&(first.id, second.id)) {
                    capabilities.push(format!(
                        "Novel combination potential: {} + {}",
                        first.label(),
                        second.label()
                    ));
                }
            }
        }

        for cluster in detect_synergy_clusters(network) {
            if cluster.score >= network.emergence_threshold {
                capabilities.push(format!(
                    "Synergy cluster of {} nodes (score {:.2})",
                    cluster.node_ids.len(),
                    cluster.score
                ));
            }
        }

        if !capabilities.is_empty() {
            info!(
                network = %network.name,
                count = capabilities.len(),
                "Emergent capabilities identified"
            );
        }
        capabilities
    }

    async fn optimize_network(&self, network: &mut SynergyNetwork) -> Result<NetworkOptimization> {
        let load = compute_load(network);

        // Weak links: barely used and barely weighted
        let pruned_link_ids: Vec<LinkId> = network
            .links
            .values()
            .filter(|l| l.strength < 0.2 && l.activation_count < 10)
            .map(|l| l.id)
            .collect();
        for link_id in &pruned_link_ids {
            network.remove_link(*link_id);
        }

        for node_id in &load.bottleneck_node_ids {
            if let Some(node) = network.get_node_mut(node_id) {
                node.attention_value = (node.attention_value * 0.9).max(ATTENTION_FLOOR);
                node.touch();
            }
        }
        for node_id in &load.underutilized_node_ids {
            if let Some(node) = network.get_node_mut(node_id) {
                node.attention_value = (node.attention_value * 1.1).min(1.0);
                node.touch();
            }
        }

        let mut strengthened_links = 0;
        let mut weakened_links = 0;
        let now = Utc::now();
        for link in network.links.values_mut() {
            if link.activation_count > 100 {
                link.strengthen(0.01);
                strengthened_links += 1;
            } else if link.activation_count < 10 && now - link.created_at > chrono::Duration::hours(24)
            {
                link.weaken(0.01);
                weakened_links += 1;
            }
        }

        info!(
            network = %network.name,
            pruned = pruned_link_ids.len(),
            strengthened = strengthened_links,
            weakened = weakened_links,
            "Network optimization complete"
        );

        Ok(NetworkOptimization {
            pruned_link_ids,
            rebalanced_bottlenecks: load.bottleneck_node_ids.len(),
            boosted_underutilized: load.underutilized_node_ids.len(),
            strengthened_links,
            weakened_links,
        })
    }

    async fn analyze_cognitive_load(&self, network: &SynergyNetwork) -> Result<CognitiveLoadReport> {
        Ok(compute_load(network))
    }
}

/// Relevance of a node to an inbound activity, always within [0, 1]
///
/// Base 0.5, plus 0.3 for schema nodes on "message" activities, 0.2 for
/// predicate nodes when the activity carries text, 0.1 for concept
/// nodes, plus a fifth of current attention.
fn activity_relevance(node: &CognitiveNode, activity: &ExternalActivity) -> f64 {
    let mut relevance: f64 = 0.5;
    if node.node_type.is_schema() && activity.activity_type == "message" {
        relevance += 0.3;
    }
    if node.node_type.is_predicate() && activity.has_text() {
        relevance += 0.2;
    }
    if node.node_type.is_concept() {
        relevance += 0.1;
    }
    relevance += 0.2 * node.attention_value;
    relevance.clamp(0.0, 1.0)
}

/// Group active, attentive nodes by type
///
/// Two or more active nodes of one type with mean attention above 0.5
/// count as a recurring activation pattern of that type.
fn detect_activation_patterns(network: &SynergyNetwork) -> Vec<ActivationPattern> {
    let mut by_type: HashMap<String, Vec<&CognitiveNode>> = HashMap::new();
    for node in network.active_nodes().filter(|n| n.attention_value > 0.5) {
        by_type
            .entry(node.node_type.label().to_string())
            .or_default()
            .push(node);
    }

    by_type
        .into_iter()
        .filter(|(_, nodes)| nodes.len() >= 2)
        .map(|(label, nodes)| {
            let strength =
                nodes.iter().map(|n| n.attention_value).sum::<f64>() / nodes.len() as f64;
            ActivationPattern {
                node_type_label: label,
                node_ids: nodes.into_iter().map(|n| n.id).collect(),
                strength,
            }
        })
        .collect()
}

/// Connected components over active links between active nodes
///
/// Components need at least three members to count as a cluster. Score
/// is an even blend of member attention and internal link strength.
fn detect_synergy_clusters(network: &SynergyNetwork) -> Vec<SynergyCluster> {
    let active_ids: HashSet<NodeId> = network.active_nodes().map(|n| n.id).collect();

    let mut adjacency: HashMap<NodeId, Vec<(NodeId, LinkId)>> = HashMap::new();
    for link in network.active_links() {
        if active_ids.contains(&link.source_node_id) && active_ids.contains(&link.target_node_id) {
            adjacency
                .entry(link.source_node_id)
                .or_default()
                .push((link.target_node_id, link.id));
            adjacency
                .entry(link.target_node_id)
                .or_default()
                .push((link.source_node_id, link.id));
        }
    }

    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut clusters = Vec::new();
    for start in &active_ids {
        if visited.contains(start) {
            continue;
        }
        let mut queue = VecDeque::from([*start]);
        visited.insert(*start);
        let mut members: Vec<NodeId> = Vec::new();
        let mut member_links: HashSet<LinkId> = HashSet::new();
        while let Some(node_id) = queue.pop_front() {
            members.push(node_id);
            if let Some(neighbors) = adjacency.get(&node_id) {
                for (next, link_id) in neighbors {
                    member_links.insert(*link_id);
                    if visited.insert(*next) {
                        queue.push_back(*next);
                    }
                }
            }
        }
        if members.len() < 3 {
            continue;
        }

        let avg_attention = members
            .iter()
            .filter_map(|id| network.get_node(id))
            .map(|n| n.attention_value)
            .sum::<f64>()
            / members.len() as f64;
        let avg_strength = if member_links.is_empty() {
            0.0
        } else {
            member_links
                .iter()
                .filter_map(|id| network.get_link(id))
                .map(|l| l.strength)
                .sum::<f64>()
                / member_links.len() as f64
        };
        clusters.push(SynergyCluster {
            node_ids: members,
            score: 0.5 * avg_attention + 0.5 * avg_strength,
        });
    }
    clusters
}

/// Load analysis over active nodes
///
/// Per-node load blends connection ratio (0.4) and attention (0.6).
/// Nodes above 0.8 are bottlenecks, below 0.3 underutilized.
fn compute_load(network: &SynergyNetwork) -> CognitiveLoadReport {
    let node_count = network.node_count();
    let active: Vec<&CognitiveNode> = network.active_nodes().collect();

    let overall_load = if active.is_empty() {
        0.0
    } else {
        active.iter().map(|n| n.attention_value).sum::<f64>() / active.len() as f64
    };

    let mut node_loads = HashMap::new();
    let mut bottleneck_node_ids = Vec::new();
    let mut underutilized_node_ids = Vec::new();
    for node in &active {
        let connection_ratio = if node_count > 1 {
            node.connection_count() as f64 / (node_count as f64 - 1.0)
        } else {
            0.0
        };
        let load = 0.4 * connection_ratio + 0.6 * node.attention_value;
        node_loads.insert(node.id, load);
        if load > 0.8 {
            bottleneck_node_ids.push(node.id);
        } else if load < 0.3 {
            underutilized_node_ids.push(node.id);
        }
    }

    let mut recommendations = Vec::new();
    if !bottleneck_node_ids.is_empty() {
        recommendations.push(format!(
            "{} bottleneck node(s) detected; rebalance attention or add parallel capabilities",
            bottleneck_node_ids.len()
        ));
    }
    if !underutilized_node_ids.is_empty() {
        recommendations.push(format!(
            "{} underutilized node(s); route more activity to them or prune",
            underutilized_node_ids.len()
        ));
    }
    if overall_load > 0.8 {
        recommendations.push("Overall cognitive load is high; consider growing the network".to_string());
    }

    CognitiveLoadReport {
        overall_load,
        node_loads,
        bottleneck_node_ids,
        underutilized_node_ids,
        recommendations,
    }
}
