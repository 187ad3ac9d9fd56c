// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # AutogenesisEngine — Evolutionary Network Growth (ADR-032)
//!
//! One engine invocation runs a generate/evaluate/accept cycle against a
//! single network:
//!
//! 1. **Analyze** — connectivity, isolated nodes, attention variance and
//!    a growth-potential count derived from the 1.2x size target.
//! 2. **Generate nodes** — template-driven candidates with uniformly
//!    sampled attention/confidence/strength and provenance metadata.
//! 3. **Generate links** — affinity-ranked connections from each new
//!    node plus gap-closing links between unconnected high-affinity
//!    pairs.
//! 4. **Evaluate fitness** — composite score over node quality, link
//!    quality, connectivity improvement and synergy enhancement.
//! 5. **Accept/Reject** — an accepted batch is merged through the
//!    network's add operations so adjacency indices stay consistent; a
//!    rejected batch is discarded with an explanatory message.
//!
//! Rejection is a normal outcome, not an error. Independently of the
//! cycle, [`AutogenesisEngine::apply_mutations`] jitters node and link
//! weights and occasionally applies one structural mutation; the
//! evaluation loop runs it on every tick.
//!
//! Candidate ranking and gap discovery are O(n^2) over the node set,
//! which is acceptable for per-session networks but a known ceiling for
//! large graphs.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{
    AutogenesisConfig, CognitiveNode, CognitiveNodeTemplate, LinkId, LinkType, NetworkId, NodeId,
    SynergyLink, SynergyLinkTemplate, SynergyNetwork,
};

/// Structural snapshot the engine derives before generating
#[derive(Debug, Clone)]
pub struct NetworkAnalysis {
    pub connectivity: f64,
    pub isolated_node_count: usize,
    pub attention_variance: f64,
    pub low_connectivity_labels: Vec<String>,
    pub growth_potential: usize,
}

impl NetworkAnalysis {
    /// Provenance attached to autogenesis notifications
    pub fn trigger_snapshot(&self) -> Value {
        json!({
            "connectivity": self.connectivity,
            "isolated_nodes": self.isolated_node_count,
            "attention_variance": self.attention_variance,
            "low_connectivity_nodes": self.low_connectivity_labels,
            "growth_potential": self.growth_potential,
        })
    }
}

/// Composite fitness of one generated batch
#[derive(Debug, Clone)]
pub struct FitnessEvaluation {
    pub node_fitness: f64,
    pub link_fitness: f64,
    pub connectivity_improvement: f64,
    pub synergy_enhancement: f64,
    pub overall: f64,
    pub meets_threshold: bool,
}

/// Outcome of one generate/evaluate/accept cycle
#[derive(Debug, Clone)]
pub struct AutogenesisResult {
    pub network_id: NetworkId,
    pub generated_node_ids: Vec<NodeId>,
    pub generated_link_ids: Vec<LinkId>,
    pub fitness: FitnessEvaluation,
    pub accepted: bool,
    pub message: String,
    pub trigger_snapshot: Value,
}

impl AutogenesisResult {
    /// Whether the cycle produced any candidates, accepted or not
    ///
    /// This is the dispatch condition for autogenesis notifications.
    pub fn generated_anything(&self) -> bool {
        !self.generated_node_ids.is_empty() || !self.generated_link_ids.is_empty()
    }
}

/// Counts from one mutation pass
#[derive(Debug, Clone, Default)]
pub struct MutationSummary {
    pub mutated_nodes: usize,
    pub mutated_links: usize,
    pub structural: Option<StructuralMutation>,
}

/// The single structural change a mutation pass may apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralMutation {
    LinkAdded(LinkId),
    LinkRemoved(LinkId),
}

/// AutogenesisEngine interface
#[async_trait]
pub trait AutogenesisEngine: Send + Sync {
    /// Run one generate/evaluate/accept cycle against the network
    async fn run_cycle(
        &self,
        network: &mut SynergyNetwork,
        cancel: &CancellationToken,
    ) -> Result<AutogenesisResult>;

    /// Jitter node/link weights and maybe apply one structural mutation
    ///
    /// Every component is mutated independently with probability `rate`.
    /// A rate of zero leaves the network untouched.
    async fn apply_mutations(
        &self,
        network: &mut SynergyNetwork,
        rate: f64,
    ) -> Result<MutationSummary>;
}

/// Standard implementation of AutogenesisEngine
pub struct StandardAutogenesisEngine {
    config: AutogenesisConfig,
}

impl StandardAutogenesisEngine {
    pub fn new(config: AutogenesisConfig) -> Self {
        Self { config }
    }

    /// Derive growth signals from the current network shape
    pub fn analyze(&self, network: &SynergyNetwork) -> NetworkAnalysis {
        let node_count = network.node_count();
        let link_count = network.link_count();

        let connectivity = pair_connectivity(node_count, link_count);
        let isolated_node_count = network.nodes.values().filter(|n| n.is_isolated()).count();

        let attention_variance = if node_count == 0 {
            0.0
        } else {
            let mean = network.nodes.values().map(|n| n.attention_value).sum::<f64>()
                / node_count as f64;
            network
                .nodes
                .values()
                .map(|n| (n.attention_value - mean).powi(2))
                .sum::<f64>()
                / node_count as f64
        };

        let low_connectivity_labels = network
            .nodes
            .values()
            .filter(|n| n.connection_count() < 2)
            .map(|n| n.label())
            .collect();

        // Growth target is 1.2x the current size, capped by max_auto_nodes
        let size_target = ((node_count as f64) * 1.2).ceil() as usize;
        let growth_potential = size_target
            .min(self.config.max_auto_nodes)
            .saturating_sub(node_count);

        NetworkAnalysis {
            connectivity,
            isolated_node_count,
            attention_variance,
            low_connectivity_labels,
            growth_potential,
        }
    }

    /// Build template-driven candidate nodes
    ///
    /// Produces up to `growth_potential` nodes without pushing the
    /// network past `max_auto_nodes`. Concept templates are preferred
    /// while isolated nodes exist; otherwise templates are chosen
    /// uniformly at random.
    pub fn generate_nodes(
        &self,
        network: &SynergyNetwork,
        analysis: &NetworkAnalysis,
    ) -> Vec<CognitiveNode> {
        let budget = self.config.max_auto_nodes.saturating_sub(network.node_count());
        let count = analysis.growth_potential.min(budget);
        if count == 0 || self.config.node_templates.is_empty() {
            return Vec::new();
        }

        let mut rng = rand::rng();
        let mut nodes = Vec::with_capacity(count);
        for _ in 0..count {
            let template = select_node_template(
                &self.config.node_templates,
                analysis.isolated_node_count > 0,
                &mut rng,
            );
            let mut node = CognitiveNode::new(template.node_type.clone())
                .with_attention(rng.random_range(0.5..=1.0))
                .with_confidence(rng.random_range(0.7..=1.0))
                .with_strength(rng.random_range(0.6..=1.0));
            apply_template_metadata(
                &mut node.metadata,
                &template.name,
                &template.base_properties,
                &template.trigger_conditions,
            );
            nodes.push(node);
        }
        nodes
    }

    /// Propose links integrating the new nodes into the network
    ///
    /// Each new node links to its top three affinity candidates above
    /// 0.5; up to five more links close the highest-affinity unconnected
    /// pairs above 0.6 across the whole node set. Nothing is proposed
    /// when no nodes were generated.
    pub fn generate_links(
        &self,
        network: &SynergyNetwork,
        new_nodes: &[CognitiveNode],
    ) -> Vec<SynergyLink> {
        if new_nodes.is_empty() || self.config.link_templates.is_empty() {
            return Vec::new();
        }

        let mut rng = rand::rng();
        let candidates: Vec<&CognitiveNode> =
            network.nodes.values().chain(new_nodes.iter()).collect();

        let generated_so_far = count_generated_links(network);
        let budget = self.config.max_auto_links.saturating_sub(generated_so_far);

        let mut links: Vec<SynergyLink> = Vec::new();
        for node in new_nodes {
            let mut scored: Vec<(f64, NodeId)> = candidates
                .iter()
                .filter(|c| c.id != node.id)
                .map(|c| (pair_affinity(node, c), c.id))
                .collect();
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

            for (affinity, target_id) in scored.into_iter().take(3) {
                if affinity <= 0.5 || links.len() >= budget {
                    break;
                }
                let template = &self.config.link_templates
                    [rng.random_range(0..self.config.link_templates.len())];
                links.push(sample_link(node.id, target_id, template, &mut rng));
            }
        }

        // Gap closing: connect the strongest unlinked pairs
        let connected: HashSet<(NodeId, NodeId)> = network
            .links
            .values()
            .map(|l| (l.source_node_id, l.target_node_id))
            .chain(links.iter().map(|l| (l.source_node_id, l.target_node_id)))
            .flat_map(|(a, b)| [(a, b), (b, a)])
            .collect();

        let mut gaps: Vec<(f64, NodeId, NodeId)> = Vec::new();
        for (i, first) in candidates.iter().enumerate() {
            for second in candidates.iter().skip(i + 1) {
                if connected.contains(&(first.id, second.id)) {
                    continue;
                }
                let affinity = pair_affinity(first, second);
                if affinity > 0.6 {
                    gaps.push((affinity, first.id, second.id));
                }
            }
        }
        gaps.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        for (_, source_id, target_id) in gaps.into_iter().take(5) {
            if links.len() >= budget {
                break;
            }
            let template = &self.config.link_templates
                [rng.random_range(0..self.config.link_templates.len())];
            links.push(sample_link(source_id, target_id, template, &mut rng));
        }

        links
    }

    /// Score a generated batch against the current network
    pub fn evaluate_fitness(
        &self,
        network: &SynergyNetwork,
        nodes: &[CognitiveNode],
        links: &[SynergyLink],
    ) -> FitnessEvaluation {
        let network_mean_attention = if network.nodes.is_empty() {
            0.0
        } else {
            network.nodes.values().map(|n| n.attention_value).sum::<f64>()
                / network.node_count() as f64
        };

        let node_fitness = if nodes.is_empty() {
            0.0
        } else {
            nodes
                .iter()
                .map(|n| {
                    let connectivity_potential = (1.0
                        - (n.attention_value - network_mean_attention).abs())
                        * n.confidence;
                    0.3 * n.confidence + 0.3 * n.strength + 0.4 * connectivity_potential
                })
                .sum::<f64>()
                / nodes.len() as f64
        };

        let present: HashSet<NodeId> = network
            .nodes
            .keys()
            .copied()
            .chain(nodes.iter().map(|n| n.id))
            .collect();
        let link_fitness = if links.is_empty() {
            0.0
        } else {
            links
                .iter()
                .map(|l| {
                    let integration = if present.contains(&l.source_node_id)
                        && present.contains(&l.target_node_id)
                    {
                        l.strength * l.confidence
                    } else {
                        0.0
                    };
                    0.4 * l.confidence + 0.3 * l.strength + 0.3 * integration
                })
                .sum::<f64>()
                / links.len() as f64
        };

        let current = pair_connectivity(network.node_count(), network.link_count());
        let merged = pair_connectivity(
            network.node_count() + nodes.len(),
            network.link_count() + links.len(),
        );
        let connectivity_improvement = (merged - current).max(0.0);

        let synergy_enhancement = (nodes.iter().map(|n| n.attention_value * 0.1).sum::<f64>()
            + links.iter().map(|l| l.strength * 0.05).sum::<f64>())
        .min(1.0);

        let overall = 0.3 * node_fitness
            + 0.3 * link_fitness
            + 0.2 * connectivity_improvement
            + 0.2 * synergy_enhancement;

        FitnessEvaluation {
            node_fitness,
            link_fitness,
            connectivity_improvement,
            synergy_enhancement,
            overall,
            meets_threshold: overall >= self.config.fitness_threshold,
        }
    }
}

#[async_trait]
impl AutogenesisEngine for StandardAutogenesisEngine {
    async fn run_cycle(
        &self,
        network: &mut SynergyNetwork,
        cancel: &CancellationToken,
    ) -> Result<AutogenesisResult> {
        let analysis = self.analyze(network);
        let trigger_snapshot = analysis.trigger_snapshot();

        if !self.config.enabled || cancel.is_cancelled() {
            return Ok(AutogenesisResult {
                network_id: network.id,
                generated_node_ids: Vec::new(),
                generated_link_ids: Vec::new(),
                fitness: self.evaluate_fitness(network, &[], &[]),
                accepted: false,
                message: if self.config.enabled {
                    "Cycle cancelled before generation".to_string()
                } else {
                    "Autogenesis is disabled".to_string()
                },
                trigger_snapshot,
            });
        }

        let nodes = self.generate_nodes(network, &analysis);
        let links = self.generate_links(network, &nodes);
        let fitness = self.evaluate_fitness(network, &nodes, &links);

        let generated_node_ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        let generated_link_ids: Vec<LinkId> = links.iter().map(|l| l.id).collect();

        if nodes.is_empty() && links.is_empty() {
            debug!(network = %network.name, "No growth opportunities identified");
            return Ok(AutogenesisResult {
                network_id: network.id,
                generated_node_ids,
                generated_link_ids,
                fitness,
                accepted: false,
                message: "No growth opportunities identified".to_string(),
                trigger_snapshot,
            });
        }

        let accepted = fitness.meets_threshold;
        let message = if accepted {
            for node in nodes {
                network.add_node(node);
            }
            for link in links {
                network.add_link(link);
            }
            network.calculate_synergy_score();
            info!(
                network = %network.name,
                nodes = generated_node_ids.len(),
                links = generated_link_ids.len(),
                fitness = fitness.overall,
                "Autogenesis batch accepted"
            );
            format!(
                "Accepted {} nodes and {} links (fitness {:.2} >= {:.2})",
                generated_node_ids.len(),
                generated_link_ids.len(),
                fitness.overall,
                self.config.fitness_threshold
            )
        } else {
            info!(
                network = %network.name,
                nodes = generated_node_ids.len(),
                links = generated_link_ids.len(),
                fitness = fitness.overall,
                "Autogenesis batch rejected"
            );
            format!(
                "Rejected {} nodes and {} links (fitness {:.2} < {:.2})",
                generated_node_ids.len(),
                generated_link_ids.len(),
                fitness.overall,
                self.config.fitness_threshold
            )
        };

        Ok(AutogenesisResult {
            network_id: network.id,
            generated_node_ids,
            generated_link_ids,
            fitness,
            accepted,
            message,
            trigger_snapshot,
        })
    }

    async fn apply_mutations(
        &self,
        network: &mut SynergyNetwork,
        rate: f64,
    ) -> Result<MutationSummary> {
        let mut summary = MutationSummary::default();
        if rate <= 0.0 {
            return Ok(summary);
        }

        let mut rng = rand::rng();

        for node in network.nodes.values_mut() {
            if rng.random::<f64>() >= rate {
                continue;
            }
            let mut changed = false;
            if rng.random_bool(0.5) {
                node.attention_value =
                    (node.attention_value + rng.random_range(-0.1..=0.1)).clamp(0.0, 1.0);
                changed = true;
            }
            if rng.random_bool(0.3) {
                node.confidence =
                    (node.confidence + rng.random_range(-0.05..=0.05)).clamp(0.0, 1.0);
                changed = true;
            }
            if rng.random_bool(0.3) {
                node.strength = (node.strength + rng.random_range(-0.05..=0.05)).clamp(0.0, 1.0);
                changed = true;
            }
            if changed {
                node.touch();
                summary.mutated_nodes += 1;
            }
        }

        for link in network.links.values_mut() {
            if rng.random::<f64>() >= rate {
                continue;
            }
            let mut changed = false;
            if rng.random_bool(0.4) {
                // Negative jitter goes through weaken so the strength
                // floor deactivation stays enforced
                let jitter = rng.random_range(-0.1..=0.1);
                if jitter >= 0.0 {
                    link.strengthen(jitter);
                } else {
                    link.weaken(-jitter);
                }
                changed = true;
            }
            if rng.random_bool(0.2) {
                link.confidence =
                    (link.confidence + rng.random_range(-0.05..=0.05)).clamp(0.0, 1.0);
                link.touch();
                changed = true;
            }
            if changed {
                summary.mutated_links += 1;
            }
        }

        if rng.random::<f64>() < rate {
            summary.structural = if rng.random_bool(0.5) {
                self.add_random_link(network, &mut rng)
                    .map(StructuralMutation::LinkAdded)
            } else {
                remove_weakest_link(network).map(StructuralMutation::LinkRemoved)
            };
        }

        if summary.mutated_nodes > 0 || summary.mutated_links > 0 || summary.structural.is_some() {
            debug!(
                network = %network.name,
                nodes = summary.mutated_nodes,
                links = summary.mutated_links,
                structural = ?summary.structural,
                "Mutation pass applied"
            );
        }
        Ok(summary)
    }
}

impl StandardAutogenesisEngine {
    /// Add one random link between two distinct nodes, within the
    /// generated-link budget
    fn add_random_link(
        &self,
        network: &mut SynergyNetwork,
        rng: &mut impl Rng,
    ) -> Option<LinkId> {
        if network.node_count() < 2 {
            return None;
        }
        if count_generated_links(network) >= self.config.max_auto_links {
            return None;
        }

        let ids: Vec<NodeId> = network.nodes.keys().copied().collect();
        let source_index = rng.random_range(0..ids.len());
        let mut target_index = rng.random_range(0..ids.len() - 1);
        if target_index >= source_index {
            target_index += 1;
        }

        let link_type = if self.config.link_templates.is_empty() {
            LinkType::Association
        } else {
            self.config.link_templates[rng.random_range(0..self.config.link_templates.len())]
                .link_type
                .clone()
        };
        let link = SynergyLink::new(ids[source_index], ids[target_index], link_type)
            .with_strength(rng.random_range(0.5..=0.9))
            .with_confidence(rng.random_range(0.6..=1.0))
            .with_attention(rng.random_range(0.4..=0.8))
            .with_metadata("generated_by", Value::String("mutation".to_string()))
            .with_metadata("generated_at", Value::String(Utc::now().to_rfc3339()));
        let link_id = link.id;
        network.add_link(link);
        Some(link_id)
    }
}

/// Directed-pair connectivity: links over possible ordered pairs
fn pair_connectivity(node_count: usize, link_count: usize) -> f64 {
    if node_count > 1 {
        link_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
    } else {
        0.0
    }
}

/// Affinity between two nodes: type match, attention gap, strength gap
fn pair_affinity(a: &CognitiveNode, b: &CognitiveNode) -> f64 {
    let type_bonus = if a.node_type == b.node_type { 0.3 } else { 0.1 };
    type_bonus
        + 0.4 * (1.0 - (a.attention_value - b.attention_value).abs())
        + 0.3 * (1.0 - (a.strength - b.strength).abs())
}

fn select_node_template<'a>(
    templates: &'a [CognitiveNodeTemplate],
    has_isolated_nodes: bool,
    rng: &mut impl Rng,
) -> &'a CognitiveNodeTemplate {
    if has_isolated_nodes {
        if let Some(concept) = templates.iter().find(|t| t.node_type.is_concept()) {
            return concept;
        }
    }
    &templates[rng.random_range(0..templates.len())]
}

fn sample_link(
    source_id: NodeId,
    target_id: NodeId,
    template: &SynergyLinkTemplate,
    rng: &mut impl Rng,
) -> SynergyLink {
    let mut link = SynergyLink::new(source_id, target_id, template.link_type.clone())
        .with_strength(rng.random_range(0.5..=0.9))
        .with_confidence(rng.random_range(0.6..=1.0))
        .with_attention(rng.random_range(0.4..=0.8))
        .with_bidirectional(rng.random_bool(0.3));
    apply_template_metadata(
        &mut link.metadata,
        &template.name,
        &template.base_properties,
        &template.trigger_conditions,
    );
    link
}

/// Copy template properties and generation provenance into metadata
fn apply_template_metadata(
    metadata: &mut std::collections::HashMap<String, Value>,
    template_name: &str,
    base_properties: &std::collections::HashMap<String, Value>,
    trigger_conditions: &std::collections::HashMap<String, Value>,
) {
    for (key, value) in base_properties {
        metadata.insert(key.clone(), value.clone());
    }
    metadata.insert(
        "generated_by".to_string(),
        Value::String(template_name.to_string()),
    );
    metadata.insert(
        "generated_at".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    if !trigger_conditions.is_empty() {
        metadata.insert(
            "trigger_conditions".to_string(),
            Value::Object(trigger_conditions.clone().into_iter().collect()),
        );
    }
}

/// Links carrying generation provenance, counted against max_auto_links
fn count_generated_links(network: &SynergyNetwork) -> usize {
    network
        .links
        .values()
        .filter(|l| l.metadata.contains_key("generated_by"))
        .count()
}

/// Remove the weakest link if its strength is below 0.3
fn remove_weakest_link(network: &mut SynergyNetwork) -> Option<LinkId> {
    let weakest = network
        .links
        .values()
        .min_by(|a, b| a.strength.partial_cmp(&b.strength).unwrap_or(std::cmp::Ordering::Equal))
        .filter(|l| l.strength < 0.3)
        .map(|l| l.id)?;
    network.remove_link(weakest);
    Some(weakest)
}
