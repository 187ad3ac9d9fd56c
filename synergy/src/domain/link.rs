// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Synergy link entities connecting cognitive nodes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::node::NodeId;

/// Link identifier in a synergy network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Type of synergy link
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    /// General association between two nodes
    Association,

    /// Target specializes or derives from source
    Inheritance,

    /// Source and target represent similar capabilities
    Similarity,

    /// Source execution feeds the target
    Execution,

    /// Host-defined link kind
    Custom(String),
}

impl LinkType {
    pub fn label(&self) -> &str {
        match self {
            LinkType::Association => "association",
            LinkType::Inheritance => "inheritance",
            LinkType::Similarity => "similarity",
            LinkType::Execution => "execution",
            LinkType::Custom(tag) => tag.as_str(),
        }
    }
}

/// Weighted edge between two cognitive nodes
///
/// `source_node_id`/`target_node_id` are foreign references into the
/// owning network's node table. Strength mutation goes through
/// [`SynergyLink::strengthen`] and [`SynergyLink::weaken`], which clamp
/// to [0, 1]; a link whose strength drops to 0.1 or below is deactivated
/// and never reactivated automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyLink {
    pub id: LinkId,
    pub link_type: LinkType,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub strength: f64,
    pub confidence: f64,
    pub attention_value: f64,
    pub is_bidirectional: bool,
    pub is_active: bool,
    pub activation_count: u64,
    pub last_activated_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SynergyLink {
    pub fn new(source_node_id: NodeId, target_node_id: NodeId, link_type: LinkType) -> Self {
        let now = Utc::now();
        Self {
            id: LinkId::new(),
            link_type,
            source_node_id,
            target_node_id,
            strength: 0.5,
            confidence: 0.5,
            attention_value: 0.5,
            is_bidirectional: false,
            is_active: true,
            activation_count: 0,
            last_activated_at: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_attention(mut self, attention_value: f64) -> Self {
        self.attention_value = attention_value;
        self
    }

    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.is_bidirectional = bidirectional;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Record one activation of this link
    pub fn activate(&mut self) {
        self.activation_count += 1;
        let now = Utc::now();
        self.last_activated_at = Some(now);
        self.updated_at = now;
    }

    /// Increase strength by `amount`, clamped to [0, 1]
    pub fn strengthen(&mut self, amount: f64) {
        self.strength = (self.strength + amount).clamp(0.0, 1.0);
        self.updated_at = Utc::now();
    }

    /// Decrease strength by `amount`, clamped to [0, 1]
    ///
    /// A link weakened to strength <= 0.1 is deactivated. The transition
    /// is one-way: later strengthening does not reactivate it.
    pub fn weaken(&mut self, amount: f64) {
        self.strength = (self.strength - amount).clamp(0.0, 1.0);
        if self.strength <= 0.1 {
            self.is_active = false;
        }
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Set a metadata entry
    pub fn set_metadata(&mut self, key: String, value: Value) {
        self.metadata.insert(key, value);
    }

    /// Get a metadata entry
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_creation() {
        let source = NodeId::new();
        let target = NodeId::new();
        let link = SynergyLink::new(source, target, LinkType::Association);

        assert_eq!(link.source_node_id, source);
        assert_eq!(link.target_node_id, target);
        assert_eq!(link.strength, 0.5);
        assert_eq!(link.activation_count, 0);
        assert!(link.is_active);
        assert!(link.last_activated_at.is_none());
    }

    #[test]
    fn test_activate_increments_count() {
        let mut link = SynergyLink::new(NodeId::new(), NodeId::new(), LinkType::Execution);

        link.activate();
        link.activate();

        assert_eq!(link.activation_count, 2);
        assert!(link.last_activated_at.is_some());
    }

    #[test]
    fn test_strengthen_clamps_to_unit_interval() {
        let mut link = SynergyLink::new(NodeId::new(), NodeId::new(), LinkType::Similarity);

        link.strengthen(5.0);
        assert_eq!(link.strength, 1.0);

        link.strengthen(-10.0);
        assert_eq!(link.strength, 0.0);
    }

    #[test]
    fn test_weaken_deactivates_at_floor() {
        let mut link =
            SynergyLink::new(NodeId::new(), NodeId::new(), LinkType::Association).with_strength(0.5);

        link.weaken(0.45);
        assert!((link.strength - 0.05).abs() < 1e-9);
        assert!(!link.is_active);

        // One-way transition: strengthening does not reactivate
        link.strengthen(0.8);
        assert!(!link.is_active);
    }

    #[test]
    fn test_weaken_idempotent_at_zero() {
        let mut link =
            SynergyLink::new(NodeId::new(), NodeId::new(), LinkType::Association).with_strength(0.2);

        link.weaken(3.0);
        assert_eq!(link.strength, 0.0);
        assert!(!link.is_active);

        link.weaken(1.0);
        assert_eq!(link.strength, 0.0);
        assert!(!link.is_active);
    }

    #[test]
    fn test_weaken_never_exceeds_bounds() {
        let mut link =
            SynergyLink::new(NodeId::new(), NodeId::new(), LinkType::Inheritance).with_strength(0.9);

        link.weaken(-5.0);
        assert_eq!(link.strength, 1.0);
    }
}
