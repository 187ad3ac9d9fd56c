// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Cognitive node entities for synergy networks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::link::LinkId;

/// Node identifier in a synergy network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Nil ids mark an unassigned node; add operations skip them
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Type of cognitive node
///
/// The tag set is open-ended: the three built-in kinds drive relevance
/// scoring, while `Custom` carries anything a host runtime defines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// An abstract concept or knowledge unit
    Concept,

    /// A predicate evaluated against inbound content
    Predicate,

    /// A behavioral schema (processing recipe)
    Schema,

    /// Host-defined node kind
    Custom(String),
}

impl NodeType {
    pub fn is_concept(&self) -> bool {
        matches!(self, NodeType::Concept)
    }

    pub fn is_predicate(&self) -> bool {
        matches!(self, NodeType::Predicate)
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, NodeType::Schema)
    }

    /// Stable label for logs and capability descriptions
    pub fn label(&self) -> &str {
        match self {
            NodeType::Concept => "concept",
            NodeType::Predicate => "predicate",
            NodeType::Schema => "schema",
            NodeType::Custom(tag) => tag.as_str(),
        }
    }
}

/// Node in a synergy network
///
/// Carries the attention/confidence/strength weights that activity
/// processing and autogenesis mutate in place. Numeric fields are stored
/// unclamped here; callers clamp to [0, 1] around every mutation. The
/// incoming/outgoing vectors are back-references only, the owning
/// network's link table holds the link objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub attention_value: f64,
    pub confidence: f64,
    pub strength: f64,
    pub is_active: bool,
    pub metadata: HashMap<String, Value>,
    pub incoming_links: Vec<LinkId>,
    pub outgoing_links: Vec<LinkId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CognitiveNode {
    pub fn new(node_type: NodeType) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::new(),
            node_type,
            attention_value: 0.5,
            confidence: 0.5,
            strength: 0.5,
            is_active: true,
            metadata: HashMap::new(),
            incoming_links: Vec::new(),
            outgoing_links: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_attention(mut self, attention_value: f64) -> Self {
        self.attention_value = attention_value;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Mark the node active and refresh its update timestamp
    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Total number of adjacent link references (incoming + outgoing)
    pub fn connection_count(&self) -> usize {
        self.incoming_links.len() + self.outgoing_links.len()
    }

    /// A node with no link references in either direction
    pub fn is_isolated(&self) -> bool {
        self.incoming_links.is_empty() && self.outgoing_links.is_empty()
    }

    /// Set a metadata entry
    pub fn set_metadata(&mut self, key: String, value: Value) {
        self.metadata.insert(key, value);
    }

    /// Get a metadata entry
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Human-readable label: the `name` metadata entry when present,
    /// else the node type plus a short id prefix
    pub fn label(&self) -> String {
        match self.metadata.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                let id = self.id.0.simple().to_string();
                format!("{}-{}", self.node_type.label(), &id[..8])
            }
        }
    }
}
