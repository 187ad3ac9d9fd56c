// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Autogenesis configuration and component templates

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::error::SynergyError;
use crate::domain::link::LinkType;
use crate::domain::node::NodeType;

/// Template for an autogenesis-generated node
///
/// `trigger_conditions` never gate generation; they are copied into the
/// generated node's metadata as provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveNodeTemplate {
    pub name: String,
    pub node_type: NodeType,
    pub base_properties: HashMap<String, Value>,
    pub trigger_conditions: HashMap<String, Value>,
}

impl CognitiveNodeTemplate {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            base_properties: HashMap::new(),
            trigger_conditions: HashMap::new(),
        }
    }

    pub fn with_base_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.base_properties.insert(key.into(), value);
        self
    }

    pub fn with_trigger_condition(mut self, key: impl Into<String>, value: Value) -> Self {
        self.trigger_conditions.insert(key.into(), value);
        self
    }
}

/// Template for an autogenesis-generated link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyLinkTemplate {
    pub name: String,
    pub link_type: LinkType,
    pub base_properties: HashMap<String, Value>,
    pub trigger_conditions: HashMap<String, Value>,
}

impl SynergyLinkTemplate {
    pub fn new(name: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            name: name.into(),
            link_type,
            base_properties: HashMap::new(),
            trigger_conditions: HashMap::new(),
        }
    }

    pub fn with_base_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.base_properties.insert(key.into(), value);
        self
    }

    pub fn with_trigger_condition(mut self, key: impl Into<String>, value: Value) -> Self {
        self.trigger_conditions.insert(key.into(), value);
        self
    }
}

/// Global tunables for the autogenesis engine and evaluation loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutogenesisConfig {
    /// Master switch for generation, mutation and the evaluation timer
    pub enabled: bool,

    /// Aggregate synergy score required before autogenesis runs
    pub synergy_threshold: f64,

    /// Hard cap on nodes per network during generation
    pub max_auto_nodes: usize,

    /// Hard cap on generated links per network
    pub max_auto_links: usize,

    /// Learning rate applied to networks created without an override
    pub learning_rate: f64,

    /// Per-component mutation probability for the periodic pass
    pub mutation_rate: f64,

    /// Overall fitness required to accept a generated batch
    pub fitness_threshold: f64,

    pub node_templates: Vec<CognitiveNodeTemplate>,
    pub link_templates: Vec<SynergyLinkTemplate>,

    /// Period of the background evaluation timer
    pub evaluation_interval: Duration,
}

impl Default for AutogenesisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            synergy_threshold: 0.8,
            max_auto_nodes: 50,
            max_auto_links: 100,
            learning_rate: 0.1,
            mutation_rate: 0.05,
            fitness_threshold: 0.6,
            node_templates: default_node_templates(),
            link_templates: default_link_templates(),
            evaluation_interval: Duration::from_secs(300),
        }
    }
}

impl AutogenesisConfig {
    /// Reject configurations that would corrupt scoring math
    pub fn validate(&self) -> Result<(), SynergyError> {
        for (name, value) in [
            ("synergy_threshold", self.synergy_threshold),
            ("mutation_rate", self.mutation_rate),
            ("fitness_threshold", self.fitness_threshold),
            ("learning_rate", self.learning_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SynergyError::InvalidArgument(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.max_auto_nodes == 0 {
            return Err(SynergyError::InvalidArgument(
                "max_auto_nodes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_node_templates() -> Vec<CognitiveNodeTemplate> {
    vec![
        CognitiveNodeTemplate::new("adaptive-concept", NodeType::Concept)
            .with_base_property("origin", Value::String("autogenesis".to_string()))
            .with_trigger_condition("isolated_nodes_present", Value::Bool(true)),
        CognitiveNodeTemplate::new("bridging-predicate", NodeType::Predicate)
            .with_base_property("origin", Value::String("autogenesis".to_string()))
            .with_trigger_condition("low_connectivity", Value::Bool(true)),
        CognitiveNodeTemplate::new("coordination-schema", NodeType::Schema)
            .with_base_property("origin", Value::String("autogenesis".to_string()))
            .with_trigger_condition("growth_potential", Value::Bool(true)),
    ]
}

fn default_link_templates() -> Vec<SynergyLinkTemplate> {
    vec![
        SynergyLinkTemplate::new("affinity-association", LinkType::Association)
            .with_base_property("origin", Value::String("autogenesis".to_string())),
        SynergyLinkTemplate::new("capability-similarity", LinkType::Similarity)
            .with_base_property("origin", Value::String("autogenesis".to_string())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AutogenesisConfig::default();

        assert!(config.enabled);
        assert_eq!(config.max_auto_nodes, 50);
        assert_eq!(config.evaluation_interval, Duration::from_secs(300));
        assert!(!config.node_templates.is_empty());
        assert!(!config.link_templates.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_rates() {
        let config = AutogenesisConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AutogenesisConfig {
            fitness_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_node_cap() {
        let config = AutogenesisConfig {
            max_auto_nodes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
