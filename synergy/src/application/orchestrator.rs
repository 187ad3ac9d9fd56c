// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Synergy Orchestrator Application Service
//!
//! Coordinates networks, activity processing, emergence detection and
//! autogenesis over the whole registry.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Own the network registry and drive per-network services
//! - **Dependencies:** Domain (SynergyNetwork), Application (SynergyService,
//!   AutogenesisEngine), Infrastructure (NetworkRegistry, SynergyEventBus)
//!
//! # Concurrency Model
//!
//! Networks live behind per-network `RwLock`s inside the registry. Every
//! pass snapshots the registry first, then takes one write guard at a
//! time, so no lock is held across the whole sweep and newly created
//! networks join the next pass. Events are published after the guard is
//! dropped.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::autogenesis_engine::{AutogenesisEngine, StandardAutogenesisEngine};
use crate::application::evaluation_loop::EvaluationLoop;
use crate::application::synergy_service::{
    CognitiveLoadReport, NetworkOptimization, StandardSynergyService, SynergyService,
};
use crate::domain::{
    AutogenesisConfig, CognitiveNode, ExternalActivity, NetworkId, NodeType, SynergyError,
    SynergyEvent, SynergyLink, SynergyNetwork,
};
use crate::infrastructure::{NetworkHandle, NetworkRegistry, SynergyEventBus};

/// Name of the network seeded during initialization
const PRIMARY_NETWORK_NAME: &str = "primary-cognitive-network";

/// Running evaluation loop task with its stop handle
struct LoopTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Synergy Orchestrator (Application Service)
///
/// Entry point for the whole engine. Owns the registry and the event
/// bus, and delegates per-network work to the synergy service and the
/// autogenesis engine.
pub struct SynergyOrchestrator {
    /// Autogenesis and evaluation configuration
    config: AutogenesisConfig,

    /// Registered networks, keyed by id
    registry: NetworkRegistry,

    /// Activity processing and emergence detection
    synergy: Arc<dyn SynergyService>,

    /// Evolutionary growth and mutation
    autogenesis: Arc<dyn AutogenesisEngine>,

    /// Event bus for publishing engine events
    event_bus: SynergyEventBus,

    /// Cooperative cancellation for in-flight passes
    cancel: CancellationToken,

    /// Background evaluation loop, armed by initialize()
    loop_task: parking_lot::Mutex<Option<LoopTask>>,
}

impl SynergyOrchestrator {
    /// Create a new orchestrator with explicit services
    pub fn new(
        config: AutogenesisConfig,
        synergy: Arc<dyn SynergyService>,
        autogenesis: Arc<dyn AutogenesisEngine>,
        event_bus: SynergyEventBus,
    ) -> Self {
        Self {
            config,
            registry: NetworkRegistry::new(),
            synergy,
            autogenesis,
            event_bus,
            cancel: CancellationToken::new(),
            loop_task: parking_lot::Mutex::new(None),
        }
    }

    /// Create an orchestrator wired with the standard service implementations
    pub fn with_defaults(config: AutogenesisConfig) -> Self {
        let autogenesis = StandardAutogenesisEngine::new(config.clone());
        Self::new(
            config,
            Arc::new(StandardSynergyService::new()),
            Arc::new(autogenesis),
            SynergyEventBus::with_default_capacity(),
        )
    }

    /// Event bus handle for subscribing to engine events
    pub fn event_bus(&self) -> &SynergyEventBus {
        &self.event_bus
    }

    /// Registered network count
    pub fn network_count(&self) -> usize {
        self.registry.len()
    }

    /// Ids of every registered network
    pub fn network_ids(&self) -> Vec<NetworkId> {
        self.registry.snapshot().into_iter().map(|(id, _)| id).collect()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Validate configuration, seed the primary network and arm the
    /// background evaluation loop
    ///
    /// Takes the orchestrator by `Arc` so the evaluation loop can hold a
    /// handle back to it; clone before calling to keep your own.
    pub async fn initialize(self: Arc<Self>) -> Result<()> {
        self.config.validate()?;
        info!(
            enabled = self.config.enabled,
            synergy_threshold = self.config.synergy_threshold,
            "Initializing synergy orchestrator"
        );

        let network = self.create_network(PRIMARY_NETWORK_NAME, None).await?;
        let seeds = [
            ("message-processing", NodeType::Schema),
            ("intent-recognition", NodeType::Predicate),
            ("response-generation", NodeType::Schema),
            ("context-management", NodeType::Concept),
            ("dialog-management", NodeType::Schema),
        ];
        for (name, node_type) in seeds {
            let node = CognitiveNode::new(node_type)
                .with_attention(0.5)
                .with_confidence(0.8)
                .with_strength(0.7)
                .with_metadata("name", Value::String(name.to_string()));
            self.add_node(network.id, node).await;
        }

        if self.config.enabled && !self.config.evaluation_interval.is_zero() {
            let evaluation_loop = Arc::new(EvaluationLoop::new(
                Arc::clone(&self),
                self.config.evaluation_interval,
            ));
            let shutdown = evaluation_loop.shutdown_token();
            let handle = evaluation_loop.start();
            *self.loop_task.lock() = Some(LoopTask { shutdown, handle });
            info!(
                interval = ?self.config.evaluation_interval,
                "Evaluation loop started"
            );
        }
        Ok(())
    }

    /// Stop the evaluation loop and cancel in-flight passes
    pub async fn shutdown(&self) {
        info!("Shutting down synergy orchestrator");
        self.cancel.cancel();

        // Take the task out before awaiting; the guard must not be held
        // across an await point
        let task = self.loop_task.lock().take();
        if let Some(task) = task {
            task.shutdown.cancel();
            if let Err(e) = task.handle.await {
                warn!("Evaluation loop task ended abnormally: {}", e);
            }
        }
        info!("Synergy orchestrator stopped");
    }

    // ========================================================================
    // Network Management
    // ========================================================================

    /// Register a new network and return its initial snapshot
    ///
    /// The network inherits the configured learning rate; an explicit
    /// emergence threshold overrides the default.
    pub async fn create_network(
        &self,
        name: &str,
        emergence_threshold: Option<f64>,
    ) -> Result<SynergyNetwork, SynergyError> {
        if name.trim().is_empty() {
            return Err(SynergyError::InvalidArgument(
                "Network name must not be empty".to_string(),
            ));
        }

        let mut network = SynergyNetwork::new(name).with_learning_rate(self.config.learning_rate);
        if let Some(threshold) = emergence_threshold {
            network = network.with_emergence_threshold(threshold);
        }
        let snapshot = network.clone();
        self.registry.insert(network);

        info!(network = %name, network_id = %snapshot.id, "Network created");
        self.event_bus.publish(SynergyEvent::NetworkCreated {
            network_id: snapshot.id,
            name: name.to_string(),
            timestamp: Utc::now(),
        });
        Ok(snapshot)
    }

    /// Add a node to a network
    ///
    /// Returns false when the network is unknown or the node id is nil.
    pub async fn add_node(&self, network_id: NetworkId, node: CognitiveNode) -> bool {
        let Some(handle) = self.registry.get(&network_id) else {
            warn!(network_id = %network_id, "Cannot add node to unknown network");
            return false;
        };
        if node.id.is_nil() {
            warn!(network_id = %network_id, "Rejected node with nil id");
            return false;
        }

        let node_id = node.id;
        let node_type = node.node_type.label().to_string();
        {
            let mut network = handle.write().await;
            network.add_node(node);
        }
        debug!(network_id = %network_id, node_id = %node_id, node_type = %node_type, "Node added");
        self.event_bus.publish(SynergyEvent::NodeAdded {
            network_id,
            node_id,
            node_type,
            timestamp: Utc::now(),
        });
        true
    }

    /// Add a link to a network
    ///
    /// Returns false when the network is unknown or the link id is nil.
    pub async fn create_link(&self, network_id: NetworkId, link: SynergyLink) -> bool {
        let Some(handle) = self.registry.get(&network_id) else {
            warn!(network_id = %network_id, "Cannot add link to unknown network");
            return false;
        };
        if link.id.is_nil() {
            warn!(network_id = %network_id, "Rejected link with nil id");
            return false;
        }

        let link_id = link.id;
        let source_node_id = link.source_node_id;
        let target_node_id = link.target_node_id;
        let link_type = link.link_type.label().to_string();
        {
            let mut network = handle.write().await;
            network.add_link(link);
        }
        debug!(network_id = %network_id, link_id = %link_id, "Link added");
        self.event_bus.publish(SynergyEvent::LinkAdded {
            network_id,
            link_id,
            source_node_id,
            target_node_id,
            link_type,
            timestamp: Utc::now(),
        });
        true
    }

    /// Clone of a network's current state
    pub async fn network_snapshot(
        &self,
        network_id: NetworkId,
    ) -> Result<SynergyNetwork, SynergyError> {
        let handle = self
            .registry
            .get(&network_id)
            .ok_or_else(|| SynergyError::NetworkNotFound(network_id.to_string()))?;
        let network = handle.read().await;
        Ok(network.clone())
    }

    // ========================================================================
    // Processing & Evaluation
    // ========================================================================

    /// Run the activity against every network, then check autogenesis
    pub async fn process_activity(&self, activity: &ExternalActivity) -> Result<()> {
        debug!(
            activity_type = %activity.activity_type,
            correlation_id = %activity.correlation_id,
            "Processing external activity"
        );
        for (network_id, handle) in self.registry.snapshot() {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            self.evaluate_network(network_id, &handle, Some(activity))
                .await?;
        }
        self.run_autogenesis_if_due().await
    }

    /// Re-score every network and check autogenesis
    ///
    /// This is the per-tick entry point of the evaluation loop.
    pub async fn evaluate_synergy(&self) -> Result<()> {
        for (network_id, handle) in self.registry.snapshot() {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            self.evaluate_network(network_id, &handle, None).await?;
        }
        self.run_autogenesis_if_due().await
    }

    /// Process, re-score and emergence-check a single network
    async fn evaluate_network(
        &self,
        network_id: NetworkId,
        handle: &NetworkHandle,
        activity: Option<&ExternalActivity>,
    ) -> Result<()> {
        let mut network = handle.write().await;
        if let Some(activity) = activity {
            self.synergy
                .process_activity(&mut network, activity, &self.cancel)
                .await
                .map_err(|e| {
                    error!(network = %network.name, "Activity processing failed: {:#}", e);
                    e.context(format!(
                        "Failed to process activity in network '{}'",
                        network.name
                    ))
                })?;
        }

        let score = network.calculate_synergy_score();
        let emergence = if score >= network.emergence_threshold {
            let capabilities = self.synergy.identify_emergent_capabilities(&network).await;
            Some((network.name.clone(), capabilities))
        } else {
            None
        };
        drop(network);

        if let Some((network_name, capabilities)) = emergence {
            info!(
                network = %network_name,
                synergy_score = score,
                capability_count = capabilities.len(),
                "Emergence detected"
            );
            self.event_bus.publish(SynergyEvent::EmergenceDetected {
                network_id,
                network_name,
                synergy_score: score,
                capabilities,
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    /// Mean of the cached per-network synergy scores, zero when no
    /// networks are registered
    pub async fn overall_synergy_score(&self) -> f64 {
        let networks = self.registry.snapshot();
        if networks.is_empty() {
            return 0.0;
        }
        let mut total = 0.0;
        for (_, handle) in &networks {
            total += handle.read().await.synergy_score;
        }
        total / networks.len() as f64
    }

    // ========================================================================
    // Autogenesis
    // ========================================================================

    /// Run an autogenesis cycle on every network once overall synergy
    /// reaches the configured threshold
    async fn run_autogenesis_if_due(&self) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let overall = self.overall_synergy_score().await;
        if overall < self.config.synergy_threshold {
            return Ok(());
        }
        debug!(
            overall_synergy = overall,
            threshold = self.config.synergy_threshold,
            "Synergy threshold reached, running autogenesis"
        );

        for (network_id, handle) in self.registry.snapshot() {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            let mut network = handle.write().await;
            let result = self
                .autogenesis
                .run_cycle(&mut network, &self.cancel)
                .await
                .map_err(|e| {
                    error!(network = %network.name, "Autogenesis cycle failed: {:#}", e);
                    e.context(format!(
                        "Autogenesis cycle failed for network '{}'",
                        network.name
                    ))
                })?;
            let network_name = network.name.clone();
            drop(network);

            if result.generated_anything() {
                self.event_bus.publish(SynergyEvent::AutogenesisTriggered {
                    network_id,
                    network_name,
                    generated_node_ids: result.generated_node_ids,
                    generated_link_ids: result.generated_link_ids,
                    accepted: result.accepted,
                    fitness_score: result.fitness.overall,
                    trigger_snapshot: result.trigger_snapshot,
                    timestamp: Utc::now(),
                });
            }
        }
        Ok(())
    }

    /// Apply one mutation pass to every network at the configured rate
    pub async fn apply_periodic_mutations(&self) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        for (_, handle) in self.registry.snapshot() {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            let mut network = handle.write().await;
            self.autogenesis
                .apply_mutations(&mut network, self.config.mutation_rate)
                .await
                .with_context(|| format!("Mutation pass failed for network '{}'", network.name))?;
        }
        Ok(())
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Prune, rebalance and reinforce a network's links
    pub async fn optimize_network(&self, network_id: NetworkId) -> Result<NetworkOptimization> {
        let handle = self
            .registry
            .get(&network_id)
            .ok_or_else(|| SynergyError::NetworkNotFound(network_id.to_string()))?;

        let mut network = handle.write().await;
        let optimization = self.synergy.optimize_network(&mut network).await?;
        network.calculate_synergy_score();
        drop(network);

        if !optimization.pruned_link_ids.is_empty() {
            self.event_bus.publish(SynergyEvent::LinksPruned {
                network_id,
                pruned_count: optimization.pruned_link_ids.len(),
                timestamp: Utc::now(),
            });
        }
        Ok(optimization)
    }

    /// Per-node load report for a network
    pub async fn analyze_cognitive_load(
        &self,
        network_id: NetworkId,
    ) -> Result<CognitiveLoadReport> {
        let handle = self
            .registry
            .get(&network_id)
            .ok_or_else(|| SynergyError::NetworkNotFound(network_id.to_string()))?;
        let network = handle.read().await;
        self.synergy.analyze_cognitive_load(&network).await
    }
}
