// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Synergy Evaluation Loop - Background task for periodic re-scoring
//!
//! Drives the continuous part of the engine: every tick re-scores all
//! networks, lets autogenesis react to the overall synergy level and
//! applies one mutation pass.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements internal responsibilities for evaluation loop
//! - **Related ADRs:** ADR-032: Autogenesis Evaluation Cadence

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::application::orchestrator::SynergyOrchestrator;
use crate::domain::SynergyEvent;

/// Synergy Evaluation Loop - Background task
pub struct EvaluationLoop {
    orchestrator: Arc<SynergyOrchestrator>,
    interval: Duration,
    shutdown_token: tokio_util::sync::CancellationToken,
}

impl EvaluationLoop {
    pub fn new(orchestrator: Arc<SynergyOrchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
            shutdown_token: tokio_util::sync::CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> tokio_util::sync::CancellationToken {
        self.shutdown_token.clone()
    }

    /// Start the evaluation background task
    /// Returns a handle that can be used to stop the task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the evaluation loop with graceful shutdown support
    async fn run(&self) {
        info!(
            interval = ?self.interval,
            "Starting synergy evaluation background task"
        );

        let mut tick = interval(self.interval);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    debug!("Running synergy evaluation cycle");

                    match self.evaluation_cycle().await {
                        Ok(overall_score) => {
                            debug!(
                                overall_score,
                                "Synergy evaluation cycle completed successfully"
                            );
                        }
                        Err(e) => {
                            warn!("Synergy evaluation cycle failed: {:#}", e);
                        }
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping evaluation loop");
                    break;
                }
            }
        }

        info!("Synergy evaluation background task stopped");
    }

    /// Execute a single evaluation cycle
    async fn evaluation_cycle(&self) -> Result<f64> {
        let started = std::time::Instant::now();

        self.orchestrator.evaluate_synergy().await?;
        self.orchestrator.apply_periodic_mutations().await?;

        let overall_synergy_score = self.orchestrator.overall_synergy_score().await;
        self.orchestrator
            .event_bus()
            .publish(SynergyEvent::EvaluationCycleCompleted {
                networks_evaluated: self.orchestrator.network_count(),
                overall_synergy_score,
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });

        Ok(overall_synergy_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AutogenesisConfig;

    fn orchestrator() -> Arc<SynergyOrchestrator> {
        let config = AutogenesisConfig {
            enabled: false,
            ..Default::default()
        };
        Arc::new(SynergyOrchestrator::with_defaults(config))
    }

    #[tokio::test]
    async fn test_evaluation_cycle_publishes_completion() {
        let orchestrator = orchestrator();
        orchestrator.create_network("looped", None).await.unwrap();
        let mut receiver = orchestrator.event_bus().subscribe();

        let evaluation_loop =
            EvaluationLoop::new(Arc::clone(&orchestrator), Duration::from_secs(60));
        evaluation_loop.evaluation_cycle().await.unwrap();

        loop {
            match receiver.recv().await.unwrap() {
                SynergyEvent::EvaluationCycleCompleted {
                    networks_evaluated, ..
                } => {
                    assert_eq!(networks_evaluated, 1);
                    break;
                }
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_loop_stops_on_shutdown() {
        let evaluation_loop = Arc::new(EvaluationLoop::new(
            orchestrator(),
            Duration::from_secs(3600),
        ));
        let token = evaluation_loop.shutdown_token();

        let handle = evaluation_loop.start();
        token.cancel();

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_cycle_reports_overall_score() {
        let orchestrator = orchestrator();
        let evaluation_loop =
            EvaluationLoop::new(Arc::clone(&orchestrator), Duration::from_secs(60));

        // No networks registered, so the overall score is zero
        let score = evaluation_loop.evaluation_cycle().await.unwrap();
        assert_eq!(score, 0.0);
    }
}
