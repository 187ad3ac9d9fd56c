// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod autogenesis_engine;
pub mod evaluation_loop;
pub mod orchestrator;
pub mod synergy_service;

// Re-export services for convenience
pub use autogenesis_engine::{
    AutogenesisEngine, AutogenesisResult, FitnessEvaluation, MutationSummary, NetworkAnalysis,
    StandardAutogenesisEngine, StructuralMutation,
};
pub use evaluation_loop::EvaluationLoop;
pub use orchestrator::SynergyOrchestrator;
pub use synergy_service::{
    CognitiveLoadReport, NetworkOptimization, StandardSynergyService, SynergyService,
};
