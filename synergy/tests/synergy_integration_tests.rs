// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use aegis_synergy::application::SynergyOrchestrator;
use aegis_synergy::domain::{
    AutogenesisConfig, CognitiveNode, ExternalActivity, LinkType, NetworkId, NodeType,
    SynergyError, SynergyEvent, SynergyLink,
};
use aegis_synergy::infrastructure::EventBusError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn quiet_config() -> AutogenesisConfig {
    AutogenesisConfig {
        enabled: false,
        ..Default::default()
    }
}

async fn next_event_of<F>(
    receiver: &mut aegis_synergy::infrastructure::EventReceiver,
    mut matches: F,
) -> SynergyEvent
where
    F: FnMut(&SynergyEvent) -> bool,
{
    loop {
        let event = timeout(Duration::from_secs(1), receiver.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event bus closed");
        if matches(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn test_emergence_event_when_score_crosses_threshold() {
    let orchestrator = SynergyOrchestrator::with_defaults(quiet_config());
    let network = orchestrator.create_network("emergent", None).await.unwrap();

    // Two active schema nodes joined by one strong link:
    // connectivity 0.5, mean attention 0.8, mean strength 0.9
    // score = 0.4 * 0.5 + 0.3 * 0.8 + 0.3 * 0.9 = 0.71 >= 0.7
    let first = CognitiveNode::new(NodeType::Schema).with_attention(0.8);
    let second = CognitiveNode::new(NodeType::Schema).with_attention(0.8);
    let link = SynergyLink::new(first.id, second.id, LinkType::Association).with_strength(0.9);
    assert!(orchestrator.add_node(network.id, first).await);
    assert!(orchestrator.add_node(network.id, second).await);
    assert!(orchestrator.create_link(network.id, link).await);

    let mut receiver = orchestrator.event_bus().subscribe();
    orchestrator.evaluate_synergy().await.unwrap();

    let event = next_event_of(&mut receiver, |e| {
        matches!(e, SynergyEvent::EmergenceDetected { .. })
    })
    .await;
    match event {
        SynergyEvent::EmergenceDetected {
            network_id,
            network_name,
            synergy_score,
            ..
        } => {
            assert_eq!(network_id, network.id);
            assert_eq!(network_name, "emergent");
            assert!((synergy_score - 0.71).abs() < 1e-9);
        }
        _ => unreachable!(),
    }

    let snapshot = orchestrator.network_snapshot(network.id).await.unwrap();
    assert!((snapshot.synergy_score - 0.71).abs() < 1e-9);
}

#[tokio::test]
async fn test_overall_score_without_networks_is_zero() {
    let orchestrator = SynergyOrchestrator::with_defaults(quiet_config());

    assert_eq!(orchestrator.network_count(), 0);
    assert_eq!(orchestrator.overall_synergy_score().await, 0.0);

    // Evaluating an empty registry is a no-op, not an error
    orchestrator.evaluate_synergy().await.unwrap();
}

#[tokio::test]
async fn test_unknown_network_rejects_components_silently() {
    let orchestrator = SynergyOrchestrator::with_defaults(quiet_config());
    let mut receiver = orchestrator.event_bus().subscribe();

    let node = CognitiveNode::new(NodeType::Concept);
    let link = SynergyLink::new(node.id, node.id, LinkType::Association);

    assert!(!orchestrator.add_node(NetworkId::new(), node).await);
    assert!(!orchestrator.create_link(NetworkId::new(), link).await);

    // Nothing was created, so nothing was announced
    assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    assert_eq!(orchestrator.network_count(), 0);
}

#[tokio::test]
async fn test_zero_mutation_rate_leaves_networks_identical() {
    let config = AutogenesisConfig {
        enabled: true,
        mutation_rate: 0.0,
        ..Default::default()
    };
    let orchestrator = SynergyOrchestrator::with_defaults(config);
    let network = orchestrator.create_network("stable", None).await.unwrap();

    let first = CognitiveNode::new(NodeType::Concept).with_attention(0.6);
    let second = CognitiveNode::new(NodeType::Predicate).with_attention(0.4);
    let third = CognitiveNode::new(NodeType::Schema).with_attention(0.7);
    let link_a = SynergyLink::new(first.id, second.id, LinkType::Association);
    let link_b = SynergyLink::new(second.id, third.id, LinkType::Similarity);
    orchestrator.add_node(network.id, first).await;
    orchestrator.add_node(network.id, second).await;
    orchestrator.add_node(network.id, third).await;
    orchestrator.create_link(network.id, link_a).await;
    orchestrator.create_link(network.id, link_b).await;

    let before = orchestrator.network_snapshot(network.id).await.unwrap();
    orchestrator.apply_periodic_mutations().await.unwrap();
    let after = orchestrator.network_snapshot(network.id).await.unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn test_saturated_network_generates_nothing() {
    let config = AutogenesisConfig {
        enabled: true,
        synergy_threshold: 0.0,
        max_auto_nodes: 3,
        ..Default::default()
    };
    let orchestrator = SynergyOrchestrator::with_defaults(config);
    let network = orchestrator.create_network("full", None).await.unwrap();
    for _ in 0..3 {
        orchestrator
            .add_node(network.id, CognitiveNode::new(NodeType::Concept))
            .await;
    }

    let mut receiver = orchestrator.event_bus().subscribe();
    orchestrator.evaluate_synergy().await.unwrap();

    let snapshot = orchestrator.network_snapshot(network.id).await.unwrap();
    assert_eq!(snapshot.node_count(), 3);
    assert_eq!(snapshot.link_count(), 0);

    // A cycle with no growth potential raises no autogenesis event
    while let Ok(event) = receiver.try_recv() {
        assert!(!matches!(event, SynergyEvent::AutogenesisTriggered { .. }));
    }
}

#[tokio::test]
async fn test_autogenesis_grows_network_when_fitness_passes() {
    let config = AutogenesisConfig {
        enabled: true,
        synergy_threshold: 0.0,
        fitness_threshold: 0.0,
        ..Default::default()
    };
    let orchestrator = SynergyOrchestrator::with_defaults(config);
    let network = orchestrator.create_network("growing", None).await.unwrap();
    for _ in 0..4 {
        orchestrator
            .add_node(network.id, CognitiveNode::new(NodeType::Concept))
            .await;
    }

    let mut receiver = orchestrator.event_bus().subscribe();
    orchestrator.evaluate_synergy().await.unwrap();

    let event = next_event_of(&mut receiver, |e| {
        matches!(e, SynergyEvent::AutogenesisTriggered { .. })
    })
    .await;
    let SynergyEvent::AutogenesisTriggered {
        accepted,
        generated_node_ids,
        ..
    } = event
    else {
        unreachable!()
    };
    assert!(accepted);
    assert!(!generated_node_ids.is_empty());

    let snapshot = orchestrator.network_snapshot(network.id).await.unwrap();
    assert_eq!(snapshot.node_count(), 4 + generated_node_ids.len());
    for node_id in &generated_node_ids {
        let node = snapshot.get_node(node_id).expect("generated node merged");
        assert!(node.metadata.contains_key("generated_by"));
    }
}

#[tokio::test]
async fn test_activity_processing_over_seeded_network() {
    let orchestrator = Arc::new(SynergyOrchestrator::with_defaults(quiet_config()));
    Arc::clone(&orchestrator).initialize().await.unwrap();

    let primary_id = orchestrator.network_ids()[0];

    let activity = ExternalActivity::new("message").with_text("schedule a meeting");
    orchestrator.process_activity(&activity).await.unwrap();

    let network = orchestrator.network_snapshot(primary_id).await.unwrap();
    // Every seeded node starts at 0.5 attention and activates on a
    // message activity, so attention rises
    assert!(network.nodes.values().all(|n| n.attention_value > 0.5));
    assert!(network.nodes.values().all(|n| n.is_active));

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_optimize_prunes_weak_links_and_reports() {
    let orchestrator = SynergyOrchestrator::with_defaults(quiet_config());
    let network = orchestrator.create_network("tuned", None).await.unwrap();

    let first = CognitiveNode::new(NodeType::Concept);
    let second = CognitiveNode::new(NodeType::Concept);
    let weak = SynergyLink::new(first.id, second.id, LinkType::Association).with_strength(0.1);
    let strong = SynergyLink::new(second.id, first.id, LinkType::Association).with_strength(0.9);
    let weak_id = weak.id;
    orchestrator.add_node(network.id, first).await;
    orchestrator.add_node(network.id, second).await;
    orchestrator.create_link(network.id, weak).await;
    orchestrator.create_link(network.id, strong).await;

    let mut receiver = orchestrator.event_bus().subscribe();
    let optimization = orchestrator.optimize_network(network.id).await.unwrap();

    assert_eq!(optimization.pruned_link_ids, vec![weak_id]);
    let event = next_event_of(&mut receiver, |e| {
        matches!(e, SynergyEvent::LinksPruned { .. })
    })
    .await;
    let SynergyEvent::LinksPruned { pruned_count, .. } = event else {
        unreachable!()
    };
    assert_eq!(pruned_count, 1);

    let snapshot = orchestrator.network_snapshot(network.id).await.unwrap();
    assert!(snapshot.get_link(&weak_id).is_none());
    assert_eq!(snapshot.link_count(), 1);
}

#[tokio::test]
async fn test_diagnostics_on_unknown_network() {
    let orchestrator = SynergyOrchestrator::with_defaults(quiet_config());
    let unknown = NetworkId::new();

    assert!(matches!(
        orchestrator.network_snapshot(unknown).await,
        Err(SynergyError::NetworkNotFound(_))
    ));
    assert!(orchestrator.optimize_network(unknown).await.is_err());
    assert!(orchestrator.analyze_cognitive_load(unknown).await.is_err());
}

#[tokio::test]
async fn test_cognitive_load_report_for_seeded_network() {
    let orchestrator = Arc::new(SynergyOrchestrator::with_defaults(quiet_config()));
    Arc::clone(&orchestrator).initialize().await.unwrap();

    let network_id = orchestrator.network_ids()[0];
    let report = orchestrator.analyze_cognitive_load(network_id).await.unwrap();

    // Five seeded nodes, all active, all reported
    assert_eq!(report.node_loads.len(), 5);
    assert!(report.overall_load > 0.0);

    orchestrator.shutdown().await;
}
