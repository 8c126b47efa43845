mod common;

use std::{sync::Arc, time::Duration};

use common::{
    BrokenStore, SOLUTION, ScriptedAnalyzer, memory_store, placeholder, recording_gateway,
    registry_of,
};
use serde_json::json;
use swarm_debug_core::{
    AgentOutcome, DebugSession, HookGateway, HookKind, MemoryStore, RecordingHookRunner,
    SessionContext, keys,
};
use swarm_debug_session::{
    Coordinator, CoordinatorError, NO_WORKERS_SOLUTION, RegistryError, WorkerRegistry,
};
use swarm_debug_store::SqliteMemoryStore;
use tokio_test::{assert_err, assert_ok};

const SPECIALISTS: [&str; 5] = [
    "FrontendDebugger",
    "BackendDebugger",
    "SystemIntegrator",
    "TestCoordinator",
    "PerformanceAnalyzer",
];

#[tokio::test]
async fn test_tab_bar_scenario() {
    let (hooks, runner) = recording_gateway();
    let coordinator = Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks);
    assert_eq!(assert_ok!(coordinator.initialize().await), 5);

    let session = coordinator
        .coordinate_debugging_session("mobile tab bar broken", None)
        .await
        .unwrap();

    assert!(session.session_id.starts_with("debug-session-"));
    assert_eq!(session.issue, "mobile tab bar broken");
    assert_eq!(session.agent_results.names().collect::<Vec<_>>(), SPECIALISTS);
    for name in SPECIALISTS {
        assert_eq!(
            session.agent_results.get(name),
            Some(&AgentOutcome::Completed(placeholder(name)))
        );
    }
    assert_eq!(session.coordinated_solution, SOLUTION);

    // Synthesis is done by the first worker after every investigation.
    let calls = coordinator.analyzer().calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[5].0, "FrontendDebugger");
    assert!(calls[5].1.is_synthesis());
    assert_eq!(calls[5].1.findings().len(), 5);

    assert_eq!(
        runner.kinds(),
        [
            HookKind::Notify,
            HookKind::PreTask,
            HookKind::PostTask,
            HookKind::Notify
        ]
    );
    let (_, pre_task) = &runner.calls()[1];
    assert_eq!(pre_task.get("task-id"), Some(session.session_id.as_str()));
    assert_eq!(
        pre_task.get("description"),
        Some("Swarms debugging session: mobile tab bar broken...")
    );
}

#[tokio::test]
async fn test_session_is_persisted() {
    let (hooks, _) = recording_gateway();
    let coordinator = Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks);
    coordinator.initialize().await.unwrap();

    let session = coordinator
        .coordinate_debugging_session("mobile tab bar broken", None)
        .await
        .unwrap();

    let stored = coordinator
        .store()
        .get(&keys::session(&session.session_id))
        .await
        .unwrap()
        .expect("session record");
    let decoded: DebugSession = serde_json::from_value(stored).unwrap();
    assert_eq!(decoded, session);
}

#[tokio::test]
async fn test_visibility_follows_dispatch_order() {
    let (hooks, _) = recording_gateway();
    let coordinator = Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks);
    coordinator
        .initialize_with(registry_of(&["A", "B", "C"]))
        .await
        .unwrap();

    coordinator
        .coordinate_debugging_session("flaky build", None)
        .await
        .unwrap();

    let seen: Vec<(String, Vec<String>)> = coordinator
        .analyzer()
        .investigations()
        .into_iter()
        .map(|(worker, request)| {
            let names = request.findings().names().map(str::to_string).collect();
            (worker, names)
        })
        .collect();

    assert_eq!(
        seen,
        [
            ("A".to_string(), vec![]),
            ("B".to_string(), vec!["A".to_string()]),
            ("C".to_string(), vec!["A".to_string(), "B".to_string()]),
        ]
    );

    let (_, last) = coordinator.analyzer().investigations().pop().unwrap();
    let findings = last.findings();
    assert_eq!(findings.get("A"), Some(&AgentOutcome::Completed(placeholder("A"))));
    assert_eq!(findings.get("B"), Some(&AgentOutcome::Completed(placeholder("B"))));
    assert!(!findings.contains("C"));
}

#[tokio::test]
async fn test_failing_worker_is_isolated() {
    let (hooks, _) = recording_gateway();
    let analyzer = ScriptedAnalyzer::new().failing("B");
    let coordinator = Coordinator::new(memory_store(), analyzer, hooks);
    coordinator
        .initialize_with(registry_of(&["A", "B", "C"]))
        .await
        .unwrap();

    let session = coordinator
        .coordinate_debugging_session("flaky build", None)
        .await
        .unwrap();

    let results = &session.agent_results;
    assert_eq!(results.len(), 3);
    assert_eq!(results.get("A"), Some(&AgentOutcome::Completed(placeholder("A"))));
    assert_eq!(results.get("C"), Some(&AgentOutcome::Completed(placeholder("C"))));
    assert_eq!(
        results.get("B").unwrap().to_string(),
        "Error: Analysis failed: B crashed"
    );
    assert_eq!(results.success_count(), 2);

    // C only sees successful findings.
    let (_, last) = coordinator.analyzer().investigations().pop().unwrap();
    assert_eq!(last.findings().names().collect::<Vec<_>>(), ["A"]);

    // The synthesizer sees every result, failures included.
    let (_, synthesis) = coordinator.analyzer().calls().pop().unwrap();
    assert!(synthesis.findings().contains("B"));
    assert_eq!(session.coordinated_solution, SOLUTION);
}

#[tokio::test]
async fn test_stalled_worker_times_out() {
    let (hooks, _) = recording_gateway();
    let analyzer = ScriptedAnalyzer::new().stalling("A");
    let coordinator = Coordinator::new(memory_store(), analyzer, hooks)
        .with_analysis_timeout(Duration::from_millis(50));
    coordinator
        .initialize_with(registry_of(&["A", "B"]))
        .await
        .unwrap();

    let session = coordinator
        .coordinate_debugging_session("deadlock", None)
        .await
        .unwrap();

    let outcome = session.agent_results.get("A").unwrap();
    assert!(!outcome.is_success());
    assert!(outcome.to_string().starts_with("Error: Analysis timed out"));
    assert!(session.agent_results.get("B").unwrap().is_success());
}

#[tokio::test]
async fn test_failed_synthesis_is_recorded() {
    let (hooks, _) = recording_gateway();
    let analyzer = ScriptedAnalyzer::new().failing_synthesis();
    let coordinator = Coordinator::new(memory_store(), analyzer, hooks);
    coordinator.initialize().await.unwrap();

    let session = coordinator
        .coordinate_debugging_session("mobile tab bar broken", None)
        .await
        .unwrap();

    assert_eq!(session.agent_results.success_count(), 5);
    assert_eq!(
        session.coordinated_solution,
        "Error: Analysis failed: synthesis backend offline"
    );
}

#[tokio::test]
async fn test_hook_failures_are_not_fatal() {
    let runner = Arc::new(RecordingHookRunner::failing("npx: command not found"));
    let coordinator = Coordinator::new(
        memory_store(),
        ScriptedAnalyzer::new(),
        HookGateway::new(runner.clone()),
    );
    assert_ok!(coordinator.initialize().await);

    let session = coordinator
        .coordinate_debugging_session("mobile tab bar broken", None)
        .await
        .unwrap();

    assert_eq!(session.agent_results.len(), 5);
    assert_eq!(session.coordinated_solution, SOLUTION);

    let log = coordinator.coordination_log();
    assert_eq!(log.len(), 4);
    assert_eq!(log.failure_count(), 4);
    assert!(
        log.entries()
            .iter()
            .all(|e| e.error.as_deref() == Some("Hook could not be launched: npx: command not found"))
    );
}

#[tokio::test]
async fn test_store_failures_are_not_fatal() {
    let (hooks, runner) = recording_gateway();
    let coordinator = Coordinator::new(BrokenStore, ScriptedAnalyzer::new(), hooks);
    coordinator.initialize().await.unwrap();

    let session = coordinator
        .coordinate_debugging_session("mobile tab bar broken", None)
        .await
        .unwrap();

    assert_eq!(session.agent_results.len(), 5);
    assert!(session.context.is_empty());
    assert_eq!(runner.kinds().last(), Some(&HookKind::Notify));
}

#[tokio::test]
async fn test_uninitialized_coordinator_refuses_sessions() {
    let (hooks, runner) = recording_gateway();
    let coordinator = Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks);

    let err = assert_err!(
        coordinator
            .coordinate_debugging_session("mobile tab bar broken", None)
            .await
    );
    assert!(matches!(err, CoordinatorError::NotInitialized));
    assert!(coordinator.analyzer().calls().is_empty());
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_previous_context_is_merged() {
    let (hooks, _) = recording_gateway();
    let coordinator = Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks);
    coordinator.initialize().await.unwrap();
    coordinator
        .store()
        .put(keys::DEBUG_CONTEXT, &json!({"last_issue": "tab bar flicker"}))
        .await
        .unwrap();

    let mut context = SessionContext::new();
    context.set("platform", json!("ios"));
    let session = coordinator
        .coordinate_debugging_session("mobile tab bar broken", Some(context))
        .await
        .unwrap();

    assert_eq!(session.context.get("platform"), Some(&json!("ios")));
    assert_eq!(
        session.context.previous_findings(),
        Some(&json!({"last_issue": "tab bar flicker"}))
    );
}

#[tokio::test]
async fn test_empty_registry_has_sentinel_solution() {
    let (hooks, _) = recording_gateway();
    let coordinator = Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks);
    coordinator
        .initialize_with(WorkerRegistry::from_workers(Vec::new(), 5).unwrap())
        .await
        .unwrap();

    let session = coordinator
        .coordinate_debugging_session("anything", None)
        .await
        .unwrap();

    assert!(session.agent_results.is_empty());
    assert_eq!(session.coordinated_solution, NO_WORKERS_SOLUTION);
    assert!(coordinator.analyzer().calls().is_empty());
}

#[tokio::test]
async fn test_initialize_records_metadata() {
    let (hooks, runner) = recording_gateway();
    let coordinator = Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks);
    assert!(!coordinator.is_initialized().await);

    coordinator.initialize().await.unwrap();

    assert!(coordinator.is_initialized().await);
    let metadata = coordinator
        .store()
        .get(keys::METADATA)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(metadata["agent_count"], json!(5));
    assert_eq!(metadata["agent_names"], json!(SPECIALISTS));
    assert_eq!(metadata["coordination_type"], json!("sequential_debugging"));
    assert!(metadata["initialized_at"].is_string());

    let (_, notify) = &runner.calls()[0];
    assert_eq!(notify.get("level"), Some("success"));
    assert_eq!(
        notify.get("message"),
        Some("Debug swarm initialized with 5 agents")
    );
}

#[tokio::test]
async fn test_initialize_with_zero_capacity() {
    let (hooks, runner) = recording_gateway();
    let coordinator =
        Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks).with_max_workers(0);

    let err = coordinator.initialize().await.unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::Registry(RegistryError::ZeroCapacity)
    ));
    assert!(!coordinator.is_initialized().await);

    let (kind, params) = &runner.calls()[0];
    assert_eq!(*kind, HookKind::Notify);
    assert_eq!(params.get("level"), Some("error"));
}

#[tokio::test]
async fn test_initialize_respects_capacity() {
    let (hooks, _) = recording_gateway();
    let coordinator =
        Coordinator::new(memory_store(), ScriptedAnalyzer::new(), hooks).with_max_workers(2);

    assert_eq!(coordinator.initialize().await.unwrap(), 2);
    assert_eq!(
        coordinator.registry().await.unwrap().names(),
        ["FrontendDebugger", "BackendDebugger"]
    );

    let err = coordinator
        .initialize_with(registry_of(&["A", "B", "C"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::Registry(RegistryError::CapacityExceeded { count: 3, max: 2 })
    ));
}

#[tokio::test]
async fn test_sqlite_backed_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".swarm").join("memory.db");
    let (hooks, _) = recording_gateway();

    let coordinator = Coordinator::new(SqliteMemoryStore::new(&path), ScriptedAnalyzer::new(), hooks);
    coordinator.initialize().await.unwrap();
    let session = coordinator
        .coordinate_debugging_session("mobile tab bar broken", None)
        .await
        .unwrap();
    coordinator.store().close().await;

    let reopened = SqliteMemoryStore::open(&path).await.unwrap();
    let stored = reopened
        .get(&keys::session(&session.session_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["coordinated_solution"], json!(SOLUTION));
    assert_eq!(
        stored["agent_results"]
            .as_object()
            .unwrap()
            .keys()
            .count(),
        5
    );
    reopened.close().await;
}
