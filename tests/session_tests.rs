//! Session registry behavior: creation, reuse, clearing, busy policy and
//! idle eviction.

mod common;

use common::mocks::{AgentCounters, CountingAgentFactory};
use ledger_agents::agents::{AgentState, BusyPolicy, SessionConfig, SessionRegistry};
use ledger_agents::types::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn registry(
    factory: CountingAgentFactory,
    config: SessionConfig,
) -> (Arc<SessionRegistry>, Arc<AgentCounters>) {
    let counters = Arc::clone(&factory.counters);
    (Arc::new(SessionRegistry::new(Arc::new(factory), config)), counters)
}

fn queue_config() -> SessionConfig {
    SessionConfig {
        busy_policy: BusyPolicy::Queue,
        idle_ttl: None,
    }
}

#[tokio::test]
async fn test_first_message_creates_and_initializes_once() {
    let (sessions, counters) = registry(CountingAgentFactory::new(), queue_config());

    let reply = sessions.process("What is my balance?", "s1").await.unwrap();

    assert_eq!(reply, "[s1] What is my balance?");
    assert_eq!(counters.created(), 1);
    assert_eq!(counters.initialized(), 1);
    assert!(sessions.contains("s1"));
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_existing_session_is_reused() {
    let (sessions, counters) = registry(CountingAgentFactory::new(), queue_config());

    let first = sessions.get_or_create("s1").await.unwrap();
    let second = sessions.get_or_create("s1").await.unwrap();
    sessions.process("hello", "s1").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.id(), "s1");
    assert_eq!(first.state().await, AgentState::Ready);
    assert_eq!(counters.created(), 1);
    assert_eq!(counters.initialized(), 1);
}

#[tokio::test]
async fn test_concurrent_first_messages_initialize_once() {
    let factory = CountingAgentFactory::new().with_init_delay(Duration::from_millis(50));
    let (sessions, counters) = registry(factory, queue_config());

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let sessions = Arc::clone(&sessions);
            tokio::spawn(async move { sessions.process(&format!("msg {}", i), "s1").await })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }

    assert_eq!(counters.created(), 1);
    assert_eq!(counters.initialized(), 1);
    assert_eq!(counters.queries(), 8);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let (sessions, counters) = registry(CountingAgentFactory::new(), queue_config());

    assert_eq!(sessions.process("hi", "a").await.unwrap(), "[a] hi");
    assert_eq!(sessions.process("hi", "b").await.unwrap(), "[b] hi");

    assert_eq!(counters.created(), 2);
    assert_eq!(sessions.len(), 2);
}

#[tokio::test]
async fn test_clear_cleans_up_once_and_removes() {
    let (sessions, counters) = registry(CountingAgentFactory::new(), queue_config());
    let session = sessions.get_or_create("s1").await.unwrap();

    assert!(sessions.clear("s1").await);
    assert_eq!(counters.cleanups(), 1);
    assert!(!sessions.contains("s1"));
    assert_eq!(session.state().await, AgentState::Closed);

    assert!(!sessions.clear("s1").await);
    assert_eq!(counters.cleanups(), 1);
}

#[tokio::test]
async fn test_clear_unknown_session_is_noop() {
    let (sessions, counters) = registry(CountingAgentFactory::new(), queue_config());

    assert!(!sessions.clear("never-seen").await);
    assert_eq!(counters.created(), 0);
    assert_eq!(counters.cleanups(), 0);
}

#[tokio::test]
async fn test_message_after_clear_gets_fresh_agent() {
    let (sessions, counters) = registry(CountingAgentFactory::new(), queue_config());

    let first = sessions.get_or_create("s1").await.unwrap();
    sessions.clear("s1").await;
    let second = sessions.get_or_create("s1").await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(counters.created(), 2);
    assert_eq!(counters.initialized(), 2);
}

#[tokio::test]
async fn test_failed_initialization_removes_entry() {
    let factory = CountingAgentFactory::new().with_failing_inits(1);
    let (sessions, counters) = registry(factory, queue_config());

    let err = sessions.process("hi", "s1").await.unwrap_err();
    assert!(matches!(err, AppError::Mcp(_)));
    assert!(!sessions.contains("s1"));
    assert_eq!(counters.cleanups(), 1);

    // The next message starts over with a new agent
    assert_eq!(sessions.process("hi", "s1").await.unwrap(), "[s1] hi");
    assert_eq!(counters.created(), 2);
    assert_eq!(counters.initialized(), 2);
}

#[tokio::test]
async fn test_reject_policy_fails_fast_when_busy() {
    let factory = CountingAgentFactory::new().with_query_delay(Duration::from_millis(200));
    let (sessions, counters) = registry(
        factory,
        SessionConfig {
            busy_policy: BusyPolicy::Reject,
            idle_ttl: None,
        },
    );
    sessions.get_or_create("s1").await.unwrap();

    let in_flight = {
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move { sessions.process("slow", "s1").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = sessions.process("second", "s1").await.unwrap_err();
    assert!(matches!(err, AppError::SessionBusy(ref id) if id == "s1"));

    assert!(in_flight.await.unwrap().is_ok());
    assert_eq!(counters.queries(), 1);

    // Once idle again the session accepts messages
    assert!(sessions.process("third", "s1").await.is_ok());
}

#[tokio::test]
async fn test_queue_policy_serializes_messages() {
    let factory = CountingAgentFactory::new().with_query_delay(Duration::from_millis(100));
    let (sessions, counters) = registry(factory, queue_config());
    sessions.get_or_create("s1").await.unwrap();

    let first = {
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move { sessions.process("one", "s1").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let started = Instant::now();
    sessions.get_or_create("s1").await.unwrap();
    // Waited for the in-flight query to release the session
    assert!(started.elapsed() >= Duration::from_millis(50));

    assert_eq!(first.await.unwrap().unwrap(), "[s1] one");
    assert_eq!(sessions.process("two", "s1").await.unwrap(), "[s1] two");
    assert_eq!(counters.queries(), 2);
}

#[tokio::test]
async fn test_idle_sessions_are_evicted() {
    let (sessions, counters) = registry(
        CountingAgentFactory::new(),
        SessionConfig {
            busy_policy: BusyPolicy::Queue,
            idle_ttl: Some(Duration::from_millis(50)),
        },
    );

    sessions.process("hi", "idle").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    sessions.process("hi", "active").await.unwrap();

    let evicted = sessions.evict_idle().await;

    assert_eq!(evicted, 1);
    assert!(!sessions.contains("idle"));
    assert!(sessions.contains("active"));
    assert_eq!(counters.cleanups(), 1);
}

#[tokio::test]
async fn test_busy_sessions_are_not_evicted() {
    let factory = CountingAgentFactory::new().with_query_delay(Duration::from_millis(200));
    let (sessions, counters) = registry(
        factory,
        SessionConfig {
            busy_policy: BusyPolicy::Queue,
            idle_ttl: Some(Duration::from_millis(10)),
        },
    );
    let session = sessions.get_or_create("s1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let in_flight = {
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move { sessions.process("slow", "s1").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(session.is_busy());

    assert_eq!(sessions.evict_idle().await, 0);
    assert!(sessions.contains("s1"));
    assert!(in_flight.await.unwrap().is_ok());
    assert_eq!(counters.cleanups(), 0);
}

#[tokio::test]
async fn test_eviction_disabled_without_ttl() {
    let (sessions, _counters) = registry(CountingAgentFactory::new(), queue_config());
    sessions.process("hi", "s1").await.unwrap();

    assert_eq!(sessions.evict_idle().await, 0);
    assert!(sessions.start_eviction_task(Duration::from_millis(10)).is_none());
}

#[tokio::test]
async fn test_eviction_task_sweeps_periodically() {
    let (sessions, counters) = registry(
        CountingAgentFactory::new(),
        SessionConfig {
            busy_policy: BusyPolicy::Queue,
            idle_ttl: Some(Duration::from_millis(30)),
        },
    );
    sessions.process("hi", "s1").await.unwrap();

    let task = sessions
        .start_eviction_task(Duration::from_millis(20))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(sessions.is_empty());
    assert_eq!(counters.cleanups(), 1);

    sessions.shutdown().await;
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_cleans_up_every_session() {
    let (sessions, counters) = registry(CountingAgentFactory::new(), queue_config());
    for id in ["a", "b", "c"] {
        sessions.process("hi", id).await.unwrap();
    }

    assert_eq!(sessions.shutdown().await, 3);
    assert_eq!(counters.cleanups(), 3);
    assert!(sessions.is_empty());

    let err = sessions.process("hi", "a").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}
