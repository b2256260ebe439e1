//! Session registry
//!
//! Maps chat session ids to agents, one agent per session. The registry is an
//! ordinary value owned by the server state: build it at startup, share it
//! behind an `Arc`, and call [`SessionRegistry::shutdown`] on the way out.
//!
//! # Concurrency
//!
//! The session map sits behind a `parking_lot::RwLock` that is only held for
//! lookups and inserts, never across an `.await`. Each session's agent sits
//! behind its own `tokio::sync::Mutex`, which serializes initialization and
//! queries for that session. What happens to a second message that arrives
//! while the first is still running is decided by [`BusyPolicy`].
//!
//! # Eviction
//!
//! Sessions idle longer than [`SessionConfig::idle_ttl`] are cleaned up by
//! [`SessionRegistry::evict_idle`], which [`SessionRegistry::start_eviction_task`]
//! runs periodically. Sessions with a message in flight are never evicted.

use crate::agents::{AgentFactory, AgentState, SessionAgent};
use crate::types::{AppError, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// What to do with a message for a session that is already answering one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Wait for the in-flight message to finish
    #[default]
    Queue,
    /// Fail immediately with [`AppError::SessionBusy`]
    Reject,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub busy_policy: BusyPolicy,
    /// Idle time before eviction; `None` keeps sessions until cleared
    pub idle_ttl: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            busy_policy: BusyPolicy::Queue,
            idle_ttl: Some(Duration::from_secs(1800)),
        }
    }
}

type AgentGuard = OwnedMutexGuard<Box<dyn SessionAgent>>;

/// One chat session and the agent it owns
pub struct Session {
    id: String,
    agent: Arc<AsyncMutex<Box<dyn SessionAgent>>>,
    last_active: Mutex<Instant>,
}

impl Session {
    fn new(id: &str, agent: Box<dyn SessionAgent>) -> Self {
        Self {
            id: id.to_string(),
            agent: Arc::new(AsyncMutex::new(agent)),
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Time since the session last handled a message
    pub fn idle_for(&self) -> Duration {
        self.last_active.lock().elapsed()
    }

    /// Whether a message is currently being handled
    pub fn is_busy(&self) -> bool {
        self.agent.try_lock().is_err()
    }

    /// Current agent state. Waits if a message is in flight.
    pub async fn state(&self) -> AgentState {
        self.agent.lock().await.state()
    }

    fn touch(&self) {
        *self.last_active.lock() = Instant::now();
    }
}

/// Registry of live sessions
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    factory: Arc<dyn AgentFactory>,
    config: SessionConfig,
    shutdown: AtomicBool,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn AgentFactory>, config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            factory,
            config,
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Return the session for `session_id`, creating and initializing it first
    /// if it does not exist.
    ///
    /// An existing session is returned as is; it is not initialized again. If
    /// initialization fails the half-built agent is cleaned up, the entry is
    /// removed and the error returned, so the next call starts fresh.
    pub async fn get_or_create(&self, session_id: &str) -> Result<Arc<Session>> {
        let (session, _guard) = self.ready_session(session_id).await?;
        Ok(session)
    }

    /// Route one message to the session's agent and return its reply
    pub async fn process(&self, message: &str, session_id: &str) -> Result<String> {
        let (session, mut agent) = self.ready_session(session_id).await?;

        session.touch();
        let response = agent.query(message).await;
        session.touch();

        response
    }

    /// Remove a session and clean up its agent. Unknown ids are ignored.
    ///
    /// Returns whether a session was removed. A message in flight for the
    /// session finishes before cleanup runs.
    pub async fn clear(&self, session_id: &str) -> bool {
        let Some(session) = self.sessions.write().remove(session_id) else {
            debug!(session_id, "Clear requested for unknown session");
            return false;
        };

        session.agent.lock().await.cleanup().await;
        info!(session_id, "Session cleared");
        true
    }

    /// Clean up sessions idle longer than the configured TTL.
    ///
    /// Returns the number of sessions evicted.
    pub async fn evict_idle(&self) -> usize {
        let Some(ttl) = self.config.idle_ttl else {
            return 0;
        };

        let candidates: Vec<Arc<Session>> = self
            .sessions
            .read()
            .values()
            .filter(|session| session.idle_for() >= ttl)
            .cloned()
            .collect();

        let mut evicted = 0;
        for session in candidates {
            let Ok(mut agent) = Arc::clone(&session.agent).try_lock_owned() else {
                debug!(session_id = %session.id, "Skipping busy session during eviction");
                continue;
            };

            // A message may have finished between the scan and the lock
            if session.idle_for() < ttl {
                continue;
            }

            self.remove_entry(&session);
            agent.cleanup().await;
            evicted += 1;

            info!(
                session_id = %session.id,
                idle_secs = session.idle_for().as_secs(),
                "Evicted idle session"
            );
        }

        evicted
    }

    /// Spawn a task that calls [`evict_idle`](Self::evict_idle) every `interval`.
    ///
    /// Returns `None` when eviction is disabled. The task stops after
    /// [`shutdown`](Self::shutdown).
    pub fn start_eviction_task(
        self: &Arc<Self>,
        interval: Duration,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let ttl = self.config.idle_ttl?;
        let registry = Arc::clone(self);

        info!(
            ttl_secs = ttl.as_secs(),
            interval_secs = interval.as_secs(),
            "Starting idle session eviction"
        );

        Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;

                if registry.is_shutdown() {
                    break;
                }

                let evicted = registry.evict_idle().await;
                if evicted > 0 {
                    debug!(evicted, remaining = registry.len(), "Eviction sweep complete");
                }
            }
        }))
    }

    /// Clean up every session. Called once at process exit.
    ///
    /// Returns the number of sessions cleaned up.
    pub async fn shutdown(&self) -> usize {
        self.shutdown.store(true, Ordering::Relaxed);

        let sessions: Vec<Arc<Session>> = self
            .sessions
            .write()
            .drain()
            .map(|(_, session)| session)
            .collect();

        let count = sessions.len();
        for session in sessions {
            session.agent.lock().await.cleanup().await;
        }

        info!(count, "Session registry shut down");
        count
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Resolve a session and hold its agent lock with the agent `Ready`.
    ///
    /// A session found `Closed` was cleared or evicted while we waited for
    /// its lock, so the lookup starts over with a fresh entry.
    async fn ready_session(&self, session_id: &str) -> Result<(Arc<Session>, AgentGuard)> {
        if self.is_shutdown() {
            return Err(AppError::InvalidState(
                "session registry is shut down".to_string(),
            ));
        }

        loop {
            let session = self.slot(session_id);
            let mut agent = self.acquire(&session).await?;

            match agent.state() {
                AgentState::Ready => return Ok((session, agent)),
                AgentState::Uninitialized => {
                    info!(session_id, "Initializing session agent");
                    if let Err(e) = agent.initialize().await {
                        warn!(session_id, error = %e, "Session agent failed to initialize");
                        agent.cleanup().await;
                        self.remove_entry(&session);
                        return Err(e);
                    }
                    return Ok((session, agent));
                }
                AgentState::Initializing => {
                    // An initialization was abandoned mid-way
                    warn!(session_id, "Discarding partially initialized session agent");
                    agent.cleanup().await;
                    self.remove_entry(&session);
                }
                AgentState::Closed => {
                    self.remove_entry(&session);
                }
            }
        }
    }

    /// Look up or insert the entry for `session_id` without awaiting
    fn slot(&self, session_id: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().get(session_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write();
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "Creating session");
            Arc::new(Session::new(session_id, self.factory.create(session_id)))
        });
        Arc::clone(session)
    }

    async fn acquire(&self, session: &Arc<Session>) -> Result<AgentGuard> {
        let agent = Arc::clone(&session.agent);
        match self.config.busy_policy {
            BusyPolicy::Queue => Ok(agent.lock_owned().await),
            BusyPolicy::Reject => agent
                .try_lock_owned()
                .map_err(|_| AppError::SessionBusy(session.id.clone())),
        }
    }

    /// Remove `session` from the map if the map still points at it
    fn remove_entry(&self, session: &Arc<Session>) {
        let mut sessions = self.sessions.write();
        if sessions
            .get(&session.id)
            .is_some_and(|current| Arc::ptr_eq(current, session))
        {
            sessions.remove(&session.id);
        }
    }
}
