//! Session service facade.
//!
//! The transport layer calls into [`SessionService`] for every inbound event,
//! every sweeper tick and the "ready" lifecycle signal. The service only
//! orchestrates: one serialized store cycle, then outbound sends once the
//! store lock is released.

use std::sync::Arc;

use serde::Serialize;

use crate::menu::{Effect, MenuRouter, Reply, ReplyCatalog, Transition};
use crate::session::{now_millis, Millis, Session, SessionState, SessionStore};
use crate::sweeper::TimeoutSweeper;
use crate::transport::{InboundEvent, Transport};
use crate::Result;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundOutcome {
    pub identity: String,
    /// State before the message was handled.
    pub previous: SessionState,
    /// State after the message was handled.
    pub state: SessionState,
    /// Text sent back, if any.
    pub reply: Option<String>,
    /// Whether the transport accepted the reply.
    pub delivered: bool,
}

/// Result of one timeout sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Identities closed by this sweep, in storage order.
    pub closed: Vec<String>,
    /// Closure notices the transport failed to deliver.
    pub failed_notices: usize,
}

/// Facade over store, router, sweeper and transport.
pub struct SessionService {
    store: SessionStore,
    router: MenuRouter,
    sweeper: TimeoutSweeper,
    catalog: ReplyCatalog,
    transport: Arc<dyn Transport>,
}

impl SessionService {
    /// Create a service with the default timeout and reply texts.
    pub fn new(store: SessionStore, transport: Arc<dyn Transport>) -> Self {
        Self {
            store,
            router: MenuRouter::new(),
            sweeper: TimeoutSweeper::default(),
            catalog: ReplyCatalog::default(),
            transport,
        }
    }

    /// Use a custom sweeper; the closure notice quotes its timeout.
    pub fn with_sweeper(mut self, sweeper: TimeoutSweeper) -> Self {
        self.catalog = self.catalog.with_timeout(sweeper.timeout());
        self.sweeper = sweeper;
        self
    }

    pub fn with_catalog(mut self, catalog: ReplyCatalog) -> Self {
        self.catalog = catalog.with_timeout(self.sweeper.timeout());
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn sweeper(&self) -> TimeoutSweeper {
        self.sweeper
    }

    pub fn catalog(&self) -> &ReplyCatalog {
        &self.catalog
    }

    /// Handle one inbound message at the current time.
    pub async fn handle_inbound(&self, event: &InboundEvent) -> Result<InboundOutcome> {
        self.handle_inbound_at(event, now_millis()).await
    }

    /// Handle one inbound message as if it arrived at `now`.
    ///
    /// The lookup, routing and mutation run in a single store cycle. If the
    /// cycle cannot be persisted the error is returned and nothing is sent.
    pub async fn handle_inbound_at(
        &self,
        event: &InboundEvent,
        now: Millis,
    ) -> Result<InboundOutcome> {
        let identity = event.identity.as_str();
        let router = self.router;
        let owned_identity = event.identity.clone();
        let body = event.body.clone();

        let (previous, transition) = self
            .store
            .transact_async(move |sessions| {
                let identity = owned_identity.as_str();
                let previous =
                    SessionState::of(sessions.iter().find(|s| s.identity == identity));
                let transition = router.route(previous, &body);

                match transition.effect.apply(sessions, identity, now) {
                    Ok(()) => (previous, transition),
                    Err(e) => {
                        tracing::warn!(identity = %identity, error = %e, "ignoring command");
                        (
                            previous,
                            Transition {
                                reply: None,
                                effect: Effect::None,
                            },
                        )
                    }
                }
            })
            .await
            .map_err(|e| {
                tracing::error!(identity = %identity, error = %e, "inbound message dropped");
                e
            })?;

        let state = transition.next_state(previous);
        tracing::debug!(
            identity = %identity,
            from = %previous,
            to = %state,
            effect = ?transition.effect,
            "inbound message routed"
        );

        let mut outcome = InboundOutcome {
            identity: identity.to_string(),
            previous,
            state,
            reply: None,
            delivered: false,
        };

        if let Some(reply) = transition.reply {
            let text = self.catalog.render(reply);
            outcome.delivered = self.deliver(identity, &text).await;
            outcome.reply = Some(text);
        }

        Ok(outcome)
    }

    /// Run one timeout sweep at the current time.
    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(now_millis()).await
    }

    /// Run one timeout sweep as if the clock read `now`.
    ///
    /// Closures are persisted once for the whole pass; notices go out only
    /// after that write succeeded. A failed notice does not stop the rest.
    pub async fn sweep_at(&self, now: Millis) -> Result<SweepReport> {
        let sweeper = self.sweeper;
        let closed = self
            .store
            .transact_async(move |sessions| sweeper.close_expired(sessions, now))
            .await?;

        let mut report = SweepReport {
            closed,
            failed_notices: 0,
        };
        if report.closed.is_empty() {
            return Ok(report);
        }

        let notice = self.catalog.render(Reply::TimeoutNotice);
        for identity in &report.closed {
            tracing::info!(identity = %identity, "session closed after inactivity");
            if !self.deliver(identity, &notice).await {
                report.failed_notices += 1;
            }
        }

        Ok(report)
    }

    /// Start a fresh run: drop every session on file.
    pub async fn reset(&self) -> Result<()> {
        self.store.clear_async().await
    }

    /// Snapshot of all sessions in storage order.
    pub fn sessions(&self) -> Vec<Session> {
        self.store.load()
    }

    /// Snapshot of one session.
    pub fn session(&self, identity: &str) -> Option<Session> {
        self.store.find(identity)
    }

    async fn deliver(&self, identity: &str, text: &str) -> bool {
        match self.transport.send(identity, text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "outbound message not delivered");
                false
            }
        }
    }
}
