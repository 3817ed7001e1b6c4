//! Scenario-scoped resource lock

use crate::config::{LockConfig, ReleaseScope};
use crate::context::ScenarioContext;
use crate::error::{BoxError, LockError, ReleaseErrors, ReleaseFailure, Result};
use crate::event::LockEvent;
use crate::hooks::{hook_fn, Registrar};
use crate::journal::{Journal, JournalExport};
use crate::registry::{Claim, Registry};
use crate::token::OwnerToken;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Instance ids, so each lock binds tokens under its own context key
static LOCK_IDS: AtomicU64 = AtomicU64::new(1);

/// Cleanup callback invoked with a resource name at teardown
pub type ReleaseFn = Box<dyn Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Exclusive access to named resources for concurrent scenarios
///
/// A scenario owns every resource it acquires until its after hook runs.
/// Acquiring a resource held by another scenario blocks until that
/// scenario finishes; acquiring one already held by the caller returns
/// immediately with `Ok(false)`.
pub struct ResourceLock {
    id: u64,
    registry: Mutex<Registry>,
    on_release: Option<ReleaseFn>,
    config: LockConfig,
    journal: Journal,
}

impl ResourceLock {
    /// Create a lock with default configuration and no release callback
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    pub fn with_config(config: LockConfig) -> Self {
        Self {
            id: LOCK_IDS.fetch_add(1, Ordering::Relaxed),
            registry: Mutex::new(Registry::new()),
            on_release: None,
            journal: Journal::new(config.record_events),
            config,
        }
    }

    /// Set the callback run for resources visited at teardown
    ///
    /// The callback runs while the registry mutex is held and must not call
    /// back into this lock.
    pub fn with_on_release<F>(mut self, on_release: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_release = Some(Box::new(on_release));
        self
    }

    /// Context key this lock binds its tokens under
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Attach this lock's before and after hooks to a host runner
    pub fn register<R: Registrar + ?Sized>(self: &Arc<Self>, registrar: &mut R) {
        let lock = Arc::clone(self);
        registrar.before_scenario(hook_fn(move |ctx| {
            lock.before_scenario(ctx);
            Ok(())
        }));

        let lock = Arc::clone(self);
        registrar.after_scenario(hook_fn(move |ctx| lock.after_scenario(ctx)));
    }

    /// Mint a fresh token and bind it into `ctx`
    ///
    /// A context that already carries an unreleased token from this lock
    /// keeps it; the existing token is returned.
    pub fn before_scenario(&self, ctx: &mut ScenarioContext) -> OwnerToken {
        if let Some(existing) = ctx.token(self.id).filter(|t| !t.is_released()) {
            warn!(
                "scenario {:?} already bound owner token {}, keeping it",
                ctx.scenario(),
                existing.id()
            );
            return existing.clone();
        }

        let token = OwnerToken::mint();
        debug!(
            "scenario {:?} bound owner token {}",
            ctx.scenario(),
            token.id()
        );
        self.journal.record(|seq| LockEvent::TokenBound {
            seq,
            scenario: ctx.scenario().to_string(),
            token: token.id(),
        });

        ctx.bind(self.id, token.clone());
        token
    }

    /// Acquire `name` for the scenario owning `ctx`
    ///
    /// Returns `Ok(true)` if the resource was free and is now held,
    /// `Ok(false)` if this scenario already held it. Blocks without a
    /// timeout while another scenario holds it.
    pub fn acquire(&self, ctx: &ScenarioContext, name: &str) -> Result<bool> {
        self.acquire_until(ctx, name, None)
    }

    /// Like [`acquire`](Self::acquire), but gives up after `timeout`
    pub fn acquire_timeout(
        &self,
        ctx: &ScenarioContext,
        name: &str,
        timeout: Duration,
    ) -> Result<bool> {
        self.acquire_until(ctx, name, Some(timeout))
    }

    fn acquire_until(
        &self,
        ctx: &ScenarioContext,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let token = ctx.token(self.id).ok_or(LockError::MissingOwnerToken)?;
        let started = Instant::now();
        let deadline = timeout.map(|timeout| started + timeout);

        loop {
            let holder = {
                let mut registry = self.registry.lock();

                // Released tokens are signaled under this mutex.
                if token.is_released() {
                    return Err(LockError::MissingOwnerToken);
                }

                match registry.claim(name, token) {
                    Claim::Acquired => {
                        debug!("scenario {:?} acquired {:?}", ctx.scenario(), name);
                        self.record(ctx, token, name, |seq, scenario, token, resource| {
                            LockEvent::Acquired {
                                seq,
                                scenario,
                                token,
                                resource,
                            }
                        });
                        return Ok(true);
                    }
                    Claim::Reentered => {
                        debug!("scenario {:?} already holds {:?}", ctx.scenario(), name);
                        self.record(ctx, token, name, |seq, scenario, token, resource| {
                            LockEvent::Reentered {
                                seq,
                                scenario,
                                token,
                                resource,
                            }
                        });
                        return Ok(false);
                    }
                    Claim::HeldBy(holder) => {
                        let holder_id = holder.id();
                        self.record(ctx, token, name, |seq, scenario, token, resource| {
                            LockEvent::Waiting {
                                seq,
                                scenario,
                                token,
                                resource,
                                holder: holder_id,
                            }
                        });
                        holder
                    }
                }
            };

            trace!(
                "scenario {:?} waiting for {:?} held by token {}",
                ctx.scenario(),
                name,
                holder.id()
            );

            match deadline {
                None => holder.signal().wait(),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if !holder.signal().wait_for(remaining) {
                        warn!(
                            "scenario {:?} gave up waiting for {:?}",
                            ctx.scenario(),
                            name
                        );
                        self.record(ctx, token, name, |seq, scenario, token, resource| {
                            LockEvent::TimedOut {
                                seq,
                                scenario,
                                token,
                                resource,
                            }
                        });
                        return Err(LockError::Timeout {
                            resource: name.to_string(),
                            waited: started.elapsed(),
                        });
                    }
                }
            }

            trace!("scenario {:?} woke for {:?}, retrying", ctx.scenario(), name);
        }
    }

    /// True if `name` is held by a scenario other than the caller's
    ///
    /// A context without a token from this lock sees every holder as foreign.
    pub fn is_locked(&self, ctx: &ScenarioContext, name: &str) -> bool {
        let registry = self.registry.lock();

        match (registry.holder(name), ctx.token(self.id)) {
            (Some(holder), Some(own)) => !holder.same_owner(own),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Sorted names of every held resource
    pub fn held_resources(&self) -> Vec<String> {
        self.registry.lock().names()
    }

    /// Sorted names held by the scenario owning `ctx`
    pub fn owned_by(&self, ctx: &ScenarioContext) -> Vec<String> {
        match ctx.token(self.id) {
            Some(token) => self.registry.lock().names_owned_by(token),
            None => Vec::new(),
        }
    }

    /// Release everything held by the scenario owning `ctx`
    ///
    /// Runs the release callback for the entries selected by
    /// [`ReleaseScope`], then signals the scenario's token so blocked
    /// acquirers retry. The token is signaled even if the callback panics.
    /// Safe to call more than once for one scenario.
    pub fn after_scenario(&self, ctx: &ScenarioContext) -> Result<()> {
        let token = ctx.token(self.id).ok_or(LockError::MissingOwnerToken)?;
        let scenario = ctx.scenario();
        let mut failures = Vec::new();

        let mut registry = self.registry.lock();
        let mut close = CloseOnDrop::new(token);

        for entry in registry.sweep(token) {
            if entry.released {
                debug!("scenario {:?} released {:?}", scenario, entry.name);
                self.record(ctx, token, &entry.name, |seq, scenario, token, resource| {
                    LockEvent::Released {
                        seq,
                        scenario,
                        token,
                        resource,
                    }
                });
            }

            if self.config.release_scope == ReleaseScope::Owned && !entry.released {
                continue;
            }

            let Some(on_release) = &self.on_release else {
                continue;
            };

            if let Err(err) = on_release(&entry.name) {
                let message = err.to_string();
                warn!(
                    "release callback failed for {:?} in scenario {:?}: {}",
                    entry.name, scenario, message
                );
                self.journal.record(|seq| LockEvent::ReleaseFailed {
                    seq,
                    scenario: scenario.to_string(),
                    resource: entry.name.clone(),
                    message: message.clone(),
                });
                failures.push(ReleaseFailure {
                    resource: entry.name,
                    message,
                });
            }
        }

        let first_close = close.close();
        if !first_close {
            warn!("repeated teardown for scenario {:?}", scenario);
        }
        self.journal.record(|seq| LockEvent::TokenClosed {
            seq,
            scenario: scenario.to_string(),
            token: token.id(),
            repeated: !first_close,
        });

        drop(registry);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LockError::Release(ReleaseErrors::new(
                failures,
                &self.config.error_separator,
            )))
        }
    }

    /// Snapshot of the recorded journal
    pub fn events(&self) -> Vec<LockEvent> {
        self.journal.events()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn export_journal(&self) -> JournalExport {
        JournalExport::new(self.journal.events())
    }

    fn record(
        &self,
        ctx: &ScenarioContext,
        token: &OwnerToken,
        resource: &str,
        build: impl FnOnce(u64, String, u64, String) -> LockEvent,
    ) {
        self.journal.record(|seq| {
            build(
                seq,
                ctx.scenario().to_string(),
                token.id(),
                resource.to_string(),
            )
        });
    }
}

/// Signals the token when dropped, so a panicking release callback still
/// wakes the scenarios waiting on it.
struct CloseOnDrop<'a> {
    token: &'a OwnerToken,
    closed: bool,
}

impl<'a> CloseOnDrop<'a> {
    fn new(token: &'a OwnerToken) -> Self {
        Self {
            token,
            closed: false,
        }
    }

    /// Returns `true` if this call performed the transition
    fn close(&mut self) -> bool {
        self.closed = true;
        self.token.signal().signal()
    }
}

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        if !self.closed {
            warn!("release interrupted, closing owner token {}", self.token.id());
            self.token.signal().signal();
        }
    }
}

impl Default for ResourceLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLock")
            .field("id", &self.id)
            .field("held", &self.registry.lock().len())
            .field("on_release", &self.on_release.is_some())
            .field("config", &self.config)
            .finish()
    }
}
