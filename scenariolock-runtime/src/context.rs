//! Scenario execution context

use crate::token::OwnerToken;
use std::collections::HashMap;

/// Per-scenario state threaded through every step by the host runner
///
/// Each [`ResourceLock`](crate::ResourceLock) binds its own token under its
/// instance id, so several locks can share one context without colliding.
#[derive(Debug, Default)]
pub struct ScenarioContext {
    scenario: String,
    tokens: HashMap<u64, OwnerToken>,
}

impl ScenarioContext {
    /// Create an empty context for the named scenario
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            tokens: HashMap::new(),
        }
    }

    /// Scenario name, for diagnostics
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Bind `token` for the lock with id `lock_id`, replacing any earlier one
    ///
    /// [`ResourceLock::before_scenario`](crate::ResourceLock::before_scenario)
    /// only rebinds once the earlier token has been released.
    pub fn bind(&mut self, lock_id: u64, token: OwnerToken) {
        self.tokens.insert(lock_id, token);
    }

    /// Token bound by the lock with id `lock_id`
    pub fn token(&self, lock_id: u64) -> Option<&OwnerToken> {
        self.tokens.get(&lock_id)
    }
}
