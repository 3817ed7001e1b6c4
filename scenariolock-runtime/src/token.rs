//! Per-scenario ownership tokens

use crate::signal::OwnerSignal;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global token counter, used for log and journal labels only
static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying one running scenario
///
/// Clones share the same identity. Two tokens are the same owner only if
/// they were cloned from one minted token; the numeric id is never used for
/// comparison.
#[derive(Clone)]
pub struct OwnerToken {
    id: u64,
    signal: Arc<OwnerSignal>,
}

impl OwnerToken {
    /// Mint a fresh token with an open signal
    pub fn mint() -> Self {
        Self {
            id: TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed),
            signal: Arc::new(OwnerSignal::new()),
        }
    }

    /// Identity comparison
    pub fn same_owner(&self, other: &OwnerToken) -> bool {
        Arc::ptr_eq(&self.signal, &other.signal)
    }

    /// Label for diagnostics
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the owning scenario has finished
    pub fn is_released(&self) -> bool {
        self.signal.is_signaled()
    }

    pub(crate) fn signal(&self) -> &OwnerSignal {
        &self.signal
    }
}

impl fmt::Debug for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerToken")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish()
    }
}
