#![allow(dead_code)]

use scenariolock_runtime::*;
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Test fixture holding a journaling lock
pub struct TestFixture {
    pub lock: Arc<ResourceLock>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    pub fn with_config(config: LockConfig) -> Self {
        init_logging();
        Self {
            lock: Arc::new(ResourceLock::with_config(config.record_events(true))),
        }
    }

    pub fn from_lock(lock: ResourceLock) -> Self {
        init_logging();
        Self {
            lock: Arc::new(lock),
        }
    }

    /// Context with the before hook already run
    pub fn scenario(&self, name: &str) -> ScenarioContext {
        let mut ctx = ScenarioContext::new(name);
        self.lock.before_scenario(&mut ctx);
        ctx
    }

    pub fn events(&self) -> Vec<LockEvent> {
        self.lock.events()
    }

    pub fn count(&self, pred: impl Fn(&LockEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(*e)).count()
    }

    pub fn assert_mutual_exclusion(&self) {
        let holds = intervals(&self.events());
        let overlaps = find_overlaps(&holds);

        assert!(
            overlaps.is_empty(),
            "Overlapping holds detected: {:?}",
            overlaps
        );
    }
}
