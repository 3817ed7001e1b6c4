//! Host runner integration

use crate::context::ScenarioContext;
use crate::error::Result;
use std::sync::Arc;

/// Lifecycle hook invoked by the host runner with the scenario's context
pub type HookFn = Arc<dyn Fn(&mut ScenarioContext) -> Result<()> + Send + Sync>;

/// Box a closure as a [`HookFn`]
pub fn hook_fn<F>(hook: F) -> HookFn
where
    F: Fn(&mut ScenarioContext) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(hook)
}

/// The host-runner side of hook registration
///
/// Before hooks run once per scenario ahead of its first step; after hooks
/// run once its steps have finished, whether they passed or failed. An
/// after hook error marks the scenario failed.
pub trait Registrar {
    fn before_scenario(&mut self, hook: HookFn);
    fn after_scenario(&mut self, hook: HookFn);
}

/// Collects hooks without running them
#[derive(Default, Clone)]
pub struct HookSet {
    pub before: Vec<HookFn>,
    pub after: Vec<HookFn>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every before hook, stopping at the first error
    pub fn run_before(&self, ctx: &mut ScenarioContext) -> Result<()> {
        for hook in &self.before {
            hook(ctx)?;
        }
        Ok(())
    }

    /// Run every after hook, collecting all errors
    pub fn run_after(&self, ctx: &mut ScenarioContext) -> Vec<crate::LockError> {
        self.after.iter().filter_map(|hook| hook(ctx).err()).collect()
    }
}

impl Registrar for HookSet {
    fn before_scenario(&mut self, hook: HookFn) {
        self.before.push(hook);
    }

    fn after_scenario(&mut self, hook: HookFn) {
        self.after.push(hook);
    }
}
