//! Scenario definitions

use scenariolock_runtime::ScenarioContext;
use std::fmt;
use std::sync::Arc;

/// Step body; receives the scenario's context
pub type StepFn = Arc<dyn Fn(&mut ScenarioContext) -> anyhow::Result<()> + Send + Sync>;

/// Box a closure as a [`StepFn`]
pub fn step_fn<F>(func: F) -> StepFn
where
    F: Fn(&mut ScenarioContext) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(func)
}

#[derive(Clone)]
pub struct Step {
    pub description: String,
    pub(crate) func: StepFn,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("description", &self.description)
            .finish()
    }
}

/// An ordered list of steps run with one shared context
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn step<F>(self, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut ScenarioContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.shared_step(description, step_fn(func))
    }

    /// Append a step that shares an existing body
    pub fn shared_step(mut self, description: impl Into<String>, func: StepFn) -> Self {
        self.steps.push(Step {
            description: description.into(),
            func,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let scenario = Scenario::new("s1")
            .step("first", |_| Ok(()))
            .step("second", |_| Ok(()));

        assert_eq!(scenario.name(), "s1");
        let steps: Vec<&str> = scenario
            .steps()
            .iter()
            .map(|s| s.description.as_str())
            .collect();
        assert_eq!(steps, vec!["first", "second"]);
    }

    #[test]
    fn test_shared_step() {
        let body = step_fn(|_| anyhow::bail!("nope"));
        let scenario = Scenario::new("s1").shared_step("a", body.clone()).shared_step("b", body);

        let mut ctx = ScenarioContext::new("s1");
        assert!((scenario.steps()[1].func)(&mut ctx).is_err());
    }
}
