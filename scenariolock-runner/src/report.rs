//! Scenario and suite outcomes

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a scenario failed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Failure {
    #[error("before hook failed: {0}")]
    BeforeHook(String),

    #[error("step {step:?} failed: {message}")]
    Step { step: String, message: String },

    #[error("step {step:?} panicked: {message}")]
    Panic { step: String, message: String },

    #[error("after hook failed: {0}")]
    AfterHook(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Passed,
    Failed,
    /// Not started because an earlier scenario failed with `stop_on_failure`
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: Outcome,
    pub steps_passed: usize,
    pub failures: Vec<Failure>,
    pub duration: Duration,
}

impl ScenarioReport {
    pub(crate) fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: Outcome::Skipped,
            steps_passed: 0,
            failures: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Results for a whole suite, in scenario definition order
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Process exit status: 0 when every scenario passed, 1 otherwise
    pub fn status(&self) -> i32 {
        if self.scenarios.iter().all(ScenarioReport::is_passed) {
            0
        } else {
            1
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios
            .iter()
            .filter(|s| s.outcome == Outcome::Failed)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.scenarios.iter().filter(|s| s.outcome == outcome).count()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scenario in self.failed() {
            writeln!(f, "Scenario: {}", scenario.name)?;
            for failure in &scenario.failures {
                writeln!(f, "  {}", failure)?;
            }
        }

        write!(
            f,
            "{} scenarios ({} passed, {} failed, {} skipped)",
            self.scenarios.len(),
            self.count(Outcome::Passed),
            self.count(Outcome::Failed),
            self.count(Outcome::Skipped)
        )
    }
}
