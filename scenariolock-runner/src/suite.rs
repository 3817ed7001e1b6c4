//! Parallel scenario suite
//!
//! Scenarios run on a fixed number of worker threads. Each scenario gets a
//! fresh [`ScenarioContext`]; before hooks, steps and after hooks all see
//! that same context. After hooks always run, even when a before hook or a
//! step failed or panicked.

use crate::report::{Failure, Outcome, ScenarioReport, SuiteReport};
use crate::scenario::Scenario;
use log::{debug, info, warn};
use parking_lot::Mutex;
use scenariolock_runtime::{HookFn, HookSet, Registrar, ScenarioContext};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

/// Environment variable overriding the worker count
pub const CONCURRENCY_ENV: &str = "SCENARIOLOCK_CONCURRENCY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOptions {
    /// Number of worker threads; at least one is always used
    pub concurrency: usize,

    /// Stop starting new scenarios after the first failure
    pub stop_on_failure: bool,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            stop_on_failure: false,
        }
    }
}

impl SuiteOptions {
    /// Defaults, with the worker count taken from `SCENARIOLOCK_CONCURRENCY`
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(value) = std::env::var(CONCURRENCY_ENV) {
            match parse_concurrency(&value) {
                Some(concurrency) => options.concurrency = concurrency,
                None => warn!(
                    "ignoring {}={:?}, expected a positive integer",
                    CONCURRENCY_ENV, value
                ),
            }
        }

        options
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }
}

fn default_concurrency() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn parse_concurrency(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

/// A set of scenarios plus the lifecycle hooks registered on them
pub struct Suite {
    options: SuiteOptions,
    hooks: HookSet,
    scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(options: SuiteOptions) -> Self {
        Self {
            options,
            hooks: HookSet::new(),
            scenarios: Vec::new(),
        }
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    pub fn scenarios(mut self, scenarios: impl IntoIterator<Item = Scenario>) -> Self {
        self.scenarios.extend(scenarios);
        self
    }

    pub fn options(&self) -> &SuiteOptions {
        &self.options
    }

    /// Run every scenario and collect reports in definition order
    pub fn run(&self) -> SuiteReport {
        let total = self.scenarios.len();
        let workers = self.options.concurrency.max(1).min(total.max(1));
        info!("running {} scenarios on {} workers", total, workers);

        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let reports: Mutex<Vec<Option<ScenarioReport>>> = Mutex::new(vec![None; total]);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(scenario) = self.scenarios.get(index) else {
                        break;
                    };

                    let report = if stop.load(Ordering::SeqCst) {
                        ScenarioReport::skipped(scenario.name())
                    } else {
                        self.run_scenario(scenario)
                    };

                    if report.outcome == Outcome::Failed && self.options.stop_on_failure {
                        stop.store(true, Ordering::SeqCst);
                    }

                    reports.lock()[index] = Some(report);
                });
            }
        });

        let scenarios = reports
            .into_inner()
            .into_iter()
            .zip(&self.scenarios)
            .map(|(report, scenario)| {
                report.unwrap_or_else(|| ScenarioReport::skipped(scenario.name()))
            })
            .collect();

        SuiteReport { scenarios }
    }

    fn run_scenario(&self, scenario: &Scenario) -> ScenarioReport {
        let started = Instant::now();
        let mut ctx = ScenarioContext::new(scenario.name());
        let mut failures = Vec::new();
        let mut steps_passed = 0;

        debug!("scenario {:?} starting", scenario.name());

        match panic::catch_unwind(AssertUnwindSafe(|| self.hooks.run_before(&mut ctx))) {
            Err(payload) => failures.push(Failure::BeforeHook(panic_message(payload.as_ref()))),
            Ok(Err(err)) => failures.push(Failure::BeforeHook(err.to_string())),
            Ok(Ok(())) => {
                for step in scenario.steps() {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| (step.func)(&mut ctx)));

                    match result {
                        Ok(Ok(())) => steps_passed += 1,
                        Ok(Err(err)) => {
                            failures.push(Failure::Step {
                                step: step.description.clone(),
                                message: format!("{:#}", err),
                            });
                            break;
                        }
                        Err(payload) => {
                            failures.push(Failure::Panic {
                                step: step.description.clone(),
                                message: panic_message(payload.as_ref()),
                            });
                            break;
                        }
                    }
                }
            }
        }

        // Each after hook runs even if an earlier one failed or panicked.
        for hook in &self.hooks.after {
            match panic::catch_unwind(AssertUnwindSafe(|| hook(&mut ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => failures.push(Failure::AfterHook(err.to_string())),
                Err(payload) => {
                    failures.push(Failure::AfterHook(panic_message(payload.as_ref())))
                }
            }
        }

        let outcome = if failures.is_empty() {
            Outcome::Passed
        } else {
            warn!(
                "scenario {:?} failed: {}",
                scenario.name(),
                failures
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
            Outcome::Failed
        };

        ScenarioReport {
            name: scenario.name().to_string(),
            outcome,
            steps_passed,
            failures,
            duration: started.elapsed(),
        }
    }
}

impl Registrar for Suite {
    fn before_scenario(&mut self, hook: HookFn) {
        self.hooks.before_scenario(hook);
    }

    fn after_scenario(&mut self, hook: HookFn) {
        self.hooks.after_scenario(hook);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
