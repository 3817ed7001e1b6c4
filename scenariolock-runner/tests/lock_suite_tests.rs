use scenariolock_runner::*;
use scenariolock_runtime::{LockConfig, LockEvent, ResourceLock};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Reusable lock steps, shared by every scenario in a suite
struct LockSteps {
    lock: Arc<ResourceLock>,
}

impl LockSteps {
    fn new(lock: ResourceLock) -> Self {
        init_logging();
        Self {
            lock: Arc::new(lock),
        }
    }

    fn suite(&self, concurrency: usize) -> Suite {
        let mut suite = Suite::new(SuiteOptions::default().concurrency(concurrency));
        self.lock.register(&mut suite);
        suite
    }

    fn acquire(&self, name: &str) -> StepFn {
        let lock = Arc::clone(&self.lock);
        let name = name.to_string();
        step_fn(move |ctx| {
            if !lock.acquire(ctx, &name)? {
                anyhow::bail!("failed to acquire lock");
            }
            Ok(())
        })
    }

    fn acquire_again(&self, name: &str) -> StepFn {
        let lock = Arc::clone(&self.lock);
        let name = name.to_string();
        step_fn(move |ctx| {
            if lock.acquire(ctx, &name)? {
                anyhow::bail!("{} was not held by this scenario", name);
            }
            Ok(())
        })
    }

    fn should_be_blocked(&self, name: &str) -> StepFn {
        let lock = Arc::clone(&self.lock);
        let name = name.to_string();
        step_fn(move |ctx| {
            if !lock.is_locked(ctx, &name) {
                anyhow::bail!("{} is not locked", name);
            }
            Ok(())
        })
    }

    fn should_not_be_blocked(&self, name: &str) -> StepFn {
        let lock = Arc::clone(&self.lock);
        let name = name.to_string();
        step_fn(move |ctx| {
            if lock.is_locked(ctx, &name) {
                anyhow::bail!("{} is locked", name);
            }
            Ok(())
        })
    }
}

fn sleep(ms: u64) -> StepFn {
    step_fn(move |_| {
        thread::sleep(Duration::from_millis(ms));
        Ok(())
    })
}

fn contended_scenarios(steps: &LockSteps, count: usize) -> Vec<Scenario> {
    (0..count)
        .map(|i| {
            Scenario::new(format!("contender {}", i))
                .shared_step("I acquire \"foo\"", steps.acquire("foo"))
                .shared_step("I sleep", sleep(5 + (i as u64 % 5)))
                .shared_step("I acquire \"foo\" again", steps.acquire_again("foo"))
                .shared_step("I should not be blocked for \"foo\"", steps.should_not_be_blocked("foo"))
        })
        .collect()
}

#[test]
fn test_no_block_for_distinct_resources() {
    let steps = LockSteps::new(ResourceLock::new());

    let scenarios: Vec<Scenario> = (0..10)
        .map(|i| {
            let own = format!("res{}", i);
            Scenario::new(format!("independent {}", i))
                .shared_step("I acquire my resource", steps.acquire(&own))
                .shared_step("I sleep", sleep(5))
                .shared_step("I should not be blocked", steps.should_not_be_blocked(&own))
        })
        .collect();

    let report = steps.suite(10).scenarios(scenarios).run();

    assert_eq!(report.status(), 0, "{}", report);
    assert!(steps.lock.held_resources().is_empty());
}

#[test]
fn test_blocked_scenarios_take_turns() {
    let steps = LockSteps::new(ResourceLock::with_config(
        LockConfig::default().record_events(true),
    ));

    let report = steps.suite(10).scenarios(contended_scenarios(&steps, 10)).run();

    assert_eq!(report.status(), 0, "{}", report);

    let events = steps.lock.events();
    let holds = scenariolock_runtime::intervals(&events);
    assert_eq!(holds.len(), 10);
    assert!(scenariolock_runtime::find_overlaps(&holds).is_empty());
    assert!(events.iter().any(LockEvent::is_waiting));
}

#[test]
fn test_other_scenario_sees_lock() {
    let steps = LockSteps::new(ResourceLock::new());
    let barrier = Arc::new(Barrier::new(2));

    let (held, checked) = (Arc::clone(&barrier), Arc::clone(&barrier));
    let (held2, checked2) = (Arc::clone(&barrier), barrier);

    let owner = Scenario::new("owner")
        .shared_step("I acquire \"bar\"", steps.acquire("bar"))
        .step("others may look", move |_| {
            held.wait();
            checked.wait();
            Ok(())
        });

    let observer = Scenario::new("observer")
        .step("owner holds bar", move |_| {
            held2.wait();
            Ok(())
        })
        .shared_step("I should be blocked for \"bar\"", steps.should_be_blocked("bar"))
        .step("let owner finish", move |_| {
            checked2.wait();
            Ok(())
        });

    let report = steps.suite(2).scenario(owner).scenario(observer).run();
    assert_eq!(report.status(), 0, "{}", report);
}

#[test]
fn test_failing_release_marks_scenarios_failed() {
    let steps = LockSteps::new(ResourceLock::new().with_on_release(|_| Err("failed".into())));

    let report = steps.suite(10).scenarios(contended_scenarios(&steps, 5)).run();

    assert_eq!(report.status(), 1);
    for scenario in &report.scenarios {
        assert_eq!(scenario.steps_passed, 4, "{}", scenario.name);
        assert!(matches!(
            &scenario.failures[..],
            [Failure::AfterHook(message)] if message.split(", ").all(|m| m == "failed")
        ));
    }
    assert!(steps.lock.held_resources().is_empty());
}

#[test]
fn test_panicking_release_does_not_strand_waiters() {
    let steps = LockSteps::new(ResourceLock::new().with_on_release(|name| {
        panic!("release of {} panicked", name)
    }));
    let suite = steps.suite(5).scenarios(contended_scenarios(&steps, 5));

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(suite.run());
    });
    let report = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("suite stalled behind a panicking release");

    assert_eq!(report.status(), 1);
    for scenario in &report.scenarios {
        assert_eq!(scenario.steps_passed, 4, "{}", scenario.name);
        assert_eq!(
            scenario.failures,
            vec![Failure::AfterHook("release of foo panicked".to_string())]
        );
    }
    assert!(steps.lock.held_resources().is_empty());
}

#[test]
fn test_unregistered_lock_reports_missing_token() {
    init_logging();
    let lock = Arc::new(ResourceLock::new());
    let step_lock = Arc::clone(&lock);

    let report = Suite::new(SuiteOptions::default())
        .scenario(Scenario::new("mis-wired").step("I acquire \"x\"", move |ctx| {
            step_lock.acquire(ctx, "x")?;
            Ok(())
        }))
        .run();

    assert_eq!(report.status(), 1);
    assert_eq!(
        report.scenarios[0].failures,
        vec![Failure::Step {
            step: "I acquire \"x\"".to_string(),
            message: "missing scenario lock key in context".to_string(),
        }]
    );
}

#[test]
fn test_failed_step_still_releases() {
    let steps = LockSteps::new(ResourceLock::new());

    let failing = Scenario::new("fails while holding")
        .shared_step("I acquire \"foo\"", steps.acquire("foo"))
        .step("boom", |_| anyhow::bail!("step failed"));
    let follower = Scenario::new("follower")
        .shared_step("I sleep", sleep(20))
        .shared_step("I acquire \"foo\"", steps.acquire("foo"));

    let report = steps.suite(2).scenario(failing).scenario(follower).run();

    assert_eq!(report.scenarios[0].outcome, Outcome::Failed);
    assert_eq!(report.scenarios[1].outcome, Outcome::Passed);
    assert!(steps.lock.held_resources().is_empty());
}
