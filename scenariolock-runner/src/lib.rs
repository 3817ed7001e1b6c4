//! ScenarioLock Runner
//!
//! A small host for [`scenariolock_runtime`]: it runs scenarios in parallel
//! worker threads and calls the registered before and after hooks around
//! each one, threading a [`ScenarioContext`](scenariolock_runtime::ScenarioContext)
//! through every step.
//!
//! # Example
//!
//! ```rust
//! use scenariolock_runner::*;
//! use scenariolock_runtime::ResourceLock;
//! use std::sync::Arc;
//!
//! let lock = Arc::new(ResourceLock::new());
//! let step_lock = Arc::clone(&lock);
//!
//! let mut suite = Suite::new(SuiteOptions::default().concurrency(4)).scenario(
//!     Scenario::new("write report").step("acquire the report file", move |ctx| {
//!         step_lock.acquire(ctx, "report.txt")?;
//!         Ok(())
//!     }),
//! );
//! lock.register(&mut suite);
//!
//! assert_eq!(suite.run().status(), 0);
//! ```

pub mod report;
pub mod scenario;
pub mod suite;

pub use report::{Failure, Outcome, ScenarioReport, SuiteReport};
pub use scenario::{step_fn, Scenario, Step, StepFn};
pub use suite::{Suite, SuiteOptions, CONCURRENCY_ENV};
