//! ScenarioLock Runtime
//!
//! This crate coordinates exclusive access to shared external resources
//! (files, rows, accounts) between test scenarios running in parallel.
//!
//! # Design Principles
//!
//! - **Scenario ownership**: a resource belongs to the scenario that acquired it until that scenario ends
//! - **Re-entrancy**: acquiring a resource you already hold never blocks
//! - **Release on teardown**: the after hook frees every held resource, pass or fail
//! - **Explicit state**: each [`ResourceLock`] owns its registry; there is no global lock table
//!
//! # Architecture
//!
//! 1. The host runner calls the before hook, which binds an [`OwnerToken`] into the [`ScenarioContext`]
//! 2. Steps call [`ResourceLock::acquire`] with that context
//! 3. Contended acquires wait on the holder's [`OwnerSignal`] outside the registry mutex, then retry
//! 4. The after hook sweeps the registry, runs the release callback and signals the token
//!
//! # Example
//!
//! ```rust
//! use scenariolock_runtime::*;
//!
//! let lock = ResourceLock::new();
//!
//! let mut ctx = ScenarioContext::new("write a file");
//! lock.before_scenario(&mut ctx);
//!
//! assert!(lock.acquire(&ctx, "/tmp/data.txt").unwrap());
//! // Already ours: no new exclusivity, no blocking
//! assert!(!lock.acquire(&ctx, "/tmp/data.txt").unwrap());
//!
//! lock.after_scenario(&ctx).unwrap();
//! assert!(lock.held_resources().is_empty());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod hooks;
pub mod journal;
pub mod lock;
pub mod registry;
pub mod signal;
pub mod token;

pub use config::{LockConfig, ReleaseScope};
pub use context::ScenarioContext;
pub use error::{BoxError, LockError, ReleaseErrors, ReleaseFailure, Result};
pub use event::LockEvent;
pub use hooks::{hook_fn, HookFn, HookSet, Registrar};
pub use journal::{find_overlaps, intervals, HoldInterval, Journal, JournalExport, JournalSummary};
pub use lock::{ReleaseFn, ResourceLock};
pub use signal::OwnerSignal;
pub use token::OwnerToken;
