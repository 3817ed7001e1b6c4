//! One-shot owner signal
//!
//! Waiters block on an [`OwnerSignal`] until the owning scenario finishes.
//! The transition from open to signaled happens exactly once; later calls to
//! [`OwnerSignal::signal`] are no-ops.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// One-shot, closable wait object
#[derive(Debug, Default)]
pub struct OwnerSignal {
    /// Guards the open -> signaled transition
    fired: AtomicBool,

    /// Mirrors `fired` under the mutex the condvar waits on
    state: Mutex<bool>,
    cond: Condvar,
}

impl OwnerSignal {
    /// Create an open signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal all current and future waiters
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// signal had already fired.
    pub fn signal(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let mut state = self.state.lock();
        *state = true;
        self.cond.notify_all();
        true
    }

    /// Whether the signal has fired
    pub fn is_signaled(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Block until the signal fires
    pub fn wait(&self) {
        let mut state = self.state.lock();
        while !*state {
            self.cond.wait(&mut state);
        }
    }

    /// Block until the signal fires or `timeout` elapses
    ///
    /// Returns `true` if the signal fired.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !*state {
            if self.cond.wait_until(&mut state, deadline).timed_out() {
                return *state;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_signal_once() {
        let signal = OwnerSignal::new();
        assert!(!signal.is_signaled());

        assert!(signal.signal());
        assert!(signal.is_signaled());

        // second close is a no-op
        assert!(!signal.signal());
        assert!(signal.is_signaled());
    }

    #[test]
    fn test_wait_after_signal_returns() {
        let signal = OwnerSignal::new();
        signal.signal();
        signal.wait();
        assert!(signal.wait_for(Duration::from_millis(1)));
    }

    #[test]
    fn test_wait_for_times_out() {
        let signal = OwnerSignal::new();
        assert!(!signal.wait_for(Duration::from_millis(10)));
    }

    #[test]
    fn test_signal_wakes_waiters() {
        let signal = Arc::new(OwnerSignal::new());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || signal.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        signal.signal();

        for waiter in waiters {
            waiter.join().unwrap();
        }
    }

    #[test]
    fn test_concurrent_signal_fires_once() {
        let signal = Arc::new(OwnerSignal::new());

        let fired: usize = (0..8)
            .map(|_| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || signal.signal())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        assert_eq!(fired, 1);
    }
}
