//! Event types recorded by the lock journal

use serde::{Deserialize, Serialize};

/// A change in resource ownership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LockEvent {
    /// Before hook bound a fresh token
    TokenBound {
        seq: u64,
        scenario: String,
        token: u64,
    },

    /// Resource was free and is now held
    Acquired {
        seq: u64,
        scenario: String,
        token: u64,
        resource: String,
    },

    /// Scenario acquired a resource it already held
    Reentered {
        seq: u64,
        scenario: String,
        token: u64,
        resource: String,
    },

    /// Scenario is about to block on another holder
    Waiting {
        seq: u64,
        scenario: String,
        token: u64,
        resource: String,
        holder: u64,
    },

    /// Teardown removed a held resource
    Released {
        seq: u64,
        scenario: String,
        token: u64,
        resource: String,
    },

    /// Release callback returned an error
    ReleaseFailed {
        seq: u64,
        scenario: String,
        resource: String,
        message: String,
    },

    /// After hook signaled the token; `repeated` marks a second teardown
    TokenClosed {
        seq: u64,
        scenario: String,
        token: u64,
        repeated: bool,
    },

    /// Timed acquire gave up
    TimedOut {
        seq: u64,
        scenario: String,
        token: u64,
        resource: String,
    },
}

impl LockEvent {
    /// Journal sequence number
    pub fn seq(&self) -> u64 {
        match self {
            LockEvent::TokenBound { seq, .. }
            | LockEvent::Acquired { seq, .. }
            | LockEvent::Reentered { seq, .. }
            | LockEvent::Waiting { seq, .. }
            | LockEvent::Released { seq, .. }
            | LockEvent::ReleaseFailed { seq, .. }
            | LockEvent::TokenClosed { seq, .. }
            | LockEvent::TimedOut { seq, .. } => *seq,
        }
    }

    pub fn scenario(&self) -> &str {
        match self {
            LockEvent::TokenBound { scenario, .. }
            | LockEvent::Acquired { scenario, .. }
            | LockEvent::Reentered { scenario, .. }
            | LockEvent::Waiting { scenario, .. }
            | LockEvent::Released { scenario, .. }
            | LockEvent::ReleaseFailed { scenario, .. }
            | LockEvent::TokenClosed { scenario, .. }
            | LockEvent::TimedOut { scenario, .. } => scenario,
        }
    }

    /// Resource name (if applicable)
    pub fn resource(&self) -> Option<&str> {
        match self {
            LockEvent::Acquired { resource, .. }
            | LockEvent::Reentered { resource, .. }
            | LockEvent::Waiting { resource, .. }
            | LockEvent::Released { resource, .. }
            | LockEvent::ReleaseFailed { resource, .. }
            | LockEvent::TimedOut { resource, .. } => Some(resource),
            LockEvent::TokenBound { .. } | LockEvent::TokenClosed { .. } => None,
        }
    }

    pub fn is_acquired(&self) -> bool {
        matches!(self, LockEvent::Acquired { .. })
    }

    pub fn is_reentered(&self) -> bool {
        matches!(self, LockEvent::Reentered { .. })
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, LockEvent::Waiting { .. })
    }

    pub fn is_released(&self) -> bool {
        matches!(self, LockEvent::Released { .. })
    }

    pub fn is_release_failed(&self) -> bool {
        matches!(self, LockEvent::ReleaseFailed { .. })
    }

    pub fn is_token_closed(&self) -> bool {
        matches!(self, LockEvent::TokenClosed { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, LockEvent::TimedOut { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = LockEvent::Acquired {
            seq: 3,
            scenario: "s1".to_string(),
            token: 7,
            resource: "file1".to_string(),
        };

        assert_eq!(event.seq(), 3);
        assert_eq!(event.scenario(), "s1");
        assert_eq!(event.resource(), Some("file1"));
        assert!(event.is_acquired());
        assert!(!event.is_released());
    }

    #[test]
    fn test_token_events_have_no_resource() {
        let event = LockEvent::TokenClosed {
            seq: 1,
            scenario: "s1".to_string(),
            token: 7,
            repeated: false,
        };
        assert_eq!(event.resource(), None);
        assert!(event.is_token_closed());
    }

    #[test]
    fn test_serialization_tagged() {
        let event = LockEvent::Waiting {
            seq: 2,
            scenario: "s2".to_string(),
            token: 9,
            resource: "row:42".to_string(),
            holder: 7,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Waiting\""));
        assert!(json.contains("\"holder\":7"));

        let back: LockEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
