//! Authorization state tracking.
//!
//! The sensor collaborator owns the actual permission prompt; this module
//! owns the last known [`AuthorizationStatus`] and lets callers await the
//! asynchronous status callback that follows a prompt.
//!
//! # Design
//!
//! The current status lives inside a `tokio::sync::watch` channel. The
//! tracker is the single writer (mutations happen under the coordinator's
//! exclusive section), while any number of readers can snapshot the status
//! or await the next change without touching the coordinator lock.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Authorization state reported by the sensor collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    /// The user has not yet been asked.
    NotDetermined,
    /// The user explicitly refused access.
    Denied,
    /// Access is blocked by policy (parental controls, MDM profile).
    Restricted,
    /// Access granted while the app is in use.
    WhenInUse,
    /// Access granted at all times.
    Always,
}

impl AuthorizationStatus {
    /// Whether this status grants at least the given permission level.
    pub fn satisfies(self, level: PermissionLevel) -> bool {
        match level {
            PermissionLevel::WhenInUse => {
                matches!(self, Self::WhenInUse | Self::Always)
            }
            PermissionLevel::Always => matches!(self, Self::Always),
        }
    }

    /// Whether this status allows any location access at all.
    pub fn is_authorized(self) -> bool {
        matches!(self, Self::WhenInUse | Self::Always)
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotDetermined => "not-determined",
            Self::Denied => "denied",
            Self::Restricted => "restricted",
            Self::WhenInUse => "when-in-use",
            Self::Always => "always",
        };
        f.write_str(name)
    }
}

/// The permission levels a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// Location access while the app is in use.
    WhenInUse,
    /// Location access at all times (required for region monitoring).
    Always,
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::WhenInUse => "when-in-use",
            Self::Always => "always",
        };
        f.write_str(name)
    }
}

/// Tracks the last known authorization status and publishes changes.
#[derive(Debug)]
pub struct AuthorizationTracker {
    changes: watch::Sender<AuthorizationStatus>,
}

impl Default for AuthorizationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationTracker {
    /// Create a tracker starting at `NotDetermined`.
    pub fn new() -> Self {
        Self {
            changes: watch::Sender::new(AuthorizationStatus::NotDetermined),
        }
    }

    /// The last known status. Never blocks.
    pub fn status(&self) -> AuthorizationStatus {
        *self.changes.borrow()
    }

    /// Subscribe to status changes (used to await a prompt's callback).
    pub fn subscribe(&self) -> watch::Receiver<AuthorizationStatus> {
        self.changes.subscribe()
    }

    /// Apply a status reported by the sensor collaborator.
    ///
    /// Always wakes subscribers, even when the value is unchanged: a repeated
    /// `Denied` callback must still resolve a caller awaiting the prompt.
    /// Returns whether the value actually changed.
    pub fn apply(&self, status: AuthorizationStatus) -> bool {
        let previous = self.changes.send_replace(status);
        previous != status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod authorization_status {
        use super::*;

        #[test]
        fn test_satisfies_when_in_use() {
            assert!(AuthorizationStatus::WhenInUse.satisfies(PermissionLevel::WhenInUse));
            assert!(AuthorizationStatus::Always.satisfies(PermissionLevel::WhenInUse));
            assert!(!AuthorizationStatus::Denied.satisfies(PermissionLevel::WhenInUse));
            assert!(!AuthorizationStatus::NotDetermined.satisfies(PermissionLevel::WhenInUse));
        }

        #[test]
        fn test_satisfies_always() {
            assert!(AuthorizationStatus::Always.satisfies(PermissionLevel::Always));
            assert!(!AuthorizationStatus::WhenInUse.satisfies(PermissionLevel::Always));
            assert!(!AuthorizationStatus::Restricted.satisfies(PermissionLevel::Always));
        }

        #[test]
        fn test_is_authorized() {
            assert!(AuthorizationStatus::WhenInUse.is_authorized());
            assert!(AuthorizationStatus::Always.is_authorized());
            assert!(!AuthorizationStatus::Denied.is_authorized());
            assert!(!AuthorizationStatus::Restricted.is_authorized());
            assert!(!AuthorizationStatus::NotDetermined.is_authorized());
        }
    }

    mod authorization_tracker {
        use super::*;

        #[test]
        fn test_starts_not_determined() {
            let tracker = AuthorizationTracker::new();
            assert_eq!(tracker.status(), AuthorizationStatus::NotDetermined);
        }

        #[test]
        fn test_apply_updates_status() {
            let tracker = AuthorizationTracker::new();
            assert!(tracker.apply(AuthorizationStatus::WhenInUse));
            assert_eq!(tracker.status(), AuthorizationStatus::WhenInUse);
        }

        #[test]
        fn test_apply_reports_unchanged_value() {
            let tracker = AuthorizationTracker::new();
            tracker.apply(AuthorizationStatus::Denied);
            assert!(!tracker.apply(AuthorizationStatus::Denied));
        }

        #[tokio::test]
        async fn test_subscriber_wakes_on_repeated_value() {
            let tracker = AuthorizationTracker::new();
            tracker.apply(AuthorizationStatus::Denied);

            let mut rx = tracker.subscribe();
            tracker.apply(AuthorizationStatus::Denied);

            // A repeated value must still count as a change notification
            rx.changed().await.unwrap();
            assert_eq!(*rx.borrow(), AuthorizationStatus::Denied);
        }

        #[tokio::test]
        async fn test_subscriber_observes_transition() {
            let tracker = AuthorizationTracker::new();
            let mut rx = tracker.subscribe();

            tracker.apply(AuthorizationStatus::Always);
            rx.changed().await.unwrap();
            assert_eq!(*rx.borrow(), AuthorizationStatus::Always);
        }
    }
}
