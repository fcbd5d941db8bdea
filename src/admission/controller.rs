//! Admission decisions over a shared session table.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::admission::session::{ClientId, SessionTable};
use crate::config::AdmissionConfig;
use crate::observability::metrics;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    Reject,
}

impl Decision {
    /// Classify a post-increment count against `quota`.
    pub fn for_count(count: u32, quota: u32) -> Self {
        if count > quota {
            Decision::Reject
        } else {
            Decision::Admit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Admit => "admit",
            Decision::Reject => "reject",
        }
    }
}

/// Fixed quota and window a controller enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    /// Requests admitted per client per window.
    pub quota: u32,
    /// Length of one session window.
    pub window: Duration,
}

impl AdmissionPolicy {
    pub const DEFAULT_QUOTA: u32 = 5;
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            quota: Self::DEFAULT_QUOTA,
            window: Self::DEFAULT_WINDOW,
        }
    }
}

impl From<&AdmissionConfig> for AdmissionPolicy {
    fn from(config: &AdmissionConfig) -> Self {
        Self {
            quota: config.quota,
            window: Duration::from_millis(config.session_window_ms),
        }
    }
}

/// Tracks per-client request counts and decides admission.
///
/// All reads and writes of the table go through one mutex, so concurrent
/// calls for the same client are serialized and each observes every call
/// ordered before it.
#[derive(Debug)]
pub struct AdmissionController {
    table: Mutex<SessionTable>,
    policy: AdmissionPolicy,
}

impl AdmissionController {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            table: Mutex::new(SessionTable::new()),
            policy,
        }
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Count a request from `client_id` and return the count for its current
    /// window, including this request.
    pub fn evaluate(&self, client_id: ClientId) -> u32 {
        let mut table = self.lock();
        let count = table.record(client_id, Instant::now(), self.policy.window);
        metrics::record_tracked_sessions(table.len());
        count
    }

    /// Same as [`evaluate`](Self::evaluate) with a caller-supplied clock reading.
    pub fn evaluate_at(&self, client_id: ClientId, now: Instant) -> u32 {
        let mut table = self.lock();
        let count = table.record(client_id, now, self.policy.window);
        metrics::record_tracked_sessions(table.len());
        count
    }

    /// Evaluate and classify in one step.
    pub fn admit(&self, client_id: ClientId) -> (u32, Decision) {
        let count = self.evaluate(client_id);
        (count, Decision::for_count(count, self.policy.quota))
    }

    /// Remove sessions whose window already ended.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut table = self.lock();
        let removed = table.remove_expired(now, self.policy.window);
        metrics::record_tracked_sessions(table.len());
        removed
    }

    /// Number of clients currently holding a session.
    pub fn tracked_sessions(&self) -> usize {
        self.lock().len()
    }

    /// Count for `client_id` without recording a request.
    pub fn current_count(&self, client_id: ClientId) -> Option<u32> {
        self.lock().get(client_id).map(|session| session.count)
    }

    // Every mutation is a single store, so a panic elsewhere cannot leave
    // the table half-written.
    fn lock(&self) -> MutexGuard<'_, SessionTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(AdmissionPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_quota_enforcement_in_one_window() {
        let controller = AdmissionController::default();
        let start = Instant::now();

        let decisions: Vec<_> = (0..6)
            .map(|i| {
                let count = controller.evaluate_at(3, start + Duration::from_millis(300 * i));
                (count, Decision::for_count(count, controller.policy().quota))
            })
            .collect();

        assert_eq!(
            decisions,
            vec![
                (1, Decision::Admit),
                (2, Decision::Admit),
                (3, Decision::Admit),
                (4, Decision::Admit),
                (5, Decision::Admit),
                (6, Decision::Reject),
            ]
        );
    }

    #[test]
    fn test_window_reset_after_gap() {
        let controller = AdmissionController::default();
        let start = Instant::now();

        assert_eq!(controller.evaluate_at(7, start), 1);
        assert_eq!(controller.evaluate_at(7, start + Duration::from_secs(6)), 1);
    }

    #[test]
    fn test_reset_after_exhausted_quota() {
        let controller = AdmissionController::default();
        let start = Instant::now();

        for _ in 0..9 {
            controller.evaluate_at(4, start);
        }
        assert_eq!(controller.current_count(4), Some(9));
        assert_eq!(controller.evaluate_at(4, start + Duration::from_secs(5)), 1);
    }

    #[test]
    fn test_boundary_counts_as_expired() {
        let controller = AdmissionController::default();
        let start = Instant::now();

        controller.evaluate_at(9, start);
        controller.evaluate_at(9, start + Duration::from_secs(1));
        assert_eq!(controller.evaluate_at(9, start + AdmissionPolicy::DEFAULT_WINDOW), 1);
    }

    #[test]
    fn test_identifier_isolation() {
        let controller = AdmissionController::default();
        let start = Instant::now();

        for i in 1..=4u32 {
            let now = start + Duration::from_millis(100 * i as u64);
            assert_eq!(controller.evaluate_at(1, now), i);
            assert_eq!(controller.evaluate_at(2, now), i);
        }
        for _ in 0..10 {
            controller.evaluate_at(1, start + Duration::from_secs(1));
        }
        assert_eq!(controller.current_count(2), Some(4));
        assert_eq!(controller.tracked_sessions(), 2);
    }

    #[test]
    fn test_concurrent_same_client_is_linearizable() {
        const CALLERS: u32 = 64;
        let controller = Arc::new(AdmissionController::new(AdmissionPolicy {
            quota: 5,
            window: Duration::from_secs(60),
        }));

        let counts: Vec<u32> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    let controller = Arc::clone(&controller);
                    scope.spawn(move || controller.evaluate(42))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let unique: HashSet<u32> = counts.iter().copied().collect();
        assert_eq!(unique.len(), CALLERS as usize);
        assert_eq!(unique, (1..=CALLERS).collect::<HashSet<u32>>());

        let admitted = counts
            .iter()
            .filter(|c| Decision::for_count(**c, 5) == Decision::Admit)
            .count();
        assert_eq!(admitted, 5);
    }

    #[test]
    fn test_independent_controllers_do_not_share_state() {
        let a = AdmissionController::default();
        let b = AdmissionController::default();

        a.evaluate(1);
        a.evaluate(1);
        assert_eq!(b.evaluate(1), 1);
        assert_eq!(a.current_count(1), Some(2));
    }

    #[test]
    fn test_sweep_leaves_quota_semantics_unchanged() {
        let controller = AdmissionController::default();
        let start = Instant::now();

        for _ in 0..7 {
            controller.evaluate_at(5, start);
        }
        controller.evaluate_at(6, start + Duration::from_secs(4));

        let later = start + Duration::from_secs(6);
        assert_eq!(controller.sweep_expired_at(later), 1);
        assert_eq!(controller.current_count(5), None);
        assert_eq!(controller.current_count(6), Some(1));
        assert_eq!(controller.evaluate_at(5, later), 1);
    }

    #[test]
    fn test_policy_from_config() {
        let config = AdmissionConfig {
            quota: 3,
            session_window_ms: 250,
            ..AdmissionConfig::default()
        };
        let policy = AdmissionPolicy::from(&config);
        assert_eq!(policy.quota, 3);
        assert_eq!(policy.window, Duration::from_millis(250));
    }
}
