use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time source for admission decisions. Injected so tests can drive the
/// window forward without sleeping.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Keyed store of admitted-request timestamps. `try_admit` is a single atomic
/// prune-check-record step; implementations must serialize it per identity so
/// concurrent callers cannot slip past the limit between the check and the
/// write-back.
pub trait WindowStore: Send + Sync {
    fn try_admit(&self, identity: &str, now_ms: u64, window_ms: u64, max_requests: usize) -> bool;
}

/// Process-local store: one timestamp list per identity, pruned lazily on
/// each check. Identities are never evicted once seen.
#[derive(Debug, Default)]
pub struct MemoryWindowStore {
    buckets: Mutex<HashMap<String, Vec<u64>>>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities with a bucket, pruned or not.
    pub fn tracked_identities(&self) -> usize {
        self.buckets.lock().expect("window store lock poisoned").len()
    }
}

impl WindowStore for MemoryWindowStore {
    fn try_admit(&self, identity: &str, now_ms: u64, window_ms: u64, max_requests: usize) -> bool {
        let mut buckets = self.buckets.lock().expect("window store lock poisoned");
        let timestamps = buckets.entry(identity.to_string()).or_default();
        timestamps.retain(|&t| now_ms.saturating_sub(t) < window_ms);

        if timestamps.len() >= max_requests {
            return false;
        }
        timestamps.push(now_ms);
        true
    }
}

/// Sliding-window limiter: at most `max_requests` admissions per identity in
/// any trailing `window`, evaluated at each decision. Rejected attempts are
/// not recorded, so a throttled caller recovers as soon as its oldest
/// admitted timestamp ages out.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn WindowStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_parts(
            Arc::new(MemoryWindowStore::new()),
            Arc::new(SystemClock),
            max_requests,
            window,
        )
    }

    pub fn with_parts(
        store: Arc<dyn WindowStore>,
        clock: Arc<dyn Clock>,
        max_requests: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            window,
            max_requests,
        }
    }

    /// True when the request is admitted and its timestamp recorded.
    pub fn admit(&self, identity: &str) -> bool {
        self.store.try_admit(
            identity,
            self.clock.now_ms(),
            self.window.as_millis() as u64,
            self.max_requests as usize,
        )
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Test doubles. Kept out of `#[cfg(test)]` so integration tests can drive
/// the limiter with a scripted clock.
pub mod testing {
    use super::Clock;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock advanced by hand from tests.
    #[derive(Debug, Default)]
    pub struct ManualClock {
        now_ms: AtomicU64,
    }

    impl ManualClock {
        pub fn at(now_ms: u64) -> Self {
            Self {
                now_ms: AtomicU64::new(now_ms),
            }
        }

        pub fn set(&self, now_ms: u64) {
            self.now_ms.store(now_ms, Ordering::SeqCst);
        }

        pub fn advance(&self, delta_ms: u64) {
            self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.now_ms.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    fn limiter_at(clock: Arc<ManualClock>) -> RateLimiter {
        RateLimiter::with_parts(
            Arc::new(MemoryWindowStore::new()),
            clock,
            10,
            Duration::from_secs(60),
        )
    }

    #[test]
    fn admits_up_to_max_then_rejects() {
        let clock = Arc::new(ManualClock::at(1_000));
        let limiter = limiter_at(clock.clone());

        for i in 0..10 {
            clock.advance(10);
            assert!(limiter.admit("user-1"), "request {i} should be admitted");
        }
        assert!(!limiter.admit("user-1"));
    }

    #[test]
    fn window_slides_rather_than_resetting_in_buckets() {
        let clock = Arc::new(ManualClock::at(0));
        let limiter = limiter_at(clock.clone());

        for _ in 0..10 {
            assert!(limiter.admit("user-1"));
        }

        // Still inside the window of every admitted timestamp.
        clock.set(30_000);
        assert!(!limiter.admit("user-1"));

        // All ten admissions at t=0 have aged out.
        clock.set(61_000);
        assert!(limiter.admit("user-1"));
    }

    #[test]
    fn rejections_are_not_recorded() {
        let clock = Arc::new(ManualClock::at(0));
        let limiter = limiter_at(clock.clone());

        for _ in 0..10 {
            assert!(limiter.admit("user-1"));
        }
        // Hammering while throttled must not extend the throttle.
        for _ in 0..50 {
            assert!(!limiter.admit("user-1"));
        }

        clock.set(60_001);
        assert!(limiter.admit("user-1"));
    }

    #[test]
    fn identities_do_not_interfere() {
        let clock = Arc::new(ManualClock::at(0));
        let limiter = limiter_at(clock.clone());

        for _ in 0..10 {
            assert!(limiter.admit("user-1"));
            assert!(limiter.admit("user-2"));
        }
        assert!(!limiter.admit("user-1"));
        assert!(!limiter.admit("user-2"));
    }

    #[test]
    fn partial_expiry_frees_exactly_the_aged_slots() {
        let clock = Arc::new(ManualClock::at(0));
        let limiter = limiter_at(clock.clone());

        for _ in 0..4 {
            assert!(limiter.admit("user-1"));
        }
        clock.set(30_000);
        for _ in 0..6 {
            assert!(limiter.admit("user-1"));
        }
        assert!(!limiter.admit("user-1"));

        // The four t=0 entries expire at t=60000; the six t=30000 ones remain.
        clock.set(60_001);
        for _ in 0..4 {
            assert!(limiter.admit("user-1"));
        }
        assert!(!limiter.admit("user-1"));
    }

    #[test]
    fn store_serializes_concurrent_admissions() {
        let store = Arc::new(MemoryWindowStore::new());
        let limiter = RateLimiter::with_parts(
            store,
            Arc::new(ManualClock::at(5_000)),
            10,
            Duration::from_secs(60),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            handles.push(std::thread::spawn(move || {
                (0..5).filter(|_| limiter.admit("user-1")).count()
            }));
        }
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 10);
    }
}
