use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

const MAX_ATTEMPTS: usize = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);
const SWEEP_EVERY: Duration = Duration::from_secs(5 * 60);

type Failures = HashMap<IpAddr, VecDeque<Instant>>;

/// Failed-login counter per client IP, shared across workers.
#[derive(Clone)]
pub struct RateLimiter {
    failures: Arc<Mutex<Failures>>,
    max_attempts: usize,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            failures: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    // Counters stay valid under a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, Failures> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True once the IP has `max_attempts` failures inside the window.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut failures = self.lock();
        let Some(seen) = failures.get_mut(&ip) else {
            return false;
        };
        let now = Instant::now();
        while seen.front().is_some_and(|t| now.duration_since(*t) >= self.window) {
            seen.pop_front();
        }
        if seen.is_empty() {
            failures.remove(&ip);
            return false;
        }
        seen.len() >= self.max_attempts
    }

    pub fn record_failure(&self, ip: IpAddr) {
        self.lock().entry(ip).or_default().push_back(Instant::now());
    }

    /// Forget an IP's failures after a successful login.
    pub fn clear(&self, ip: IpAddr) {
        self.lock().remove(&ip);
    }

    /// Drop every failure older than the window. Returns how many IPs were forgotten.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut failures = self.lock();
        let before = failures.len();
        failures.retain(|_, seen| {
            seen.retain(|t| now.duration_since(*t) < self.window);
            !seen.is_empty()
        });
        before - failures.len()
    }
}

/// Periodically prune the limiter so IPs that never log in again do not pile up.
pub fn spawn_sweeper(limiter: RateLimiter) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_EVERY);
        loop {
            interval.tick().await;
            let forgotten = limiter.prune_expired();
            if forgotten > 0 {
                log::debug!("rate limiter forgot {forgotten} idle addresses");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const IP: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
    const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 8));

    #[test]
    fn blocks_after_max_attempts() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..2 {
            limiter.record_failure(IP);
        }
        assert!(!limiter.is_blocked(IP));
        limiter.record_failure(IP);
        assert!(limiter.is_blocked(IP));
        assert!(!limiter.is_blocked(OTHER));
    }

    #[test]
    fn clear_unblocks() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.record_failure(IP);
        assert!(limiter.is_blocked(IP));
        limiter.clear(IP);
        assert!(!limiter.is_blocked(IP));
    }

    #[test]
    fn prune_forgets_idle_addresses() {
        let limiter = RateLimiter::new(5, Duration::from_millis(20));
        limiter.record_failure(IP);
        std::thread::sleep(Duration::from_millis(40));
        limiter.record_failure(OTHER);
        assert_eq!(limiter.prune_expired(), 1);
        assert_eq!(limiter.prune_expired(), 0);
    }

    #[test]
    fn old_failures_expire() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        limiter.record_failure(IP);
        std::thread::sleep(Duration::from_millis(40));
        assert!(!limiter.is_blocked(IP));
    }
}
