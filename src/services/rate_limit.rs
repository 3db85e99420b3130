use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_MAX_CLIENTS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Counters {
    windows: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Fixed-window request counter keyed by client address. Expired windows
/// are swept once per window length, and at most `max_clients` windows are
/// tracked at a time.
pub struct RateLimiter {
    max: u32,
    window: Duration,
    max_clients: usize,
    counters: Mutex<Counters>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            max_clients: DEFAULT_MAX_CLIENTS,
            counters: Mutex::new(Counters {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients.max(1);
        self
    }

    /// Counts one request for `key`; `false` once the key is over its limit
    /// for the current window.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let Ok(mut counters) = self.counters.lock() else {
            // poisoned: fail open
            return true;
        };
        let window = self.window;

        if now.saturating_duration_since(counters.last_sweep) >= window {
            counters
                .windows
                .retain(|_, w| now.saturating_duration_since(w.started) < window);
            counters.last_sweep = now;
        }

        if !counters.windows.contains_key(key) && counters.windows.len() >= self.max_clients {
            evict_oldest(&mut counters.windows);
        }

        let entry = counters.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(entry.started) >= window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count += 1;
        entry.count <= self.max
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.counters.lock().map(|c| c.windows.len()).unwrap_or(0)
    }
}

fn evict_oldest(windows: &mut HashMap<String, Window>) {
    let oldest = windows
        .iter()
        .min_by_key(|(_, w)| w.started)
        .map(|(k, _)| k.clone());
    if let Some(key) = oldest {
        windows.remove(&key);
    }
}
