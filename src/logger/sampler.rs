//! Per-message sampling.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::level::Severity;
use crate::config::schema::SamplingConfig;

/// Distinct messages tracked before new ones share a per-severity window.
pub(crate) const MAX_TRACKED: usize = 4096;

/// `None` is the shared window for messages that arrive while the table is full.
type Key = (Severity, Option<Box<str>>);

/// Counts records per `(severity, message)` in fixed windows.
///
/// The table holds at most [`MAX_TRACKED`] messages plus one overflow window
/// per severity. Expired windows are swept at most once per tick when it fills.
#[derive(Debug)]
pub struct Sampler {
    initial: u64,
    thereafter: u64,
    tick: Duration,
    counters: DashMap<Key, Window>,
    last_sweep: Mutex<Option<Instant>>,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u64,
}

impl Sampler {
    /// One-second windows, as configured.
    pub fn new(config: SamplingConfig) -> Self {
        Self::with_tick(config, Duration::from_secs(1))
    }

    pub fn with_tick(config: SamplingConfig, tick: Duration) -> Self {
        Self {
            initial: config.initial,
            thereafter: config.thereafter,
            tick,
            counters: DashMap::new(),
            last_sweep: Mutex::new(None),
        }
    }

    /// Whether this record should be written.
    pub fn admit(&self, severity: Severity, message: &str) -> bool {
        self.admit_at(severity, message, Instant::now())
    }

    fn admit_at(&self, severity: Severity, message: &str, now: Instant) -> bool {
        let tracked: Key = (severity, Some(Box::from(message)));
        let key = if self.counters.contains_key(&tracked) || self.has_room(now) {
            tracked
        } else {
            (severity, None)
        };

        let mut window = self
            .counters
            .entry(key)
            .or_insert_with(|| Window { started: now, count: 0 });

        if now.duration_since(window.started) >= self.tick {
            window.started = now;
            window.count = 0;
        }
        window.count += 1;

        let n = window.count;
        if n <= self.initial {
            return true;
        }
        self.thereafter != 0 && (n - self.initial) % self.thereafter == 0
    }

    fn has_room(&self, now: Instant) -> bool {
        if self.counters.len() < MAX_TRACKED {
            return true;
        }
        let sweep_due = match self.last_sweep.lock() {
            Ok(mut last) => {
                let due = last.map_or(true, |at| now.duration_since(at) >= self.tick);
                if due {
                    *last = Some(now);
                }
                due
            }
            Err(_) => false,
        };
        if sweep_due {
            self.counters
                .retain(|_, window| now.duration_since(window.started) < self.tick);
        }
        self.counters.len() < MAX_TRACKED
    }

    /// Number of live windows.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.counters.len()
    }
}
