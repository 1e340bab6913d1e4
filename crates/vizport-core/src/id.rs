//! Clock and id generation.
//!
//! Both are traits so tests can pin time and still get unique ids.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use ulid::{Generator, Ulid};

use crate::artifact::ArtifactId;

/// Provides the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Issues artifact ids that never repeat within the process lifetime.
///
/// Uniqueness, not secrecy, is the requirement: ids are public handles.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> ArtifactId;
}

/// ULID based generator.
///
/// The timestamp part comes from `C`, the rest from a monotonic generator:
/// ids minted in the same millisecond increment the random part instead of
/// drawing a new one, so they stay ordered and distinct even under a frozen
/// clock.
pub struct UlidGenerator<C> {
    clock: C,
    monotonic: Mutex<Generator>,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            monotonic: Mutex::new(Generator::new()),
        }
    }

    fn next_ulid(&self) -> Ulid {
        let now = self.clock.now();
        let mut monotonic = self.monotonic.lock().unwrap_or_else(PoisonError::into_inner);
        monotonic
            .generate_from_datetime(SystemTime::from(now))
            // 2^80 ids in one millisecond: start over with a fresh random part.
            .unwrap_or_else(|_| Ulid::from_parts(now.timestamp_millis() as u64, rand::random()))
    }
}

impl Default for UlidGenerator<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn next_id(&self) -> ArtifactId {
        ArtifactId::from_ulid(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ids_are_pairwise_distinct() {
        let ids = UlidGenerator::default();
        let issued: HashSet<_> = (0..10_000).map(|_| ids.next_id()).collect();
        assert_eq!(issued.len(), 10_000);
    }

    #[test]
    fn frozen_clock_still_yields_increasing_ids() {
        let fixed = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let ids = UlidGenerator::new(ManualClock::new(fixed));

        let first = ids.next_ulid();
        let second = ids.next_ulid();

        assert!(second > first);
        assert_eq!(first.timestamp_ms(), fixed.timestamp_millis() as u64);
        assert_eq!(second.timestamp_ms(), fixed.timestamp_millis() as u64);
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now(), start + chrono::Duration::minutes(5));
    }

    #[test]
    fn concurrent_generation_never_collides() {
        let ids = Arc::new(UlidGenerator::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..1_000).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut issued = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(issued.insert(id));
            }
        }
        assert_eq!(issued.len(), 8_000);
    }
}
