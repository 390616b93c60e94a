use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Wall-clock instant in nanoseconds since the Unix epoch.
///
/// `Timestamp::now()` is derived from a wall-clock reading taken once per
/// process and advanced with a monotonic clock, so later stamps are never
/// smaller than earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

struct Anchor {
    wall: u64,
    mono: Instant,
}

fn anchor() -> &'static Anchor {
    static ANCHOR: OnceLock<Anchor> = OnceLock::new();
    ANCHOR.get_or_init(|| Anchor {
        wall: dur_to_nanos(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
        ),
        mono: Instant::now(),
    })
}

fn dur_to_nanos(d: Duration) -> u64 {
    d.as_secs()
        .saturating_mul(NANOS_PER_SEC)
        .saturating_add(d.subsec_nanos().into())
}

impl Timestamp {
    pub fn now() -> Timestamp {
        let a = anchor();
        Timestamp(a.wall.saturating_add(dur_to_nanos(a.mono.elapsed())))
    }

    pub fn from_nanos(nanos: u64) -> Timestamp {
        Timestamp(nanos)
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Whole seconds since the epoch; the bucket key for throughput history.
    pub fn as_secs(self) -> u64 {
        self.0 / NANOS_PER_SEC
    }

    /// `None` if `earlier` is after `self`.
    pub fn duration_since(self, earlier: Timestamp) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:09}", self.0 / NANOS_PER_SEC, self.0 % NANOS_PER_SEC)
    }
}

/// Time between two optional markers, if both are set and correctly ordered.
pub fn span(start: Option<Timestamp>, end: Option<Timestamp>) -> Option<Duration> {
    start.and_then(|s| end.and_then(|e| e.duration_since(s)))
}
