//! Garbage classification for stored records.
//!
//! A record is garbage when any of the following holds:
//!
//! 1. its URL is not a valid absolute URL
//! 2. its URL points back at one of this service's own short domains
//! 3. it has been accessed at most `max_access_count` times and is older
//!    than `max_age`
//!
//! Classification is pure. The sweeper decides whether to act on it.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::domain::entities::ShortUrlRecord;
use crate::utils::url_normalizer::{InvalidUrlReason, validate};

/// Default own short domains.
pub const DEFAULT_SELF_DOMAINS: &[&str] = &["tny.wtf", "dic.lol"];

/// Default age after which a rarely used record becomes garbage.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 14;

/// Default access count at or below which an old record becomes garbage.
pub const DEFAULT_MAX_ACCESS_COUNT: i32 = 1;

/// Thresholds and domain list used by [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarbagePolicy {
    /// Lowercased host names of this service.
    pub self_domains: Vec<String>,
    pub max_age: Duration,
    pub max_access_count: i32,
}

impl GarbagePolicy {
    pub fn new(self_domains: Vec<String>, max_age: Duration, max_access_count: i32) -> Self {
        Self {
            self_domains: self_domains
                .into_iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            max_age,
            max_access_count,
        }
    }

    fn is_self_domain(&self, host: &str) -> bool {
        self.self_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(host))
    }
}

impl Default for GarbagePolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_SELF_DOMAINS.iter().map(|d| d.to_string()).collect(),
            Duration::days(DEFAULT_MAX_AGE_DAYS),
            DEFAULT_MAX_ACCESS_COUNT,
        )
    }
}

/// Why a record was classified as garbage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GarbageReason {
    InvalidUrl(InvalidUrlReason),
    PointsToSelf { host: String },
    Stale { access_count: i32, age_days: i64 },
}

impl fmt::Display for GarbageReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GarbageReason::InvalidUrl(reason) => write!(f, "invalid url ({reason})"),
            GarbageReason::PointsToSelf { host } => write!(f, "points to this site ({host})"),
            GarbageReason::Stale {
                access_count,
                age_days,
            } => write!(
                f,
                "viewed {access_count} times and created {age_days} days ago"
            ),
        }
    }
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Garbage(GarbageReason),
}

impl Verdict {
    pub fn is_garbage(&self) -> bool {
        matches!(self, Verdict::Garbage(_))
    }
}

/// Classifies `record` against `policy` at time `now`.
///
/// The record's `long_url` is expected to be already normalized.
pub fn classify(record: &ShortUrlRecord, policy: &GarbagePolicy, now: DateTime<Utc>) -> Verdict {
    let url = match validate(&record.long_url) {
        Ok(url) => url,
        Err(reason) => return Verdict::Garbage(GarbageReason::InvalidUrl(reason)),
    };

    if let Some(host) = url.host_str()
        && policy.is_self_domain(host)
    {
        return Verdict::Garbage(GarbageReason::PointsToSelf {
            host: host.to_ascii_lowercase(),
        });
    }

    let age = record.age(now);
    if record.access_count <= policy.max_access_count && age > policy.max_age {
        return Verdict::Garbage(GarbageReason::Stale {
            access_count: record.access_count,
            age_days: age.num_days(),
        });
    }

    Verdict::Keep
}
