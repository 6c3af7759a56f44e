//! Short URL record entity.

use chrono::{DateTime, Utc};

/// Maximum length of a stored long URL.
pub const MAX_URL_LENGTH: usize = 2048;

/// A stored mapping from a short code to its long URL.
///
/// `code` is the primary key and never changes once assigned. `long_url` is
/// rewritten only by the sweeper when it repairs a malformed URL.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShortUrlRecord {
    pub code: String,
    pub long_url: String,
    pub access_count: i32,
    pub created: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl ShortUrlRecord {
    /// Creates a freshly inserted record with no recorded accesses.
    pub fn new(code: String, long_url: String) -> Self {
        let now = Utc::now();
        Self {
            code,
            long_url,
            access_count: 0,
            created: now,
            last_accessed: now,
        }
    }

    /// Returns the age of the record relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_record_defaults() {
        let record = ShortUrlRecord::new("abc".to_string(), "https://example.com".to_string());

        assert_eq!(record.code, "abc");
        assert_eq!(record.long_url, "https://example.com");
        assert_eq!(record.access_count, 0);
        assert_eq!(record.created, record.last_accessed);
    }

    #[test]
    fn test_record_age() {
        let mut record = ShortUrlRecord::new("a".to_string(), "https://example.com".to_string());
        let now = Utc::now();
        record.created = now - Duration::days(20);

        assert_eq!(record.age(now).num_days(), 20);
    }
}
