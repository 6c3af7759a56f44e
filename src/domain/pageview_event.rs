//! Page-view event model for the anonymized audit trail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// An in-memory record of one successful redirect.
///
/// Sent from the redirect handler to the background worker through a
/// bounded channel so that file I/O never delays the redirect itself.
/// Client metadata is kept raw here; the sink is responsible for hashing it.
#[derive(Debug, Clone)]
pub struct PageViewEvent {
    pub long_url: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub at: DateTime<Utc>,
}

impl PageViewEvent {
    /// Creates an event stamped with the current time.
    pub fn new(long_url: String, ip: Option<String>, user_agent: Option<&str>) -> Self {
        Self {
            long_url,
            ip,
            user_agent: user_agent.map(|s| s.to_string()),
            at: Utc::now(),
        }
    }
}

/// Destination for page-view events.
#[async_trait]
pub trait PageViewSink: Send + Sync {
    /// Persists one event.
    async fn record(&self, event: &PageViewEvent) -> std::io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_view_event_creation() {
        let event = PageViewEvent::new(
            "https://example.com".to_string(),
            Some("10.0.0.1".to_string()),
            Some("curl/8.0"),
        );

        assert_eq!(event.long_url, "https://example.com");
        assert_eq!(event.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(event.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn test_page_view_event_minimal() {
        let event = PageViewEvent::new("https://example.com".to_string(), None, None);

        assert!(event.ip.is_none());
        assert!(event.user_agent.is_none());
    }
}
