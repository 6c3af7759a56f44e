//! Background worker draining page-view events into a sink.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::pageview_event::{PageViewEvent, PageViewSink};

/// Consumes events until every sender is dropped.
///
/// A failed write is logged and the event is lost; delivery is at most once.
pub async fn run_pageview_worker(mut rx: mpsc::Receiver<PageViewEvent>, sink: Arc<dyn PageViewSink>) {
    info!("Page-view worker started");

    while let Some(event) = rx.recv().await {
        if let Err(e) = sink.record(&event).await {
            warn!(error = %e, url = %event.long_url, "Failed to record page view");
        }
    }

    info!("Page-view worker stopped");
}
