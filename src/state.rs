//! Shared state injected into every handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::LinkService;
use crate::domain::pageview_event::PageViewEvent;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub pageview_sender: mpsc::Sender<PageViewEvent>,
}

impl AppState {
    pub fn new(link_service: Arc<LinkService>, pageview_sender: mpsc::Sender<PageViewEvent>) -> Self {
        Self {
            link_service,
            pageview_sender,
        }
    }
}
