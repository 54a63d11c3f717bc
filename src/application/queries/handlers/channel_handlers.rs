//! Channel Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{QueueSnapshot, SessionManagerPort};
use crate::application::queries::GetQueue;

/// GetQueue Handler
pub struct GetQueueHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl GetQueueHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub fn handle(&self, query: GetQueue) -> Result<QueueSnapshot, ApplicationError> {
        self.session_manager
            .snapshot(&query.channel_id, query.limit)
            .ok_or_else(|| ApplicationError::not_found("Channel", &query.channel_id))
    }
}
