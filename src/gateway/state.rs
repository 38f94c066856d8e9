use std::sync::Arc;

use crate::intake::{IntakeController, StatusQueryService};
use crate::store::DedupStore;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Submission path
    pub controller: Arc<IntakeController>,
    /// Status reads
    pub status: Arc<StatusQueryService>,
    /// Health pings
    pub store: Arc<dyn DedupStore>,
}

impl AppState {
    pub fn new(
        controller: Arc<IntakeController>,
        status: Arc<StatusQueryService>,
        store: Arc<dyn DedupStore>,
    ) -> Self {
        Self {
            controller,
            status,
            store,
        }
    }
}
