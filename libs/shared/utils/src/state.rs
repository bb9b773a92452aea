use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::SchedulingStore;

use crate::notify::BookingNotifier;

/// Shared handler state. Cells build their routers over this.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SchedulingStore>,
    pub notifier: Arc<dyn BookingNotifier>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn SchedulingStore>,
        notifier: Arc<dyn BookingNotifier>,
    ) -> Self {
        Self { config, store, notifier }
    }
}
