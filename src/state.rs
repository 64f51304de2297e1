use std::sync::Arc;

use tokio::sync::RwLock;

use crate::db::{DbPool, OrmConn};
use crate::entity::cafe_settings;
use crate::events::ChangeFeed;
use crate::razorpay::RazorpayClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub gateway: RazorpayClient,
    pub feed: ChangeFeed,
    pub settings: SettingsCache,
}

/// Read-through cache for the settings singleton. A `None` slot means the row
/// has not been seen yet; callers fall back to the store, then to defaults.
#[derive(Clone, Default)]
pub struct SettingsCache {
    slot: Arc<RwLock<Option<cafe_settings::Model>>>,
}

impl SettingsCache {
    pub async fn get(&self) -> Option<cafe_settings::Model> {
        self.slot.read().await.clone()
    }

    pub async fn store(&self, settings: cafe_settings::Model) {
        *self.slot.write().await = Some(settings);
    }
}
