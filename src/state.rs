use crate::config::AppConfig;
use crate::models::AppData;
use crate::store::FileStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
    pub workspace: String,
    pub streak_horizon_weeks: u32,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(config: &AppConfig, store: FileStore, data: AppData) -> Self {
        Self {
            store: Arc::new(store),
            workspace: config.workspace.clone(),
            streak_horizon_weeks: config.streak_horizon_weeks,
            data: Arc::new(Mutex::new(data)),
        }
    }
}
