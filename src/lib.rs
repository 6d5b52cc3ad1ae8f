pub mod app;
pub mod calculations;
pub mod config;
pub mod date_grid;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use store::{FileStore, MemoryStore, SnapshotStore, Subscription};
