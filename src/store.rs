//! Snapshot stores keyed by workspace. Every implementation saves whole
//! snapshots (last writer wins) and notifies subscribers of the saved key.

use crate::errors::StoreError;
use crate::models::AppData;
use crate::storage::{load_data, persist_data};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use tracing::debug;

pub const DEFAULT_KEY: &str = "default";

type Listener = Arc<dyn Fn(&AppData) + Send + Sync>;

pub trait SnapshotStore: Send + Sync {
    fn load(&self, key: &str) -> impl Future<Output = Result<AppData, StoreError>> + Send;

    fn save(&self, key: &str, data: &AppData) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Registers `listener` for snapshots saved under `key`. Delivery stops
    /// once the returned handle is cancelled or dropped.
    fn subscribe<F>(&self, key: &str, listener: F) -> Subscription
    where
        F: Fn(&AppData) + Send + Sync + 'static;
}

pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<String, Vec<(u64, Listener)>>,
}

#[derive(Clone, Default)]
pub struct Subscribers {
    registry: Arc<Mutex<Registry>>,
}

impl Subscribers {
    pub fn subscribe<F>(&self, key: &str, listener: F) -> Subscription
    where
        F: Fn(&AppData) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .listeners
            .entry(key.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        Subscription {
            key: key.to_string(),
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn notify(&self, key: &str, data: &AppData) {
        // Listeners run without the lock held so they may subscribe or cancel.
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .listeners
            .get(key)
            .map(|entries| entries.iter().map(|(_, listener)| Arc::clone(listener)).collect())
            .unwrap_or_default();
        debug!(key, listeners = listeners.len(), "notifying snapshot subscribers");
        for listener in listeners {
            listener(data);
        }
    }

    pub fn count(&self, key: &str) -> usize {
        self.registry.lock().listeners.get(key).map_or(0, Vec::len)
    }
}

pub struct Subscription {
    key: String,
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock();
        if let Some(entries) = registry.listeners.get_mut(&self.key) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                registry.listeners.remove(&self.key);
            }
        }
    }
}

/// One pretty-printed JSON file per key inside `dir`.
pub struct FileStore {
    dir: PathBuf,
    subscribers: Subscribers,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotStore for FileStore {
    async fn load(&self, key: &str) -> Result<AppData, StoreError> {
        let path = self.path_for(key)?;
        Ok(load_data(&path).await)
    }

    async fn save(&self, key: &str, data: &AppData) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        persist_data(&path, data).await?;
        self.subscribers.notify(key, data);
        Ok(())
    }

    fn subscribe<F>(&self, key: &str, listener: F) -> Subscription
    where
        F: Fn(&AppData) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(key, listener)
    }
}

/// Shared in-process store. Several handles over one `MemoryStore` behave like
/// devices attached to the same synced backend.
#[derive(Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<String, AppData>>,
    subscribers: Subscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<AppData, StoreError> {
        validate_key(key)?;
        Ok(self.snapshots.lock().get(key).cloned().unwrap_or_default())
    }

    async fn save(&self, key: &str, data: &AppData) -> Result<(), StoreError> {
        validate_key(key)?;
        self.snapshots.lock().insert(key.to_string(), data.clone());
        self.subscribers.notify(key, data);
        Ok(())
    }

    fn subscribe<F>(&self, key: &str, listener: F) -> Subscription
    where
        F: Fn(&AppData) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(key, listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Habit;
    use chrono::NaiveDate;

    fn snapshot(name: &str) -> AppData {
        let mut data = AppData::default();
        data.add_habit(Habit::new(name, "#111", 4, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
        data
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&AppData) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener = move |data: &AppData| {
            let names = data.habits.iter().map(|habit| habit.name.clone());
            sink.lock().extend(names);
        };
        (seen, listener)
    }

    fn unique_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("habit_tracker_store_{}_{nanos}", std::process::id()))
    }

    #[test]
    fn keys_are_restricted_to_safe_characters() {
        assert!(validate_key("team-42_home").is_ok());
        assert!(matches!(validate_key(""), Err(StoreError::InvalidKey(_))));
        assert!(matches!(validate_key("../etc"), Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn memory_store_is_last_writer_wins() {
        let store = MemoryStore::new();
        assert_eq!(store.load("home").await.unwrap(), AppData::default());

        let phone = snapshot("Phone edit");
        let laptop = snapshot("Laptop edit");
        store.save("home", &phone).await.unwrap();
        store.save("home", &laptop).await.unwrap();
        assert_eq!(store.load("home").await.unwrap(), laptop);
    }

    #[tokio::test]
    async fn subscribers_only_see_their_key_until_cancelled() {
        let store = MemoryStore::new();
        let (seen, listener) = recorder();
        let subscription = store.subscribe("home", listener);

        store.save("home", &snapshot("Walk")).await.unwrap();
        store.save("work", &snapshot("Standup")).await.unwrap();
        assert_eq!(*seen.lock(), vec!["Walk".to_string()]);

        subscription.cancel();
        assert_eq!(store.subscribers.count("home"), 0);
        store.save("home", &snapshot("Run")).await.unwrap();
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn dropping_one_subscription_keeps_the_others() {
        let store = MemoryStore::new();
        let (first_seen, first) = recorder();
        let (second_seen, second) = recorder();
        let first_sub = store.subscribe("home", first);
        let _second_sub = store.subscribe("home", second);

        drop(first_sub);
        store.save("home", &snapshot("Yoga")).await.unwrap();
        assert!(first_seen.lock().is_empty());
        assert_eq!(*second_seen.lock(), vec!["Yoga".to_string()]);
    }

    #[tokio::test]
    async fn file_store_persists_per_key_and_notifies() {
        let dir = unique_dir();
        let store = FileStore::new(&dir);
        let (seen, listener) = recorder();
        let _subscription = store.subscribe("home", listener);

        let data = snapshot("Meditate");
        store.save("home", &data).await.unwrap();
        assert!(dir.join("home.json").exists());
        assert_eq!(store.load("home").await.unwrap(), data);
        assert_eq!(store.load("other").await.unwrap(), AppData::default());
        assert_eq!(*seen.lock(), vec!["Meditate".to_string()]);

        assert!(matches!(store.save("../x", &data).await, Err(StoreError::InvalidKey(_))));
        let _ = std::fs::remove_dir_all(dir);
    }
}
