//! [`StateService`] backed by an in-process map.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use timeswitch_app::ports::StateService;
use timeswitch_domain::error::StateError;
use timeswitch_domain::id::StateId;
use timeswitch_domain::value::StateValue;

use crate::error::SnapshotError;

/// A state value and whether its last write was acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub val: StateValue,
    pub ack: bool,
}

/// Every state the engine reads or writes, kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: RwLock<BTreeMap<StateId, StoredState>>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`InMemoryStateStore::save`]. A missing
    /// file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no state snapshot, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let snapshot: BTreeMap<String, StoredState> =
            serde_json::from_str(&raw).map_err(|source| SnapshotError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let states = snapshot
            .into_iter()
            .map(|(id, state)| Ok((StateId::new(id).map_err(SnapshotError::InvalidId)?, state)))
            .collect::<Result<BTreeMap<_, _>, SnapshotError>>()?;
        tracing::info!(path = %path.display(), states = states.len(), "state snapshot loaded");
        Ok(Self {
            states: RwLock::new(states),
        })
    }

    /// Write every state to `path` as a JSON object keyed by state id.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let snapshot: BTreeMap<String, StoredState> = self
            .read()
            .iter()
            .map(|(id, state)| (id.to_string(), state.clone()))
            .collect();
        let raw = serde_json::to_string_pretty(&snapshot).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, raw).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), states = snapshot.len(), "state snapshot saved");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &StateId) -> Option<StoredState> {
        self.read().get(id).cloned()
    }

    pub fn insert(&self, id: StateId, value: StateValue, ack: bool) {
        tracing::trace!(state_id = %id, %value, ack, "state written");
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, StoredState { val: value, ack });
    }

    /// States whose id starts with `prefix`, sorted by id.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Vec<(StateId, StoredState)> {
        self.read()
            .iter()
            .filter(|(id, _)| id.as_str().starts_with(prefix))
            .map(|(id, state)| (id.clone(), state.clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<StateId, StoredState>> {
        self.states.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateService for InMemoryStateStore {
    async fn set_state(&self, id: StateId, value: StateValue, ack: bool) -> Result<(), StateError> {
        self.insert(id, value, ack);
        Ok(())
    }

    async fn get_foreign_state(&self, id: StateId) -> Result<StateValue, StateError> {
        self.get(&id)
            .map(|state| state.val)
            .ok_or_else(|| StateError::NotFound(id.to_string()))
    }

    async fn set_foreign_state(&self, id: StateId, value: StateValue) -> Result<(), StateError> {
        self.insert(id, value, false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(id: &str) -> StateId {
        StateId::new(id).unwrap()
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("timeswitch-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn should_read_back_written_foreign_state() {
        let store = InMemoryStateStore::new();
        store
            .set_foreign_state(sid("lamp"), StateValue::Boolean(true))
            .await
            .unwrap();
        assert_eq!(
            store.get_foreign_state(sid("lamp")).await,
            Ok(StateValue::Boolean(true))
        );
        assert!(!store.get(&sid("lamp")).unwrap().ack);
    }

    #[tokio::test]
    async fn should_keep_acknowledge_flag_of_own_states() {
        let store = InMemoryStateStore::new();
        store
            .set_state(sid("onoff.0.enabled"), StateValue::Boolean(false), true)
            .await
            .unwrap();
        assert_eq!(
            store.get(&sid("onoff.0.enabled")),
            Some(StoredState {
                val: StateValue::Boolean(false),
                ack: true,
            })
        );
    }

    #[tokio::test]
    async fn should_fail_reading_unknown_state() {
        let store = InMemoryStateStore::new();
        assert_eq!(
            store.get_foreign_state(sid("missing")).await,
            Err(StateError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn should_list_only_states_under_prefix() {
        let store = InMemoryStateStore::new();
        store.insert(sid("onoff.0.data"), "{}".into(), true);
        store.insert(sid("onoff.0.enabled"), true.into(), true);
        store.insert(sid("lamp"), true.into(), false);
        let ids: Vec<String> = store
            .with_prefix("onoff.")
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["onoff.0.data", "onoff.0.enabled"]);
    }

    #[test]
    fn should_restore_saved_snapshot() {
        let path = temp_path("roundtrip");
        let store = InMemoryStateStore::new();
        store.insert(sid("blind.level"), 40.0.into(), false);
        store.insert(sid("onoff.0.data"), "{\"type\":\"OnOffSchedule\"}".into(), true);
        store.save(&path).unwrap();

        let restored = InMemoryStateStore::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(&sid("blind.level")).unwrap().val, StateValue::Number(40.0));
        assert!(restored.get(&sid("onoff.0.data")).unwrap().ack);
    }

    #[test]
    fn should_start_empty_when_snapshot_missing() {
        let store = InMemoryStateStore::load(&temp_path("missing")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn should_reject_malformed_snapshot() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{not json").unwrap();
        let result = InMemoryStateStore::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(SnapshotError::Json { .. })));
    }
}
