use std::fs;
use std::path::{Path, PathBuf};

use ntfy_core::{PersistedState, StateStore, StoreError};
use ntfy_engine::{AtomicFileWriter, PersistError};
use ntfy_logging::{ntfy_info, ntfy_warn};

/// RON file holding subscriptions, message history and window layout.
pub struct RonStateStore {
    writer: AtomicFileWriter,
}

impl RonStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.writer.target()
    }
}

impl StateStore for RonStateStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        let content = match fs::read_to_string(self.path()) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        ron::from_str(&content)
            .map(Some)
            .map_err(|err| StoreError::Format(err.to_string()))
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(state, pretty)
            .map_err(|err| StoreError::Format(err.to_string()))?;

        self.writer
            .write(content.as_bytes())
            .map_err(|err| match err {
                PersistError::Io(io) => StoreError::Io(io),
                other => StoreError::Location(other.to_string()),
            })
    }
}

/// Loads startup state, treating unreadable or corrupt files as empty.
pub fn load_or_empty(store: &dyn StateStore) -> Option<PersistedState> {
    match store.load() {
        Ok(Some(state)) => {
            ntfy_info!(
                "Loaded {} subscriptions and {} messages from saved state",
                state.subscriptions.len(),
                state.messages.len()
            );
            Some(state)
        }
        Ok(None) => {
            ntfy_info!("No saved state found; starting empty");
            None
        }
        Err(err) => {
            ntfy_warn!("Ignoring saved state: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use ntfy_core::{Message, PersistedSubscription, WindowLayout};
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_state() -> PersistedState {
        let message = Message::decode_line(
            br#"{"id":"a1","time":1700000000,"event":"message","topic":"alerts","title":"Disk","message":"almost full","priority":5,"tags":["warning"]}"#,
            "https://ntfy.sh",
        )
        .unwrap();
        PersistedState {
            subscriptions: vec![PersistedSubscription {
                server: "https://ntfy.sh".to_string(),
                topic: "alerts".to_string(),
            }],
            messages: vec![message],
            window_layout: WindowLayout {
                size: Some((900, 600)),
                position: Some((10, 20)),
                splitter_position: Some(300),
            },
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonStateStore::new(dir.path().join("state.ron"));
        assert!(store.load().unwrap().is_none());
        assert!(load_or_empty(&store).is_none());
    }

    #[test]
    fn saved_state_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonStateStore::new(dir.path().join("nested").join("state.ron"));
        let state = sample_state();

        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), Some(state));
    }

    #[test]
    fn corrupt_file_is_a_format_error_and_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.ron");
        fs::write(&path, "(subscriptions: [oops").unwrap();
        let store = RonStateStore::new(path);

        assert!(matches!(store.load(), Err(StoreError::Format(_))));
        assert!(load_or_empty(&store).is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.ron");
        fs::write(
            &path,
            r#"(subscriptions: [(server: "https://ntfy.sh", topic: "alerts")])"#,
        )
        .unwrap();
        let store = RonStateStore::new(path);

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.subscriptions.len(), 1);
        assert!(loaded.messages.is_empty());
        assert_eq!(loaded.window_layout, WindowLayout::default());
    }
}
