// ABOUTME: JSON-file history backend, one log file per (cluster, service).
// ABOUTME: Appends are serialized per key; distinct keys stay independent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{HistoryEntry, HistoryError, HistoryStore};

/// Default state directory, XDG-ish: `$HOME/.local/state/stevedore`.
pub fn default_state_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".local/state/stevedore"),
        None => PathBuf::from(".stevedore-state"),
    }
}

/// One log-file name component: non-empty, no path separators, and no
/// leading dot.
fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// History log backed by one JSON file per (cluster, service).
///
/// The backend's file writes are not atomic appends, so same-key writes are
/// serialized through a per-key mutex; writes for different keys never
/// contend.
pub struct FileHistoryStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileHistoryStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn log_path(&self, cluster: &str, service: &str) -> Result<PathBuf, HistoryError> {
        // Both names become path components; anything that could escape the
        // state root (separators, leading dots, empty names) is rejected
        // rather than joined.
        for name in [cluster, service] {
            if !is_safe_component(name) {
                return Err(HistoryError::InvalidKey(name.to_string()));
            }
        }
        Ok(self.root.join(format!("{cluster}__{service}.json")))
    }

    fn key_lock(&self, cluster: &str, service: &str) -> Arc<Mutex<()>> {
        let key = format!("{cluster}__{service}");
        self.locks.lock().entry(key).or_default().clone()
    }

    fn read_entries(path: &Path) -> Result<Vec<HistoryEntry>, HistoryError> {
        match fs::read(path) {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| HistoryError::Corrupt(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(path: &Path, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let raw = serde_json::to_vec_pretty(entries)
            .map_err(|e| HistoryError::Corrupt(e.to_string()))?;
        // Write-then-rename so a crash never leaves a truncated log.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn push_state(
        &self,
        cluster: &str,
        service: &str,
        revision: u64,
        message: &str,
    ) -> Result<(), HistoryError> {
        let path = self.log_path(cluster, service)?;
        let lock = self.key_lock(cluster, service);
        let _held = lock.lock();

        fs::create_dir_all(&self.root)?;
        let mut entries = Self::read_entries(&path)?;
        entries.push(HistoryEntry {
            revision,
            message: message.to_string(),
            recorded_at: Utc::now(),
        });
        Self::write_entries(&path, &entries)
    }

    async fn latest(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<Option<HistoryEntry>, HistoryError> {
        let path = self.log_path(cluster, service)?;
        let lock = self.key_lock(cluster, service);
        let _held = lock.lock();

        let entries = Self::read_entries(&path)?;
        Ok(entries.into_iter().next_back())
    }
}
