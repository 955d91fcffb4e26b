//! On-disk session store: one JSON document per session.
//!
//! Writes go through a temp file + rename so readers never observe a torn
//! record, and same-machine writers serialize on an advisory sidecar lock
//! (`fs2`). Record content is still last-writer-wins across concurrent
//! read-modify-write cycles; the relay documents that limitation.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fs2::FileExt;

use crate::errors::RelayError;
use crate::session::Session;
use crate::store::SessionStore;

const LOCK_FILE: &str = ".lock";

/// File-backed [`SessionStore`] rooted at a single directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Opens the store, creating the directory tree if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RelayError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            RelayError::store_unavailable(format!(
                "cannot create store directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    fn record_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }

    fn lock_handle(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))
            .with_context(|| format!("cannot open lock file in {}", self.dir.display()))
    }

    // Lock released when the handle drops at the end of each call.
    fn write_record(&self, session: &Session) -> Result<()> {
        let lock = self.lock_handle()?;
        lock.lock_exclusive()
            .context("cannot take exclusive store lock")?;

        let path = self.record_path(&session.id);
        let content = serde_json::to_string_pretty(session)
            .with_context(|| format!("cannot serialize session {}", session.id))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("cannot write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("cannot move record into place at {}", path.display()))?;
        Ok(())
    }

    fn read_record(&self, path: &Path) -> Result<Option<Session>> {
        let lock = self.lock_handle()?;
        lock.lock_shared().context("cannot take shared store lock")?;

        match fs::read_to_string(path) {
            Ok(content) => {
                let session = serde_json::from_str(&content)
                    .with_context(|| format!("corrupt session record at {}", path.display()))?;
                Ok(Some(session))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    fn list_records(&self) -> Result<Vec<Session>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("cannot list store directory {}", self.dir.display()))?;

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry
                .with_context(|| format!("cannot list store directory {}", self.dir.display()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path) {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping unreadable session record {}: {:#}", path.display(), e);
                }
            }
        }
        Ok(sessions)
    }
}

#[async_trait]
impl SessionStore for LocalStore {
    async fn create(&self, session: &Session) -> Result<(), RelayError> {
        self.write_record(session).map_err(into_unavailable)
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, RelayError> {
        self.read_record(&self.record_path(session_id))
            .map_err(into_unavailable)
    }

    async fn save(&self, session: &Session) -> Result<(), RelayError> {
        self.write_record(session).map_err(into_unavailable)
    }

    async fn delete(&self, session_id: &str) -> Result<(), RelayError> {
        match fs::remove_file(self.record_path(session_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RelayError::store_unavailable(format!(
                "cannot delete session {}: {}",
                session_id, e
            ))),
        }
    }

    async fn exists(&self, session_id: &str) -> Result<bool, RelayError> {
        Ok(self.record_path(session_id).exists())
    }

    async fn list_all(&self) -> Result<Vec<Session>, RelayError> {
        self.list_records().map_err(into_unavailable)
    }
}

fn into_unavailable(e: anyhow::Error) -> RelayError {
    RelayError::store_unavailable(format!("{:#}", e))
}

#[cfg(test)]
#[path = "tests/local_store_tests.rs"]
mod tests;
