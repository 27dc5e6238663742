//! JSON-file repositories: one document per entity in a directory.
//!
//! Writes go to a temp file first. `save` renames it over the target;
//! `create` hard-links it into place, which fails if the target exists, so at
//! most one `create` per id succeeds even across processes.

use crate::domain::types::is_token;
use crate::domain::{Appointment, AppointmentId};
use crate::workflow::ports::{
    AppointmentFilter, AppointmentRepository, PendingDecisionRepository, StoreError,
};
use crate::workflow::PendingDecision;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A directory of `{id}.json` documents.
#[derive(Debug, Clone)]
struct JsonDir {
    dir: PathBuf,
}

impl JsonDir {
    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_token(id) {
            return Err(StoreError::InvalidId { id: id.into() });
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// An id that cannot be a file name was never stored, so it reads as absent.
    fn read<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, StoreError> {
        if !is_token(id) {
            return Ok(None);
        }
        read_document(&self.path_for(id)?)
    }

    fn write_temp<T: Serialize>(&self, id: &str, value: &T) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(value).map_err(|e| StoreError::Io {
            message: format!("cannot serialize {}: {}", id, e),
        })?;
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", id, uuid::Uuid::new_v4()));
        std::fs::write(&tmp_path, content)?;
        Ok(tmp_path)
    }

    fn save<T: Serialize>(&self, id: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        let tmp_path = self.write_temp(id, value)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn create<T: Serialize>(&self, id: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        let tmp_path = self.write_temp(id, value)?;
        let linked = std::fs::hard_link(&tmp_path, &path);
        std::fs::remove_file(&tmp_path)?;
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists { id: id.into() })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        if !is_token(id) {
            return Ok(());
        }
        match std::fs::remove_file(self.path_for(id)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_document = path.extension().is_some_and(|ext| ext == "json")
                && !path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('.'));
            if !is_document {
                continue;
            }
            if let Some(document) = read_document(&path)? {
                documents.push(document);
            }
        }
        Ok(documents)
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            message: format!("{}: {}", path.display(), e),
        })
}

/// Appointments stored as `{dir}/{id}.json`.
#[derive(Debug, Clone)]
pub struct FileAppointmentRepository {
    store: JsonDir,
}

impl FileAppointmentRepository {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            store: JsonDir { dir },
        }
    }
}

#[async_trait]
impl AppointmentRepository for FileAppointmentRepository {
    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, StoreError> {
        self.store.read(id.as_str())
    }

    async fn save(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.store.save(appointment.id().as_str(), appointment)
    }

    async fn create(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.store.create(appointment.id().as_str(), appointment)
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let mut appointments: Vec<Appointment> = self
            .store
            .read_all::<Appointment>()?
            .into_iter()
            .filter(|appointment| filter.matches(appointment))
            .collect();
        appointments.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(appointments)
    }
}

/// Pending decisions stored as `{dir}/{id}.json`.
#[derive(Debug, Clone)]
pub struct FilePendingDecisionRepository {
    store: JsonDir,
}

impl FilePendingDecisionRepository {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            store: JsonDir { dir },
        }
    }
}

fn checked(decision: PendingDecision) -> Result<PendingDecision, StoreError> {
    decision.validate().map_err(|e| StoreError::Corrupt {
        message: format!("pending decision {}: {}", decision.id, e),
    })?;
    Ok(decision)
}

#[async_trait]
impl PendingDecisionRepository for FilePendingDecisionRepository {
    async fn save(&self, decision: &PendingDecision) -> Result<(), StoreError> {
        self.store.save(&decision.id, decision)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PendingDecision>, StoreError> {
        self.store
            .read::<PendingDecision>(id)?
            .map(checked)
            .transpose()
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.remove(id)
    }

    async fn list(&self) -> Result<Vec<PendingDecision>, StoreError> {
        let mut decisions = self
            .store
            .read_all::<PendingDecision>()?
            .into_iter()
            .map(checked)
            .collect::<Result<Vec<_>, _>>()?;
        decisions.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(decisions)
    }
}

#[cfg(test)]
#[path = "tests/json_repo_tests.rs"]
mod tests;
