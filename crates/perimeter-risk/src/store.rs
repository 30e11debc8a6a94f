//! Office store
//!
//! Records are keyed by office id. Every mutation runs against a single
//! record while the store's write lock is held, so concurrent edits to
//! the same office serialize instead of overwriting each other.

use crate::office::Office;
use crate::{Result, RiskError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Keyed office storage with record-level atomic updates
pub trait OfficeRepository: Send + Sync {
    /// All offices ordered by id
    fn list(&self) -> Result<Vec<Office>>;

    fn get(&self, id: &str) -> Result<Office>;

    /// Insert a new office; fails with `Duplicate` if the id is taken
    fn insert(&self, office: Office) -> Result<Office>;

    /// Apply `mutation` to one office atomically and return the updated record.
    /// If the mutation fails the stored record is left untouched.
    fn update(&self, id: &str, mutation: &mut dyn FnMut(&mut Office) -> Result<()>) -> Result<Office>;

    fn remove(&self, id: &str) -> Result<Office>;
}

fn apply(
    offices: &mut BTreeMap<String, Office>,
    id: &str,
    mutation: &mut dyn FnMut(&mut Office) -> Result<()>,
) -> Result<Office> {
    let current = offices
        .get(id)
        .ok_or_else(|| RiskError::NotFound(id.to_string()))?;
    let mut draft = current.clone();
    mutation(&mut draft)?;
    // The id is the key; a mutation cannot move a record.
    draft.id = id.to_string();
    offices.insert(id.to_string(), draft.clone());
    Ok(draft)
}

/// In-process store
#[derive(Default)]
pub struct MemoryRepository {
    offices: RwLock<BTreeMap<String, Office>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offices(offices: impl IntoIterator<Item = Office>) -> Self {
        Self {
            offices: RwLock::new(offices.into_iter().map(|o| (o.id.clone(), o)).collect()),
        }
    }
}

impl OfficeRepository for MemoryRepository {
    fn list(&self) -> Result<Vec<Office>> {
        Ok(self.offices.read().values().cloned().collect())
    }

    fn get(&self, id: &str) -> Result<Office> {
        self.offices
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RiskError::NotFound(id.to_string()))
    }

    fn insert(&self, office: Office) -> Result<Office> {
        let mut offices = self.offices.write();
        if offices.contains_key(&office.id) {
            return Err(RiskError::Duplicate(office.id));
        }
        offices.insert(office.id.clone(), office.clone());
        Ok(office)
    }

    fn update(&self, id: &str, mutation: &mut dyn FnMut(&mut Office) -> Result<()>) -> Result<Office> {
        let mut offices = self.offices.write();
        apply(&mut offices, id, mutation)
    }

    fn remove(&self, id: &str) -> Result<Office> {
        self.offices
            .write()
            .remove(id)
            .ok_or_else(|| RiskError::NotFound(id.to_string()))
    }
}

/// Store backed by a JSON array file.
///
/// The whole map lives in memory; each mutation is written through a
/// temporary file in the same directory and renamed over the store.
pub struct JsonFileRepository {
    path: PathBuf,
    offices: RwLock<BTreeMap<String, Office>>,
}

impl JsonFileRepository {
    /// Open a store, starting empty if the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let offices = if path.exists() {
            let file = File::open(&path)?;
            let list: Vec<Office> = serde_json::from_reader(BufReader::new(file))?;
            let mut offices = BTreeMap::new();
            for office in list {
                if offices.contains_key(&office.id) {
                    return Err(RiskError::Duplicate(office.id));
                }
                offices.insert(office.id.clone(), office);
            }
            offices
        } else {
            BTreeMap::new()
        };

        info!("Opened office store {:?} ({} offices)", path, offices.len());

        Ok(Self {
            path,
            offices: RwLock::new(offices),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, offices: &BTreeMap<String, Office>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let list: Vec<&Office> = offices.values().collect();
            serde_json::to_writer_pretty(&mut writer, &list)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        debug!("Persisted {} offices to {:?}", offices.len(), self.path);
        Ok(())
    }
}

impl OfficeRepository for JsonFileRepository {
    fn list(&self) -> Result<Vec<Office>> {
        Ok(self.offices.read().values().cloned().collect())
    }

    fn get(&self, id: &str) -> Result<Office> {
        self.offices
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RiskError::NotFound(id.to_string()))
    }

    fn insert(&self, office: Office) -> Result<Office> {
        let mut offices = self.offices.write();
        if offices.contains_key(&office.id) {
            return Err(RiskError::Duplicate(office.id));
        }
        offices.insert(office.id.clone(), office.clone());
        if let Err(e) = self.persist(&offices) {
            offices.remove(&office.id);
            return Err(e);
        }
        Ok(office)
    }

    fn update(&self, id: &str, mutation: &mut dyn FnMut(&mut Office) -> Result<()>) -> Result<Office> {
        let mut offices = self.offices.write();
        let previous = offices.get(id).cloned();
        let updated = apply(&mut offices, id, mutation)?;
        if let Err(e) = self.persist(&offices) {
            if let Some(previous) = previous {
                offices.insert(id.to_string(), previous);
            }
            return Err(e);
        }
        Ok(updated)
    }

    fn remove(&self, id: &str) -> Result<Office> {
        let mut offices = self.offices.write();
        let removed = offices
            .remove(id)
            .ok_or_else(|| RiskError::NotFound(id.to_string()))?;
        if let Err(e) = self.persist(&offices) {
            offices.insert(id.to_string(), removed);
            return Err(e);
        }
        Ok(removed)
    }
}
