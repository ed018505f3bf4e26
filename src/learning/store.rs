//! Persistence of Q-tables between runs.
//!
//! Tables are keyed by `(run, agent_id)`. A missing entry is not an error:
//! the agent starts from an empty table.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use super::q_table::QTable;
use crate::error::StoreError;
use crate::Id;

/// Storage backend for per-agent Q-tables.
pub trait QTableStore {
    /// Table saved for `agent` in `run`, or `None` if there is none.
    fn load(&self, run: u32, agent: &str) -> Result<Option<QTable>, StoreError>;

    /// Saves (or replaces) the table of `agent` in `run`.
    fn save(&mut self, run: u32, agent: &str, table: &QTable) -> Result<(), StoreError>;
}

/// One bincode blob per agent and run in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Uses `dir` for all blobs. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `agent_{id}_run_{run}.bin` under the store directory.
    pub fn path_for(&self, run: u32, agent: &str) -> PathBuf {
        self.dir.join(format!("agent_{agent}_run_{run}.bin"))
    }
}

impl QTableStore for FileStore {
    fn load(&self, run: u32, agent: &str) -> Result<Option<QTable>, StoreError> {
        let path = self.path_for(run, agent);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let table: QTable = bincode::deserialize(&data)?;
        info!(agent, run, states = table.len(), path = %path.display(), "Q-table loaded");
        Ok(Some(table))
    }

    fn save(&mut self, run: u32, agent: &str, table: &QTable) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(run, agent);
        let data = bincode::serialize(table)?;
        fs::write(&path, data)?;
        info!(agent, run, states = table.len(), path = %path.display(), "Q-table saved");
        Ok(())
    }
}

/// In-process store, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<(u32, Id), QTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl QTableStore for MemoryStore {
    fn load(&self, run: u32, agent: &str) -> Result<Option<QTable>, StoreError> {
        Ok(self.tables.get(&(run, agent.to_string())).cloned())
    }

    fn save(&mut self, run: u32, agent: &str, table: &QTable) -> Result<(), StoreError> {
        self.tables.insert((run, agent.to_string()), table.clone());
        Ok(())
    }
}
