use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use common::models::TradeSignal;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("signal store I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("signal store {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What the store already knows: the dedup set plus every record, newest
/// first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoredSignals {
    pub known: HashSet<String>,
    pub signals: Vec<TradeSignal>,
}

impl StoredSignals {
    fn from_signals(signals: Vec<TradeSignal>) -> Self {
        let known = signals.iter().map(|s| s.transaction_id.clone()).collect();
        Self { known, signals }
    }
}

pub trait SignalStore: Send + Sync {
    fn load(&self) -> Result<StoredSignals, StoreError>;

    /// Replaces the whole persisted list.
    fn save(&self, signals: &[TradeSignal]) -> Result<(), StoreError>;
}

impl<T: SignalStore + ?Sized> SignalStore for Arc<T> {
    fn load(&self) -> Result<StoredSignals, StoreError> {
        (**self).load()
    }

    fn save(&self, signals: &[TradeSignal]) -> Result<(), StoreError> {
        (**self).save(signals)
    }
}

/// Signals persisted as a pretty-printed JSON array on local disk.
pub struct JsonSignalStore {
    path: PathBuf,
}

impl JsonSignalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "signals".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SignalStore for JsonSignalStore {
    fn load(&self) -> Result<StoredSignals, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No signal file at {}, starting empty", self.path.display());
                return Ok(StoredSignals::default());
            }
            Err(e) => return Err(self.io_err(e)),
        };

        let signals: Vec<TradeSignal> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        Ok(StoredSignals::from_signals(signals))
    }

    fn save(&self, signals: &[TradeSignal]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
                info!("Created signal directory {}", parent.display());
            }
        }

        let json = serde_json::to_string_pretty(signals).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;

        debug!("Saved {} signals to {}", signals.len(), self.path.display());
        Ok(())
    }
}

/// Keeps everything in memory. Used by tests and dry runs.
#[derive(Default)]
pub struct InMemorySignalStore {
    signals: Mutex<Vec<TradeSignal>>,
    saves: Mutex<usize>,
}

impl InMemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals(signals: Vec<TradeSignal>) -> Self {
        Self {
            signals: Mutex::new(signals),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> Vec<TradeSignal> {
        self.signals.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Number of times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl SignalStore for InMemorySignalStore {
    fn load(&self) -> Result<StoredSignals, StoreError> {
        Ok(StoredSignals::from_signals(self.snapshot()))
    }

    fn save(&self, signals: &[TradeSignal]) -> Result<(), StoreError> {
        if let (Ok(mut stored), Ok(mut saves)) = (self.signals.lock(), self.saves.lock()) {
            *stored = signals.to_vec();
            *saves += 1;
        }
        Ok(())
    }
}
