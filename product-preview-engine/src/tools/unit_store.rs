use crate::engine::assets::model_asset::strip_query;
use crate::tools::dimensions::LengthUnit;
use bevy::prelude::*;
use constants::path::UNIT_STORE_KEY_PREFIX;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage read failed: {0}")]
    Read(String),
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Persisted key→unit map. Keys are already normalised by `storage_key`.
pub trait UnitPreferenceStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<LengthUnit>, StoreError>;
    fn save(&self, key: &str, unit: LengthUnit) -> Result<(), StoreError>;
}

/// Signed storage URLs differ per request; the key ignores the query.
pub fn storage_key(url: &str) -> String {
    format!("{}{}", UNIT_STORE_KEY_PREFIX, strip_query(url))
}

#[derive(Default)]
pub struct MemoryUnitStore {
    entries: Mutex<HashMap<String, LengthUnit>>,
}

impl UnitPreferenceStore for MemoryUnitStore {
    fn load(&self, key: &str) -> Result<Option<LengthUnit>, StoreError> {
        self.entries
            .lock()
            .map(|entries| entries.get(key).copied())
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    fn save(&self, key: &str, unit: LengthUnit) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map(|mut entries| {
                entries.insert(key.to_string(), unit);
            })
            .map_err(|e| StoreError::Write(e.to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
pub struct BrowserUnitStore;

#[cfg(target_arch = "wasm32")]
impl BrowserUnitStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl UnitPreferenceStore for BrowserUnitStore {
    fn load(&self, key: &str) -> Result<Option<LengthUnit>, StoreError> {
        let value = Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::Read(format!("{:?}", e)))?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    fn save(&self, key: &str, unit: LengthUnit) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, unit.suffix())
            .map_err(|e| StoreError::Write(format!("{:?}", e)))
    }
}

/// JSON file under the user's config directory.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileUnitStore {
    path: std::path::PathBuf,
    lock: Mutex<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileUnitStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn in_config_dir() -> Option<Self> {
        use constants::path::{UNIT_STORE_DIR, UNIT_STORE_FILE};
        dirs::config_dir().map(|dir| Self::new(dir.join(UNIT_STORE_DIR).join(UNIT_STORE_FILE)))
    }

    fn read_all(&self) -> Result<HashMap<String, LengthUnit>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StoreError::Read(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Read(e.to_string())),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl UnitPreferenceStore for FileUnitStore {
    fn load(&self, key: &str) -> Result<Option<LengthUnit>, StoreError> {
        let _guard = self.lock.lock().map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(self.read_all()?.get(key).copied())
    }

    fn save(&self, key: &str, unit: LengthUnit) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), unit);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write(e.to_string()))?;
        }
        let json =
            serde_json::to_vec_pretty(&entries).map_err(|e| StoreError::Write(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Write(e.to_string()))
    }
}

/// The assumed authoring unit per model URL.
#[derive(Resource)]
pub struct AssumedUnitStore {
    backend: Box<dyn UnitPreferenceStore>,
}

impl AssumedUnitStore {
    pub fn new(backend: impl UnitPreferenceStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryUnitStore::default())
    }

    /// Browser storage on wasm, a config-dir file natively, memory as a last resort.
    pub fn platform_default() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            Self::new(BrowserUnitStore)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            match FileUnitStore::in_config_dir() {
                Some(store) => Self::new(store),
                None => {
                    warn!("No config directory; assumed units will not persist");
                    Self::in_memory()
                }
            }
        }
    }

    /// Stored unit for `url`, or `fallback` written back so later views agree.
    pub fn resolve(&self, url: &str, fallback: LengthUnit) -> LengthUnit {
        let key = storage_key(url);
        match self.backend.load(&key) {
            Ok(Some(unit)) => unit,
            Ok(None) => {
                self.remember(url, fallback);
                fallback
            }
            Err(e) => {
                warn!("Assumed unit lookup failed for {}: {}", key, e);
                fallback
            }
        }
    }

    pub fn remember(&self, url: &str, unit: LengthUnit) {
        let key = storage_key(url);
        if let Err(e) = self.backend.save(&key, unit) {
            warn!("Could not persist assumed unit for {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_query() {
        assert_eq!(
            storage_key("https://cdn/x/door.fbx?X-Amz-Signature=1"),
            storage_key("https://cdn/x/door.fbx?X-Amz-Signature=2")
        );
    }

    #[test]
    fn test_miss_writes_fallback_back() {
        let store = AssumedUnitStore::in_memory();
        assert_eq!(store.resolve("door.fbx?a=1", LengthUnit::Cm), LengthUnit::Cm);
        // Later views see the persisted value even with another default.
        assert_eq!(store.resolve("door.fbx?a=2", LengthUnit::M), LengthUnit::Cm);
    }

    #[test]
    fn test_override_is_persisted() {
        let store = AssumedUnitStore::in_memory();
        store.remember("window.glb", LengthUnit::M);
        assert_eq!(store.resolve("window.glb", LengthUnit::Mm), LengthUnit::M);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let path = std::env::temp_dir()
            .join("preview_unit_store")
            .join("units.json");
        let _ = std::fs::remove_file(&path);

        FileUnitStore::new(&path)
            .save("k", LengthUnit::Cm)
            .unwrap();
        let reopened = FileUnitStore::new(&path);
        assert_eq!(reopened.load("k").unwrap(), Some(LengthUnit::Cm));
        assert_eq!(reopened.load("missing").unwrap(), None);
    }
}
