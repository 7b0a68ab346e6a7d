/// Mount configuration read through the asset server on startup.
pub const VIEWER_MANIFEST_PATH: &str = "viewer_manifest.json";

/// Prefix for assumed-unit entries in the browser key/value store.
pub const UNIT_STORE_KEY_PREFIX: &str = "product-preview:assumed-unit:";

/// Native config directory and file for assumed-unit entries.
pub const UNIT_STORE_DIR: &str = "product-preview";
pub const UNIT_STORE_FILE: &str = "assumed_units.json";

/// Request timeout for native HTTP fetches of models and skyboxes.
pub const REMOTE_FETCH_TIMEOUT_SECS: u64 = 30;
