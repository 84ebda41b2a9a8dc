// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for Vantage tools.
//!
//! Each key is one `<key>.json` file under the platform config directory
//! (e.g. `~/.config/vantage` on Linux).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use vantage_app_core::config::{validate_key, ConfigError, ConfigStore};

/// Store configs as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at the user config directory, created if missing.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "Vantage")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::with_base(dirs.config_dir())
    }

    /// Store rooted at `base`, created if missing.
    pub fn with_base(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        validate_key(key)?;
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    // Written to a sibling temp file and renamed so readers never see a
    // partial blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::create_dir_all(&self.base)?;
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vantage_app_core::config::ConfigService;
    use vantage_app_core::prefs::{ReceiverPrefs, RECEIVER_PREFS_KEY};

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path()).unwrap();
        assert!(matches!(
            store.load_raw("receiver"),
            Err(ConfigError::NotFound)
        ));
    }

    #[test]
    fn blob_lands_in_key_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path().join("nested")).unwrap();
        store.save_raw("receiver", b"{}").unwrap();
        assert_eq!(
            fs::read(dir.path().join("nested/receiver.json")).unwrap(),
            b"{}"
        );
        assert!(!dir.path().join("nested/receiver.json.tmp").exists());
        assert_eq!(store.load_raw("receiver").unwrap(), b"{}");
    }

    #[test]
    fn traversal_keys_never_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path()).unwrap();
        assert!(matches!(
            store.save_raw("../escape", b"x"),
            Err(ConfigError::InvalidKey(_))
        ));
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }

    #[test]
    fn receiver_prefs_persist_across_services() {
        let dir = tempfile::tempdir().unwrap();
        let svc = ConfigService::new(FsConfigStore::with_base(dir.path()).unwrap());
        let prefs = ReceiverPrefs::default().with_overrides(None, Some(4096));
        svc.save(RECEIVER_PREFS_KEY, &prefs).unwrap();

        let reopened = ConfigService::new(FsConfigStore::with_base(dir.path()).unwrap());
        let loaded: ReceiverPrefs = reopened.load_or_init(RECEIVER_PREFS_KEY).unwrap();
        assert_eq!(loaded, prefs);
    }
}
