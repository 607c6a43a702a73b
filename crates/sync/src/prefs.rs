#![forbid(unsafe_code)]

use jd_core::BranchTag;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PREFS_FILE: &str = "prefs.json";

/// Per-device preferences that survive restarts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "jardin_username", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "tao_branch", default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug)]
pub enum PreferencesError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "preferences io: {err}"),
            Self::Json(err) => write!(f, "preferences json: {err}"),
        }
    }
}

impl std::error::Error for PreferencesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PreferencesError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PreferencesError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl Preferences {
    pub fn path_in(storage_dir: &Path) -> PathBuf {
        storage_dir.join(PREFS_FILE)
    }

    /// A missing file reads as empty preferences.
    pub fn load(storage_dir: &Path) -> Result<Self, PreferencesError> {
        let raw = match std::fs::read(Self::path_in(storage_dir)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn save(&self, storage_dir: &Path) -> Result<(), PreferencesError> {
        std::fs::create_dir_all(storage_dir)?;
        let path = Self::path_in(storage_dir);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Stored branch, or the default branch when absent or unusable.
    pub fn branch_tag(&self) -> BranchTag {
        self.branch
            .as_deref()
            .and_then(|raw| BranchTag::try_new(raw).ok())
            .unwrap_or_default()
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(test_name: &str) -> PathBuf {
        let base = std::env::temp_dir();
        let pid = std::process::id();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = base.join(format!("jd_sync_{test_name}_{pid}_{nonce}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn missing_file_is_default_branch() {
        let prefs = Preferences::load(&temp_dir("prefs_missing")).expect("load");
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.branch_tag().as_str(), "centro");
        assert_eq!(prefs.username(), "");
    }

    #[test]
    fn save_then_load_uses_legacy_keys() {
        let dir = temp_dir("prefs_roundtrip");
        let prefs = Preferences {
            username: Some("Lucía".to_string()),
            branch: Some("ejemplares".to_string()),
        };
        prefs.save(&dir).expect("save");

        let raw = std::fs::read_to_string(Preferences::path_in(&dir)).expect("read prefs");
        assert!(raw.contains("\"jardin_username\""));
        assert!(raw.contains("\"tao_branch\""));

        let loaded = Preferences::load(&dir).expect("load");
        assert_eq!(loaded.branch_tag().as_str(), "ejemplares");
        assert_eq!(loaded.username(), "Lucía");
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = temp_dir("prefs_corrupt");
        std::fs::write(Preferences::path_in(&dir), "{not json").expect("write");
        assert!(matches!(Preferences::load(&dir), Err(PreferencesError::Json(_))));
    }
}
