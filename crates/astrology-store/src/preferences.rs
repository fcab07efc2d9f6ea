//! Small per-device preferences kept in a JSON file.
//!
//! Keys match the ones the web client keeps in local storage:
//! `dismissedAds`, `accessibility-settings` and `onboarding-seen-{userId}`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;

const DISMISSED_ADS: &str = "dismissedAds";
const ACCESSIBILITY: &str = "accessibility-settings";

fn onboarding_key(user_id: &str) -> String {
    format!("onboarding-seen-{}", user_id)
}

/// Display preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilitySettings {
    #[serde(default)]
    pub high_contrast: bool,
    #[serde(default)]
    pub reduced_motion: bool,
    #[serde(default = "default_font_scale")]
    pub font_scale: f64,
}

fn default_font_scale() -> f64 {
    1.0
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            high_contrast: false,
            reduced_motion: false,
            font_scale: default_font_scale(),
        }
    }
}

/// Preferences file handle. Changes are held in memory until [`save`](Self::save).
#[derive(Debug, Clone)]
pub struct LocalPreferences {
    path: PathBuf,
    values: Map<String, Value>,
}

impl LocalPreferences {
    /// Load from `path`. A missing file yields empty preferences.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Map::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No preferences file, starting empty");
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    /// Write all values back to the file.
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&self.values)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Banner ids the user closed.
    pub fn dismissed_ads(&self) -> Vec<String> {
        self.values
            .get(DISMISSED_ADS)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn dismiss_ad(&mut self, ad_id: &str) {
        let mut ids = self.dismissed_ads();
        if !ids.iter().any(|id| id == ad_id) {
            ids.push(ad_id.to_string());
            self.values.insert(DISMISSED_ADS.to_string(), Value::from(ids));
        }
    }

    /// Stored settings, or defaults when absent or unreadable.
    pub fn accessibility_settings(&self) -> AccessibilitySettings {
        self.values
            .get(ACCESSIBILITY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn set_accessibility_settings(&mut self, settings: &AccessibilitySettings) -> Result<()> {
        self.values
            .insert(ACCESSIBILITY.to_string(), serde_json::to_value(settings)?);
        Ok(())
    }

    pub fn onboarding_seen(&self, user_id: &str) -> bool {
        self.values
            .get(&onboarding_key(user_id))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn mark_onboarding_seen(&mut self, user_id: &str) {
        self.values.insert(onboarding_key(user_id), Value::Bool(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = LocalPreferences::load(dir.path().join("prefs.json")).await.unwrap();
        assert!(prefs.dismissed_ads().is_empty());
        assert_eq!(prefs.accessibility_settings(), AccessibilitySettings::default());
        assert!(!prefs.onboarding_seen("user-1"));
    }

    #[tokio::test]
    async fn test_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut prefs = LocalPreferences::load(&path).await.unwrap();
        prefs.dismiss_ad("ad-1");
        prefs.dismiss_ad("ad-1");
        prefs.dismiss_ad("ad-2");
        prefs.mark_onboarding_seen("user-1");
        prefs
            .set_accessibility_settings(&AccessibilitySettings {
                high_contrast: true,
                reduced_motion: false,
                font_scale: 1.25,
            })
            .unwrap();
        prefs.save().await.unwrap();

        let reloaded = LocalPreferences::load(&path).await.unwrap();
        assert_eq!(reloaded.dismissed_ads(), vec!["ad-1", "ad-2"]);
        assert!(reloaded.onboarding_seen("user-1"));
        assert!(!reloaded.onboarding_seen("user-2"));
        assert!(reloaded.accessibility_settings().high_contrast);

        let raw: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw.get("dismissedAds").is_some());
        assert!(raw.get("accessibility-settings").is_some());
        assert_eq!(raw["onboarding-seen-user-1"], Value::Bool(true));
        assert_eq!(raw["accessibility-settings"]["fontScale"], 1.25);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(LocalPreferences::load(&path).await.is_err());
    }
}
