//! Qualification data sources: stored preferences, feature flags, and the
//! account's service tier.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use async_trait::async_trait;
use shared::{domain::ServiceTier, error::PlatformError};
use tracing::debug;

#[async_trait]
pub trait QualificationSource: Send + Sync {
    /// Stored boolean preference; unset reads as `false`.
    async fn preference(&self, key: &str) -> Result<bool, PlatformError>;
    async fn feature_enabled(&self, flag: &str) -> Result<bool, PlatformError>;
    async fn service_tier(&self) -> Result<ServiceTier, PlatformError>;
    async fn pending_invitations(&self) -> Result<usize, PlatformError>;
}

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<bool>, PlatformError>;
    fn set(&self, key: &str, value: bool) -> Result<(), PlatformError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: Mutex<HashMap<String, bool>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<bool>, PlatformError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied())
    }

    fn set(&self, key: &str, value: bool) -> Result<(), PlatformError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Preferences persisted as a flat JSON object of booleans.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, bool>>,
}

impl JsonPreferenceStore {
    /// Opens the store, reading `path` if it exists. A missing file is an
    /// empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PlatformError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), entries = values.len(), "opened preference store");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, bool>) -> Result<(), PlatformError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<bool>, PlatformError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied())
    }

    fn set(&self, key: &str, value: bool) -> Result<(), PlatformError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        self.persist(&values)
    }
}

/// Qualification source answered from local state: a preference store plus
/// the account tier, feature flags, and invitation count as last reported by
/// the platform.
pub struct LocalQualificationSource {
    preferences: Arc<dyn PreferenceStore>,
    tier: RwLock<ServiceTier>,
    features: RwLock<HashSet<String>>,
    pending_invitations: RwLock<usize>,
}

impl LocalQualificationSource {
    pub fn new(preferences: Arc<dyn PreferenceStore>, tier: ServiceTier) -> Self {
        Self {
            preferences,
            tier: RwLock::new(tier),
            features: RwLock::new(HashSet::new()),
            pending_invitations: RwLock::new(0),
        }
    }

    pub fn with_features<I, S>(self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(features.into_iter().map(Into::into));
        self
    }

    pub fn set_tier(&self, tier: ServiceTier) {
        *self.tier.write().unwrap_or_else(PoisonError::into_inner) = tier;
    }

    pub fn set_feature(&self, flag: &str, enabled: bool) {
        let mut features = self.features.write().unwrap_or_else(PoisonError::into_inner);
        if enabled {
            features.insert(flag.to_string());
        } else {
            features.remove(flag);
        }
    }

    pub fn set_pending_invitations(&self, count: usize) {
        *self
            .pending_invitations
            .write()
            .unwrap_or_else(PoisonError::into_inner) = count;
    }

    pub fn preferences(&self) -> &Arc<dyn PreferenceStore> {
        &self.preferences
    }
}

#[async_trait]
impl QualificationSource for LocalQualificationSource {
    async fn preference(&self, key: &str) -> Result<bool, PlatformError> {
        Ok(self.preferences.get(key)?.unwrap_or(false))
    }

    async fn feature_enabled(&self, flag: &str) -> Result<bool, PlatformError> {
        Ok(self
            .features
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(flag))
    }

    async fn service_tier(&self) -> Result<ServiceTier, PlatformError> {
        Ok(*self.tier.read().unwrap_or_else(PoisonError::into_inner))
    }

    async fn pending_invitations(&self) -> Result<usize, PlatformError> {
        Ok(*self
            .pending_invitations
            .read()
            .unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("prefs.json");

        let store = JsonPreferenceStore::open(&path).expect("open missing");
        assert_eq!(store.get("upsell.dismissed").expect("get"), None);
        store.set("upsell.dismissed", true).expect("set");

        let reopened = JsonPreferenceStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("upsell.dismissed").expect("get"), Some(true));
    }

    #[test]
    fn json_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").expect("write");

        let err = JsonPreferenceStore::open(&path).expect_err("should fail");
        assert_eq!(err.code, shared::error::ErrorCode::Storage);
    }

    #[tokio::test]
    async fn local_source_reads_unset_preference_as_false() {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(InMemoryPreferenceStore::new());
        let source = LocalQualificationSource::new(Arc::clone(&prefs), ServiceTier::Basic)
            .with_features(["care_behaviors"]);

        assert!(!source.preference("rate_app.dismissed").await.expect("pref"));
        prefs.set("rate_app.dismissed", true).expect("set");
        assert!(source.preference("rate_app.dismissed").await.expect("pref"));

        assert!(source.feature_enabled("care_behaviors").await.expect("flag"));
        source.set_feature("care_behaviors", false);
        assert!(!source.feature_enabled("care_behaviors").await.expect("flag"));

        source.set_tier(ServiceTier::Premium);
        assert_eq!(source.service_tier().await.expect("tier"), ServiceTier::Premium);
    }
}
