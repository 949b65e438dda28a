//! Write-time validation of stored scores.

use serde_json::Value;

use crate::score::{to_json, AuditKind, IntegrityReport, ScoreValidator};
use crate::types::config::Config;
use crate::RadarResult;

use super::KeyValueStore;

/// Wraps a store so that score payloads are normalized before they persist.
///
/// A write to a key under the reserved prefix is parsed as JSON; if it has a
/// `breakdown`, that breakdown is replaced by its normalized form. Values
/// that are not JSON, and keys outside the prefix, pass through untouched.
pub struct GuardedStore<S> {
    inner: S,
    validator: ScoreValidator,
    prefix: String,
}

impl<S: KeyValueStore> GuardedStore<S> {
    pub fn new(inner: S, validator: ScoreValidator, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            validator,
            prefix: prefix.into(),
        }
    }

    /// Builds a guard using the `storage` and `validation` config sections.
    pub fn from_config(inner: S, config: &Config) -> Self {
        Self::new(
            inner,
            ScoreValidator::new(config.validation.clone()),
            config.storage.score_prefix.clone(),
        )
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True for keys whose writes are validated.
    pub fn is_reserved(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }

    /// Normalizes the `breakdown` of a payload. `None` when the payload has
    /// no breakdown; the flag tells whether corrections were needed.
    fn sanitize(&mut self, key: &str, payload: &mut Value) -> Option<bool> {
        let object = payload.as_object_mut()?;
        let raw = object.get("breakdown").filter(|raw| !raw.is_null())?;
        let result = self
            .validator
            .validate_as(AuditKind::StorageWrite, Some(key), raw);
        object.insert("breakdown".to_string(), to_json(&result.data));
        Some(!result.issues.is_empty())
    }

    /// Re-validates every stored score payload.
    ///
    /// Entries whose breakdown needed corrections are rewritten; entries that
    /// are not valid JSON are deleted. Returns how many keys were touched.
    pub fn repair_all(&mut self) -> RadarResult<usize> {
        let mut repaired = 0;
        for key in self.inner.keys(&self.prefix)? {
            let Some(stored) = self.inner.get(&key)? else {
                continue;
            };

            match serde_json::from_str::<Value>(&stored) {
                Ok(mut payload) => {
                    if self.sanitize(&key, &mut payload) == Some(true) {
                        self.inner.set(&key, &serde_json::to_string(&payload)?)?;
                        repaired += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "Removing corrupt score entry");
                    self.inner.remove(&key)?;
                    repaired += 1;
                }
            }
        }

        tracing::info!(repaired, "Stored scores repaired");
        Ok(repaired)
    }

    pub fn validator(&self) -> &ScoreValidator {
        &self.validator
    }

    /// Integrity report over the writes validated so far.
    pub fn report(&self) -> IntegrityReport {
        self.validator.report()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: KeyValueStore> KeyValueStore for GuardedStore<S> {
    fn get(&self, key: &str) -> RadarResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> RadarResult<()> {
        if !self.is_reserved(key) {
            return self.inner.set(key, value);
        }

        let Ok(mut payload) = serde_json::from_str::<Value>(value) else {
            tracing::debug!(key = %key, "Score payload is not JSON, storing as is");
            return self.inner.set(key, value);
        };

        match self.sanitize(key, &mut payload) {
            Some(_) => self.inner.set(key, &serde_json::to_string(&payload)?),
            None => self.inner.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> RadarResult<bool> {
        self.inner.remove(key)
    }

    fn keys(&self, prefix: &str) -> RadarResult<Vec<String>> {
        self.inner.keys(prefix)
    }
}

impl<S> std::fmt::Debug for GuardedStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedStore")
            .field("prefix", &self.prefix)
            .field("audit_entries", &self.validator.audit_log().len())
            .finish()
    }
}
