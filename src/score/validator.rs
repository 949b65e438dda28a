//! Stateful score validator with a bounded audit log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::config::ValidationConfig;

use super::axes::{aggregate, CanonicalScore, DEFAULT_VALUE};
use super::normalize::{normalize, to_json, IssueKind, ValidationIssue, ValidationResult};

/// What was being validated when an audit entry was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A bare score breakdown.
    Breakdown,
    /// A `{score, breakdown}` envelope.
    ScoreValidation,
    /// A profile's `scoreBreakdown`.
    ProfileValidation,
    /// A write to the reserved storage prefix.
    StorageWrite,
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditKind::Breakdown => write!(f, "breakdown"),
            AuditKind::ScoreValidation => write!(f, "score_validation"),
            AuditKind::ProfileValidation => write!(f, "profile_validation"),
            AuditKind::StorageWrite => write!(f, "storage_write"),
        }
    }
}

/// One validation that needed corrections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub kind: AuditKind,

    /// Profile id or storage key, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    pub issues: Vec<ValidationIssue>,

    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Issue type this entry is counted under in reports.
    pub fn primary_kind(&self) -> String {
        self.issues
            .first()
            .map(|issue| issue.kind.to_string())
            .unwrap_or_else(|| self.kind.to_string())
    }
}

/// Summary of recent data quality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub total_validations: usize,
    pub issues_by_type: BTreeMap<String, usize>,
    pub recent_issues: Vec<AuditEntry>,
    pub recommendations: Vec<String>,
}

/// A score payload: overall score, breakdown and suggestions.
///
/// Fields other than these three are kept as-is in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEnvelope {
    pub score: u8,
    pub breakdown: CanonicalScore,
    #[serde(default)]
    pub suggestions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ScoreEnvelope {
    fn default() -> Self {
        Self {
            score: DEFAULT_VALUE,
            breakdown: CanonicalScore::DEFAULT,
            suggestions: Vec::new(),
            extra: Map::new(),
        }
    }
}

const RECENT_ISSUES: usize = 10;
const CONVERSION_ALERT: usize = 10;
const MISSING_ALERT: usize = 20;

/// Score validator.
///
/// Wraps [`normalize`] and records every validation that needed
/// corrections. The log is trimmed to `audit_retain` entries once it grows
/// past `audit_capacity`.
#[derive(Debug, Clone)]
pub struct ScoreValidator {
    config: ValidationConfig,
    audit_log: Vec<AuditEntry>,
}

impl ScoreValidator {
    /// Creates a validator.
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            audit_log: Vec::new(),
        }
    }

    /// Normalizes a bare breakdown.
    pub fn validate_breakdown(&mut self, breakdown: &Value) -> ValidationResult {
        let result = normalize(breakdown);
        self.record(AuditKind::Breakdown, None, &result.issues);
        result
    }

    /// Normalizes a value and records any issues under `kind`.
    pub fn validate_as(
        &mut self,
        kind: AuditKind,
        subject: Option<&str>,
        breakdown: &Value,
    ) -> ValidationResult {
        let result = normalize(breakdown);
        self.record(kind, subject, &result.issues);
        result
    }

    /// Validates a `{score, breakdown, suggestions}` payload.
    ///
    /// The overall score is always recomputed from the normalized breakdown.
    pub fn validate_score_data(&mut self, data: &Value) -> ScoreEnvelope {
        let Some(object) = data.as_object() else {
            return ScoreEnvelope::default();
        };

        let breakdown = match object.get("breakdown") {
            Some(raw) if !raw.is_null() => {
                self.validate_as(AuditKind::ScoreValidation, None, raw).data
            }
            _ => CanonicalScore::DEFAULT,
        };

        let suggestions = match object.get("suggestions") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let extra = object
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "score" | "breakdown" | "suggestions"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        ScoreEnvelope {
            score: aggregate(&breakdown),
            breakdown,
            suggestions,
            extra,
        }
    }

    /// Normalizes the `scoreBreakdown` of each profile in place.
    ///
    /// Profiles without a breakdown receive the default one.
    pub fn validate_profiles(&mut self, profiles: Vec<Value>) -> Vec<Value> {
        profiles
            .into_iter()
            .map(|mut profile| {
                let id = profile.get("id").map(|id| match id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });

                let Some(object) = profile.as_object_mut() else {
                    return profile;
                };

                let breakdown = match object.get("scoreBreakdown") {
                    Some(raw) if !raw.is_null() => {
                        self.validate_as(AuditKind::ProfileValidation, id.as_deref(), raw)
                            .data
                    }
                    _ => CanonicalScore::DEFAULT,
                };
                object.insert("scoreBreakdown".to_string(), to_json(&breakdown));
                profile
            })
            .collect()
    }

    /// Records issues for a validation. Clean validations are not logged.
    pub fn record(&mut self, kind: AuditKind, subject: Option<&str>, issues: &[ValidationIssue]) {
        if issues.is_empty() {
            return;
        }

        let entry = AuditEntry {
            kind,
            subject: subject.map(str::to_string),
            issues: issues.to_vec(),
            timestamp: Utc::now(),
        };

        if self.config.debug_audit {
            tracing::warn!(
                kind = %entry.kind,
                subject = entry.subject.as_deref().unwrap_or("-"),
                issues = entry.issues.len(),
                first = %entry.primary_kind(),
                "Score corrected"
            );
        } else {
            tracing::debug!(
                kind = %entry.kind,
                issues = entry.issues.len(),
                "Score corrected"
            );
        }

        self.audit_log.push(entry);

        if self.audit_log.len() > self.config.audit_capacity {
            // Never keep more than the capacity, whatever `audit_retain` says.
            let keep = self.config.audit_retain.min(self.config.audit_capacity);
            let excess = self.audit_log.len().saturating_sub(keep);
            self.audit_log.drain(..excess);
        }
    }

    /// Entries currently held, oldest first.
    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit_log
    }

    /// Drops every audit entry.
    pub fn clear_audit(&mut self) {
        self.audit_log.clear();
    }

    /// Builds a data quality report from the audit log.
    pub fn report(&self) -> IntegrityReport {
        let mut issues_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &self.audit_log {
            *issues_by_type.entry(entry.primary_kind()).or_insert(0) += 1;
        }

        let mut recommendations = Vec::new();
        let count = |kind: IssueKind| issues_by_type.get(kind.as_str()).copied().unwrap_or(0);

        if count(IssueKind::FormatConversion) > CONVERSION_ALERT {
            recommendations.push(
                "Many legacy-format scores detected; consider migrating stored data.".to_string(),
            );
        }
        if count(IssueKind::MissingValue) > MISSING_ALERT {
            recommendations.push(
                "Many scores are missing axes; review how score data is collected.".to_string(),
            );
        }

        let recent_start = self.audit_log.len().saturating_sub(RECENT_ISSUES);

        IntegrityReport {
            total_validations: self.audit_log.len(),
            issues_by_type,
            recent_issues: self.audit_log[recent_start..].to_vec(),
            recommendations,
        }
    }
}

impl Default for ScoreValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy() -> Value {
        json!({ "commonTopics": 80, "profileMatch": 40 })
    }

    #[test]
    fn test_clean_validation_not_logged() {
        let mut validator = ScoreValidator::default();
        let clean = to_json(&CanonicalScore::uniform(60));
        assert!(validator.validate_breakdown(&clean).is_clean());
        assert!(validator.audit_log().is_empty());
    }

    #[test]
    fn test_audit_log_trims_to_retain() {
        let mut validator = ScoreValidator::default();
        for _ in 0..101 {
            validator.validate_breakdown(&legacy());
        }
        assert_eq!(validator.audit_log().len(), 50);

        for _ in 0..10 {
            validator.validate_breakdown(&legacy());
        }
        assert_eq!(validator.audit_log().len(), 60);
    }

    #[test]
    fn test_retain_larger_than_capacity() {
        let mut validator = ScoreValidator::new(ValidationConfig {
            audit_capacity: 10,
            audit_retain: 50,
            debug_audit: false,
        });
        for _ in 0..25 {
            validator.validate_breakdown(&legacy());
        }
        assert_eq!(validator.audit_log().len(), 10);
    }

    #[test]
    fn test_report_counts_and_recommends() {
        let mut validator = ScoreValidator::default();
        for _ in 0..11 {
            validator.validate_breakdown(&legacy());
        }
        for _ in 0..3 {
            validator.validate_breakdown(&json!({ "businessSynergy": 70 }));
        }

        let report = validator.report();
        assert_eq!(report.total_validations, 14);
        assert_eq!(report.issues_by_type.get("format_conversion"), Some(&11));
        assert_eq!(report.issues_by_type.get("missing_value"), Some(&3));
        assert_eq!(report.recent_issues.len(), 10);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("legacy"));
    }

    #[test]
    fn test_score_data_recomputes_overall() {
        let mut validator = ScoreValidator::default();
        let envelope = validator.validate_score_data(&json!({
            "score": 3,
            "breakdown": {
                "businessSynergy": 100, "solutionMatch": 100, "businessTrends": 0,
                "growthPhaseMatch": 0, "urgencyAlignment": 0, "resourceComplement": 0
            },
            "suggestions": ["talk about hiring"],
            "matchedAt": "2024-05-01"
        }));

        assert_eq!(envelope.score, 50);
        assert_eq!(envelope.suggestions.len(), 1);
        assert_eq!(envelope.extra.get("matchedAt"), Some(&json!("2024-05-01")));
        assert!(validator.audit_log().is_empty());
    }

    #[test]
    fn test_score_data_defaults() {
        let mut validator = ScoreValidator::default();
        assert_eq!(validator.validate_score_data(&json!(null)), ScoreEnvelope::default());

        let envelope = validator.validate_score_data(&json!({ "score": 99 }));
        assert_eq!(envelope.score, 50);
        assert_eq!(envelope.breakdown, CanonicalScore::DEFAULT);
    }

    #[test]
    fn test_profiles_get_breakdowns() {
        let mut validator = ScoreValidator::default();
        let profiles = validator.validate_profiles(vec![
            json!({ "id": "u1", "scoreBreakdown": legacy() }),
            json!({ "id": 2 }),
            json!("not a profile"),
        ]);

        assert_eq!(profiles[0]["scoreBreakdown"]["businessTrends"], 65);
        assert_eq!(profiles[1]["scoreBreakdown"]["solutionMatch"], 50);
        assert_eq!(profiles[2], json!("not a profile"));

        let log = validator.audit_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, AuditKind::ProfileValidation);
        assert_eq!(log[0].subject.as_deref(), Some("u1"));
    }
}
