//! Integration tests for score normalization and the validator.

use radarmatch::score::{
    aggregate, normalize, normalize_opt, normalize_str, to_json, Axis, AuditKind, CanonicalScore,
    IssueKind, ScoreValidator, MAX_VALUE,
};
use radarmatch::types::config::ValidationConfig;
use serde_json::{json, Value};

fn awkward_inputs() -> Vec<Value> {
    vec![
        Value::Null,
        json!("x"),
        json!(42),
        json!([1, 2, 3]),
        json!({}),
        json!({"businessSynergy": 150, "solutionMatch": -20}),
        json!({"businessSynergy": "80", "solutionMatch": null, "businessTrends": 33.5}),
        json!({"commonTopics": 80, "communicationStyle": 70, "emotionalSync": 85}),
        json!({"commonTopics": "loud", "profileMatch": 1e9}),
        json!({"unrelated": true}),
    ]
}

#[test]
fn test_normalize_is_total() {
    for input in [None, Some(&Value::Null), Some(&json!("x")), Some(&json!({}))] {
        let result = normalize_opt(input);
        assert_eq!(result.data, CanonicalScore::DEFAULT);
        assert!(!result.issues.is_empty());
    }
    assert_eq!(normalize_str("definitely not json").data, CanonicalScore::DEFAULT);
}

#[test]
fn test_range_invariant() {
    for input in awkward_inputs() {
        let result = normalize(&input);
        for (_, value) in result.data.iter() {
            assert!(value <= MAX_VALUE, "{} out of range for {}", value, input);
        }
    }
}

#[test]
fn test_idempotence() {
    for input in awkward_inputs() {
        let first = normalize(&input);
        let second = normalize(&to_json(&first.data));
        assert_eq!(second.data, first.data);
        assert!(second.is_clean(), "second pass reported {:?}", second.issues);
    }
}

#[test]
fn test_legacy_conversion() {
    let result = normalize(&json!({
        "commonTopics": 80,
        "communicationStyle": 70,
        "emotionalSync": 85,
        "activityOverlap": 65,
        "profileMatch": 90
    }));

    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.count(IssueKind::FormatConversion), 1);

    let json = to_json(&result.data);
    for axis in Axis::ALL {
        assert!(json.get(axis.key()).is_some(), "missing {}", axis.key());
    }
}

#[test]
fn test_clamping() {
    let result = normalize(&json!({
        "businessSynergy": 150,
        "solutionMatch": -20,
        "businessTrends": 90,
        "growthPhaseMatch": 75,
        "urgencyAlignment": 60,
        "resourceComplement": 80
    }));

    assert_eq!(result.data.business_synergy, 100);
    assert_eq!(result.data.solution_match, 0);
    assert_eq!(result.count(IssueKind::OutOfRange), 2);
    assert_eq!(result.issues.len(), 2);
}

#[test]
fn test_weighted_score() {
    let score = CanonicalScore::from_values([100, 100, 0, 0, 0, 0]);
    assert_eq!(aggregate(&score), 50);
    assert_eq!(aggregate(&CanonicalScore::uniform(100)), 100);
    assert_eq!(aggregate(&CanonicalScore::DEFAULT), 50);
}

#[test]
fn test_cache_key_ignores_origin() {
    let from_current = normalize(&json!({
        "businessSynergy": 65, "solutionMatch": 70, "businessTrends": 65,
        "growthPhaseMatch": 50, "urgencyAlignment": 50, "resourceComplement": 70
    }));
    let from_legacy = normalize(&json!({"commonTopics": 80, "profileMatch": 90}));

    assert_eq!(from_current.data, from_legacy.data);
    assert_eq!(from_current.data.cache_key(), from_legacy.data.cache_key());
}

#[test]
fn test_envelope_and_profiles() {
    let mut validator = ScoreValidator::default();

    let envelope = validator.validate_score_data(&json!({
        "score": 3,
        "breakdown": {"businessSynergy": 100, "solutionMatch": 100, "businessTrends": 0,
                      "growthPhaseMatch": 0, "urgencyAlignment": 0, "resourceComplement": 0},
        "suggestions": ["Share a roadmap"],
        "matchedAt": "2024-05-01"
    }));
    assert_eq!(envelope.score, 50);
    assert_eq!(envelope.suggestions.len(), 1);
    assert_eq!(envelope.extra["matchedAt"], "2024-05-01");

    let profiles = validator.validate_profiles(vec![
        json!({"id": "u1", "scoreBreakdown": {"commonTopics": 40}}),
        json!({"id": "u2"}),
    ]);
    assert_eq!(profiles[1]["scoreBreakdown"]["businessSynergy"], 50);
    assert_eq!(profiles[0]["scoreBreakdown"]["businessTrends"], 45);

    let log = validator.audit_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, AuditKind::ProfileValidation);
    assert_eq!(log[0].subject.as_deref(), Some("u1"));
}

#[test]
fn test_report_recommendations_and_trimming() {
    let mut validator = ScoreValidator::new(ValidationConfig {
        audit_capacity: 100,
        audit_retain: 50,
        debug_audit: false,
    });

    for _ in 0..11 {
        validator.validate_breakdown(&json!({"commonTopics": 60}));
    }
    for _ in 0..21 {
        validator.validate_breakdown(&json!({"businessSynergy": 60}));
    }

    let report = validator.report();
    assert_eq!(report.total_validations, 32);
    assert_eq!(report.issues_by_type["format_conversion"], 11);
    assert_eq!(report.issues_by_type["missing_value"], 21);
    assert_eq!(report.recent_issues.len(), 10);
    assert_eq!(report.recommendations.len(), 2);

    for _ in 0..80 {
        validator.validate_breakdown(&Value::Null);
    }
    assert!(validator.audit_log().len() <= 100);
    assert!(validator.audit_log().len() >= 50);
}
