//! Compatibility score schema and validation.
//!
//! Scores reach the dashboard in two generations: the current 6-axis form
//! and a retired 5-axis form still present in persisted data. Everything
//! downstream only ever sees a [`CanonicalScore`], produced here.
//!
//! ## Example
//!
//! ```rust
//! use radarmatch::score::{normalize, aggregate, IssueKind};
//! use serde_json::json;
//!
//! let result = normalize(&json!({ "businessSynergy": 150, "solutionMatch": 80 }));
//! assert_eq!(result.data.business_synergy, 100);
//! assert_eq!(result.count(IssueKind::OutOfRange), 1);
//! assert_eq!(result.count(IssueKind::MissingValue), 4);
//! let overall = aggregate(&result.data);
//! assert!(overall <= 100);
//! ```

mod axes;
mod normalize;
mod validator;

pub use axes::{aggregate, Axis, CanonicalScore, LegacyAxis, DEFAULT_VALUE, MAX_VALUE, MIN_VALUE};
pub use normalize::{
    decode, decode_current, decode_legacy, normalize, normalize_opt, normalize_str, to_json,
    CurrentFields, DecodedScore, IssueKind, LegacyFields, ValidationIssue, ValidationResult,
};
pub use validator::{AuditEntry, AuditKind, IntegrityReport, ScoreEnvelope, ScoreValidator};
