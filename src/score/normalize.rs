//! Score normalization.
//!
//! Raw scores arrive as arbitrary JSON. Decoding is a pure, tagged step
//! ([`decode`]): try the current 6-axis schema, then the legacy 5-axis
//! schema, else give up with [`DecodedScore::Unknown`]. Each outcome is
//! then turned into a complete [`CanonicalScore`] plus the list of
//! corrections that were applied. No input can make [`normalize`] fail.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::axes::{Axis, CanonicalScore, LegacyAxis, DEFAULT_VALUE, MAX_VALUE, MIN_VALUE};

/// Kind of correction applied during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Axis absent or null, default applied.
    MissingValue,
    /// Axis present but not a number, default applied.
    InvalidType,
    /// Axis outside `0..=100`, clamped.
    OutOfRange,
    /// Legacy score converted to the current schema.
    FormatConversion,
    /// Neither schema recognised, defaults applied.
    UnknownFormat,
}

impl IssueKind {
    /// Snake-case name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::MissingValue => "missing_value",
            IssueKind::InvalidType => "invalid_type",
            IssueKind::OutOfRange => "out_of_range",
            IssueKind::FormatConversion => "format_conversion",
            IssueKind::UnknownFormat => "unknown_format",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single correction. Informational only, never blocks the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Axis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationIssue {
    fn new(kind: IssueKind) -> Self {
        Self {
            kind,
            field: None,
            original: None,
            corrected: None,
            expected: None,
            actual: None,
        }
    }

    /// Axis absent or null.
    pub fn missing(axis: Axis) -> Self {
        Self {
            field: Some(axis),
            corrected: Some(DEFAULT_VALUE),
            ..Self::new(IssueKind::MissingValue)
        }
    }

    /// Axis holding something other than a finite number.
    pub fn invalid_type(axis: Axis, original: &Value) -> Self {
        Self {
            field: Some(axis),
            original: Some(original.clone()),
            corrected: Some(DEFAULT_VALUE),
            expected: Some("number".to_string()),
            actual: Some(json_type_name(original).to_string()),
            ..Self::new(IssueKind::InvalidType)
        }
    }

    /// Axis clamped into range.
    pub fn out_of_range(axis: Axis, original: &Value, corrected: u8) -> Self {
        Self {
            field: Some(axis),
            original: Some(original.clone()),
            corrected: Some(corrected),
            ..Self::new(IssueKind::OutOfRange)
        }
    }

    /// Legacy schema converted.
    pub fn format_conversion() -> Self {
        Self::new(IssueKind::FormatConversion)
    }

    /// Unrecognised input.
    pub fn unknown_format(original: &Value) -> Self {
        Self {
            actual: Some(json_type_name(original).to_string()),
            ..Self::new(IssueKind::UnknownFormat)
        }
    }
}

/// Normalized score plus the corrections that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Complete, in-range score.
    pub data: CanonicalScore,

    /// Corrections applied, in order. May be empty.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// True when the input needed no correction.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues of one kind.
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// Raw fields of a current-schema score, in axis order.
#[derive(Debug, Clone, Copy)]
pub struct CurrentFields<'a> {
    pub values: [Option<&'a Value>; 6],
}

/// Raw fields of a legacy-schema score, in legacy order.
#[derive(Debug, Clone, Copy)]
pub struct LegacyFields<'a> {
    pub values: [Option<&'a Value>; 5],
}

/// Tagged outcome of schema detection.
#[derive(Debug, Clone, Copy)]
pub enum DecodedScore<'a> {
    Current(CurrentFields<'a>),
    Legacy(LegacyFields<'a>),
    Unknown,
}

/// Detects which schema a raw value uses.
pub fn decode(input: &Value) -> DecodedScore<'_> {
    if let Some(fields) = decode_current(input) {
        return DecodedScore::Current(fields);
    }
    if let Some(fields) = decode_legacy(input) {
        return DecodedScore::Legacy(fields);
    }
    DecodedScore::Unknown
}

/// Current schema: an object holding at least one canonical axis key.
pub fn decode_current(input: &Value) -> Option<CurrentFields<'_>> {
    let object = input.as_object()?;
    if !Axis::ALL.iter().any(|axis| object.contains_key(axis.key())) {
        return None;
    }
    Some(CurrentFields {
        values: Axis::ALL.map(|axis| object.get(axis.key())),
    })
}

/// Legacy schema: an object holding at least one legacy axis key.
pub fn decode_legacy(input: &Value) -> Option<LegacyFields<'_>> {
    let object = input.as_object()?;
    if !LegacyAxis::ALL.iter().any(|axis| object.contains_key(axis.key())) {
        return None;
    }
    Some(LegacyFields {
        values: LegacyAxis::ALL.map(|axis| object.get(axis.key())),
    })
}

/// Normalizes any JSON value into a complete canonical score.
pub fn normalize(input: &Value) -> ValidationResult {
    match decode(input) {
        DecodedScore::Current(fields) => from_current(fields),
        DecodedScore::Legacy(fields) => from_legacy(fields),
        DecodedScore::Unknown => ValidationResult {
            data: CanonicalScore::DEFAULT,
            issues: vec![ValidationIssue::unknown_format(input)],
        },
    }
}

/// Normalizes an optional value; `None` behaves like `null`.
pub fn normalize_opt(input: Option<&Value>) -> ValidationResult {
    match input {
        Some(value) => normalize(value),
        None => normalize(&Value::Null),
    }
}

/// Normalizes JSON text. Text that is not JSON is treated as a plain string.
pub fn normalize_str(input: &str) -> ValidationResult {
    match serde_json::from_str::<Value>(input) {
        Ok(value) => normalize(&value),
        Err(_) => normalize(&Value::String(input.to_string())),
    }
}

/// Serializes a canonical score back into a JSON object.
pub fn to_json(score: &CanonicalScore) -> Value {
    let mut object = Map::with_capacity(6);
    for (axis, value) in score.iter() {
        object.insert(axis.key().to_string(), Value::from(value));
    }
    Value::Object(object)
}

enum AxisReading {
    Missing,
    WrongType,
    Number(f64),
}

fn read_axis(value: Option<&Value>) -> AxisReading {
    match value {
        None | Some(Value::Null) => AxisReading::Missing,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => AxisReading::Number(v),
            _ => AxisReading::WrongType,
        },
        Some(_) => AxisReading::WrongType,
    }
}

fn clamp_round(value: f64) -> u8 {
    value.clamp(MIN_VALUE as f64, MAX_VALUE as f64).round() as u8
}

fn from_current(fields: CurrentFields<'_>) -> ValidationResult {
    let mut data = CanonicalScore::DEFAULT;
    let mut issues = Vec::new();

    for (axis, raw) in Axis::ALL.into_iter().zip(fields.values) {
        match read_axis(raw) {
            AxisReading::Missing => {
                data.set(axis, DEFAULT_VALUE);
                issues.push(ValidationIssue::missing(axis));
            }
            AxisReading::WrongType => {
                data.set(axis, DEFAULT_VALUE);
                // read_axis only reports WrongType for a present value
                let original = raw.unwrap_or(&Value::Null);
                issues.push(ValidationIssue::invalid_type(axis, original));
            }
            AxisReading::Number(v) if v < MIN_VALUE as f64 || v > MAX_VALUE as f64 => {
                let corrected = clamp_round(v);
                data.set(axis, corrected);
                let original = raw.cloned().unwrap_or(Value::Null);
                issues.push(ValidationIssue::out_of_range(axis, &original, corrected));
            }
            AxisReading::Number(v) => data.set(axis, clamp_round(v)),
        }
    }

    ValidationResult { data, issues }
}

fn from_legacy(fields: LegacyFields<'_>) -> ValidationResult {
    let mut running = Axis::ALL.map(|_| DEFAULT_VALUE as f64);

    for (legacy, raw) in LegacyAxis::ALL.into_iter().zip(fields.values) {
        // Contributors that are not numbers leave their targets untouched.
        let AxisReading::Number(v) = read_axis(raw) else {
            continue;
        };
        let contribution = v.clamp(MIN_VALUE as f64, MAX_VALUE as f64);
        for target in legacy.targets() {
            let slot = &mut running[target.index()];
            *slot = ((*slot + contribution) / 2.0).round();
        }
    }

    let mut data = CanonicalScore::DEFAULT;
    for axis in Axis::ALL {
        data.set(axis, clamp_round(running[axis.index()]));
    }

    ValidationResult {
        data,
        issues: vec![ValidationIssue::format_conversion()],
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
