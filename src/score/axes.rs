//! Compatibility axes and the canonical 6-axis score.

use serde::{Deserialize, Serialize};

/// Lowest value any axis can hold.
pub const MIN_VALUE: u8 = 0;

/// Highest value any axis can hold.
pub const MAX_VALUE: u8 = 100;

/// Value assigned to an axis that could not be read.
pub const DEFAULT_VALUE: u8 = 50;

/// One of the six current compatibility axes, in chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    BusinessSynergy,
    SolutionMatch,
    BusinessTrends,
    GrowthPhaseMatch,
    UrgencyAlignment,
    ResourceComplement,
}

impl Axis {
    /// All axes in chart order (axis 0 points up).
    pub const ALL: [Axis; 6] = [
        Axis::BusinessSynergy,
        Axis::SolutionMatch,
        Axis::BusinessTrends,
        Axis::GrowthPhaseMatch,
        Axis::UrgencyAlignment,
        Axis::ResourceComplement,
    ];

    /// Field name used in score objects.
    pub fn key(self) -> &'static str {
        match self {
            Axis::BusinessSynergy => "businessSynergy",
            Axis::SolutionMatch => "solutionMatch",
            Axis::BusinessTrends => "businessTrends",
            Axis::GrowthPhaseMatch => "growthPhaseMatch",
            Axis::UrgencyAlignment => "urgencyAlignment",
            Axis::ResourceComplement => "resourceComplement",
        }
    }

    /// Short label drawn next to the axis.
    pub fn label(self) -> &'static str {
        match self {
            Axis::BusinessSynergy => "Synergy",
            Axis::SolutionMatch => "Solution",
            Axis::BusinessTrends => "Trends",
            Axis::GrowthPhaseMatch => "Growth",
            Axis::UrgencyAlignment => "Urgency",
            Axis::ResourceComplement => "Resources",
        }
    }

    /// Weight in the overall score, in percent. The six weights sum to 100.
    pub fn weight_percent(self) -> u32 {
        match self {
            Axis::BusinessSynergy | Axis::SolutionMatch => 25,
            Axis::BusinessTrends | Axis::GrowthPhaseMatch => 15,
            Axis::UrgencyAlignment | Axis::ResourceComplement => 10,
        }
    }

    /// Weight in the overall score as a fraction.
    pub fn weight(self) -> f64 {
        self.weight_percent() as f64 / 100.0
    }

    /// Position of the axis on the chart.
    pub fn index(self) -> usize {
        match self {
            Axis::BusinessSynergy => 0,
            Axis::SolutionMatch => 1,
            Axis::BusinessTrends => 2,
            Axis::GrowthPhaseMatch => 3,
            Axis::UrgencyAlignment => 4,
            Axis::ResourceComplement => 5,
        }
    }

    /// Looks up an axis by its field name.
    pub fn from_key(key: &str) -> Option<Axis> {
        Axis::ALL.into_iter().find(|axis| axis.key() == key)
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One of the five axes of the retired score schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyAxis {
    CommonTopics,
    CommunicationStyle,
    EmotionalSync,
    ActivityOverlap,
    ProfileMatch,
}

impl LegacyAxis {
    /// All legacy axes in conversion order.
    pub const ALL: [LegacyAxis; 5] = [
        LegacyAxis::CommonTopics,
        LegacyAxis::CommunicationStyle,
        LegacyAxis::EmotionalSync,
        LegacyAxis::ActivityOverlap,
        LegacyAxis::ProfileMatch,
    ];

    /// Field name used in legacy score objects.
    pub fn key(self) -> &'static str {
        match self {
            LegacyAxis::CommonTopics => "commonTopics",
            LegacyAxis::CommunicationStyle => "communicationStyle",
            LegacyAxis::EmotionalSync => "emotionalSync",
            LegacyAxis::ActivityOverlap => "activityOverlap",
            LegacyAxis::ProfileMatch => "profileMatch",
        }
    }

    /// Canonical axes this legacy axis contributes to, in update order.
    pub fn targets(self) -> &'static [Axis] {
        match self {
            LegacyAxis::CommonTopics => &[Axis::BusinessTrends, Axis::BusinessSynergy],
            LegacyAxis::CommunicationStyle => &[Axis::UrgencyAlignment],
            LegacyAxis::EmotionalSync => &[Axis::GrowthPhaseMatch],
            LegacyAxis::ActivityOverlap => &[Axis::UrgencyAlignment],
            LegacyAxis::ProfileMatch => &[Axis::ResourceComplement, Axis::SolutionMatch],
        }
    }
}

/// A fully populated 6-axis score, every value in `0..=100`.
///
/// Field order is the serialization order, which makes the JSON form a
/// stable cache key: structurally equal scores always serialize identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalScore {
    pub business_synergy: u8,
    pub solution_match: u8,
    pub business_trends: u8,
    pub growth_phase_match: u8,
    pub urgency_alignment: u8,
    pub resource_complement: u8,
}

impl CanonicalScore {
    /// Score with every axis at [`DEFAULT_VALUE`].
    pub const DEFAULT: CanonicalScore = CanonicalScore::uniform(DEFAULT_VALUE);

    /// Score with every axis set to `value` (clamped to 100).
    pub const fn uniform(value: u8) -> Self {
        let v = if value > MAX_VALUE { MAX_VALUE } else { value };
        Self {
            business_synergy: v,
            solution_match: v,
            business_trends: v,
            growth_phase_match: v,
            urgency_alignment: v,
            resource_complement: v,
        }
    }

    /// Builds a score from values in chart order, clamping each to 100.
    pub fn from_values(values: [u8; 6]) -> Self {
        let mut score = Self::DEFAULT;
        for (axis, value) in Axis::ALL.into_iter().zip(values) {
            score.set(axis, value);
        }
        score
    }

    /// Value of one axis.
    pub fn get(&self, axis: Axis) -> u8 {
        match axis {
            Axis::BusinessSynergy => self.business_synergy,
            Axis::SolutionMatch => self.solution_match,
            Axis::BusinessTrends => self.business_trends,
            Axis::GrowthPhaseMatch => self.growth_phase_match,
            Axis::UrgencyAlignment => self.urgency_alignment,
            Axis::ResourceComplement => self.resource_complement,
        }
    }

    /// Sets one axis, clamping to 100.
    pub fn set(&mut self, axis: Axis, value: u8) {
        let value = value.min(MAX_VALUE);
        match axis {
            Axis::BusinessSynergy => self.business_synergy = value,
            Axis::SolutionMatch => self.solution_match = value,
            Axis::BusinessTrends => self.business_trends = value,
            Axis::GrowthPhaseMatch => self.growth_phase_match = value,
            Axis::UrgencyAlignment => self.urgency_alignment = value,
            Axis::ResourceComplement => self.resource_complement = value,
        }
    }

    /// Values in chart order.
    pub fn values(&self) -> [u8; 6] {
        Axis::ALL.map(|axis| self.get(axis))
    }

    /// Iterates `(axis, value)` pairs in chart order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, u8)> + '_ {
        Axis::ALL.into_iter().map(move |axis| (axis, self.get(axis)))
    }

    /// Deterministic cache key: compact JSON with fixed key order.
    pub fn cache_key(&self) -> String {
        let mut key = String::with_capacity(140);
        key.push('{');
        for (i, (axis, value)) in self.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push('"');
            key.push_str(axis.key());
            key.push_str("\":");
            key.push_str(&value.to_string());
        }
        key.push('}');
        key
    }

    /// Weighted overall score, see [`aggregate`].
    pub fn overall(&self) -> u8 {
        aggregate(self)
    }
}

impl Default for CanonicalScore {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Weighted overall score: `round(Σ weight·value)`.
///
/// Computed in integer percent so that halves always round up.
pub fn aggregate(score: &CanonicalScore) -> u8 {
    let weighted: u32 = score
        .iter()
        .map(|(axis, value)| axis.weight_percent() * value as u32)
        .sum();
    ((weighted + 50) / 100).min(MAX_VALUE as u32) as u8
}
