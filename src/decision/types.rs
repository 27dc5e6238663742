//! Request and result shapes of the decision engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Decision kind for appointment triage.
pub const APPOINTMENT_PRIORITY_KIND: &str = "appointment priority";

/// Lowercases a kind and treats `_` and `-` as spaces, so
/// `appointment_priority` names the same kind as `appointment priority`.
pub fn normalize_kind(kind: &str) -> String {
    kind.trim().to_ascii_lowercase().replace(['_', '-'], " ")
}

/// Caller-supplied importance tier. Higher weights make the engine more
/// willing to stop for human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DecisionWeight {
    Low,
    #[default]
    Medium,
    High,
}

impl DecisionWeight {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionWeight::Low => "Low",
            DecisionWeight::Medium => "Medium",
            DecisionWeight::High => "High",
        }
    }
}

impl Display for DecisionWeight {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for DecisionWeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(DecisionWeight::Low),
            "medium" => Ok(DecisionWeight::Medium),
            "high" => Ok(DecisionWeight::High),
            other => Err(format!(
                "unknown weight '{}' (use low, medium or high)",
                other
            )),
        }
    }
}

/// Verdict on whether a decision may proceed without a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutonomyLevel {
    Automatic,
    Supervised,
    Blocked,
}

impl AutonomyLevel {
    /// True when the decision must wait for a human before taking effect.
    pub fn needs_approval(&self) -> bool {
        matches!(self, AutonomyLevel::Supervised | AutonomyLevel::Blocked)
    }
}

impl Display for AutonomyLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AutonomyLevel::Automatic => "AUTOMATIC",
            AutonomyLevel::Supervised => "SUPERVISED",
            AutonomyLevel::Blocked => "BLOCKED",
        };
        write!(f, "{}", label)
    }
}

/// Everything the engine needs to decide, plus the payload needed to act on
/// the decision later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    pub kind: String,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<DecisionWeight>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl DecisionContext {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: BTreeMap::new(),
            weight: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_weight(mut self, weight: DecisionWeight) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// The weight to evaluate with; unspecified means Medium.
    pub fn effective_weight(&self) -> DecisionWeight {
        self.weight.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOption {
    pub id: String,
    pub value: String,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tradeoff {
    pub option_id: String,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub options: Vec<DecisionOption>,
    pub tradeoffs: Vec<Tradeoff>,
    pub primary_recommendation: Option<DecisionOption>,
    pub requires_human_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<String>,
    pub autonomy_level: AutonomyLevel,
}

impl DecisionResult {
    /// A result with no options that must not proceed unattended.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            options: Vec::new(),
            tradeoffs: Vec::new(),
            primary_recommendation: None,
            requires_human_review: true,
            review_reason: Some(reason.into()),
            autonomy_level: AutonomyLevel::Blocked,
        }
    }
}
