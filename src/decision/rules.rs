//! Classification rules for appointment priority.
//!
//! The ordinary ambiguity test and the extreme-ambiguity test have separate
//! thresholds and are kept as separate predicates; they are not equivalent.

use crate::decision::types::{DecisionOption, Tradeoff};
use crate::domain::types::PriorityLevel;
use serde_json::Value;
use std::collections::BTreeMap;

/// Phrases that mark a request as urgent (case-insensitive substring match).
pub const URGENCY_KEYWORDS: &[&str] = &[
    "severe pain",
    "bleeding",
    "chest",
    "shortness of breath",
    "difficulty breathing",
    "unconscious",
    "fainting",
    "seizure",
    "high fever",
    "fracture",
];

/// Age from which a patient is classified at least Medium.
pub const ELDERLY_AGE: f64 = 65.0;
/// Waiting longer than this escalates the candidate one step.
pub const LONG_WAIT_DAYS: f64 = 15.0;

// Clear-cut patterns for the ordinary ambiguity test.
const CLEAR_LONG_WAIT_DAYS: f64 = 15.0;
const CLEAR_YOUNG_AGE: f64 = 40.0;
const CLEAR_SHORT_WAIT_DAYS: f64 = 7.0;
const CLEAR_ELDERLY_AGE: f64 = 65.0;
const CLEAR_VERY_SHORT_WAIT_DAYS: f64 = 3.0;

// Self-contradictory or degenerate inputs.
const CONTRADICTION_SHORT_WAIT_DAYS: f64 = 5.0;
const CONTRADICTION_YOUNG_AGE: f64 = 50.0;
const CONTRADICTION_LONG_WAIT_DAYS: f64 = 20.0;
const CONTRADICTION_ELDERLY_AGE: f64 = 70.0;
const MIN_REASON_CHARS: usize = 5;

/// Validated inputs of an appointment-priority decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityInputs {
    pub reason: String,
    pub age: f64,
    pub wait_days: f64,
}

impl PriorityInputs {
    /// Reads `reason` (string), `age` and `waitDays` (numbers) from the context data.
    pub fn from_data(data: &BTreeMap<String, Value>) -> Result<Self, String> {
        let reason = match data.get("reason") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err("field 'reason' must be a string".to_string()),
            None => return Err("missing required field 'reason'".to_string()),
        };
        Ok(Self {
            reason,
            age: number_field(data, "age")?,
            wait_days: number_field(data, "waitDays")?,
        })
    }

    /// Urgency keywords found in the reason, in vocabulary order.
    pub fn urgency_keywords(&self) -> Vec<&'static str> {
        let reason = self.reason.to_lowercase();
        URGENCY_KEYWORDS
            .iter()
            .copied()
            .filter(|keyword| reason.contains(keyword))
            .collect()
    }

    pub fn has_urgency(&self) -> bool {
        !self.urgency_keywords().is_empty()
    }
}

fn number_field(data: &BTreeMap<String, Value>, key: &str) -> Result<f64, String> {
    match data.get(key) {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(value) => Ok(value),
            None => Err(format!("field '{}' is not representable as a number", key)),
        },
        Some(_) => Err(format!("field '{}' must be a number", key)),
        None => Err(format!("missing required field '{}'", key)),
    }
}

/// Keyword, then age, then default classification.
pub fn base_priority(inputs: &PriorityInputs) -> PriorityLevel {
    if inputs.has_urgency() {
        PriorityLevel::High
    } else if inputs.age >= ELDERLY_AGE {
        PriorityLevel::Medium
    } else {
        PriorityLevel::Low
    }
}

/// Base classification escalated one step for long waits. Never downgrades.
pub fn candidate_priority(inputs: &PriorityInputs) -> PriorityLevel {
    let base = base_priority(inputs);
    if inputs.wait_days > LONG_WAIT_DAYS {
        base.escalated()
    } else {
        base
    }
}

pub fn option_id(priority: PriorityLevel) -> &'static str {
    match priority {
        PriorityLevel::High => "high",
        PriorityLevel::Medium => "medium",
        PriorityLevel::Low => "low",
    }
}

/// One scored option per priority level, ordered High, Medium, Low.
pub fn priority_options(inputs: &PriorityInputs) -> Vec<DecisionOption> {
    PriorityLevel::ALL
        .into_iter()
        .map(|priority| priority_option(inputs, priority))
        .collect()
}

/// The scored option for a single priority level.
pub fn priority_option(inputs: &PriorityInputs, priority: PriorityLevel) -> DecisionOption {
    let keywords = inputs.urgency_keywords();
    let (confidence, reasons) = match priority {
        PriorityLevel::High if !keywords.is_empty() => (
            0.9,
            vec![format!("urgency keywords present: {}", keywords.join(", "))],
        ),
        PriorityLevel::High => (
            0.7,
            vec!["no urgency keywords; high priority would be precautionary".to_string()],
        ),
        PriorityLevel::Medium if inputs.age >= ELDERLY_AGE => {
            (0.8, vec![format!("patient is {} or older", ELDERLY_AGE)])
        }
        PriorityLevel::Medium if inputs.wait_days > LONG_WAIT_DAYS => (
            0.75,
            vec![format!(
                "patient has waited more than {} days",
                LONG_WAIT_DAYS
            )],
        ),
        PriorityLevel::Medium => (0.6, vec!["no age or waiting-time factor".to_string()]),
        PriorityLevel::Low => (
            0.7,
            vec!["routine request handled in regular scheduling".to_string()],
        ),
    };

    DecisionOption {
        id: option_id(priority).to_string(),
        value: priority.label().to_string(),
        confidence,
        reasons,
    }
}

/// Fixed advantages and disadvantages of each priority level.
pub fn tradeoff_for(priority: PriorityLevel) -> Tradeoff {
    let (advantages, disadvantages): (&[&str], &[&str]) = match priority {
        PriorityLevel::High => (
            &[
                "patient is seen at the earliest available slot",
                "lowest clinical risk if the symptoms are serious",
            ],
            &[
                "consumes scarce urgent capacity",
                "may displace patients with a greater need",
            ],
        ),
        PriorityLevel::Medium => (
            &[
                "balances waiting time against capacity",
                "keeps urgent slots free",
            ],
            &["may delay care if the condition worsens"],
        ),
        PriorityLevel::Low => (
            &[
                "preserves capacity for urgent cases",
                "fits regular scheduling",
            ],
            &[
                "longest expected wait",
                "risk of under-triaging symptoms the patient did not report",
            ],
        ),
    };

    Tradeoff {
        option_id: option_id(priority).to_string(),
        advantages: advantages.iter().map(|s| s.to_string()).collect(),
        disadvantages: disadvantages.iter().map(|s| s.to_string()).collect(),
    }
}

/// True unless the inputs match one of the clear-cut patterns.
pub fn is_ambiguous(inputs: &PriorityInputs) -> bool {
    let urgent = inputs.has_urgency();
    let urgent_and_long_wait = urgent && inputs.wait_days > CLEAR_LONG_WAIT_DAYS;
    let routine_young_short_wait =
        !urgent && inputs.age < CLEAR_YOUNG_AGE && inputs.wait_days <= CLEAR_SHORT_WAIT_DAYS;
    let urgent_elderly_very_short_wait =
        urgent && inputs.age >= CLEAR_ELDERLY_AGE && inputs.wait_days <= CLEAR_VERY_SHORT_WAIT_DAYS;

    !(urgent_and_long_wait || routine_young_short_wait || urgent_elderly_very_short_wait)
}

/// True when the inputs contradict themselves or are degenerate.
pub fn is_extremely_ambiguous(inputs: &PriorityInputs) -> bool {
    extreme_ambiguity_reason(inputs).is_some()
}

/// Explains why the inputs are extremely ambiguous, if they are.
pub fn extreme_ambiguity_reason(inputs: &PriorityInputs) -> Option<String> {
    if inputs.reason.chars().count() < MIN_REASON_CHARS {
        return Some(format!(
            "reason is shorter than {} characters",
            MIN_REASON_CHARS
        ));
    }
    if inputs.age <= 0.0 {
        return Some(format!("age {} is not a valid age", inputs.age));
    }
    if inputs.wait_days < 0.0 {
        return Some(format!("waiting days {} is negative", inputs.wait_days));
    }

    let urgent = inputs.has_urgency();
    if urgent
        && inputs.wait_days <= CONTRADICTION_SHORT_WAIT_DAYS
        && inputs.age < CONTRADICTION_YOUNG_AGE
    {
        return Some(
            "urgent symptoms reported by a young patient who has barely waited".to_string(),
        );
    }
    if !urgent
        && inputs.wait_days > CONTRADICTION_LONG_WAIT_DAYS
        && inputs.age >= CONTRADICTION_ELDERLY_AGE
    {
        return Some("elderly patient with a very long wait but no urgency reported".to_string());
    }
    None
}

#[cfg(test)]
#[path = "tests/rules_tests.rs"]
mod tests;
