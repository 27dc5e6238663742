//! The triage decision engine.
//!
//! `evaluate` is a pure function of its context: no I/O, no clock, no state.
//! It never fails; anything it cannot classify comes back `BLOCKED`.

use crate::decision::rules::{self, PriorityInputs};
use crate::decision::types::{
    normalize_kind, AutonomyLevel, DecisionContext, DecisionOption, DecisionResult, DecisionWeight,
    APPOINTMENT_PRIORITY_KIND,
};
use crate::domain::types::PriorityLevel;

/// Confidence assigned to the single option of a low-weight decision.
const LOW_WEIGHT_CONFIDENCE: f64 = 0.9;
/// High-weight decisions below this confidence go to a reviewer.
const REVIEW_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Stateless decision engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates a decision request.
    pub fn evaluate(&self, context: &DecisionContext) -> DecisionResult {
        if normalize_kind(&context.kind) == APPOINTMENT_PRIORITY_KIND {
            self.evaluate_priority(context)
        } else {
            DecisionResult::blocked(format!("unknown decision kind '{}'", context.kind))
        }
    }

    fn evaluate_priority(&self, context: &DecisionContext) -> DecisionResult {
        let inputs = match PriorityInputs::from_data(&context.data) {
            Ok(inputs) => inputs,
            Err(problem) => return DecisionResult::blocked(problem),
        };
        let candidate = rules::candidate_priority(&inputs);

        let weight = context.effective_weight();
        if weight == DecisionWeight::Low {
            let option = DecisionOption {
                confidence: LOW_WEIGHT_CONFIDENCE,
                ..rules::priority_option(&inputs, candidate)
            };
            return DecisionResult {
                options: vec![option.clone()],
                tradeoffs: Vec::new(),
                primary_recommendation: Some(option),
                requires_human_review: false,
                review_reason: None,
                autonomy_level: AutonomyLevel::Automatic,
            };
        }

        let extreme = rules::extreme_ambiguity_reason(&inputs);
        let options = rules::priority_options(&inputs);
        let tradeoffs = PriorityLevel::ALL
            .into_iter()
            .map(rules::tradeoff_for)
            .collect();
        let primary = options
            .iter()
            .find(|option| option.value == candidate.label())
            .or_else(|| options.first())
            .cloned();
        let ambiguous = rules::is_ambiguous(&inputs);

        let (requires_human_review, review_reason, autonomy_level) = match extreme {
            Some(reason) => (
                true,
                Some(format!("extreme ambiguity: {}", reason)),
                AutonomyLevel::Blocked,
            ),
            None if weight == DecisionWeight::Medium => (
                ambiguous,
                ambiguous.then(|| "inputs do not match a clear-cut pattern".to_string()),
                AutonomyLevel::Automatic,
            ),
            None => {
                let low_confidence = primary
                    .as_ref()
                    .is_none_or(|option| option.confidence < REVIEW_CONFIDENCE_THRESHOLD);
                if low_confidence || ambiguous {
                    let reason = if low_confidence {
                        "recommended priority has low confidence"
                    } else {
                        "inputs do not match a clear-cut pattern"
                    };
                    (true, Some(reason.to_string()), AutonomyLevel::Supervised)
                } else {
                    (false, None, AutonomyLevel::Automatic)
                }
            }
        };

        DecisionResult {
            options,
            tradeoffs,
            primary_recommendation: primary,
            requires_human_review,
            review_reason,
            autonomy_level,
        }
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
