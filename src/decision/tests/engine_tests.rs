//! Tests for DecisionEngine::evaluate across weights and edge cases.

use super::*;
use proptest::prelude::*;

fn priority_context(
    reason: &str,
    age: i64,
    wait_days: i64,
    weight: DecisionWeight,
) -> DecisionContext {
    DecisionContext::new(APPOINTMENT_PRIORITY_KIND)
        .with_data("reason", reason)
        .with_data("age", age)
        .with_data("waitDays", wait_days)
        .with_weight(weight)
}

fn evaluate(reason: &str, age: i64, wait_days: i64, weight: DecisionWeight) -> DecisionResult {
    DecisionEngine::new().evaluate(&priority_context(reason, age, wait_days, weight))
}

fn primary_value(result: &DecisionResult) -> &str {
    result
        .primary_recommendation
        .as_ref()
        .map(|option| option.value.as_str())
        .unwrap_or("")
}

// ============================================================================
// Fail-safe paths
// ============================================================================

#[test]
fn unknown_kind_is_blocked_without_options() {
    let context = DecisionContext::new("discharge_plan").with_weight(DecisionWeight::Low);
    let result = DecisionEngine::new().evaluate(&context);

    assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
    assert!(result.options.is_empty());
    assert!(result.primary_recommendation.is_none());
    assert!(result.review_reason.unwrap().contains("discharge_plan"));
}

#[test]
fn missing_field_is_blocked_even_at_low_weight() {
    let context = DecisionContext::new(APPOINTMENT_PRIORITY_KIND)
        .with_data("reason", "routine checkup")
        .with_data("age", 40)
        .with_weight(DecisionWeight::Low);
    let result = DecisionEngine::new().evaluate(&context);

    assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
    assert!(result.options.is_empty());
    assert!(result.review_reason.unwrap().contains("waitDays"));
}

#[test]
fn mistyped_field_is_blocked() {
    let context = DecisionContext::new(APPOINTMENT_PRIORITY_KIND)
        .with_data("reason", "routine checkup")
        .with_data("age", "forty")
        .with_data("waitDays", 3)
        .with_weight(DecisionWeight::High);
    let result = DecisionEngine::new().evaluate(&context);

    assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
    assert!(result.options.is_empty());
}

// ============================================================================
// Low weight
// ============================================================================

#[test]
fn low_weight_routine_request_is_a_single_automatic_low_option() {
    let result = evaluate("routine checkup", 30, 5, DecisionWeight::Low);

    assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
    assert!(!result.requires_human_review);
    assert_eq!(result.options.len(), 1);
    assert!(result.tradeoffs.is_empty());
    assert_eq!(result.options[0].value, "Low");
    assert_eq!(result.options[0].id, "low");
    assert_eq!(result.options[0].confidence, 0.9);
}

#[test]
fn low_weight_never_escalates_even_for_contradictory_input() {
    let result = evaluate("severe chest pain", 30, 2, DecisionWeight::Low);
    assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
    assert_eq!(primary_value(&result), "High");
}

#[test]
fn long_wait_escalates_the_candidate() {
    let result = evaluate("annual review", 30, 16, DecisionWeight::Low);
    assert_eq!(primary_value(&result), "Medium");

    let result = evaluate("annual review", 70, 16, DecisionWeight::Low);
    assert_eq!(primary_value(&result), "High");
}

// ============================================================================
// Medium weight
// ============================================================================

#[test]
fn medium_weight_clear_case_returns_three_options() {
    let result = evaluate("routine checkup", 30, 5, DecisionWeight::Medium);

    assert_eq!(result.options.len(), 3);
    assert_eq!(result.tradeoffs.len(), 3);
    assert_eq!(primary_value(&result), "Low");
    assert!(!result.requires_human_review);
    assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
}

#[test]
fn medium_weight_ambiguous_case_flags_review_but_stays_automatic() {
    let result = evaluate("recurring headaches", 45, 10, DecisionWeight::Medium);

    assert!(result.requires_human_review);
    assert!(result.review_reason.is_some());
    assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
}

#[test]
fn medium_weight_extreme_ambiguity_blocks() {
    let result = evaluate("follow-up visit", 75, 25, DecisionWeight::Medium);

    assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
    assert!(result.requires_human_review);
    assert!(result.primary_recommendation.is_some());
}

#[test]
fn degenerate_inputs_block_at_medium_weight() {
    assert_eq!(
        evaluate("ok", 30, 2, DecisionWeight::Medium).autonomy_level,
        AutonomyLevel::Blocked
    );
    assert_eq!(
        evaluate("routine checkup", 0, 2, DecisionWeight::Medium).autonomy_level,
        AutonomyLevel::Blocked
    );
    assert_eq!(
        evaluate("routine checkup", 30, -1, DecisionWeight::Medium).autonomy_level,
        AutonomyLevel::Blocked
    );
}

// ============================================================================
// High weight
// ============================================================================

#[test]
fn high_weight_young_urgent_short_wait_is_blocked() {
    let result = evaluate("severe chest pain", 30, 2, DecisionWeight::High);
    assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
}

#[test]
fn high_weight_clear_urgent_elderly_case_is_automatic() {
    let result = evaluate("persistent bleeding", 70, 2, DecisionWeight::High);

    assert_eq!(primary_value(&result), "High");
    assert!(!result.requires_human_review);
    assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
}

#[test]
fn high_weight_ambiguous_case_is_supervised() {
    let result = evaluate("Severe Pain in the knee", 55, 10, DecisionWeight::High);

    assert_eq!(primary_value(&result), "High");
    assert!(result.requires_human_review);
    assert_eq!(result.autonomy_level, AutonomyLevel::Supervised);
}

#[test]
fn missing_weight_evaluates_as_medium() {
    let context = DecisionContext::new(APPOINTMENT_PRIORITY_KIND)
        .with_data("reason", "recurring headaches")
        .with_data("age", 45)
        .with_data("waitDays", 10);
    let result = DecisionEngine::new().evaluate(&context);

    assert_eq!(result.options.len(), 3);
    assert!(result.requires_human_review);
    assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
}

#[test]
fn kind_is_matched_with_spaces_or_underscores() {
    for kind in [
        "appointment priority",
        "appointment_priority",
        " Appointment-Priority ",
    ] {
        let context = DecisionContext::new(kind)
            .with_data("reason", "routine checkup")
            .with_data("age", 30)
            .with_data("waitDays", 5)
            .with_weight(DecisionWeight::Low);
        let result = DecisionEngine::new().evaluate(&context);
        assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
    }

    let context = DecisionContext::new("appointmentpriority");
    let result = DecisionEngine::new().evaluate(&context);
    assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
}

#[test]
fn documented_scenarios_evaluate_as_described() {
    let routine: DecisionContext = serde_json::from_value(serde_json::json!({
        "kind": "appointment priority",
        "weight": "Low",
        "data": {"reason": "routine checkup", "age": 30, "waitDays": 5}
    }))
    .unwrap();
    let result = DecisionEngine::new().evaluate(&routine);
    assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
    assert_eq!(result.options.len(), 1);
    assert_eq!(result.options[0].value, "Low");
    assert_eq!(result.options[0].confidence, 0.9);

    let chest_pain: DecisionContext = serde_json::from_value(serde_json::json!({
        "kind": "appointment priority",
        "weight": "High",
        "data": {"reason": "severe chest pain", "age": 30, "waitDays": 2}
    }))
    .unwrap();
    let result = DecisionEngine::new().evaluate(&chest_pain);
    assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
    assert!(result.requires_human_review);
}

#[test]
fn fractional_numbers_are_accepted() {
    let context = DecisionContext::new(APPOINTMENT_PRIORITY_KIND)
        .with_data("reason", "annual review")
        .with_data("age", 30.5)
        .with_data("waitDays", 15.5)
        .with_weight(DecisionWeight::Low);
    let result = DecisionEngine::new().evaluate(&context);

    assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
    assert_eq!(primary_value(&result), "Medium");
}

#[test]
fn context_deserializes_from_camel_case_json() {
    let json = r#"{
        "kind": "appointment_priority",
        "weight": "High",
        "data": {"reason": "severe chest pain", "age": 30, "waitDays": 2}
    }"#;
    let context: DecisionContext = serde_json::from_str(json).unwrap();
    let result = DecisionEngine::new().evaluate(&context);

    assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
    let rendered = serde_json::to_value(&result).unwrap();
    assert_eq!(rendered["autonomyLevel"], "BLOCKED");
    assert!(rendered["primaryRecommendation"].is_object());
}

// ============================================================================
// Properties
// ============================================================================

fn reason_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("routine checkup".to_string()),
        Just("severe chest pain".to_string()),
        Just("bleeding".to_string()),
        Just("x".to_string()),
        "[a-z ]{0,24}",
    ]
}

proptest! {
    #[test]
    fn low_weight_is_always_automatic_with_one_option(
        reason in reason_strategy(),
        age in -5i64..110,
        wait_days in -5i64..120,
    ) {
        let result = evaluate(&reason, age, wait_days, DecisionWeight::Low);
        prop_assert_eq!(result.autonomy_level, AutonomyLevel::Automatic);
        prop_assert_eq!(result.options.len(), 1);
    }

    #[test]
    fn young_urgent_short_wait_blocks_at_medium_and_high(
        keyword in prop::sample::select(crate::decision::rules::URGENCY_KEYWORDS.to_vec()),
        age in 1i64..50,
        wait_days in 0i64..=5,
    ) {
        let reason = format!("patient reports {}", keyword);
        for weight in [DecisionWeight::Medium, DecisionWeight::High] {
            let result = evaluate(&reason, age, wait_days, weight);
            prop_assert_eq!(result.autonomy_level, AutonomyLevel::Blocked);
        }
    }
}
