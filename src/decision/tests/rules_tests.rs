use super::*;
use serde_json::json;

fn inputs(reason: &str, age: f64, wait_days: f64) -> PriorityInputs {
    PriorityInputs {
        reason: reason.to_string(),
        age,
        wait_days,
    }
}

// ============================================================================
// Input parsing
// ============================================================================

#[test]
fn from_data_reads_all_three_fields() {
    let mut data = BTreeMap::new();
    data.insert("reason".to_string(), json!("sore throat"));
    data.insert("age".to_string(), json!(42));
    data.insert("waitDays".to_string(), json!(3.5));

    let parsed = PriorityInputs::from_data(&data).unwrap();
    assert_eq!(parsed, inputs("sore throat", 42.0, 3.5));
}

#[test]
fn from_data_rejects_wrong_types() {
    let mut data = BTreeMap::new();
    data.insert("reason".to_string(), json!(12));
    data.insert("age".to_string(), json!(42));
    data.insert("waitDays".to_string(), json!(3));
    assert!(PriorityInputs::from_data(&data)
        .unwrap_err()
        .contains("reason"));

    data.insert("reason".to_string(), json!("sore throat"));
    data.insert("age".to_string(), json!("42"));
    assert!(PriorityInputs::from_data(&data)
        .unwrap_err()
        .contains("age"));
}

#[test]
fn from_data_reports_missing_field() {
    let data = BTreeMap::new();
    let err = PriorityInputs::from_data(&data).unwrap_err();
    assert!(err.contains("missing"));
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn keywords_match_case_insensitively_in_vocabulary_order() {
    let found = inputs("Chest tightness and HIGH FEVER", 30.0, 1.0).urgency_keywords();
    assert_eq!(found, vec!["chest", "high fever"]);
    assert!(!inputs("routine checkup", 30.0, 1.0).has_urgency());
}

#[test]
fn base_priority_prefers_keywords_then_age() {
    for (reason, age, expected) in [
        ("seizure", 20.0, PriorityLevel::High),
        ("checkup", 65.0, PriorityLevel::Medium),
        ("checkup", 64.0, PriorityLevel::Low),
    ] {
        assert_eq!(base_priority(&inputs(reason, age, 0.0)), expected);
    }
}

#[test]
fn candidate_escalates_only_past_the_wait_threshold() {
    for (reason, wait_days, expected) in [
        ("checkup", 15.0, PriorityLevel::Low),
        ("checkup", 15.5, PriorityLevel::Medium),
        ("fracture", 40.0, PriorityLevel::High),
    ] {
        let priority = candidate_priority(&inputs(reason, 30.0, wait_days));
        assert_eq!(priority, expected);
    }
}

#[test]
fn options_are_ordered_and_scored() {
    let options = priority_options(&inputs("bleeding", 70.0, 2.0));
    let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec!["High", "Medium", "Low"]);
    assert_eq!(options[0].confidence, 0.9);
    assert_eq!(options[1].confidence, 0.8);
    assert_eq!(options[2].confidence, 0.7);

    let options = priority_options(&inputs("checkup", 30.0, 20.0));
    assert_eq!(options[0].confidence, 0.7);
    assert_eq!(options[1].confidence, 0.75);

    let options = priority_options(&inputs("checkup", 30.0, 2.0));
    assert_eq!(options[1].confidence, 0.6);
}

#[test]
fn every_tradeoff_names_its_option() {
    for priority in PriorityLevel::ALL {
        let tradeoff = tradeoff_for(priority);
        assert_eq!(tradeoff.option_id, option_id(priority));
        assert!(!tradeoff.advantages.is_empty());
        assert!(!tradeoff.disadvantages.is_empty());
    }
}

// ============================================================================
// Ambiguity
// ============================================================================

#[test]
fn clear_cut_patterns_are_not_ambiguous() {
    assert!(!is_ambiguous(&inputs("bleeding", 30.0, 16.0)));
    assert!(!is_ambiguous(&inputs("checkup", 39.0, 7.0)));
    assert!(!is_ambiguous(&inputs("bleeding", 65.0, 3.0)));
}

#[test]
fn anything_else_is_ambiguous() {
    assert!(is_ambiguous(&inputs("checkup", 40.0, 7.0)));
    assert!(is_ambiguous(&inputs("checkup", 30.0, 8.0)));
    assert!(is_ambiguous(&inputs("bleeding", 65.0, 4.0)));
}

#[test]
fn extreme_ambiguity_catches_contradictions() {
    assert!(is_extremely_ambiguous(&inputs(
        "severe chest pain",
        49.0,
        5.0
    )));
    assert!(!is_extremely_ambiguous(&inputs(
        "severe chest pain",
        50.0,
        5.0
    )));
    assert!(is_extremely_ambiguous(&inputs("checkup", 70.0, 21.0)));
    assert!(!is_extremely_ambiguous(&inputs("checkup", 70.0, 20.0)));
}

#[test]
fn extreme_ambiguity_catches_degenerate_inputs() {
    let reason = extreme_ambiguity_reason(&inputs("pain", 30.0, 1.0)).unwrap();
    assert!(reason.contains("shorter"));
    assert!(is_extremely_ambiguous(&inputs("  ", 30.0, 1.0)));
    assert!(is_extremely_ambiguous(&inputs("checkup", 0.0, 1.0)));
    assert!(is_extremely_ambiguous(&inputs("checkup", 30.0, -0.5)));
}

#[test]
fn reason_length_counts_padding() {
    assert!(!is_extremely_ambiguous(&inputs("ab   ", 30.0, 1.0)));
    assert!(!is_extremely_ambiguous(&inputs(" ab  ", 30.0, 1.0)));
    assert!(is_extremely_ambiguous(&inputs("ab  ", 30.0, 1.0)));
}

#[test]
fn ambiguity_and_extreme_ambiguity_differ() {
    let ordinary = inputs("recurring headaches", 45.0, 10.0);
    assert!(is_ambiguous(&ordinary));
    assert!(!is_extremely_ambiguous(&ordinary));
}
