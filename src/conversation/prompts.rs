//! Reply texts and per-field question prompts.

use crate::error::ValidationErrors;
use crate::feature::{FeatureKind, FieldPath};

use super::state::SessionState;

pub const INITIAL_GREETING: &str = "Hello! What type of Lynk feature would you like to create (Metric, First-Last, Formula, or Field)?";

pub const RESET_REPLY: &str = "Ok, let's start over. What type of Lynk feature would you like to create (Metric, First-Last, Formula, or Field)?";

pub const CLARIFY_TYPE: &str =
    "I didn't catch that. Please specify a feature type: Metric, First-Last, Formula, or Field.";

pub const DOCUMENT_READY: &str = "Here is the generated YAML for your feature:";

pub const CONFUSED_RESTART: &str = "I'm a bit confused. Let's start over. What type of feature?";

/// Greeting sent once a feature type has been picked.
pub fn variant_greeting(kind: FeatureKind, first_prompt: &str) -> String {
    format!("Great! Let's create a {kind} feature. {first_prompt}")
}

pub fn field_required(field: &FieldPath) -> String {
    format!("The field '{field}' is required. Please provide a value.")
}

/// Build the question for `field`.
///
/// A handful of fields get tailored wording; everything else falls back to
/// "What is '<field>'?".
pub fn question_for(field: &FieldPath, state: &SessionState) -> String {
    let path = field.to_string();
    match path.as_str() {
        "metric_spec.aggregation" => {
            return "What aggregation do you want for the metric (e.g., COUNT, SUM, AVG, MIN, MAX)?"
                .to_string();
        }
        "metric_spec.field"
            if state
                .nested_value("metric_spec", "aggregation")
                .is_some_and(|agg| agg.eq_ignore_ascii_case("COUNT")) =>
        {
            return "For COUNT aggregation, the 'field' is often optional (for COUNT(*)). You can say 'skip' or provide a field name.".to_string();
        }
        "first_last_spec.operation" => return "Is this a FIRST or LAST operation?".to_string(),
        "first_last_spec.order_by_type" => {
            return "Should the order be ascending or descending (ASC or DESC)?".to_string();
        }
        "formula_spec.sql" => return "Please provide the SQL for the formula:".to_string(),
        _ => {}
    }

    match *field {
        FieldPath::Nested {
            parent,
            child: "filter_clause",
        } => format!(
            "Provide an optional SQL filter clause for '{parent}' (e.g., 'status = \\'active\\''). You can say 'skip' if not needed."
        ),
        _ => format!("What is '{field}'?"),
    }
}

/// Reply for a finished conversation whose answers failed validation.
pub fn validation_failed(errors: &ValidationErrors) -> String {
    let lines: Vec<String> = errors
        .iter()
        .map(|e| format!("- {}: {}", e.field, e.message))
        .collect();
    format!(
        "There was an issue with the provided data:\n{}\nLet's try again for the problematic fields. Or you can say 'reset'.\nState has been reset. What type of feature would you like to create?",
        lines.join("\n")
    )
}

pub fn unexpected_error(detail: &str) -> String {
    format!("An unexpected error occurred: {detail}. Let's reset.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::feature::CollectedValue;

    fn nested(parent: &'static str, child: &'static str) -> FieldPath {
        FieldPath::Nested { parent, child }
    }

    fn state_with_aggregation(aggregation: &str) -> SessionState {
        let mut state = SessionState::new();
        state.begin(FeatureKind::Metric);
        let mut children = std::collections::BTreeMap::new();
        children.insert("aggregation".to_string(), Some(aggregation.to_string()));
        state
            .collected
            .insert("metric_spec".to_string(), CollectedValue::Nested(children));
        state
    }

    #[test]
    fn generic_prompt_quotes_the_path() {
        let state = SessionState::new();
        assert_eq!(
            question_for(&FieldPath::Top("asset_id"), &state),
            "What is 'asset_id'?"
        );
        assert_eq!(
            question_for(&nested("field_spec", "source_field_name"), &state),
            "What is 'field_spec.source_field_name'?"
        );
    }

    #[test]
    fn aggregation_prompt_lists_choices() {
        let prompt = question_for(&nested("metric_spec", "aggregation"), &SessionState::new());
        for agg in ["COUNT", "SUM", "AVG", "MIN", "MAX"] {
            assert!(prompt.contains(agg));
        }
    }

    #[test]
    fn metric_field_prompt_depends_on_aggregation() {
        let field = nested("metric_spec", "field");

        let count = question_for(&field, &state_with_aggregation("count"));
        assert!(count.contains("COUNT(*)"));

        let sum = question_for(&field, &state_with_aggregation("SUM"));
        assert_eq!(sum, "What is 'metric_spec.field'?");
    }

    #[test]
    fn filter_clause_prompt_names_parent_and_skip() {
        let prompt = question_for(&nested("first_last_spec", "filter_clause"), &SessionState::new());
        assert!(prompt.contains("'first_last_spec'"));
        assert!(prompt.contains("skip"));
    }

    #[test]
    fn fixed_overrides() {
        let state = SessionState::new();
        assert_eq!(
            question_for(&nested("first_last_spec", "operation"), &state),
            "Is this a FIRST or LAST operation?"
        );
        assert_eq!(
            question_for(&nested("formula_spec", "sql"), &state),
            "Please provide the SQL for the formula:"
        );
        assert!(question_for(&nested("first_last_spec", "order_by_type"), &state).contains("ASC"));
    }

    #[test]
    fn validation_reply_has_one_line_per_error() {
        let errors = ValidationErrors::from(vec![
            ValidationError::new("first_last_spec.operation", "Input should be 'FIRST' or 'LAST'"),
            ValidationError::new("first_last_spec.order_by_type", "Field required"),
        ]);
        let reply = validation_failed(&errors);
        assert!(reply.contains("\n- first_last_spec.operation: Input should be 'FIRST' or 'LAST'\n"));
        assert!(reply.contains("\n- first_last_spec.order_by_type: Field required\n"));
        assert!(reply.ends_with("What type of feature would you like to create?"));
    }

    #[test]
    fn greeting_uses_type_tag() {
        assert_eq!(
            variant_greeting(FeatureKind::FirstLast, "What is 'name'?"),
            "Great! Let's create a FIRST_LAST feature. What is 'name'?"
        );
    }
}
