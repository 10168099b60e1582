//! Conversation state machine — tracks which phase a session is in.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::feature::{Collected, CollectedValue, FeatureKind, FieldPath};

/// The phases of a feature-building conversation.
///
/// Loops indefinitely: SelectingType → Collecting → … → Finalizing →
/// SelectingType. Reset returns to SelectingType from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "field")]
pub enum ConversationPhase {
    SelectingType,
    Collecting(FieldPath),
    Finalizing,
}

impl ConversationPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ConversationPhase) -> bool {
        use ConversationPhase::*;
        matches!(
            (self, target),
            (SelectingType, Collecting(_))
                | (Collecting(_), Collecting(_))
                | (Collecting(_), Finalizing)
                | (_, SelectingType)
        )
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectingType => write!(f, "selecting_type"),
            Self::Collecting(field) => write!(f, "collecting({field})"),
            Self::Finalizing => write!(f, "finalizing"),
        }
    }
}

/// Mutable state of one conversation.
///
/// `active_variant` is `None` exactly when nothing is pending or collected.
/// `current_question`, when set, was the last field taken off the front of
/// `pending_fields`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub active_variant: Option<FeatureKind>,
    pub pending_fields: VecDeque<FieldPath>,
    pub collected: Collected,
    pub current_question: Option<FieldPath>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to a fresh conversation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_fresh(&self) -> bool {
        *self == Self::default()
    }

    pub fn phase(&self) -> ConversationPhase {
        match (self.active_variant, self.current_question) {
            (None, _) => ConversationPhase::SelectingType,
            (Some(_), Some(field)) => ConversationPhase::Collecting(field),
            (Some(_), None) => ConversationPhase::Finalizing,
        }
    }

    /// Start collecting for `kind`: queue its questions and take the first.
    pub fn begin(&mut self, kind: FeatureKind) -> Option<FieldPath> {
        self.active_variant = Some(kind);
        self.pending_fields = crate::feature::fields_for(kind).iter().copied().collect();
        self.collected.clear();
        self.next_question()
    }

    /// Take the next pending field as the outstanding question.
    pub fn next_question(&mut self) -> Option<FieldPath> {
        self.current_question = self.pending_fields.pop_front();
        self.current_question
    }

    /// Store an answer. `None` records an explicitly skipped field.
    ///
    /// The nested entry for a dotted path is created on its first child.
    pub fn record(&mut self, field: FieldPath, value: Option<String>) {
        match field {
            FieldPath::Top(name) => {
                self.collected
                    .insert(name.to_string(), CollectedValue::Scalar(value));
            }
            FieldPath::Nested { parent, child } => {
                let entry = self
                    .collected
                    .entry(parent.to_string())
                    .or_insert_with(|| CollectedValue::Nested(BTreeMap::new()));
                if let CollectedValue::Scalar(_) = entry {
                    *entry = CollectedValue::Nested(BTreeMap::new());
                }
                if let CollectedValue::Nested(children) = entry {
                    children.insert(child.to_string(), value);
                }
            }
        }
    }

    /// Raw value recorded for a nested child, if any.
    pub fn nested_value(&self, parent: &str, child: &str) -> Option<&str> {
        match self.collected.get(parent)? {
            CollectedValue::Nested(children) => children.get(child)?.as_deref(),
            CollectedValue::Scalar(_) => None,
        }
    }
}
