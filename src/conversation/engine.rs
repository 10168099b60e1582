//! Turn-by-turn conversation driver.
//!
//! Each call to [`advance`] consumes one user message, mutates the session
//! and produces exactly one reply. A finished feature comes back as YAML.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::prompts::{
    CLARIFY_TYPE, CONFUSED_RESTART, DOCUMENT_READY, RESET_REPLY, field_required, question_for,
    unexpected_error, validation_failed, variant_greeting,
};
use super::state::SessionState;
use crate::error::FinalizeError;
use crate::feature::{Collected, FeatureDocument, FeatureKind, construct, is_required};

/// Inputs meaning "leave this field unset" (compared trimmed, lowercase).
const SKIP_SENTINELS: &[&str] = &["skip", "none", ""];

/// What one turn produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    pub reply: String,
    /// Serialized document, present only when a feature was finalized.
    pub yaml: Option<String>,
}

impl TurnReply {
    fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            yaml: None,
        }
    }
}

pub fn is_skip(text: &str) -> bool {
    SKIP_SENTINELS.contains(&text.trim().to_lowercase().as_str())
}

/// Run one conversation turn against `state`.
pub fn advance(user_text: &str, state: &mut SessionState) -> TurnReply {
    let Some(kind) = state.active_variant else {
        return select_variant(user_text, state);
    };

    let Some(field) = state.current_question else {
        warn!(feature_type = %kind, "No outstanding question, restarting conversation");
        state.reset();
        return TurnReply::text(CONFUSED_RESTART);
    };

    if is_skip(user_text) {
        if is_required(kind, &field) {
            debug!(feature_type = %kind, field = %field, "Required field skipped");
            return TurnReply::text(field_required(&field));
        }
        state.record(field, None);
    } else {
        state.record(field, Some(user_text.to_string()));
    }
    debug!(feature_type = %kind, field = %field, "Answer recorded");

    match state.next_question() {
        Some(next) => TurnReply::text(question_for(&next, state)),
        None => finalize(kind, state),
    }
}

/// Reinitialize the session and return the restart prompt.
pub fn reset(state: &mut SessionState) -> TurnReply {
    state.reset();
    TurnReply::text(RESET_REPLY)
}

fn select_variant(user_text: &str, state: &mut SessionState) -> TurnReply {
    let Some(kind) = FeatureKind::from_text(user_text) else {
        debug!("No feature type recognised");
        return TurnReply::text(CLARIFY_TYPE);
    };

    info!(feature_type = %kind, "Feature type selected");
    match state.begin(kind) {
        Some(first) => TurnReply::text(variant_greeting(kind, &question_for(&first, state))),
        None => {
            state.reset();
            TurnReply::text(CONFUSED_RESTART)
        }
    }
}

/// Validate and serialize the collected answers. The session is reset
/// whatever the outcome.
fn finalize(kind: FeatureKind, state: &mut SessionState) -> TurnReply {
    finalize_with(kind, state, FeatureDocument::to_yaml)
}

fn finalize_with(
    kind: FeatureKind,
    state: &mut SessionState,
    render: impl FnOnce(&FeatureDocument) -> Result<String, serde_yaml::Error>,
) -> TurnReply {
    let outcome = build_document(kind, &state.collected, render);
    state.reset();

    match outcome {
        Ok((document, yaml)) => {
            info!(feature_type = %kind, name = %document.name(), "Feature document generated");
            TurnReply {
                reply: DOCUMENT_READY.to_string(),
                yaml: Some(yaml),
            }
        }
        Err(FinalizeError::Validation(errors)) => {
            warn!(feature_type = %kind, errors = %errors, "Feature failed validation");
            TurnReply::text(validation_failed(&errors))
        }
        Err(e) => {
            warn!(feature_type = %kind, error = %e, "Feature finalization failed");
            TurnReply::text(unexpected_error(&e.to_string()))
        }
    }
}

fn build_document(
    kind: FeatureKind,
    collected: &Collected,
    render: impl FnOnce(&FeatureDocument) -> Result<String, serde_yaml::Error>,
) -> Result<(FeatureDocument, String), FinalizeError> {
    let document = construct(kind, collected)?;
    let yaml = render(&document)?;
    Ok((document, yaml))
}
