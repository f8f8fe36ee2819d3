//! Spoken narration text
//!
//! Only the text is produced here; turning it into audio is the job of a
//! [`SpeechSink`](crate::source::SpeechSink).

use pulse_core::SessionState;
use pulse_model::InstructionResponse;

const INTRO_RECOMMENDATIONS: usize = 2;

/// Intro spoken once a feed completes
///
/// `None` until store meta and at least one conversation message exist.
#[must_use]
pub fn intro_narration(state: &SessionState) -> Option<String> {
    let meta = state.meta()?;
    if state.conversation().is_empty() {
        return None;
    }

    let mut parts = vec![format!(
        "Store {} is operating at {} percent capacity with a health score of {}.",
        meta.label(),
        (meta.capacity_pct * 100.0).round(),
        meta.inventory_health
    )];

    let recommendations: Vec<String> = state
        .catalog()
        .actionable()
        .into_iter()
        .take(INTRO_RECOMMENDATIONS)
        .map(|action| action.describe_shift())
        .collect();
    if recommendations.is_empty() {
        if let Some(message) = state.conversation().first_agent_message() {
            parts.push(message.text.clone());
        }
    } else {
        parts.push(format!(
            "Recommended actions include shifting {}.",
            recommendations.join(" and ")
        ));
    }

    Some(parts.join(" "))
}

/// Snippet spoken after a delegated instruction
///
/// Prefers the provider's own summary, then the returned actions, then the
/// returned narration.
#[must_use]
pub fn voice_snippet(response: &InstructionResponse) -> Option<String> {
    if let Some(summary) = response.voice_summary.as_deref() {
        if !summary.trim().is_empty() {
            return Some(summary.to_string());
        }
    }

    let snippet = if response.actions.is_empty() {
        response
            .narration
            .iter()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        response
            .actions
            .iter()
            .map(|action| format!("{}. Shift {}.", action.title, action.describe_shift()))
            .collect::<Vec<_>>()
            .join(" ")
    };

    (!snippet.trim().is_empty()).then_some(snippet)
}
