//! Text rendering of a draft for /preview

use super::state::ActivityDraft;

/// Render the draft name and its participants in insertion order
pub fn render_preview(draft: &ActivityDraft) -> String {
    let participant_lines: Vec<String> = draft
        .participants
        .iter()
        .map(|p| format!(" - {}", p.name))
        .collect();

    format!(
        "Activity: \"{}\"\n\nParticipants:\n{}",
        draft.name,
        participant_lines.join("\n")
    )
}
