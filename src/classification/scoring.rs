use crate::models::Team;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Weight for a generalist team matched against an unclear ticket.
/// Dominates so vague tickets land with generalists instead of being
/// mis-routed to a specialist on weak signal.
pub const WEIGHT_GENERAL_UNCLEAR: f64 = 0.8;

/// Weight for an exact category-to-focus-area match
pub const WEIGHT_FOCUS_MATCH: f64 = 0.7;

/// Weight for a generalist team matched against a clear, non-matching category
pub const WEIGHT_GENERAL_FALLBACK: f64 = 0.2;

/// Secondary weight applied to the tag-overlap ratio
pub const WEIGHT_TAG_OVERLAP: f64 = 0.3;

/// Categories too vague to carry routing signal on their own
static AMBIGUOUS_CATEGORIES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["technical", "general", "unknown", ""]));

/// A ticket is unclear when it carries at most one tag and its category is
/// one of the ambiguous labels.
pub fn is_unclear(category: &str, tags: &[String]) -> bool {
    tags.len() <= 1 && AMBIGUOUS_CATEGORIES.contains(category.trim().to_lowercase().as_str())
}

/// Score how well a team matches a ticket's category and tags.
///
/// Focus-area fit dominates; tag overlap refines. Pure function, result
/// always in [0, 1].
pub fn score_team(team: &Team, category: &str, tags: &[String]) -> f64 {
    let category_normalized = category.trim().to_lowercase();
    let unclear = is_unclear(category, tags);

    let focus_component = if unclear && team.is_general() {
        WEIGHT_GENERAL_UNCLEAR
    } else if !team.focus_area.is_empty()
        && team.focus_area.eq_ignore_ascii_case(&category_normalized)
    {
        WEIGHT_FOCUS_MATCH
    } else if team.is_general() {
        WEIGHT_GENERAL_FALLBACK
    } else {
        0.0
    };

    let score = focus_component + WEIGHT_TAG_OVERLAP * tag_overlap(&team.tags, tags);
    score.min(1.0)
}

/// Share of the ticket's tags the team also carries, in [0, 1]
fn tag_overlap(team_tags: &[String], ticket_tags: &[String]) -> f64 {
    if ticket_tags.is_empty() {
        return 0.0;
    }

    let team_set: HashSet<String> = team_tags.iter().map(|t| t.trim().to_lowercase()).collect();
    let matched = ticket_tags
        .iter()
        .filter(|t| team_set.contains(&t.trim().to_lowercase()))
        .count();

    matched as f64 / ticket_tags.len() as f64
}
