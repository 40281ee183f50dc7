mod common;

use common::*;
use std::sync::Arc;
use ticket_triage::classification::{score_team, AutoResolutionClassifier};
use ticket_triage::config::{ClassificationConfig, DirectoryConfig};
use ticket_triage::directory::TeamDirectory;
use ticket_triage::models::{SimilarTicket, Team};

fn classifier_over(rows: Vec<ticket_triage::models::TeamRow>) -> AutoResolutionClassifier {
    let directory = Arc::new(TeamDirectory::new(
        Arc::new(StaticTeamBackend::new(rows)),
        &DirectoryConfig::default(),
    ));
    AutoResolutionClassifier::new(directory, ClassificationConfig::default())
}

fn precedent(success_rate: f64) -> SimilarTicket {
    let mut ticket = SimilarTicket::new(
        uuid::Uuid::new_v4().to_string(),
        "password reset precedent".to_string(),
        0.92,
    );
    ticket.auto_resolved = true;
    ticket.success_rate = success_rate;
    ticket.resolution_steps = vec![
        "verify the requester's identity".to_string(),
        "send the password reset link".to_string(),
    ];
    ticket
}

#[tokio::test]
async fn password_reset_with_strong_precedents_is_auto_resolved() {
    let classifier = classifier_over(standard_team_rows());
    let ticket = make_ticket("Password Reset Required", "password_reset", &["password", "reset"]);
    let similars = vec![precedent(0.9), precedent(0.95), precedent(0.85)];

    let decision = classifier.classify(&ticket, &similars).await;

    assert!(decision.can_auto_resolve);
    assert!(!decision
        .auto_resolution_steps
        .as_deref()
        .unwrap_or_default()
        .is_empty());
    assert_eq!(decision.routing_team.name, "Auto Resolution");
    assert!((0.0..=1.0).contains(&decision.confidence_score));
}

#[tokio::test]
async fn auto_resolvable_without_dedicated_team_uses_highest_scorer() {
    let rows = vec![
        team_row("Engineering Team", "technical", &["technical"]),
        team_row("Customer Support", "general", &["support"]),
    ];
    let classifier = classifier_over(rows);
    let ticket = make_ticket("Password Reset Required", "password_reset", &["password", "reset"]);
    let similars = vec![precedent(0.9), precedent(0.95)];

    let decision = classifier.classify(&ticket, &similars).await;

    assert!(decision.can_auto_resolve);
    // No auto_resolution focus team registered: scored routing applies, and
    // since no team clears the match floor the default team is substituted.
    assert_eq!(decision.routing_team.name, "General Support");
    assert_eq!(decision.team_match_score, 0.5);
}

#[tokio::test]
async fn technical_ticket_without_precedent_routes_by_score() {
    let classifier = classifier_over(standard_team_rows());
    let ticket = make_ticket("API Integration Error", "Technical", &["api", "error"]);

    let decision = classifier.classify(&ticket, &[]).await;

    assert!(!decision.can_auto_resolve);
    assert!(decision.auto_resolution_steps.is_none());
    assert_eq!(decision.routing_team.name, "Engineering Team");
}

#[tokio::test]
async fn directory_fault_without_cache_routes_to_default_team() {
    let directory = Arc::new(TeamDirectory::new(
        Arc::new(FailingTeamBackend),
        &DirectoryConfig::default(),
    ));
    let teams = directory.get_teams(false).await;

    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].name, "General Support");

    let classifier = AutoResolutionClassifier::new(directory, ClassificationConfig::default());
    let ticket = make_ticket("Anything at all", "billing", &["invoice", "refund"]);
    let decision = classifier.classify(&ticket, &[]).await;

    assert_eq!(decision.routing_team.name, "General Support");
}

#[tokio::test]
async fn confidence_is_bounded_by_both_signals() {
    let classifier = classifier_over(standard_team_rows());
    let ticket = make_ticket("Password Reset Required", "password_reset", &["password", "reset"]);
    let similars = vec![precedent(0.9), precedent(0.95), precedent(0.85)];

    let assessment = classifier.assess_auto_resolution(&ticket, &similars);
    let team_match = classifier.select_team(&ticket, assessment.eligible).await;
    let decision = classifier.classify(&ticket, &similars).await;

    assert!(decision.confidence_score <= assessment.confidence + 1e-9);
    assert!(decision.confidence_score <= team_match.score + 1e-9);
}

#[test]
fn team_scores_stay_in_unit_interval() {
    let teams: Vec<Team> = standard_team_rows()
        .into_iter()
        .filter_map(Team::from_row)
        .collect();

    let cases: Vec<(&str, Vec<String>)> = vec![
        ("Technical", vec!["error".to_string()]),
        (
            "technical",
            vec!["technical".to_string(), "engineering".to_string()],
        ),
        ("unknown", vec![]),
        ("billing", vec!["invoice".to_string()]),
    ];

    for team in &teams {
        for (category, tags) in &cases {
            let score = score_team(team, category, tags);
            assert!(
                (0.0..=1.0).contains(&score),
                "score {score} for {} out of range",
                team.name
            );
        }
    }
}
