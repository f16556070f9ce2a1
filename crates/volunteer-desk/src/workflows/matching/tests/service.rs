use super::common::*;
use crate::workflows::matching::{
    ContactRequest, ContactValidationError, FilterValidationError, Filters, MatchingError,
    MatchingService, ScoringConfig,
};
use crate::workflows::volunteers::{HabitRecord, VolunteerId};
use std::collections::BTreeMap;
use std::sync::Arc;

fn contact_request(ids: &[i64]) -> ContactRequest {
    ContactRequest {
        volunteer_ids: ids.iter().copied().map(VolunteerId).collect(),
        subject: "Étude hydratation".to_string(),
        body: "Bonjour, une nouvelle étude est ouverte.".to_string(),
        details: BTreeMap::new(),
    }
}

#[tokio::test]
async fn inverted_age_range_fails_before_any_fetch() {
    let (service, directory, _) =
        build_service(MemoryDirectory::with(vec![volunteer(1, 30)]), settings(50));
    let mut filters = Filters::default();
    filters.demographics.age_min = 40;
    filters.demographics.age_max = 30;

    match service.execute(&filters, today()).await {
        Err(MatchingError::Filters(FilterValidationError::AgeRangeInverted { min: 40, max: 30 })) => {}
        other => panic!("expected age validation error, got {other:?}"),
    }
    assert_eq!(directory.page_calls(), 0);
}

#[tokio::test]
async fn evaluation_bound_outside_scale_is_rejected() {
    let (service, directory, _) =
        build_service(MemoryDirectory::with(vec![volunteer(1, 30)]), settings(50));
    let mut filters = Filters::default();
    filters.evaluations.punctuality = Some(crate::workflows::matching::AxisRange::between(2, 7));

    assert!(matches!(
        service.execute(&filters, today()).await,
        Err(MatchingError::Filters(FilterValidationError::EvaluationOutOfScale { value: 7, .. }))
    ));
    assert_eq!(directory.page_calls(), 0);
}

#[tokio::test]
async fn pages_are_merged_until_the_last_one() {
    let volunteers = (1..=5).map(|id| volunteer(id, 30)).collect();
    let (service, directory, _) = build_service(MemoryDirectory::with(volunteers), settings(2));

    let report = service
        .execute(&Filters::default(), today())
        .await
        .expect("matching succeeds");

    assert_eq!(report.considered, 5);
    assert_eq!(report.results.len(), 5);
    assert_eq!(directory.page_calls(), 3);
}

#[tokio::test]
async fn paging_stops_when_a_page_brings_nothing_new() {
    let volunteers = (1..=3).map(|id| volunteer(id, 30)).collect();
    let directory = MemoryDirectory {
        ignores_paging: true,
        ..MemoryDirectory::with(volunteers)
    };
    let (service, directory, _) = build_service(directory, settings(2));

    let report = service
        .execute(&Filters::default(), today())
        .await
        .expect("matching succeeds");

    assert_eq!(directory.page_calls(), 2);
    assert_eq!(report.considered, 2);
}

#[tokio::test]
async fn failed_page_keeps_volunteers_already_retrieved() {
    let volunteers = (1..=5).map(|id| volunteer(id, 30)).collect();
    let mut directory = MemoryDirectory::with(volunteers);
    directory.failing_pages.insert(1);
    let (service, _, _) = build_service(directory, settings(2));

    let report = service
        .execute(&Filters::default(), today())
        .await
        .expect("degraded run still succeeds");

    assert_eq!(
        report.volunteer_ids(),
        vec![VolunteerId(1), VolunteerId(2)]
    );
}

#[tokio::test]
async fn no_volunteers_is_a_blocking_error() {
    let mut directory = MemoryDirectory::default();
    directory.failing_pages.insert(0);
    let (service, _, _) = build_service(directory, settings(10));

    assert!(matches!(
        service.execute(&Filters::default(), today()).await,
        Err(MatchingError::NoVolunteers)
    ));
}

#[tokio::test]
async fn habit_outage_degrades_makeup_scores_to_zero() {
    let mut directory = MemoryDirectory::with(vec![volunteer(1, 30)]);
    directory.habits = vec![HabitRecord::new(VolunteerId(1)).with_answer("mascara", "oui")];
    directory.habits_unavailable = true;
    let (service, _, _) = build_service(directory, settings(10));
    let mut filters = Filters::default();
    filters.makeup.eyes = vec!["Mascara".to_string()];

    let report = service
        .execute(&filters, today())
        .await
        .expect("matching succeeds");

    assert_eq!(report.results[0].makeup_score, Some(0));
    assert_eq!(report.results[0].total_score, 20);
}

#[tokio::test]
async fn detail_refresh_drops_volunteers_whose_fetch_failed() {
    let volunteers = (1..=5).map(|id| volunteer(id, 30)).collect();
    let mut directory = MemoryDirectory::with(volunteers);
    directory.failing_details.insert(VolunteerId(3));
    let mut settings = settings(10);
    settings.refresh_details = true;
    let (service, directory, _) = build_service(directory, settings);

    let report = service
        .execute(&Filters::default(), today())
        .await
        .expect("matching succeeds");

    assert_eq!(
        report.volunteer_ids(),
        vec![VolunteerId(1), VolunteerId(2), VolunteerId(4), VolunteerId(5)]
    );
    assert_eq!(directory.detail_calls(), 5);
}

#[tokio::test]
async fn repeated_runs_return_identical_reports() {
    let volunteers = (1..=4).map(|id| volunteer(id, 20 + id as i32)).collect();
    let (service, _, _) = build_service(MemoryDirectory::with(volunteers), settings(3));

    let first = service.execute(&Filters::default(), today()).await.expect("first run");
    let second = service.execute(&Filters::default(), today()).await.expect("second run");
    assert_eq!(first, second);
}

#[tokio::test]
async fn contact_resolves_recipients_and_skips_missing_addresses() {
    let mut no_email = volunteer(2, 30);
    no_email.email = Some("   ".to_string());
    let mut archived = volunteer(3, 30);
    archived.archived = true;
    let (service, _, contacts) = build_service(
        MemoryDirectory::with(vec![volunteer(1, 30), no_email, archived]),
        settings(10),
    );

    let receipt = service
        .contact(contact_request(&[1, 2, 1, 3, 99]))
        .await
        .expect("contact succeeds");

    assert_eq!(receipt.sent, 1);
    assert_eq!(receipt.skipped_without_email, vec![VolunteerId(2)]);
    assert_eq!(receipt.unknown, vec![VolunteerId(3), VolunteerId(99)]);

    let messages = contacts.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].recipients.len(), 1);
    assert_eq!(messages[0].recipients[0].email, "v1@example.org");
    assert_eq!(messages[0].recipients[0].display_name, "Alice Durand1");
}

#[tokio::test]
async fn contact_requires_a_selection_and_subject() {
    let (service, _, contacts) =
        build_service(MemoryDirectory::with(vec![volunteer(1, 30)]), settings(10));

    assert!(matches!(
        service.contact(contact_request(&[])).await,
        Err(MatchingError::Contact(ContactValidationError::NoRecipients))
    ));

    let mut blank = contact_request(&[1]);
    blank.subject = "  ".to_string();
    assert!(matches!(
        service.contact(blank).await,
        Err(MatchingError::Contact(ContactValidationError::EmptySubject))
    ));

    assert!(matches!(
        service.contact(contact_request(&[42])).await,
        Err(MatchingError::Contact(
            ContactValidationError::NoReachableRecipients
        ))
    ));
    assert!(contacts.messages().is_empty());
}

#[tokio::test]
async fn contact_surfaces_transport_failures() {
    let service = MatchingService::new(
        Arc::new(MemoryDirectory::with(vec![volunteer(1, 30)])),
        Arc::new(OfflineContacts),
        settings(10),
        ScoringConfig::default(),
    );

    assert!(matches!(
        service.contact(contact_request(&[1])).await,
        Err(MatchingError::Transport(_))
    ));
}
