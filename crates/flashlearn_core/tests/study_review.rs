use chrono::{DateTime, Duration, TimeZone, Utc};
use flashlearn_core::{
    CardPatch, CollectionPatch, Difficulty, EntityKind, FixedClock, MemoryRecordStore,
    ReviewOutcome, StudyError, StudyService,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap()
}

#[test]
fn add_card_starts_unreviewed_and_updates_counts() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);

    let collection = service.add_collection("Capitals", "Europe").unwrap();
    assert_eq!(collection.card_count, 0);

    let card = service.add_card(&collection.id, "France", "Paris").unwrap();
    assert_eq!(card.difficulty, Difficulty::Medium);
    assert_eq!(card.next_review_date, None);
    assert_eq!(card.review_count, 0);
    assert_eq!(card.created_at, start());

    assert_eq!(service.collection(&collection.id).unwrap().card_count, 1);
    assert_eq!(service.stats().today_added, 1);
    assert_eq!(service.stats().total_cards, 1);
}

#[test]
fn known_later_hard_follow_fixed_intervals() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let collection = service.add_collection("Capitals", "").unwrap();
    let card = service.add_card(&collection.id, "Spain", "Madrid").unwrap();

    let known = service.record_review(&card.id, ReviewOutcome::Known).unwrap();
    assert_eq!(known.next_review_date, Some(start() + Duration::days(7)));
    assert_eq!(known.difficulty, Difficulty::Easy);
    assert_eq!(known.review_count, 1);

    let later = service.record_review(&card.id, ReviewOutcome::Later).unwrap();
    assert_eq!(later.next_review_date, Some(start() + Duration::days(1)));
    assert_eq!(later.difficulty, Difficulty::Medium);
    assert_eq!(later.review_count, 2);

    let hard = service.record_review(&card.id, ReviewOutcome::Hard).unwrap();
    assert_eq!(hard.next_review_date, Some(start() + Duration::minutes(10)));
    assert_eq!(hard.difficulty, Difficulty::Hard);
    assert_eq!(service.stats().today_reviewed, 3);
}

#[test]
fn hard_review_tracks_and_known_review_clears_hard_set() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let collection = service.add_collection("Capitals", "").unwrap();
    let card = service.add_card(&collection.id, "Italy", "Rome").unwrap();

    service.record_review(&card.id, ReviewOutcome::Hard).unwrap();
    assert!(service.stats().hard_cards.contains(&card.id));
    assert_eq!(service.hard_card_list().len(), 1);

    service.record_review(&card.id, ReviewOutcome::Hard).unwrap();
    assert_eq!(service.stats().hard_card_count(), 1);

    service.record_review(&card.id, ReviewOutcome::Known).unwrap();
    assert!(service.stats().hard_cards.is_empty());
    service.state().check_invariants().unwrap();
}

#[test]
fn review_errors_are_explicit() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let collection = service.add_collection("Capitals", "").unwrap();
    let card = service.add_card(&collection.id, "Greece", "Athens").unwrap();

    let err = service.record_review_text(&card.id, "maybe").unwrap_err();
    assert_eq!(err, StudyError::InvalidOutcome("maybe".to_string()));
    assert_eq!(service.card(&card.id).unwrap().review_count, 0);

    let err = service
        .record_review("missing", ReviewOutcome::Known)
        .unwrap_err();
    assert_eq!(
        err,
        StudyError::NotFound {
            kind: EntityKind::Card,
            id: "missing".to_string()
        }
    );
    assert_eq!(service.stats().today_reviewed, 0);

    service.record_review_text(&card.id, "later").unwrap();
    assert_eq!(service.stats().today_reviewed, 1);
}

#[test]
fn due_query_honours_schedule_and_filter_in_insertion_order() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let verbs = service.add_collection("Verbs", "").unwrap();
    let nouns = service.add_collection("Nouns", "").unwrap();
    let a = service.add_card(&verbs.id, "a", "1").unwrap();
    let b = service.add_card(&nouns.id, "b", "2").unwrap();
    let c = service.add_card(&verbs.id, "c", "3").unwrap();

    service.record_review(&a.id, ReviewOutcome::Hard).unwrap();
    service.record_review(&c.id, ReviewOutcome::Known).unwrap();

    let due: Vec<String> = service
        .cards_for_review(None)
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(due, vec![b.id.clone()]);

    clock.advance(Duration::minutes(10));
    let due: Vec<String> = service
        .cards_for_review(None)
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(due, vec![a.id.clone(), b.id.clone()]);

    let due_verbs: Vec<String> = service
        .cards_for_review(Some(&verbs.id))
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(due_verbs, vec![a.id.clone()]);

    clock.advance(Duration::days(7));
    assert_eq!(service.cards_for_review(Some(&verbs.id)).len(), 2);
    assert!(service.cards_for_review(Some("unknown")).is_empty());
}

#[test]
fn delete_collection_cascades_and_reports_removed_cards() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let doomed = service.add_collection("Doomed", "").unwrap();
    let kept = service.add_collection("Kept", "").unwrap();
    for i in 0..3 {
        let card = service
            .add_card(&doomed.id, format!("q{i}"), format!("a{i}"))
            .unwrap();
        service.record_review(&card.id, ReviewOutcome::Hard).unwrap();
    }
    service.add_card(&kept.id, "q", "a").unwrap();
    assert_eq!(service.stats().total_cards, 4);

    let removal = service.delete_collection(&doomed.id).unwrap();
    assert_eq!(removal.collection.id, doomed.id);
    assert_eq!(removal.removed_card_ids.len(), 3);

    assert_eq!(service.stats().total_cards, 1);
    assert!(service.stats().hard_cards.is_empty());
    assert_eq!(service.cards().len(), 1);
    assert!(service.collection(&doomed.id).is_none());
    service.state().check_invariants().unwrap();
}

#[test]
fn delete_card_decrements_counts_and_hard_set() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let collection = service.add_collection("Capitals", "").unwrap();
    let card = service.add_card(&collection.id, "Peru", "Lima").unwrap();
    service.record_review(&card.id, ReviewOutcome::Hard).unwrap();

    let removed = service.delete_card(&card.id).unwrap();
    assert_eq!(removed.id, card.id);
    assert_eq!(service.collection(&collection.id).unwrap().card_count, 0);
    assert_eq!(service.stats().total_cards, 0);
    assert!(service.stats().hard_cards.is_empty());

    let err = service.delete_card(&card.id).unwrap_err();
    assert!(matches!(
        err,
        StudyError::NotFound {
            kind: EntityKind::Card,
            ..
        }
    ));
}

#[test]
fn updates_merge_fields_and_reject_missing_ids() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let collection = service.add_collection("Capitals", "old").unwrap();
    let card = service.add_card(&collection.id, "Chile", "Santigo").unwrap();
    service.record_review(&card.id, ReviewOutcome::Known).unwrap();

    let updated = service
        .update_collection(
            &collection.id,
            CollectionPatch {
                description: Some("South America".to_string()),
                ..CollectionPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Capitals");
    assert_eq!(updated.description, "South America");
    assert_eq!(updated.card_count, 1);

    let edited = service
        .update_card(&card.id, CardPatch::text("Chile", "Santiago"))
        .unwrap();
    assert_eq!(edited.back, "Santiago");
    assert_eq!(edited.difficulty, Difficulty::Easy);
    assert_eq!(edited.review_count, 1);

    assert!(matches!(
        service.update_collection("nope", CollectionPatch::default()),
        Err(StudyError::NotFound {
            kind: EntityKind::Collection,
            ..
        })
    ));
    assert!(matches!(
        service.update_card("nope", CardPatch::default()),
        Err(StudyError::NotFound {
            kind: EntityKind::Card,
            ..
        })
    ));
    assert!(matches!(
        service.add_card("nope", "f", "b"),
        Err(StudyError::NotFound {
            kind: EntityKind::Collection,
            ..
        })
    ));
    assert_eq!(service.stats().total_cards, 1);
}

#[test]
fn first_mutation_on_new_day_resets_daily_counters() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let collection = service.add_collection("Capitals", "").unwrap();
    let card = service.add_card(&collection.id, "Japan", "Tokyo").unwrap();
    service.record_review(&card.id, ReviewOutcome::Hard).unwrap();

    clock.advance(Duration::days(1));
    service.add_card(&collection.id, "Korea", "Seoul").unwrap();

    let stats = service.stats();
    assert_eq!(stats.today_added, 1);
    assert_eq!(stats.today_reviewed, 0);
    assert_eq!(stats.total_cards, 2);
    assert!(stats.hard_cards.contains(&card.id));
    assert_eq!(stats.last_updated, clock_today(&clock));
}

#[test]
fn breakdown_reports_per_collection_counts() {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::new(start());
    let mut service = StudyService::open_with_clock(&store, &clock);
    let collection = service.add_collection("Capitals", "").unwrap();
    let a = service.add_card(&collection.id, "a", "1").unwrap();
    let b = service.add_card(&collection.id, "b", "2").unwrap();
    service.add_card(&collection.id, "c", "3").unwrap();
    service.record_review(&a.id, ReviewOutcome::Known).unwrap();
    service.record_review(&b.id, ReviewOutcome::Hard).unwrap();

    let rows = service.collection_breakdown();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_cards, 3);
    assert_eq!(rows[0].easy_count, 1);
    assert_eq!(rows[0].hard_count, 1);
    assert_eq!(rows[0].due_count, 1);
    assert_eq!(service.cards_in_collection(&collection.id).len(), 3);
}

fn clock_today(clock: &FixedClock) -> chrono::NaiveDate {
    use flashlearn_core::Clock;
    clock.today()
}
