//! Repository tests against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` set and `cargo test -p doer-db -- --ignored`.

use chrono::{Duration, Utc};
use doer_core::activation::{open_gate, ActivationFlags, ActivationGate};
use doer_core::quiz::GradedAnswer;
use doer_db::models::bank_details::SaveBankDetails;
use doer_db::models::doer::CreateDoer;
use doer_db::models::quiz::CreateQuizAttempt;
use doer_db::models::training::CreateTrainingModule;
use doer_db::repositories::{
    ActivationStatusRepo, BankDetailsRepo, DoerRepo, EventRepo, QuizRepo, TrainingRepo,
};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_doer(pool: &PgPool, email: &str) -> i64 {
    DoerRepo::create(
        pool,
        &CreateDoer {
            full_name: "Test Doer".to_string(),
            email: email.to_string(),
        },
    )
    .await
    .expect("doer creation should succeed")
    .id
}

fn new_module(title: &str, order_index: i32) -> CreateTrainingModule {
    CreateTrainingModule {
        title: title.to_string(),
        description: None,
        module_type: "video".to_string(),
        content_url: format!("https://cdn.example.com/{title}.mp4"),
        duration_minutes: Some(5),
        order_index: Some(order_index),
        is_required: None,
    }
}

fn attempt(doer_id: i64, passed: bool) -> CreateQuizAttempt {
    CreateQuizAttempt {
        doer_id,
        submission_id: Uuid::new_v4(),
        score: if passed { 1 } else { 0 },
        total_questions: 1,
        passed,
        answers: vec![GradedAnswer {
            question_id: 1,
            selected_option_index: None,
            is_correct: passed,
        }],
    }
}

// ---------------------------------------------------------------------------
// Activation status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn get_or_create_returns_same_row(pool: PgPool) {
    let doer_id = new_doer(&pool, "a@test.com").await;

    let first = ActivationStatusRepo::get_or_create(&pool, doer_id).await.unwrap();
    let second = ActivationStatusRepo::get_or_create(&pool, doer_id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(!first.training_completed);
    assert!(!first.is_fully_activated);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn save_flags_never_closes_a_gate(pool: PgPool) {
    let doer_id = new_doer(&pool, "b@test.com").await;
    ActivationStatusRepo::get_or_create(&pool, doer_id).await.unwrap();

    let opened = ActivationFlags::default().open(ActivationGate::Quiz);
    ActivationStatusRepo::save_flags(&pool, doer_id, &opened).await.unwrap();

    let stale = ActivationFlags::default();
    let row = ActivationStatusRepo::save_flags(&pool, doer_id, &stale).await.unwrap();
    assert!(row.status.quiz_passed);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn caller_cannot_activate_with_a_closed_gate(pool: PgPool) {
    let doer_id = new_doer(&pool, "c@test.com").await;
    ActivationStatusRepo::get_or_create(&pool, doer_id).await.unwrap();

    let bogus = ActivationFlags {
        is_fully_activated: true,
        activated_at: Some(Utc::now()),
        ..Default::default()
    };
    let write = ActivationStatusRepo::save_flags(&pool, doer_id, &bogus).await.unwrap();
    assert!(!write.status.is_fully_activated);
    assert!(write.status.activated_at.is_none());
    assert!(!write.newly_activated());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn stale_writer_completing_the_last_gate_activates(pool: PgPool) {
    let doer_id = new_doer(&pool, "k@test.com").await;
    ActivationStatusRepo::get_or_create(&pool, doer_id).await.unwrap();

    let other = ActivationFlags::default()
        .open(ActivationGate::Training)
        .open(ActivationGate::Quiz);
    let first = ActivationStatusRepo::save_flags(&pool, doer_id, &other).await.unwrap();
    assert!(!first.newly_activated());

    // Written from a snapshot taken before the other two gates opened.
    let stale = ActivationFlags::default().open(ActivationGate::BankDetails);
    let write = ActivationStatusRepo::save_flags(&pool, doer_id, &stale).await.unwrap();
    assert!(write.status.is_fully_activated);
    assert!(write.status.activated_at.is_some());
    assert!(write.newly_activated());

    let again = ActivationStatusRepo::save_flags(&pool, doer_id, &stale).await.unwrap();
    assert!(again.status.is_fully_activated);
    assert!(!again.newly_activated());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn activation_keeps_first_timestamp(pool: PgPool) {
    let doer_id = new_doer(&pool, "d@test.com").await;
    ActivationStatusRepo::get_or_create(&pool, doer_id).await.unwrap();

    let first_at = Utc::now();
    let flags = ActivationFlags::default()
        .open(ActivationGate::Training)
        .open(ActivationGate::Quiz);
    let activated = open_gate(flags, ActivationGate::BankDetails, first_at).flags;
    let write = ActivationStatusRepo::save_flags(&pool, doer_id, &activated).await.unwrap();
    assert!(write.newly_activated());

    let later = ActivationFlags {
        activated_at: Some(first_at + Duration::hours(1)),
        ..activated
    };
    let write = ActivationStatusRepo::save_flags(&pool, doer_id, &later).await.unwrap();
    assert!(!write.newly_activated());
    assert_eq!(
        write.status.activated_at.map(|t| t.timestamp()),
        Some(first_at.timestamp())
    );
}

// ---------------------------------------------------------------------------
// Training progress
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn completing_twice_keeps_one_row_and_started_at(pool: PgPool) {
    let doer_id = new_doer(&pool, "e@test.com").await;
    let module = TrainingRepo::create_module(&pool, &new_module("intro", 1)).await.unwrap();

    let start = Utc::now() - Duration::minutes(10);
    TrainingRepo::record_progress(&pool, doer_id, module.id, 40, start).await.unwrap();
    let first = TrainingRepo::complete_module(&pool, doer_id, module.id, Utc::now()).await.unwrap();
    let second = TrainingRepo::complete_module(&pool, doer_id, module.id, Utc::now()).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.started_at.timestamp(), start.timestamp());
    assert!(second.is_completed);
    assert_eq!(second.progress_percent, 100);

    let rows = TrainingRepo::list_progress(&pool, doer_id).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn partial_progress_never_decreases(pool: PgPool) {
    let doer_id = new_doer(&pool, "f@test.com").await;
    let module = TrainingRepo::create_module(&pool, &new_module("safety", 2)).await.unwrap();

    TrainingRepo::record_progress(&pool, doer_id, module.id, 60, Utc::now()).await.unwrap();
    let row = TrainingRepo::record_progress(&pool, doer_id, module.id, 20, Utc::now()).await.unwrap();
    assert_eq!(row.progress_percent, 60);
    assert!(!row.is_completed);
}

// ---------------------------------------------------------------------------
// Quiz attempts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn attempt_numbers_increase_per_doer(pool: PgPool) {
    let doer_a = new_doer(&pool, "g@test.com").await;
    let doer_b = new_doer(&pool, "h@test.com").await;

    let a1 = QuizRepo::insert_attempt(&pool, &attempt(doer_a, false)).await.unwrap();
    let a2 = QuizRepo::insert_attempt(&pool, &attempt(doer_a, true)).await.unwrap();
    let b1 = QuizRepo::insert_attempt(&pool, &attempt(doer_b, true)).await.unwrap();

    assert_eq!(a1.attempt_number, 1);
    assert_eq!(a2.attempt_number, 2);
    assert_eq!(b1.attempt_number, 1);

    let history = QuizRepo::list_attempts(&pool, doer_a).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().map(|a| a.id), Some(a2.id));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn resubmitted_attempt_returns_the_stored_row(pool: PgPool) {
    let doer_id = new_doer(&pool, "l@test.com").await;
    let input = attempt(doer_id, true);

    let first = QuizRepo::insert_attempt(&pool, &input).await.unwrap();
    let again = QuizRepo::insert_attempt(&pool, &input).await.unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(again.attempt_number, 1);
    assert_eq!(QuizRepo::list_attempts(&pool, doer_id).await.unwrap().len(), 1);

    let next = QuizRepo::insert_attempt(&pool, &attempt(doer_id, false)).await.unwrap();
    assert_eq!(next.attempt_number, 2);
}

// ---------------------------------------------------------------------------
// Bank details
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn bank_details_resubmission_replaces_row(pool: PgPool) {
    let doer_id = new_doer(&pool, "i@test.com").await;
    let form = SaveBankDetails {
        account_holder_name: "Asha Rao".to_string(),
        account_number: "123456789012".to_string(),
        ifsc_code: "SBIN0001234".to_string(),
        upi_id: None,
    };

    let first = BankDetailsRepo::upsert(&pool, doer_id, &form).await.unwrap();
    let second = BankDetailsRepo::upsert(
        &pool,
        doer_id,
        &SaveBankDetails {
            account_number: "999988887777".to_string(),
            ..form
        },
    )
    .await
    .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.account_number, "999988887777");
    assert!(!second.is_verified);
}

// ---------------------------------------------------------------------------
// Doers and events
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn mark_activated_and_record_event(pool: PgPool) {
    let doer_id = new_doer(&pool, "j@test.com").await;

    let doer = DoerRepo::mark_activated(&pool, doer_id, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert!(doer.is_activated);

    EventRepo::insert(&pool, "doer.activated", Some(doer_id), &serde_json::json!({}))
        .await
        .unwrap();
    let events = EventRepo::list_for_doer(&pool, doer_id, 10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "doer.activated");
}
