//! Repository for the `quiz_questions` and `quiz_attempts` tables.

use doer_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::quiz::{CreateQuizAttempt, CreateQuizQuestion, QuizAttempt, QuizQuestion};

/// Column list for `quiz_questions` queries.
const QUESTION_COLUMNS: &str =
    "id, question_text, options, correct_option_index, order_index, created_at";

/// Column list for `quiz_attempts` queries.
const ATTEMPT_COLUMNS: &str =
    "id, doer_id, submission_id, score, total_questions, passed, attempt_number, answers, \
     attempted_at";

/// Provides question reads and append-only attempt storage.
pub struct QuizRepo;

impl QuizRepo {
    /// List all questions in display order.
    pub async fn list_questions(pool: &PgPool) -> Result<Vec<QuizQuestion>, sqlx::Error> {
        let query = format!(
            "SELECT {QUESTION_COLUMNS} FROM quiz_questions ORDER BY order_index, id"
        );
        sqlx::query_as::<_, QuizQuestion>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert a question.
    pub async fn create_question(
        pool: &PgPool,
        input: &CreateQuizQuestion,
    ) -> Result<QuizQuestion, sqlx::Error> {
        let query = format!(
            "INSERT INTO quiz_questions (question_text, options, correct_option_index, order_index) \
             VALUES ($1, $2, $3, COALESCE($4, 0)) \
             RETURNING {QUESTION_COLUMNS}"
        );
        sqlx::query_as::<_, QuizQuestion>(&query)
            .bind(&input.question_text)
            .bind(Json(&input.options))
            .bind(input.correct_option_index)
            .bind(input.order_index)
            .fetch_one(pool)
            .await
    }

    /// All attempts for a doer, oldest first.
    pub async fn list_attempts(
        pool: &PgPool,
        doer_id: DbId,
    ) -> Result<Vec<QuizAttempt>, sqlx::Error> {
        let query = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts \
             WHERE doer_id = $1 \
             ORDER BY attempt_number"
        );
        sqlx::query_as::<_, QuizAttempt>(&query)
            .bind(doer_id)
            .fetch_all(pool)
            .await
    }

    /// Append a graded attempt, or return the one already stored for the
    /// same `submission_id`.
    ///
    /// The attempt number is the doer's current maximum plus one, computed
    /// in the same statement. Two concurrent inserts for one doer collide on
    /// `uq_quiz_attempts_doer_attempt` instead of sharing a number. A
    /// resubmitted `submission_id` hits `uq_quiz_attempts_submission`, inserts
    /// nothing, and the second branch returns the earlier row.
    pub async fn insert_attempt(
        pool: &PgPool,
        input: &CreateQuizAttempt,
    ) -> Result<QuizAttempt, sqlx::Error> {
        let query = format!(
            "WITH inserted AS ( \
                 INSERT INTO quiz_attempts \
                     (doer_id, submission_id, score, total_questions, passed, \
                      attempt_number, answers) \
                 SELECT $1, $2, $3, $4, $5, COALESCE(MAX(attempt_number), 0) + 1, $6 \
                 FROM quiz_attempts WHERE doer_id = $1 \
                 ON CONFLICT (submission_id) DO NOTHING \
                 RETURNING {ATTEMPT_COLUMNS} \
             ) \
             SELECT {ATTEMPT_COLUMNS} FROM inserted \
             UNION ALL \
             SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE submission_id = $2 \
             LIMIT 1"
        );
        sqlx::query_as::<_, QuizAttempt>(&query)
            .bind(input.doer_id)
            .bind(input.submission_id)
            .bind(input.score)
            .bind(input.total_questions)
            .bind(input.passed)
            .bind(Json(&input.answers))
            .fetch_one(pool)
            .await
    }
}
