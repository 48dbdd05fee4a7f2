//! Quiz question and attempt models.

use doer_core::quiz::{AnswerKey, GradedAnswer};
use doer_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `quiz_questions` table.
///
/// Carries the correct answer; never serialize it to a doer directly.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct QuizQuestion {
    pub id: DbId,
    pub question_text: String,
    pub options: Json<Vec<String>>,
    pub correct_option_index: i32,
    pub order_index: i32,
    pub created_at: Timestamp,
}

impl QuizQuestion {
    pub fn answer_key(&self) -> AnswerKey {
        AnswerKey {
            question_id: self.id,
            correct_option_index: self.correct_option_index,
        }
    }
}

/// DTO for seeding a quiz question.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuizQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option_index: i32,
    pub order_index: Option<i32>,
}

/// A row from the `quiz_attempts` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct QuizAttempt {
    pub id: DbId,
    pub doer_id: DbId,
    pub submission_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub passed: bool,
    pub attempt_number: i32,
    pub answers: Json<Vec<GradedAnswer>>,
    pub attempted_at: Timestamp,
}

/// DTO for inserting a graded attempt. The attempt number is assigned on insert.
///
/// `submission_id` identifies one submission; inserting it again returns
/// the stored attempt instead of a new one.
#[derive(Debug, Clone)]
pub struct CreateQuizAttempt {
    pub doer_id: DbId,
    pub submission_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub passed: bool,
    pub answers: Vec<GradedAnswer>,
}
