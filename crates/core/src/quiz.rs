//! Quiz grading.
//!
//! Questions are graded in the order given by the caller (the loaded
//! question list, sorted by `order_index`). Submitted answers for unknown
//! question ids are ignored; questions without a submitted answer count as
//! incorrect.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// The part of a quiz question needed for grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerKey {
    pub question_id: DbId,
    pub correct_option_index: i32,
}

/// One graded answer, stored as part of a quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: DbId,
    /// `None` when the doer left the question unanswered.
    pub selected_option_index: Option<i32>,
    pub is_correct: bool,
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizGrade {
    pub score: i32,
    pub total_questions: i32,
    pub passed: bool,
    pub answers: Vec<GradedAnswer>,
}

/// Whether `score` out of `total` reaches `threshold_percent`.
///
/// Compared as `score / total >= threshold / 100` using integer
/// cross-multiplication, so 7 of 10 meets a 70 % mark exactly. A quiz with
/// no questions never passes.
pub fn meets_threshold(score: i32, total: i32, threshold_percent: u8) -> bool {
    if total <= 0 {
        return false;
    }
    i64::from(score) * 100 >= i64::from(threshold_percent) * i64::from(total)
}

/// Grade a submission against the answer keys.
pub fn grade_quiz(
    keys: &[AnswerKey],
    answers: &HashMap<DbId, i32>,
    threshold_percent: u8,
) -> QuizGrade {
    let graded: Vec<GradedAnswer> = keys
        .iter()
        .map(|key| {
            let selected = answers.get(&key.question_id).copied();
            GradedAnswer {
                question_id: key.question_id,
                selected_option_index: selected,
                is_correct: selected == Some(key.correct_option_index),
            }
        })
        .collect();

    let score = graded.iter().filter(|a| a.is_correct).count() as i32;
    let total_questions = keys.len() as i32;

    QuizGrade {
        score,
        total_questions,
        passed: meets_threshold(score, total_questions, threshold_percent),
        answers: graded,
    }
}

/// Attempt number for the next submission, given the latest one.
pub fn next_attempt_number(previous: Option<i32>) -> i32 {
    previous.map_or(1, |n| n + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: i64) -> Vec<AnswerKey> {
        (1..=n)
            .map(|id| AnswerKey {
                question_id: id,
                correct_option_index: (id % 4) as i32,
            })
            .collect()
    }

    /// Answers with the first `correct` questions right and the rest wrong.
    fn answers(keys: &[AnswerKey], correct: usize) -> HashMap<DbId, i32> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| {
                let idx = if i < correct {
                    k.correct_option_index
                } else {
                    k.correct_option_index + 1
                };
                (k.question_id, idx)
            })
            .collect()
    }

    #[test]
    fn seven_of_ten_passes_at_seventy_percent() {
        let k = keys(10);
        let grade = grade_quiz(&k, &answers(&k, 7), 70);
        assert_eq!(grade.score, 7);
        assert_eq!(grade.total_questions, 10);
        assert!(grade.passed);
    }

    #[test]
    fn six_of_ten_fails_at_seventy_percent() {
        let k = keys(10);
        let grade = grade_quiz(&k, &answers(&k, 6), 70);
        assert_eq!(grade.score, 6);
        assert!(!grade.passed);
    }

    #[test]
    fn threshold_is_not_rounded() {
        // 2/3 = 66.67 %, below 67 % and above 66 %.
        assert!(!meets_threshold(2, 3, 67));
        assert!(meets_threshold(2, 3, 66));
    }

    #[test]
    fn omitted_questions_are_unanswered_and_incorrect() {
        let k = keys(3);
        let mut submitted = HashMap::new();
        submitted.insert(1, k[0].correct_option_index);

        let grade = grade_quiz(&k, &submitted, 70);
        assert_eq!(grade.score, 1);
        assert_eq!(grade.answers.len(), 3);
        assert_eq!(grade.answers[1].selected_option_index, None);
        assert!(!grade.answers[1].is_correct);
        assert!(!grade.passed);
    }

    #[test]
    fn unknown_question_ids_are_ignored() {
        let k = keys(2);
        let mut submitted = answers(&k, 2);
        submitted.insert(999, 0);

        let grade = grade_quiz(&k, &submitted, 70);
        assert_eq!(grade.total_questions, 2);
        assert_eq!(grade.score, 2);
        assert!(grade.answers.iter().all(|a| a.question_id != 999));
    }

    #[test]
    fn answers_follow_key_order() {
        let k = keys(4);
        let grade = grade_quiz(&k, &answers(&k, 4), 70);
        let ids: Vec<DbId> = grade.answers.iter().map(|a| a.question_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_quiz_never_passes() {
        let grade = grade_quiz(&[], &HashMap::new(), 0);
        assert_eq!(grade.total_questions, 0);
        assert!(!grade.passed);
    }

    #[test]
    fn attempt_numbers_start_at_one() {
        assert_eq!(next_attempt_number(None), 1);
        assert_eq!(next_attempt_number(Some(1)), 2);
        assert_eq!(next_attempt_number(Some(41)), 42);
    }
}
