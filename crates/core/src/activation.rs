//! Activation gates, full-activation re-evaluation, and stage derivation.
//!
//! A doer becomes fully activated once three independent gates are open:
//! training, quiz, and bank details. Gates may open in any order, never
//! close again, and full activation is terminal. Everything here is pure;
//! callers load the current flags, apply a transition, and persist the
//! result.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

/// One of the three steps a doer must complete before activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationGate {
    Training,
    Quiz,
    BankDetails,
}

impl ActivationGate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Quiz => "quiz",
            Self::BankDetails => "bank_details",
        }
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// The persisted boolean state of a doer's activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivationFlags {
    pub training_completed: bool,
    pub quiz_passed: bool,
    pub bank_details_added: bool,
    pub is_fully_activated: bool,
    pub activated_at: Option<Timestamp>,
}

impl ActivationFlags {
    /// True when all three gates are open, regardless of the aggregate flag.
    pub fn all_gates_open(&self) -> bool {
        self.training_completed && self.quiz_passed && self.bank_details_added
    }

    /// Whether a single gate is open.
    pub fn is_open(&self, gate: ActivationGate) -> bool {
        match gate {
            ActivationGate::Training => self.training_completed,
            ActivationGate::Quiz => self.quiz_passed,
            ActivationGate::BankDetails => self.bank_details_added,
        }
    }

    /// Open a gate. Gates only ever move from closed to open.
    pub fn open(mut self, gate: ActivationGate) -> Self {
        match gate {
            ActivationGate::Training => self.training_completed = true,
            ActivationGate::Quiz => self.quiz_passed = true,
            ActivationGate::BankDetails => self.bank_details_added = true,
        }
        self
    }

    /// Number of open gates (0..=3).
    pub fn open_count(&self) -> u8 {
        [
            self.training_completed,
            self.quiz_passed,
            self.bank_details_added,
        ]
        .iter()
        .filter(|open| **open)
        .count() as u8
    }

    /// Check that the aggregate flag agrees with the gates.
    ///
    /// `is_fully_activated` may only be true when every gate is open, and
    /// `activated_at` is present exactly when the doer is fully activated.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_fully_activated && !self.all_gates_open() {
            return Err(CoreError::Internal(
                "is_fully_activated is set while an activation step is incomplete".into(),
            ));
        }
        if self.is_fully_activated != self.activated_at.is_some() {
            return Err(CoreError::Internal(
                "activated_at must be stamped exactly when the doer is fully activated".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Re-evaluation
// ---------------------------------------------------------------------------

/// Result of [`reevaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reevaluation {
    pub flags: ActivationFlags,
    /// True only on the transition into full activation.
    pub newly_activated: bool,
}

/// Recompute the aggregate flag after a gate change.
///
/// When every gate is open and the doer is not yet activated, sets
/// `is_fully_activated` and stamps `activated_at = now`. Otherwise the flags
/// are returned untouched; an already activated doer keeps its original
/// `activated_at`.
pub fn reevaluate(flags: ActivationFlags, now: Timestamp) -> Reevaluation {
    if flags.all_gates_open() && !flags.is_fully_activated {
        return Reevaluation {
            flags: ActivationFlags {
                is_fully_activated: true,
                activated_at: Some(now),
                ..flags
            },
            newly_activated: true,
        };
    }
    Reevaluation {
        flags,
        newly_activated: false,
    }
}

/// Open `gate` and re-evaluate in one step.
pub fn open_gate(flags: ActivationFlags, gate: ActivationGate, now: Timestamp) -> Reevaluation {
    reevaluate(flags.open(gate), now)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// A coarse, UI-facing view of where a doer stands.
///
/// Derived from the first open gate in the canonical order
/// training -> quiz -> bank details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStage {
    NotStarted,
    TrainingInProgress,
    TrainingDone,
    QuizPending,
    QuizPassed,
    BankPending,
    BankAdded,
    FullyActivated,
}

impl ActivationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::TrainingInProgress => "training_in_progress",
            Self::TrainingDone => "training_done",
            Self::QuizPending => "quiz_pending",
            Self::QuizPassed => "quiz_passed",
            Self::BankPending => "bank_pending",
            Self::BankAdded => "bank_added",
            Self::FullyActivated => "fully_activated",
        }
    }
}

/// Everything [`derive_stage`] looks at besides the flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageInputs {
    /// Number of training progress rows for the doer (completed or not).
    pub training_progress_records: usize,
    /// Number of quiz attempts the doer has made.
    pub quiz_attempts: usize,
    /// Whether a bank details row exists for the doer.
    pub has_bank_details: bool,
}

/// Map activation flags plus collection sizes to an [`ActivationStage`].
pub fn derive_stage(flags: &ActivationFlags, inputs: &StageInputs) -> ActivationStage {
    if flags.is_fully_activated {
        return ActivationStage::FullyActivated;
    }

    if !flags.training_completed {
        let anything_started = flags.open_count() > 0
            || inputs.training_progress_records > 0
            || inputs.quiz_attempts > 0
            || inputs.has_bank_details;
        return if anything_started {
            ActivationStage::TrainingInProgress
        } else {
            ActivationStage::NotStarted
        };
    }

    if !flags.quiz_passed {
        return if inputs.quiz_attempts == 0 {
            ActivationStage::TrainingDone
        } else {
            ActivationStage::QuizPending
        };
    }

    if !flags.bank_details_added {
        return if inputs.has_bank_details {
            ActivationStage::BankPending
        } else {
            ActivationStage::QuizPassed
        };
    }

    ActivationStage::BankAdded
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    const ALL_GATES: [ActivationGate; 3] = [
        ActivationGate::Training,
        ActivationGate::Quiz,
        ActivationGate::BankDetails,
    ];

    // -- reevaluate --

    #[test]
    fn no_activation_until_every_gate_is_open() {
        let flags = ActivationFlags::default()
            .open(ActivationGate::Training)
            .open(ActivationGate::Quiz);
        let result = reevaluate(flags, t(0));
        assert!(!result.newly_activated);
        assert!(!result.flags.is_fully_activated);
        assert!(result.flags.activated_at.is_none());
    }

    #[test]
    fn last_gate_activates_and_stamps_time() {
        let flags = ActivationFlags::default()
            .open(ActivationGate::Training)
            .open(ActivationGate::Quiz);
        let result = open_gate(flags, ActivationGate::BankDetails, t(5));
        assert!(result.newly_activated);
        assert!(result.flags.is_fully_activated);
        assert_eq!(result.flags.activated_at, Some(t(5)));
        assert!(result.flags.validate().is_ok());
    }

    #[test]
    fn already_activated_keeps_original_timestamp() {
        let flags = ActivationFlags {
            training_completed: true,
            quiz_passed: true,
            bank_details_added: true,
            is_fully_activated: true,
            activated_at: Some(t(1)),
        };
        let result = open_gate(flags, ActivationGate::Quiz, t(99));
        assert!(!result.newly_activated);
        assert_eq!(result.flags.activated_at, Some(t(1)));
    }

    #[test]
    fn every_gate_order_activates_only_on_the_last_gate() {
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut flags = ActivationFlags::default();
            for (step, idx) in order.iter().enumerate() {
                let result = open_gate(flags, ALL_GATES[*idx], t(step as i64));
                flags = result.flags;
                assert_eq!(result.newly_activated, step == 2, "order {order:?}");
                assert_eq!(flags.is_fully_activated, flags.all_gates_open());
                assert!(flags.validate().is_ok());
            }
        }
    }

    #[test]
    fn open_is_monotonic() {
        let flags = ActivationFlags::default().open(ActivationGate::Quiz);
        let again = flags.open(ActivationGate::Quiz);
        assert!(again.quiz_passed);
        assert_eq!(again.open_count(), 1);
    }

    // -- validate --

    #[test]
    fn validate_rejects_activation_with_closed_gate() {
        let flags = ActivationFlags {
            training_completed: true,
            quiz_passed: false,
            bank_details_added: true,
            is_fully_activated: true,
            activated_at: Some(t(0)),
        };
        assert!(flags.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_activated_at() {
        let flags = ActivationFlags {
            training_completed: true,
            quiz_passed: true,
            bank_details_added: true,
            is_fully_activated: true,
            activated_at: None,
        };
        assert!(flags.validate().is_err());
    }

    // -- derive_stage --

    #[test]
    fn stage_not_started_for_fresh_doer() {
        let stage = derive_stage(&ActivationFlags::default(), &StageInputs::default());
        assert_eq!(stage, ActivationStage::NotStarted);
    }

    #[test]
    fn stage_training_in_progress_with_partial_progress() {
        let inputs = StageInputs {
            training_progress_records: 1,
            ..Default::default()
        };
        let stage = derive_stage(&ActivationFlags::default(), &inputs);
        assert_eq!(stage, ActivationStage::TrainingInProgress);
    }

    #[test]
    fn stage_training_in_progress_when_quiz_passed_first() {
        let flags = ActivationFlags::default().open(ActivationGate::Quiz);
        let stage = derive_stage(&flags, &StageInputs::default());
        assert_eq!(stage, ActivationStage::TrainingInProgress);
    }

    #[test]
    fn stage_quiz_progression() {
        let flags = ActivationFlags::default().open(ActivationGate::Training);
        assert_eq!(
            derive_stage(&flags, &StageInputs::default()),
            ActivationStage::TrainingDone
        );

        let failed_once = StageInputs {
            quiz_attempts: 1,
            ..Default::default()
        };
        assert_eq!(derive_stage(&flags, &failed_once), ActivationStage::QuizPending);
    }

    #[test]
    fn stage_bank_progression() {
        let flags = ActivationFlags::default()
            .open(ActivationGate::Training)
            .open(ActivationGate::Quiz);
        assert_eq!(
            derive_stage(&flags, &StageInputs::default()),
            ActivationStage::QuizPassed
        );

        let stored_but_unflagged = StageInputs {
            has_bank_details: true,
            ..Default::default()
        };
        assert_eq!(
            derive_stage(&flags, &stored_but_unflagged),
            ActivationStage::BankPending
        );

        let all_open = flags.open(ActivationGate::BankDetails);
        assert_eq!(
            derive_stage(&all_open, &stored_but_unflagged),
            ActivationStage::BankAdded
        );
    }

    #[test]
    fn stage_fully_activated_is_terminal() {
        let flags = reevaluate(
            ActivationFlags::default()
                .open(ActivationGate::Training)
                .open(ActivationGate::Quiz)
                .open(ActivationGate::BankDetails),
            t(0),
        )
        .flags;
        assert_eq!(
            derive_stage(&flags, &StageInputs::default()),
            ActivationStage::FullyActivated
        );
    }
}
