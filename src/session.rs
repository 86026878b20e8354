use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::AnswerLedger;
use crate::scoring::ResultRecord;
use crate::timer::ExamTimer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub exam_type: String,
    pub total_exam_seconds: u64,
    pub per_question_seconds: u64,
}

impl SessionConfig {
    pub fn new(
        exam_type: impl Into<String>,
        total_exam_seconds: u64,
        per_question_seconds: u64,
    ) -> Self {
        Self {
            exam_type: exam_type.into(),
            total_exam_seconds,
            per_question_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionStatus {
    #[strum(serialize = "not started")]
    NotStarted,
    #[strum(serialize = "in progress")]
    InProgress,
    #[strum(serialize = "paused")]
    Paused,
    #[strum(serialize = "completed")]
    Completed,
}

/// Session operations, named in [`crate::error::StateError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Operation {
    #[strum(serialize = "start")]
    Start,
    #[strum(serialize = "submit an answer")]
    SubmitAnswer,
    #[strum(serialize = "move to the next question")]
    NextQuestion,
    #[strum(serialize = "complete")]
    Complete,
    #[strum(serialize = "pause")]
    Pause,
    #[strum(serialize = "resume")]
    Resume,
    #[strum(serialize = "tick")]
    Tick,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub status: SessionStatus,
    pub current_question_index: usize,
    pub timer: ExamTimer,
    pub ledger: AnswerLedger,
    pub question_displayed_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    // Cached once the session completes
    pub result: Option<ResultRecord>,
}

impl SessionState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            status: SessionStatus::NotStarted,
            current_question_index: 0,
            timer: ExamTimer::new(config.total_exam_seconds, config.per_question_seconds),
            ledger: AnswerLedger::new(),
            question_displayed_at: None,
            paused_at: None,
            result: None,
        }
    }
}
