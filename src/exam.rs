use log::{debug, info, warn};

use crate::clock::{whole_seconds_between, Clock, SystemClock};
use crate::error::{AnswerError, ExamError, LoadError, StateError};
use crate::ledger::{Answer, AnswerLedger};
use crate::question::{validate_questions, Question, QuestionKind};
use crate::scoring::{score, ResultRecord, ScoreMeta};
use crate::session::{Operation, SessionConfig, SessionState, SessionStatus};
use crate::timer::TimerTick;

/// What a one-second tick did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTick {
    Running { question_expired: bool },
    /// Paused; clocks untouched
    Frozen,
    /// Total time ran out and the session completed itself
    Expired,
}

/// One attempt at an exam.
///
/// All transitions are synchronous. The owner drives `tick()` once per
/// second and forwards user input; nothing here runs on its own.
#[derive(Debug)]
pub struct ExamSession<C: Clock = SystemClock> {
    config: SessionConfig,
    questions: Vec<Question>,
    state: SessionState,
    clock: C,
}

impl ExamSession<SystemClock> {
    pub fn new(config: SessionConfig, questions: Vec<Question>) -> Result<Self, LoadError> {
        Self::with_clock(config, questions, SystemClock)
    }
}

impl<C: Clock> ExamSession<C> {
    pub fn with_clock(
        config: SessionConfig,
        questions: Vec<Question>,
        clock: C,
    ) -> Result<Self, LoadError> {
        validate_questions(&questions)?;
        let state = SessionState::new(&config);

        Ok(Self {
            config,
            questions,
            state,
            clock,
        })
    }

    fn require(&self, operation: Operation, allowed: &[SessionStatus]) -> Result<(), StateError> {
        if allowed.contains(&self.state.status) {
            Ok(())
        } else {
            warn!(
                "rejected {} in {} session ({})",
                operation, self.state.status, self.config.exam_type
            );
            Err(StateError {
                operation,
                status: self.state.status,
            })
        }
    }

    pub fn start(&mut self) -> Result<(), StateError> {
        self.require(Operation::Start, &[SessionStatus::NotStarted])?;

        self.state.status = SessionStatus::InProgress;
        self.state.current_question_index = 0;
        self.state.timer.start();
        self.state.question_displayed_at = Some(self.clock.now());

        info!(
            "started {} exam: {} questions, {}s total, {}s per question",
            self.config.exam_type,
            self.questions.len(),
            self.config.total_exam_seconds,
            self.config.per_question_seconds
        );
        Ok(())
    }

    /// Record an answer for the current question. Does not advance.
    pub fn submit_answer(&mut self, answer: Answer) -> Result<(), ExamError> {
        self.require(Operation::SubmitAnswer, &[SessionStatus::InProgress])?;

        let question = &self.questions[self.state.current_question_index];
        if self.state.ledger.contains(&question.id) {
            return Err(AnswerError::AlreadyAnswered {
                question: question.id.clone(),
            }
            .into());
        }
        check_answer(question, &answer)?;

        let now = self.clock.now();
        let displayed_at = self.state.question_displayed_at.unwrap_or(now);
        let time_taken = whole_seconds_between(displayed_at, now);

        debug!("answered {} in {}s", question.id, time_taken);
        let question_id = question.id.clone();
        self.state.ledger.record(question_id, answer, time_taken, now);
        Ok(())
    }

    /// Move to the next question. Returns `false` at the last question.
    pub fn next_question(&mut self) -> Result<bool, StateError> {
        self.require(Operation::NextQuestion, &[SessionStatus::InProgress])?;

        if self.is_last_question() {
            return Ok(false);
        }

        self.state.current_question_index += 1;
        self.state.timer.reset_question_timer();
        self.state.question_displayed_at = Some(self.clock.now());
        Ok(true)
    }

    /// Finish the session and score it. Later calls return the same record.
    pub fn complete(&mut self) -> Result<ResultRecord, StateError> {
        if let Some(result) = &self.state.result {
            return Ok(result.clone());
        }
        self.require(
            Operation::Complete,
            &[SessionStatus::InProgress, SessionStatus::Paused],
        )?;

        self.state.timer.stop();
        self.state.status = SessionStatus::Completed;

        let result = score(
            &self.questions,
            &self.state.ledger,
            self.state.timer.elapsed_seconds(),
            ScoreMeta {
                exam_type: self.config.exam_type.clone(),
                date: self.clock.now(),
            },
        );

        info!(
            "completed {} exam: {}/{} correct ({}%) in {}s",
            result.exam_type,
            result.correct_answers,
            result.total_questions,
            result.percentage,
            result.time_spent
        );
        self.state.result = Some(result.clone());
        Ok(result)
    }

    pub fn pause(&mut self) -> Result<(), StateError> {
        self.require(Operation::Pause, &[SessionStatus::InProgress])?;
        self.state.timer.pause();
        self.state.status = SessionStatus::Paused;
        self.state.paused_at = Some(self.clock.now());
        debug!("paused at {}s remaining", self.state.timer.total_remaining());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), StateError> {
        self.require(Operation::Resume, &[SessionStatus::Paused])?;
        self.state.timer.resume();
        self.state.status = SessionStatus::InProgress;

        // Time spent paused does not count towards the current answer
        if let (Some(paused_at), Some(displayed_at)) =
            (self.state.paused_at.take(), self.state.question_displayed_at)
        {
            let now = self.clock.now();
            if now > paused_at {
                self.state.question_displayed_at = Some(displayed_at + (now - paused_at));
            }
        }
        debug!("resumed at {}s remaining", self.state.timer.total_remaining());
        Ok(())
    }

    /// Advance both clocks by one second; completes the session on total expiry
    pub fn tick(&mut self) -> Result<SessionTick, StateError> {
        self.require(
            Operation::Tick,
            &[SessionStatus::InProgress, SessionStatus::Paused],
        )?;

        match self.state.timer.tick() {
            TimerTick::Frozen => Ok(SessionTick::Frozen),
            TimerTick::Running { question_expired } => {
                Ok(SessionTick::Running { question_expired })
            }
            TimerTick::TotalExpired => {
                info!("time is up for {} exam", self.config.exam_type);
                self.complete()?;
                Ok(SessionTick::Expired)
            }
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.state.current_question_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.state.current_question_index]
    }

    pub fn is_last_question(&self) -> bool {
        self.state.current_question_index + 1 >= self.questions.len()
    }

    pub fn is_current_answered(&self) -> bool {
        self.state.ledger.contains(&self.current_question().id)
    }

    pub fn answered_count(&self) -> usize {
        self.state.ledger.len()
    }

    pub fn ledger(&self) -> &AnswerLedger {
        &self.state.ledger
    }

    pub fn per_question_remaining(&self) -> u64 {
        self.state.timer.per_question_remaining()
    }

    pub fn total_remaining(&self) -> u64 {
        self.state.timer.total_remaining()
    }

    pub fn result(&self) -> Option<&ResultRecord> {
        self.state.result.as_ref()
    }
}

/// Reject answers whose shape or ids do not fit `question`
pub fn check_answer(question: &Question, answer: &Answer) -> Result<(), AnswerError> {
    let unknown_option = |option: &String| AnswerError::UnknownOption {
        question: question.id.clone(),
        option: option.clone(),
    };

    match (&question.kind, answer) {
        (QuestionKind::SingleChoice { .. }, Answer::Single(chosen)) => {
            if !question.has_option(chosen) {
                return Err(unknown_option(chosen));
            }
        }
        (QuestionKind::MultipleChoice { .. }, Answer::Multiple(chosen)) => {
            if chosen.is_empty() {
                return Err(AnswerError::EmptySelection {
                    question: question.id.clone(),
                });
            }
            if let Some(missing) = chosen.iter().find(|id| !question.has_option(id)) {
                return Err(unknown_option(missing));
            }
        }
        (QuestionKind::Matching { tasks }, Answer::Matching(chosen)) => {
            if let Some(task) = chosen.keys().find(|k| !tasks.iter().any(|t| &t.id == *k)) {
                return Err(AnswerError::UnknownTask {
                    question: question.id.clone(),
                    task: task.clone(),
                });
            }
            if let Some(missing) = chosen.values().find(|id| !question.has_option(id)) {
                return Err(unknown_option(missing));
            }
            let unanswered = tasks.iter().filter(|t| !chosen.contains_key(&t.id)).count();
            if unanswered > 0 {
                return Err(AnswerError::IncompleteMatching {
                    question: question.id.clone(),
                    missing: unanswered,
                });
            }
        }
        _ => {
            return Err(AnswerError::WrongShape {
                question: question.id.clone(),
                expected: question.question_type(),
            })
        }
    }

    Ok(())
}
