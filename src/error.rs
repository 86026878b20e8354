use thiserror::Error;

use crate::question::QuestionType;
use crate::session::{Operation, SessionStatus};

/// Malformed question data; fatal to building a session
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("question data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question set is empty")]
    NoQuestions,
    #[error("question {question}: missing required field `{field}`")]
    MissingField {
        question: String,
        field: &'static str,
    },
    #[error("question {question}: answer {answer:?} does not match any option")]
    UnresolvedAnswer { question: String, answer: String },
    #[error("question {question}: correct answer set is empty")]
    EmptyAnswerSet { question: String },
    #[error("question {question}: option id {option:?} is not declared")]
    UnknownOption { question: String, option: String },
    #[error("question {question}: option id {option:?} appears more than once")]
    DuplicateOption { question: String, option: String },
    #[error("question {question}: task id {task:?} appears more than once")]
    DuplicateTask { question: String, task: String },
    #[error("question id {id:?} appears more than once")]
    DuplicateQuestion { id: String },
}

/// An operation was invoked in a state that does not allow it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {operation} while the session is {status}")]
pub struct StateError {
    pub operation: Operation,
    pub status: SessionStatus,
}

/// A submitted answer does not fit the question it was given for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("question {question} expects a {expected} answer")]
    WrongShape {
        question: String,
        expected: QuestionType,
    },
    #[error("question {question} has no option {option:?}")]
    UnknownOption { question: String, option: String },
    #[error("question {question} has no task {task:?}")]
    UnknownTask { question: String, task: String },
    #[error("question {question}: select at least one option")]
    EmptySelection { question: String },
    #[error("question {question}: every task needs an answer ({missing} left)")]
    IncompleteMatching { question: String, missing: usize },
    #[error("question {question} has already been answered")]
    AlreadyAnswered { question: String },
}

#[derive(Debug, Error)]
pub enum ExamError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
}

/// Failures of the result persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored result is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to prepare result storage: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no bundled exam named {0:?}")]
    UnknownExam(String),
    #[error("bundled exam {name:?} is broken: {source}")]
    Broken {
        name: String,
        #[source]
        source: LoadError,
    },
}
