use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::LoadError;
use crate::ledger::Answer;

/// A selectable option inside a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

impl QuestionOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One prompt of a matching question and the option it pairs with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingTask {
    pub id: String,
    pub text: String,
    pub correct_option_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnMoreLink {
    pub text: String,
    pub url: String,
}

/// Question shape together with its answer key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QuestionKind {
    #[serde(rename_all = "camelCase")]
    SingleChoice { correct_option_id: String },
    #[serde(rename_all = "camelCase")]
    MultipleChoice { correct_option_ids: BTreeSet<String> },
    Matching { tasks: Vec<MatchingTask> },
}

/// Fieldless view of [`QuestionKind`] for display and shape checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum QuestionType {
    #[strum(serialize = "single choice")]
    SingleChoice,
    #[strum(serialize = "multiple choice")]
    MultipleChoice,
    #[strum(serialize = "matching")]
    Matching,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<QuestionOption>,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learn_more_link: Option<LearnMoreLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::SingleChoice { .. } => QuestionType::SingleChoice,
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::Matching { .. } => QuestionType::Matching,
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.option(option_id).is_some()
    }

    /// Tasks of a matching question, empty for the other kinds
    pub fn tasks(&self) -> &[MatchingTask] {
        match &self.kind {
            QuestionKind::Matching { tasks } => tasks,
            _ => &[],
        }
    }

    /// The answer key expressed as the answer a perfect candidate would submit
    pub fn correct_answer(&self) -> Answer {
        match &self.kind {
            QuestionKind::SingleChoice { correct_option_id } => {
                Answer::Single(correct_option_id.clone())
            }
            QuestionKind::MultipleChoice { correct_option_ids } => {
                Answer::Multiple(correct_option_ids.clone())
            }
            QuestionKind::Matching { tasks } => Answer::Matching(
                tasks
                    .iter()
                    .map(|t| (t.id.clone(), t.correct_option_id.clone()))
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }

    /// Check that option ids are unique and every answer reference resolves
    pub fn validate(&self) -> Result<(), LoadError> {
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.id.as_str()) {
                return Err(LoadError::DuplicateOption {
                    question: self.id.clone(),
                    option: option.id.clone(),
                });
            }
        }

        let unknown = |option: &str| LoadError::UnknownOption {
            question: self.id.clone(),
            option: option.to_string(),
        };

        match &self.kind {
            QuestionKind::SingleChoice { correct_option_id } => {
                if !seen.contains(correct_option_id.as_str()) {
                    return Err(unknown(correct_option_id));
                }
            }
            QuestionKind::MultipleChoice { correct_option_ids } => {
                if correct_option_ids.is_empty() {
                    return Err(LoadError::EmptyAnswerSet {
                        question: self.id.clone(),
                    });
                }
                if let Some(missing) = correct_option_ids
                    .iter()
                    .find(|id| !seen.contains(id.as_str()))
                {
                    return Err(unknown(missing));
                }
            }
            QuestionKind::Matching { tasks } => {
                if tasks.is_empty() {
                    return Err(LoadError::EmptyAnswerSet {
                        question: self.id.clone(),
                    });
                }
                let mut task_ids = HashSet::new();
                if let Some(task) = tasks.iter().find(|t| !task_ids.insert(t.id.as_str())) {
                    return Err(LoadError::DuplicateTask {
                        question: self.id.clone(),
                        task: task.id.clone(),
                    });
                }
                if let Some(task) = tasks
                    .iter()
                    .find(|t| !seen.contains(t.correct_option_id.as_str()))
                {
                    return Err(unknown(&task.correct_option_id));
                }
            }
        }

        Ok(())
    }
}

/// Validate a whole question set: non-empty, unique ids, every question sound
pub fn validate_questions(questions: &[Question]) -> Result<(), LoadError> {
    if questions.is_empty() {
        return Err(LoadError::NoQuestions);
    }

    let mut ids = HashSet::new();
    for question in questions {
        if !ids.insert(question.id.as_str()) {
            return Err(LoadError::DuplicateQuestion {
                id: question.id.clone(),
            });
        }
        question.validate()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn single(id: &str, correct: &str) -> Question {
        Question {
            id: id.to_string(),
            text: "Pick one".to_string(),
            options: vec![QuestionOption::new("a", "A"), QuestionOption::new("b", "B")],
            kind: QuestionKind::SingleChoice {
                correct_option_id: correct.to_string(),
            },
            explanation: String::new(),
            learn_more_link: None,
            domain: None,
        }
    }

    #[test]
    fn test_question_type_display() {
        assert_eq!(QuestionType::SingleChoice.to_string(), "single choice");
        assert_eq!(QuestionType::MultipleChoice.to_string(), "multiple choice");
        assert_eq!(QuestionType::Matching.to_string(), "matching");
    }

    #[test]
    fn test_validate_accepts_resolved_single() {
        assert!(single("q1", "b").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_option() {
        assert_matches!(
            single("q1", "z").validate(),
            Err(LoadError::UnknownOption { question, option }) if question == "q1" && option == "z"
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_option_ids() {
        let mut q = single("q1", "a");
        q.options.push(QuestionOption::new("a", "again"));
        assert_matches!(q.validate(), Err(LoadError::DuplicateOption { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_multiple_set() {
        let mut q = single("q1", "a");
        q.kind = QuestionKind::MultipleChoice {
            correct_option_ids: BTreeSet::new(),
        };
        assert_matches!(q.validate(), Err(LoadError::EmptyAnswerSet { .. }));
    }

    #[test]
    fn test_validate_rejects_matching_task_with_unknown_option() {
        let mut q = single("q1", "a");
        q.kind = QuestionKind::Matching {
            tasks: vec![MatchingTask {
                id: "task-0".to_string(),
                text: "t".to_string(),
                correct_option_id: "nope".to_string(),
            }],
        };
        assert_matches!(q.validate(), Err(LoadError::UnknownOption { .. }));
    }

    #[test]
    fn test_validate_rejects_duplicate_task_ids() {
        let task = MatchingTask {
            id: "task-0".to_string(),
            text: "t".to_string(),
            correct_option_id: "a".to_string(),
        };
        let mut q = single("q1", "a");
        q.kind = QuestionKind::Matching {
            tasks: vec![task.clone(), task],
        };
        assert_matches!(
            q.validate(),
            Err(LoadError::DuplicateTask { question, task }) if question == "q1" && task == "task-0"
        );
    }

    #[test]
    fn test_validate_questions_rejects_duplicates_and_empty() {
        assert_matches!(validate_questions(&[]), Err(LoadError::NoQuestions));
        assert_matches!(
            validate_questions(&[single("q1", "a"), single("q1", "b")]),
            Err(LoadError::DuplicateQuestion { id }) if id == "q1"
        );
    }

    #[test]
    fn test_correct_answer_for_matching() {
        let mut q = single("q1", "a");
        q.kind = QuestionKind::Matching {
            tasks: vec![
                MatchingTask {
                    id: "task-0".to_string(),
                    text: "first".to_string(),
                    correct_option_id: "a".to_string(),
                },
                MatchingTask {
                    id: "task-1".to_string(),
                    text: "second".to_string(),
                    correct_option_id: "b".to_string(),
                },
            ],
        };

        let expected: BTreeMap<String, String> = [
            ("task-0".to_string(), "a".to_string()),
            ("task-1".to_string(), "b".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(q.correct_answer(), Answer::Matching(expected));
        assert_eq!(q.tasks().len(), 2);
        assert_eq!(q.question_type(), QuestionType::Matching);
    }
}
