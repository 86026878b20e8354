use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::LoadError;
use crate::question::{
    validate_questions, LearnMoreLink, MatchingTask, Question, QuestionKind, QuestionOption,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawKind {
    #[default]
    Single,
    Multiple,
    Matching,
}

/// A question as authored in exam JSON files
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    #[serde(default, rename = "type")]
    pub kind: RawKind,
    pub id: Option<String>,
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    pub answer: Option<String>,
    pub answers: Option<Vec<String>>,
    /// task prompt -> correct option text, in document order
    pub matches: Option<Map<String, Value>>,
    #[serde(default)]
    pub explanation: String,
    pub learn_more_link: Option<LearnMoreLink>,
    pub domain: Option<String>,
}

pub fn load_json(json: &str) -> Result<Vec<Question>, LoadError> {
    let raw: Vec<RawQuestion> = serde_json::from_str(json)?;
    load(raw)
}

/// Normalize raw records into validated questions
pub fn load(raw: Vec<RawQuestion>) -> Result<Vec<Question>, LoadError> {
    let questions = raw
        .into_iter()
        .enumerate()
        .map(|(index, record)| normalize(index, record))
        .collect::<Result<Vec<Question>, LoadError>>()?;

    validate_questions(&questions)?;
    Ok(questions)
}

fn normalize(index: usize, raw: RawQuestion) -> Result<Question, LoadError> {
    let id = raw.id.unwrap_or_else(|| format!("q{}", index + 1));
    let missing = |field: &'static str| LoadError::MissingField {
        question: id.clone(),
        field,
    };

    let text = raw.question.ok_or_else(|| missing("question"))?;

    let (options, kind) = match raw.kind {
        RawKind::Single => {
            let options = indexed_options(raw.options.ok_or_else(|| missing("options"))?);
            let answer = raw.answer.ok_or_else(|| missing("answer"))?;
            let correct_option_id = resolve(&id, &options, &answer)?;
            (options, QuestionKind::SingleChoice { correct_option_id })
        }
        RawKind::Multiple => {
            let options = indexed_options(raw.options.ok_or_else(|| missing("options"))?);
            let answers = raw.answers.ok_or_else(|| missing("answers"))?;
            let correct_option_ids = answers
                .iter()
                .map(|answer| resolve(&id, &options, answer))
                .collect::<Result<BTreeSet<String>, LoadError>>()?;
            (options, QuestionKind::MultipleChoice { correct_option_ids })
        }
        RawKind::Matching => {
            let matches = raw.matches.ok_or_else(|| missing("matches"))?;
            matching(&id, matches, raw.options)?
        }
    };

    Ok(Question {
        id,
        text,
        options,
        kind,
        explanation: raw.explanation,
        learn_more_link: raw.learn_more_link,
        domain: raw.domain,
    })
}

/// Options keyed by their position, as the authoring format carries no ids
fn indexed_options(texts: Vec<String>) -> Vec<QuestionOption> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| QuestionOption::new(i.to_string(), text))
        .collect()
}

/// Id of the first option whose text equals `answer`
fn resolve(question: &str, options: &[QuestionOption], answer: &str) -> Result<String, LoadError> {
    options
        .iter()
        .find(|o| o.text == answer)
        .map(|o| o.id.clone())
        .ok_or_else(|| LoadError::UnresolvedAnswer {
            question: question.to_string(),
            answer: answer.to_string(),
        })
}

fn matching(
    question: &str,
    matches: Map<String, Value>,
    declared: Option<Vec<String>>,
) -> Result<(Vec<QuestionOption>, QuestionKind), LoadError> {
    let mut tasks = Vec::with_capacity(matches.len());
    let mut seen = Vec::<String>::new();

    for (i, (prompt, value)) in matches.into_iter().enumerate() {
        let option_text = match value {
            Value::String(s) => s,
            other => {
                return Err(LoadError::UnresolvedAnswer {
                    question: question.to_string(),
                    answer: other.to_string(),
                })
            }
        };
        if !seen.contains(&option_text) {
            seen.push(option_text.clone());
        }
        tasks.push(MatchingTask {
            id: format!("task-{i}"),
            text: prompt,
            correct_option_id: option_text,
        });
    }

    // Option id is the option text; declared options add distractors
    let texts = match declared {
        Some(declared) => {
            if let Some(unknown) = seen.iter().find(|t| !declared.contains(t)) {
                return Err(LoadError::UnresolvedAnswer {
                    question: question.to_string(),
                    answer: unknown.clone(),
                });
            }
            let mut texts = Vec::with_capacity(declared.len());
            for text in declared {
                if !texts.contains(&text) {
                    texts.push(text);
                }
            }
            texts
        }
        None => seen,
    };

    let options = texts
        .into_iter()
        .map(|t| QuestionOption::new(t.clone(), t))
        .collect();

    Ok((options, QuestionKind::Matching { tasks }))
}
