use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A submitted answer, shaped like the question it answers.
///
/// Serialized untagged so it reads as a bare string, list or object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(BTreeSet<String>),
    Matching(BTreeMap<String, String>),
}

impl Answer {
    pub fn single(option_id: impl Into<String>) -> Self {
        Answer::Single(option_id.into())
    }

    pub fn multiple<I, S>(option_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::Multiple(option_ids.into_iter().map(Into::into).collect())
    }

    pub fn matching<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Answer::Matching(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub answer: Answer,
    #[serde(rename = "submittedAtMillis", with = "chrono::serde::ts_milliseconds")]
    pub submitted_at: DateTime<Utc>,
    pub time_taken_seconds: u64,
}

/// Per-question answer store for one session, keyed by question id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    entries: HashMap<String, AnswerEntry>,
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an answer, replacing any earlier one for the same question
    pub fn record(
        &mut self,
        question_id: impl Into<String>,
        answer: Answer,
        time_taken_seconds: u64,
        submitted_at: DateTime<Utc>,
    ) {
        self.entries.insert(
            question_id.into(),
            AnswerEntry {
                answer,
                submitted_at,
                time_taken_seconds,
            },
        );
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerEntry> {
        self.entries.get(question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.entries.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerEntry)> {
        self.entries.iter()
    }
}
