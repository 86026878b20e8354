use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::ledger::{Answer, AnswerLedger};
use crate::question::{Question, QuestionKind};
use crate::util::{mean_seconds, percentage};

/// Labels handed out round-robin to questions that carry no domain.
/// A stand-in until every bundled question is tagged.
pub const FALLBACK_DOMAINS: [&str; 4] = [
    "Fundamentals of AI and ML",
    "Fundamentals of Generative AI",
    "Applications of Foundation Models",
    "Guidelines for Responsible AI",
];

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPerformance {
    pub name: String,
    pub correct: usize,
    pub incorrect: usize,
}

impl DomainPerformance {
    pub fn total(&self) -> usize {
        self.correct + self.incorrect
    }

    pub fn percentage(&self) -> u8 {
        percentage(self.correct, self.total())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub id: String,
    pub text: String,
    pub correct_option: Answer,
    pub user_answer: Option<Answer>,
    pub is_correct: bool,
    pub time_taken: u64,
}

/// Immutable summary of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub exam_type: String,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub time_spent: u64,
    pub date: DateTime<Utc>,
    pub percentage: u8,
    pub avg_correct_time: f64,
    pub avg_incorrect_time: f64,
    pub avg_answer_time: f64,
    pub domain_performance: Vec<DomainPerformance>,
    pub questions: Vec<QuestionOutcome>,
}

impl ResultRecord {
    pub fn incorrect_answers(&self) -> usize {
        self.total_questions - self.correct_answers
    }

    pub fn unanswered(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.user_answer.is_none())
            .count()
    }

    pub fn passed(&self, threshold: u8) -> bool {
        self.percentage >= threshold
    }

    pub fn total_pages(&self, per_page: usize) -> usize {
        if per_page == 0 {
            return 0;
        }
        self.questions.len().div_ceil(per_page)
    }

    /// Review page `page` (1-based) of `per_page` outcomes; empty past the end
    pub fn page(&self, page: usize, per_page: usize) -> &[QuestionOutcome] {
        if page == 0 || per_page == 0 {
            return &[];
        }
        let start = (page - 1).saturating_mul(per_page);
        if start >= self.questions.len() {
            return &[];
        }
        let end = (start + per_page).min(self.questions.len());
        &self.questions[start..end]
    }
}

/// Exam identity and completion time stamped onto a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreMeta {
    pub exam_type: String,
    pub date: DateTime<Utc>,
}

/// Whether `answer` earns full credit on `question`. No partial credit.
pub fn is_correct(question: &Question, answer: &Answer) -> bool {
    match (&question.kind, answer) {
        (QuestionKind::SingleChoice { correct_option_id }, Answer::Single(chosen)) => {
            chosen == correct_option_id
        }
        (QuestionKind::MultipleChoice { correct_option_ids }, Answer::Multiple(chosen)) => {
            chosen == correct_option_ids
        }
        (QuestionKind::Matching { tasks }, Answer::Matching(chosen)) => tasks
            .iter()
            .all(|task| chosen.get(&task.id) == Some(&task.correct_option_id)),
        _ => false,
    }
}

/// The reporting domain of the question at `index`
pub fn domain_for(question: &Question, index: usize) -> String {
    match &question.domain {
        Some(domain) => domain.clone(),
        None => FALLBACK_DOMAINS[index % FALLBACK_DOMAINS.len()].to_string(),
    }
}

pub fn score(
    questions: &[Question],
    ledger: &AnswerLedger,
    total_elapsed_seconds: u64,
    meta: ScoreMeta,
) -> ResultRecord {
    let outcomes = questions
        .iter()
        .map(|question| {
            let entry = ledger.get(&question.id);
            let is_correct = entry.is_some_and(|e| is_correct(question, &e.answer));

            QuestionOutcome {
                id: question.id.clone(),
                text: question.text.clone(),
                correct_option: question.correct_answer(),
                user_answer: entry.map(|e| e.answer.clone()),
                is_correct,
                time_taken: entry.map_or(0, |e| e.time_taken_seconds),
            }
        })
        .collect::<Vec<QuestionOutcome>>();

    let (correct_times, incorrect_times): (Vec<u64>, Vec<u64>) = outcomes
        .iter()
        .partition_map(|o| {
            if o.is_correct {
                itertools::Either::Left(o.time_taken)
            } else {
                itertools::Either::Right(o.time_taken)
            }
        });
    let all_times = outcomes.iter().map(|o| o.time_taken).collect::<Vec<u64>>();

    let correct_answers = correct_times.len();

    ResultRecord {
        exam_type: meta.exam_type,
        total_questions: questions.len(),
        correct_answers,
        time_spent: total_elapsed_seconds,
        date: meta.date,
        percentage: percentage(correct_answers, questions.len()),
        avg_correct_time: mean_seconds(&correct_times),
        avg_incorrect_time: mean_seconds(&incorrect_times),
        avg_answer_time: mean_seconds(&all_times),
        domain_performance: domain_performance(questions, &outcomes),
        questions: outcomes,
    }
}

fn domain_performance(questions: &[Question], outcomes: &[QuestionOutcome]) -> Vec<DomainPerformance> {
    let tagged = questions
        .iter()
        .enumerate()
        .zip(outcomes)
        .map(|((index, question), outcome)| (domain_for(question, index), outcome.is_correct))
        .collect::<Vec<(String, bool)>>();

    tagged
        .iter()
        .map(|(name, _)| name)
        .unique()
        .map(|name| {
            let correct = tagged.iter().filter(|(n, ok)| n == name && *ok).count();
            let incorrect = tagged.iter().filter(|(n, ok)| n == name && !*ok).count();
            DomainPerformance {
                name: name.clone(),
                correct,
                incorrect,
            }
        })
        .filter(|d| d.total() > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{MatchingTask, QuestionOption};
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn meta() -> ScoreMeta {
        ScoreMeta {
            exam_type: "athena".to_string(),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn options() -> Vec<QuestionOption> {
        ["a", "b", "c", "d"]
            .iter()
            .map(|id| QuestionOption::new(*id, id.to_uppercase()))
            .collect()
    }

    fn single(id: &str, correct: &str) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            options: options(),
            kind: QuestionKind::SingleChoice {
                correct_option_id: correct.to_string(),
            },
            explanation: String::new(),
            learn_more_link: None,
            domain: None,
        }
    }

    fn multiple(id: &str, correct: &[&str]) -> Question {
        Question {
            kind: QuestionKind::MultipleChoice {
                correct_option_ids: correct.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            },
            ..single(id, "a")
        }
    }

    fn matching(id: &str) -> Question {
        Question {
            kind: QuestionKind::Matching {
                tasks: vec![
                    MatchingTask {
                        id: "t1".to_string(),
                        text: "first".to_string(),
                        correct_option_id: "a".to_string(),
                    },
                    MatchingTask {
                        id: "t2".to_string(),
                        text: "second".to_string(),
                        correct_option_id: "b".to_string(),
                    },
                ],
            },
            ..single(id, "a")
        }
    }

    fn ledger_with(entries: &[(&str, Answer, u64)]) -> AnswerLedger {
        let mut ledger = AnswerLedger::new();
        for (id, answer, secs) in entries {
            ledger.record(*id, answer.clone(), *secs, meta().date);
        }
        ledger
    }

    #[test]
    fn test_multiple_choice_requires_exact_set() {
        let q = multiple("q1", &["a", "c"]);
        assert!(is_correct(&q, &Answer::multiple(["c", "a"])));
        assert!(!is_correct(&q, &Answer::multiple(["a"])));
        assert!(!is_correct(&q, &Answer::multiple(["a", "b", "c"])));
        assert!(!is_correct(&q, &Answer::multiple(Vec::<String>::new())));
    }

    #[test]
    fn test_matching_requires_every_task() {
        let q = matching("q1");
        assert!(is_correct(&q, &Answer::matching([("t1", "a"), ("t2", "b")])));
        assert!(!is_correct(&q, &Answer::matching([("t1", "a"), ("t2", "c")])));
        assert!(!is_correct(&q, &Answer::matching([("t1", "a")])));
    }

    #[test]
    fn test_wrong_shape_is_incorrect() {
        let q = single("q1", "a");
        assert!(!is_correct(&q, &Answer::multiple(["a"])));
    }

    #[test]
    fn test_two_single_choice_questions_all_correct() {
        let questions = vec![single("q1", "b"), single("q2", "a")];
        let ledger = ledger_with(&[("q1", Answer::single("b"), 4), ("q2", Answer::single("a"), 6)]);

        let record = score(&questions, &ledger, 10, meta());

        assert_eq!(record.total_questions, 2);
        assert_eq!(record.correct_answers, 2);
        assert_eq!(record.percentage, 100);
        assert_eq!(record.avg_answer_time, 5.0);
        assert_eq!(record.avg_correct_time, 5.0);
        assert_eq!(record.avg_incorrect_time, 0.0);
        assert_eq!(record.time_spent, 10);
    }

    #[test]
    fn test_unanswered_scored_incorrect_with_zero_time() {
        let questions = vec![single("q1", "a"), single("q2", "b"), single("q3", "c")];
        let ledger = ledger_with(&[("q1", Answer::single("a"), 9)]);

        let record = score(&questions, &ledger, 30, meta());

        assert_eq!(record.correct_answers, 1);
        assert_eq!(record.percentage, 33);
        assert_eq!(record.unanswered(), 2);
        assert_eq!(record.incorrect_answers(), 2);
        assert_eq!(record.questions[1].user_answer, None);
        assert_eq!(record.questions[1].time_taken, 0);
        assert_eq!(record.avg_answer_time, 3.0);
        assert_eq!(record.avg_correct_time, 9.0);
        assert_eq!(record.avg_incorrect_time, 0.0);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let questions = (1..=8).map(|i| single(&format!("q{i}"), "a")).collect::<Vec<_>>();
        let ledger = ledger_with(&[("q1", Answer::single("a"), 1)]);
        assert_eq!(score(&questions, &ledger, 1, meta()).percentage, 13);
    }

    #[test]
    fn test_domain_fallback_round_robin() {
        let questions = (1..=6).map(|i| single(&format!("q{i}"), "a")).collect::<Vec<_>>();
        let ledger = ledger_with(&[
            ("q1", Answer::single("a"), 1),
            ("q5", Answer::single("b"), 1),
        ]);

        let record = score(&questions, &ledger, 1, meta());

        assert_eq!(record.domain_performance.len(), 4);
        assert_eq!(
            record.domain_performance[0],
            DomainPerformance {
                name: FALLBACK_DOMAINS[0].to_string(),
                correct: 1,
                incorrect: 1,
            }
        );
        assert_eq!(record.domain_performance[1].total(), 2);
        assert_eq!(record.domain_performance[3].total(), 1);
    }

    #[test]
    fn test_domain_uses_question_metadata() {
        let mut q1 = single("q1", "a");
        q1.domain = Some("Security".to_string());
        let mut q2 = single("q2", "a");
        q2.domain = Some("Security".to_string());

        let ledger = ledger_with(&[("q1", Answer::single("a"), 1)]);
        let record = score(&[q1, q2], &ledger, 1, meta());

        assert_eq!(record.domain_performance.len(), 1);
        assert_eq!(record.domain_performance[0].name, "Security");
        assert_eq!(record.domain_performance[0].percentage(), 50);
    }

    #[test]
    fn test_domain_percentage_guards_zero_total() {
        let empty = DomainPerformance {
            name: "None".to_string(),
            correct: 0,
            incorrect: 0,
        };
        assert_eq!(empty.percentage(), 0);
    }

    #[test]
    fn test_rescoring_produces_independent_record() {
        let questions = vec![single("q1", "a")];
        let first = score(&questions, &AnswerLedger::new(), 5, meta());
        let second = score(
            &questions,
            &ledger_with(&[("q1", Answer::single("a"), 2)]),
            5,
            meta(),
        );

        assert_eq!(first.correct_answers, 0);
        assert_eq!(second.correct_answers, 1);
    }

    #[test]
    fn test_pagination() {
        let questions = (1..=12).map(|i| single(&format!("q{i}"), "a")).collect::<Vec<_>>();
        let record = score(&questions, &AnswerLedger::new(), 0, meta());

        assert_eq!(record.total_pages(DEFAULT_PAGE_SIZE), 3);
        assert_eq!(record.page(1, DEFAULT_PAGE_SIZE)[0].id, "q1");
        assert_eq!(record.page(3, DEFAULT_PAGE_SIZE).len(), 2);
        assert!(record.page(4, DEFAULT_PAGE_SIZE).is_empty());
        assert!(record.page(0, DEFAULT_PAGE_SIZE).is_empty());
    }

    #[test]
    fn test_record_json_field_names() {
        let questions = vec![multiple("q1", &["a", "b"])];
        let ledger = ledger_with(&[("q1", Answer::multiple(["a"]), 3)]);
        let record = score(&questions, &ledger, 3, meta());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["examType"], "athena");
        assert_eq!(json["totalQuestions"], 1);
        assert_eq!(json["correctAnswers"], 0);
        assert_eq!(json["timeSpent"], 3);
        assert_eq!(json["date"], "2024-05-01T12:00:00Z");
        assert_eq!(json["questions"][0]["correctOption"], serde_json::json!(["a", "b"]));
        assert_eq!(json["questions"][0]["userAnswer"], serde_json::json!(["a"]));
        assert_eq!(json["questions"][0]["isCorrect"], false);
        assert_eq!(json["questions"][0]["timeTaken"], 3);
        assert!(json["domainPerformance"].is_array());
    }

    #[test]
    fn test_passed_threshold() {
        let questions = vec![single("q1", "a"), single("q2", "a")];
        let ledger = ledger_with(&[("q1", Answer::single("a"), 1)]);
        let record = score(&questions, &ledger, 2, meta());
        assert!(record.passed(50));
        assert!(!record.passed(70));
    }
}
