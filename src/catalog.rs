use include_dir::{include_dir, Dir};
use serde::Deserialize;

use crate::error::{CatalogError, LoadError};
use crate::loader::{load, RawQuestion};
use crate::question::Question;

static EXAM_DIR: Dir = include_dir!("src/exams");

#[derive(Deserialize)]
struct ExamFile {
    id: String,
    title: String,
    questions: Vec<RawQuestion>,
}

/// A bundled exam with its questions already loaded
#[derive(Debug, Clone)]
pub struct Exam {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

/// Summary line for listing bundled exams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamInfo {
    pub id: String,
    pub title: String,
    pub question_count: usize,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    exams: Vec<Exam>,
}

impl Catalog {
    /// Load every exam shipped in the binary
    pub fn bundled() -> Result<Self, CatalogError> {
        let mut exams = EXAM_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .map(|f| {
                let name = f.path().display().to_string();
                let contents = f.contents_utf8().unwrap_or_default();
                parse_exam(contents).map_err(|source| CatalogError::Broken { name, source })
            })
            .collect::<Result<Vec<Exam>, CatalogError>>()?;

        exams.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { exams })
    }

    pub fn list(&self) -> Vec<ExamInfo> {
        self.exams
            .iter()
            .map(|e| ExamInfo {
                id: e.id.clone(),
                title: e.title.clone(),
                question_count: e.questions.len(),
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<&Exam, CatalogError> {
        self.exams
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| CatalogError::UnknownExam(id.to_string()))
    }

    /// Display title for an exam type, falling back to the id itself
    pub fn title_for(&self, id: &str) -> String {
        self.get(id)
            .map(|e| e.title.clone())
            .unwrap_or_else(|_| id.to_string())
    }
}

fn parse_exam(contents: &str) -> Result<Exam, LoadError> {
    let file: ExamFile = serde_json::from_str(contents)?;
    Ok(Exam {
        id: file.id,
        title: file.title,
        questions: load(file.questions)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::QuestionType;
    use assert_matches::assert_matches;

    #[test]
    fn test_bundled_exams_load() {
        let catalog = Catalog::bundled().unwrap();
        let ids = catalog.list().into_iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["ai-practitioner", "athena"]);
    }

    #[test]
    fn test_athena_exam() {
        let catalog = Catalog::bundled().unwrap();
        let exam = catalog.get("athena").unwrap();

        assert_eq!(exam.title, "AWS Athena SerDe Practice Questions");
        assert_eq!(exam.questions[0].id, "q1");
        assert!(exam.questions.iter().all(|q| q.domain.is_some()));
    }

    #[test]
    fn test_ai_practitioner_has_every_question_kind() {
        let catalog = Catalog::bundled().unwrap();
        let exam = catalog.get("ai-practitioner").unwrap();
        let kinds = exam
            .questions
            .iter()
            .map(|q| q.question_type())
            .collect::<Vec<_>>();

        assert!(kinds.contains(&QuestionType::SingleChoice));
        assert!(kinds.contains(&QuestionType::MultipleChoice));
        assert!(kinds.contains(&QuestionType::Matching));
    }

    #[test]
    fn test_unknown_exam() {
        let catalog = Catalog::bundled().unwrap();
        assert_matches!(catalog.get("nope"), Err(CatalogError::UnknownExam(id)) if id == "nope");
        assert_eq!(catalog.title_for("nope"), "nope");
    }

    #[test]
    fn test_parse_exam_rejects_bad_question() {
        let err = parse_exam(
            r#"{"id": "x", "title": "X", "questions": [{"question": "?", "options": ["a"], "answer": "b"}]}"#,
        )
        .unwrap_err();
        assert_matches!(err, LoadError::UnresolvedAnswer { .. });
    }
}
