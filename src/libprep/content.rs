use crate::libprep::error::Error;
use crate::libprep::question::{Question, QuestionEntry};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

const BUILTIN_PACK: &str = include_str!("../../content/builtin.json");

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ContentPack {
    pub exams: Vec<ExamEntry>,
    #[serde(default)]
    pub subjects: Vec<SubjectEntry>,
    #[serde(default)]
    pub articles: Vec<ArticleEntry>,
    #[serde(default)]
    pub battle: Vec<QuestionEntry>,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExamEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: String,
    pub questions: Vec<QuestionEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubjectEntry {
    pub id: String,
    pub exam_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<QuestionEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ArticleEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub token_cost: u32,
    #[serde(default)]
    pub questions: Vec<QuestionEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub reward: u32,
    pub cadence: Cadence,
}

/// Tally returned by [`ContentPack::validate`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PackSummary {
    pub exams: usize,
    pub subjects: usize,
    pub articles: usize,
    pub questions: usize,
    pub tasks: usize,
}

fn to_questions(entries: &[QuestionEntry]) -> Result<Vec<Question>, Error> {
    entries.iter().cloned().map(Question::try_from).collect()
}

impl ContentPack {
    pub fn builtin() -> Result<ContentPack, Error> {
        Self::from_json(BUILTIN_PACK)
    }

    pub fn from_json(json: &str) -> Result<ContentPack, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<ContentPack, Error> {
        let now = Instant::now();
        let json = std::fs::read_to_string(path)?;
        let pack = Self::from_json(&json)?;
        debug!(
            "[Content] Loaded pack {:?} in {} ms.",
            path,
            now.elapsed().as_millis()
        );
        Ok(pack)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Looks up an exam by id. Unknown ids fall back to the first exam.
    pub fn exam(&self, id: &str) -> Result<&ExamEntry, Error> {
        match self.exams.iter().find(|e| e.id == id) {
            Some(exam) => Ok(exam),
            None => {
                warn!("[Content] No exam {:?}, falling back to the first one.", id);
                self.exams.first().ok_or(Error::EmptyQuestionSet)
            }
        }
    }

    pub fn exam_questions(&self, id: &str) -> Result<Vec<Question>, Error> {
        to_questions(&self.exam(id)?.questions)
    }

    pub fn subjects_of<'a>(&'a self, exam_id: &'a str) -> impl Iterator<Item = &'a SubjectEntry> {
        self.subjects.iter().filter(move |s| s.exam_id == exam_id)
    }

    /// Questions for one subject of an exam: the subject's own question set if
    /// it has one, otherwise the exam's questions tagged with the subject,
    /// otherwise the whole exam.
    pub fn subject_questions(&self, exam_id: &str, subject_id: &str) -> Result<Vec<Question>, Error> {
        let exam = self.exam(exam_id)?;
        if let Some(subject) = self
            .subjects
            .iter()
            .find(|s| s.id == subject_id && s.exam_id == exam.id)
        {
            if !subject.questions.is_empty() {
                return to_questions(&subject.questions);
            }
        } else {
            warn!(
                "[Content] No subject {:?} in exam {:?}, using the whole exam.",
                subject_id, exam.id
            );
        }

        let tagged: Vec<QuestionEntry> = exam
            .questions
            .iter()
            .filter(|q| q.subject_id.as_deref() == Some(subject_id))
            .cloned()
            .collect();
        if tagged.is_empty() {
            to_questions(&exam.questions)
        } else {
            to_questions(&tagged)
        }
    }

    /// Looks up an article by id. Unknown ids fall back to the first article.
    pub fn article(&self, id: &str) -> Result<&ArticleEntry, Error> {
        match self.articles.iter().find(|a| a.id == id) {
            Some(article) => Ok(article),
            None => {
                warn!("[Content] No article {:?}, falling back to the first one.", id);
                self.articles.first().ok_or(Error::EmptyQuestionSet)
            }
        }
    }

    pub fn article_questions(&self, id: &str) -> Result<Vec<Question>, Error> {
        to_questions(&self.article(id)?.questions)
    }

    pub fn battle_questions(&self) -> Result<Vec<Question>, Error> {
        to_questions(&self.battle)
    }

    pub fn task(&self, id: &str) -> Option<&TaskEntry> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn tasks_with(&self, cadence: Cadence) -> impl Iterator<Item = &TaskEntry> {
        self.tasks.iter().filter(move |t| t.cadence == cadence)
    }

    /// Checks every question in the pack and counts what it contains.
    pub fn validate(&self) -> Result<PackSummary, Error> {
        let mut questions = 0;
        for exam in &self.exams {
            questions += to_questions(&exam.questions)?.len();
        }
        for subject in &self.subjects {
            questions += to_questions(&subject.questions)?.len();
        }
        for article in &self.articles {
            questions += to_questions(&article.questions)?.len();
        }
        questions += to_questions(&self.battle)?.len();

        Ok(PackSummary {
            exams: self.exams.len(),
            subjects: self.subjects.len(),
            articles: self.articles.len(),
            questions,
            tasks: self.tasks.len(),
        })
    }
}
