use crate::libprep::error::Error;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A question as it appears in a content pack: the correct answer is spelled
/// out as option text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntry {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    correct: usize,
    pub explanation: Option<String>,
    pub image: Option<String>,
    pub subject: Option<String>,
}

impl Question {
    pub fn new(prompt: &str, options: &[&str], correct: usize) -> Result<Question, Error> {
        if correct >= options.len() {
            return Err(Error::MalformedQuestion {
                prompt: prompt.to_string(),
                correct: format!("#{}", correct + 1),
            });
        }
        Ok(Question {
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct,
            explanation: None,
            image: None,
            subject: None,
        })
    }

    pub fn with_explanation(mut self, explanation: &str) -> Self {
        self.explanation = Some(explanation.to_string());
        self
    }

    pub fn correct_index(&self) -> usize {
        self.correct
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct]
    }

    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }

    /// Options in a random display order, each paired with its index in
    /// `options`. The second value is where the correct option landed.
    pub fn get_options_randomize<R: Rng>(&self, rng: &mut R) -> (Vec<(usize, &str)>, usize) {
        let mut opts: Vec<(usize, &str)> = self
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| (i, o.as_str()))
            .collect();
        opts.shuffle(rng);
        let position = opts
            .iter()
            .position(|(i, _)| *i == self.correct)
            .unwrap_or_default();
        (opts, position)
    }
}

impl TryFrom<QuestionEntry> for Question {
    type Error = Error;

    fn try_from(entry: QuestionEntry) -> Result<Self, Self::Error> {
        let correct = entry
            .options
            .iter()
            .position(|o| *o == entry.correct_answer)
            .ok_or_else(|| Error::MalformedQuestion {
                prompt: entry.text.clone(),
                correct: entry.correct_answer.clone(),
            })?;
        Ok(Question {
            prompt: entry.text,
            options: entry.options,
            correct,
            explanation: entry.explanation,
            image: entry.image,
            subject: entry.subject_id,
        })
    }
}
