use serde::{Deserialize, Serialize};

use crate::validation::answers_match;

/// Type of exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
  MultipleChoice,
  FillBlank,
  Matching,
  Translation,
}

impl ExerciseType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MultipleChoice => "multiple_choice",
      Self::FillBlank => "fill_blank",
      Self::Matching => "matching",
      Self::Translation => "translation",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "multiple_choice" => Some(Self::MultipleChoice),
      "fill_blank" => Some(Self::FillBlank),
      "matching" => Some(Self::Matching),
      "translation" => Some(Self::Translation),
      _ => None,
    }
  }
}

/// A learner's answer: free text / a chosen option, or one entry per matching slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
  Text(String),
  Sequence(Vec<String>),
}

impl Answer {
  pub fn text(s: impl Into<String>) -> Self {
    Self::Text(s.into())
  }

  pub fn sequence<I, S>(items: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::Sequence(items.into_iter().map(Into::into).collect())
  }

  /// Blank text, or a sequence without a single filled slot
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Text(s) => s.trim().is_empty(),
      Self::Sequence(items) => items.iter().all(|s| s.trim().is_empty()),
    }
  }
}

/// Answer key, one variant per exercise type. Each carries the payload its
/// comparison rule needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
  MultipleChoice(String),
  FillBlank(String),
  Translation(String),
  /// Expected value for each slot, in slot order
  Matching(Vec<String>),
}

impl AnswerKey {
  pub fn exercise_type(&self) -> ExerciseType {
    match self {
      Self::MultipleChoice(_) => ExerciseType::MultipleChoice,
      Self::FillBlank(_) => ExerciseType::FillBlank,
      Self::Translation(_) => ExerciseType::Translation,
      Self::Matching(_) => ExerciseType::Matching,
    }
  }

  /// Whether the answer has the shape this key compares against
  pub fn fits(&self, answer: &Answer) -> bool {
    matches!(
      (self, answer),
      (Self::Matching(_), Answer::Sequence(_))
        | (Self::MultipleChoice(_) | Self::FillBlank(_) | Self::Translation(_), Answer::Text(_))
    )
  }

  /// Matching compares slot by slot, exactly and in order. Every other type
  /// compares trimmed text ignoring case.
  pub fn accepts(&self, answer: &Answer) -> bool {
    match (self, answer) {
      (Self::Matching(expected), Answer::Sequence(given)) => expected == given,
      (Self::MultipleChoice(expected) | Self::FillBlank(expected) | Self::Translation(expected), Answer::Text(given)) => {
        answers_match(given, expected)
      }
      _ => false,
    }
  }

  /// Human-readable correct answer (matching slots joined by ", ")
  pub fn display(&self) -> String {
    match self {
      Self::Matching(items) => items.join(", "),
      Self::MultipleChoice(s) | Self::FillBlank(s) | Self::Translation(s) => s.clone(),
    }
  }

  pub fn slot_count(&self) -> usize {
    match self {
      Self::Matching(items) => items.len(),
      _ => 1,
    }
  }
}

/// One gradable question within a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExerciseRecord", into = "ExerciseRecord")]
pub struct Exercise {
  pub exercise_id: String,
  pub prompt: String,
  pub options: Option<Vec<String>>,
  pub explanation: Option<String>,
  pub points: u32,
  pub key: AnswerKey,
}

impl Exercise {
  pub fn exercise_type(&self) -> ExerciseType {
    self.key.exercise_type()
  }

  pub fn is_correct(&self, answer: &Answer) -> bool {
    self.key.accepts(answer)
  }

  pub fn view(&self) -> ExerciseView {
    ExerciseView {
      exercise_id: self.exercise_id.clone(),
      exercise_type: self.exercise_type(),
      prompt: self.prompt.clone(),
      options: self.options.clone().unwrap_or_default(),
      slots: self.key.slot_count(),
      points: self.points,
    }
  }
}

/// Exercise as shown to a learner before answering: no answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseView {
  pub exercise_id: String,
  #[serde(rename = "type")]
  pub exercise_type: ExerciseType,
  pub prompt: String,
  pub options: Vec<String>,
  /// Number of answer inputs (1 except for matching)
  pub slots: usize,
  pub points: u32,
}

/// Error building an exercise from catalog data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExerciseError {
  #[error("Exercise missing ID")]
  MissingId,
  #[error("Exercise {0} has an empty prompt")]
  EmptyPrompt(String),
  #[error("Exercise {0} must be worth at least one point")]
  NoPoints(String),
  #[error("Exercise {0} has an empty correct answer")]
  EmptyAnswer(String),
  #[error("Matching exercise {0} needs a list of answers")]
  MatchingNeedsList(String),
  #[error("Matching exercise {id} has {options} options but {answers} answers")]
  SlotMismatch { id: String, options: usize, answers: usize },
}

/// Wire form of an exercise, as stored in the lesson catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExerciseRecord {
  exercise_id: String,
  #[serde(rename = "type")]
  exercise_type: ExerciseType,
  prompt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  options: Option<Vec<String>>,
  correct_answer: Answer,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  explanation: Option<String>,
  points: u32,
}

impl TryFrom<ExerciseRecord> for Exercise {
  type Error = ExerciseError;

  fn try_from(record: ExerciseRecord) -> Result<Self, Self::Error> {
    let id = record.exercise_id;
    if id.trim().is_empty() {
      return Err(ExerciseError::MissingId);
    }
    if record.prompt.trim().is_empty() {
      return Err(ExerciseError::EmptyPrompt(id));
    }
    if record.points == 0 {
      return Err(ExerciseError::NoPoints(id));
    }
    if record.correct_answer.is_empty() {
      return Err(ExerciseError::EmptyAnswer(id));
    }

    let key = match (record.exercise_type, record.correct_answer) {
      (ExerciseType::Matching, Answer::Sequence(items)) => {
        if let Some(options) = &record.options {
          if options.len() != items.len() {
            return Err(ExerciseError::SlotMismatch {
              id,
              options: options.len(),
              answers: items.len(),
            });
          }
        }
        AnswerKey::Matching(items)
      }
      (ExerciseType::Matching, Answer::Text(_)) => return Err(ExerciseError::MatchingNeedsList(id)),
      (other, answer) => {
        // A list answer for a single-value type contributes its first element
        let text = match answer {
          Answer::Text(s) => s,
          Answer::Sequence(items) => items.into_iter().next().unwrap_or_default(),
        };
        if text.trim().is_empty() {
          return Err(ExerciseError::EmptyAnswer(id));
        }
        match other {
          ExerciseType::MultipleChoice => AnswerKey::MultipleChoice(text),
          ExerciseType::FillBlank => AnswerKey::FillBlank(text),
          ExerciseType::Translation => AnswerKey::Translation(text),
          ExerciseType::Matching => unreachable!("matching handled above"),
        }
      }
    };

    Ok(Exercise {
      exercise_id: id,
      prompt: record.prompt,
      options: record.options,
      explanation: record.explanation,
      points: record.points,
      key,
    })
  }
}

impl From<Exercise> for ExerciseRecord {
  fn from(ex: Exercise) -> Self {
    let exercise_type = ex.exercise_type();
    let correct_answer = match ex.key {
      AnswerKey::Matching(items) => Answer::Sequence(items),
      AnswerKey::MultipleChoice(s) | AnswerKey::FillBlank(s) | AnswerKey::Translation(s) => Answer::Text(s),
    };
    ExerciseRecord {
      exercise_id: ex.exercise_id,
      exercise_type,
      prompt: ex.prompt,
      options: ex.options,
      correct_answer,
      explanation: ex.explanation,
      points: ex.points,
    }
  }
}
