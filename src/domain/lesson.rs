use serde::{Deserialize, Serialize};

use super::exercise::Exercise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Beginner => "beginner",
      Self::Intermediate => "intermediate",
      Self::Advanced => "advanced",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "beginner" => Some(Self::Beginner),
      "intermediate" => Some(Self::Intermediate),
      "advanced" => Some(Self::Advanced),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Greetings,
  Accommodation,
  Food,
  Transportation,
  Shopping,
  Emergency,
}

impl Category {
  pub const ALL: [Category; 6] = [
    Self::Greetings,
    Self::Accommodation,
    Self::Food,
    Self::Transportation,
    Self::Shopping,
    Self::Emergency,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Greetings => "greetings",
      Self::Accommodation => "accommodation",
      Self::Food => "food",
      Self::Transportation => "transportation",
      Self::Shopping => "shopping",
      Self::Emergency => "emergency",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.as_str() == s)
  }
}

/// Language a learner is studying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLanguage {
  Kinyarwanda,
  English,
  French,
}

impl TargetLanguage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Kinyarwanda => "kinyarwanda",
      Self::English => "english",
      Self::French => "french",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "kinyarwanda" => Some(Self::Kinyarwanda),
      "english" => Some(Self::English),
      "french" => Some(Self::French),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeLanguage {
  Kinyarwanda,
  English,
  French,
  Swahili,
  Other,
}

impl NativeLanguage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Kinyarwanda => "kinyarwanda",
      Self::English => "english",
      Self::French => "french",
      Self::Swahili => "swahili",
      Self::Other => "other",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "kinyarwanda" => Some(Self::Kinyarwanda),
      "english" => Some(Self::English),
      "french" => Some(Self::French),
      "swahili" => Some(Self::Swahili),
      "other" => Some(Self::Other),
      _ => None,
    }
  }
}

/// Tourists learn Kinyarwanda, tourism workers learn English or French
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
  Tourist,
  TourismWorker,
}

impl UserType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Tourist => "tourist",
      Self::TourismWorker => "tourism_worker",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "tourist" => Some(Self::Tourist),
      "tourism_worker" => Some(Self::TourismWorker),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
  pub word: String,
  pub translation: String,
  pub pronunciation: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseItem {
  pub phrase: String,
  pub translation: String,
  pub pronunciation: String,
  pub context: String,
}

/// Lesson body. Order of every list is the order the learner sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonContent {
  #[serde(default)]
  pub vocabulary: Vec<VocabularyItem>,
  #[serde(default)]
  pub phrases: Vec<PhraseItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cultural_notes: Option<Vec<String>>,
  #[serde(default)]
  pub exercises: Vec<Exercise>,
}

impl LessonContent {
  pub fn cultural_notes(&self) -> &[String] {
    self.cultural_notes.as_deref().unwrap_or(&[])
  }

  /// Sum of the point values of every exercise
  pub fn total_points(&self) -> u32 {
    self.exercises.iter().map(|e| e.points).sum()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
  pub lesson_id: String,
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
  pub category: Category,
  pub target_language: TargetLanguage,
  /// Restricts the lesson to one kind of learner; None means everyone studying the language
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub audience: Option<UserType>,
  /// Minutes
  pub duration: u32,
  pub vocabulary_count: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thumbnail: Option<String>,
  pub content: LessonContent,
}

impl Lesson {
  pub fn is_for(&self, user_type: UserType, language: TargetLanguage) -> bool {
    self.target_language == language && self.audience.is_none_or(|a| a == user_type)
  }

  pub fn exercise_count(&self) -> usize {
    self.content.exercises.len()
  }
}
