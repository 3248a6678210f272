//! Lesson catalog loading, validation and browsing.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::domain::{Category, Difficulty, Lesson, TargetLanguage, UserType};

/// Page size when the caller gives none
pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

const BUNDLED_LESSONS: &str = include_str!("../../data/lessons.json");

/// Read access to lessons. Implementations keep catalog order stable.
pub trait LessonCatalog: Send + Sync {
    fn lessons(&self) -> &[Lesson];

    fn find_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons().iter().find(|l| l.lesson_id == lesson_id)
    }

    /// Lessons in the learner's target language that are open to their user type
    fn lessons_for_user(&self, user_type: UserType, language: TargetLanguage) -> Vec<&Lesson> {
        self.lessons().iter().filter(|l| l.is_for(user_type, language)).collect()
    }
}

/// Error loading the lesson catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    lessons: Vec<Lesson>,
}

/// In-memory catalog loaded once at startup.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    lessons: Vec<Lesson>,
}

impl StaticCatalog {
    /// Catalog compiled into the binary
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_LESSONS)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_lessons(file.lessons)
    }

    pub fn from_lessons(lessons: Vec<Lesson>) -> Result<Self, CatalogError> {
        validate_lessons(&lessons)?;
        Ok(Self { lessons })
    }

    /// Bundled catalog unless a path is configured
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) => {
                tracing::info!("Loading lesson catalog from {}", p.display());
                Self::from_path(p)
            }
            None => Self::bundled(),
        }
    }
}

impl LessonCatalog for StaticCatalog {
    fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }
}

/// Checks the per-exercise deserializer cannot see: ids unique across the catalog
fn validate_lessons(lessons: &[Lesson]) -> Result<(), CatalogError> {
    let mut lesson_ids = HashSet::new();
    let mut exercise_ids = HashSet::new();

    for lesson in lessons {
        if lesson.lesson_id.trim().is_empty() {
            return Err(CatalogError::Invalid("Lesson missing ID".to_string()));
        }
        if !lesson_ids.insert(lesson.lesson_id.as_str()) {
            return Err(CatalogError::Invalid(format!("Duplicate lesson ID {}", lesson.lesson_id)));
        }
        for ex in &lesson.content.exercises {
            if !exercise_ids.insert(ex.exercise_id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "Duplicate exercise ID {} in lesson {}",
                    ex.exercise_id, lesson.lesson_id
                )));
            }
        }
    }

    Ok(())
}

/// Browse filter for the lesson list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LessonQuery {
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    pub language: Option<TargetLanguage>,
    pub search: Option<String>,
    #[serde(default)]
    pub skip: usize,
    pub limit: Option<usize>,
}

/// One page of matching lessons plus the total match count.
#[derive(Debug)]
pub struct LessonPage<'a> {
    pub lessons: Vec<&'a Lesson>,
    pub total: usize,
}

impl LessonQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn matches(&self, lesson: &Lesson) -> bool {
        if self.language.is_some_and(|lang| lesson.target_language != lang) {
            return false;
        }
        if self.category.is_some_and(|c| lesson.category != c) {
            return false;
        }
        if self.difficulty.is_some_and(|d| lesson.difficulty != d) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                lesson.title.to_lowercase().contains(&term) || lesson.description.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }

    pub fn run<'a>(&self, catalog: &'a dyn LessonCatalog) -> LessonPage<'a> {
        let matching: Vec<&Lesson> = catalog.lessons().iter().filter(|l| self.matches(l)).collect();
        let total = matching.len();
        let lessons = matching.into_iter().skip(self.skip).take(self.effective_limit()).collect();
        LessonPage { lessons, total }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Lesson count per category for one language; categories without lessons are omitted
pub fn category_counts(catalog: &dyn LessonCatalog, language: TargetLanguage) -> Vec<CategoryCount> {
    Category::ALL
        .into_iter()
        .map(|category| CategoryCount {
            category,
            count: catalog
                .lessons()
                .iter()
                .filter(|l| l.target_language == language && l.category == category)
                .count(),
        })
        .filter(|c| c.count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StaticCatalog {
        StaticCatalog::bundled().unwrap()
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let c = catalog();
        assert_eq!(c.lessons().len(), 7);
        let exercises: usize = c.lessons().iter().map(|l| l.exercise_count()).sum();
        assert_eq!(exercises, 22);
    }

    #[test]
    fn test_find_lesson() {
        let c = catalog();
        assert_eq!(c.find_lesson("L004").map(|l| l.difficulty), Some(Difficulty::Intermediate));
        assert!(c.find_lesson("L999").is_none());
    }

    #[test]
    fn test_lessons_for_tourist() {
        let c = catalog();
        let ids: Vec<&str> = c
            .lessons_for_user(UserType::Tourist, TargetLanguage::Kinyarwanda)
            .iter()
            .map(|l| l.lesson_id.as_str())
            .collect();
        assert_eq!(ids, ["L001", "L002", "L003", "L004", "L005", "L006"]);
    }

    #[test]
    fn test_lessons_for_worker() {
        let c = catalog();
        let ids: Vec<&str> = c
            .lessons_for_user(UserType::TourismWorker, TargetLanguage::English)
            .iter()
            .map(|l| l.lesson_id.as_str())
            .collect();
        assert_eq!(ids, ["L007"]);
        assert!(c.lessons_for_user(UserType::Tourist, TargetLanguage::English).is_empty());
        assert!(c.lessons_for_user(UserType::TourismWorker, TargetLanguage::French).is_empty());
    }

    #[test]
    fn test_reject_duplicate_lesson_id() {
        let mut lessons = catalog().lessons().to_vec();
        let dup = lessons[0].clone();
        lessons.push(dup);
        let err = StaticCatalog::from_lessons(lessons).unwrap_err();
        assert!(err.to_string().contains("Duplicate lesson ID L001"));
    }

    #[test]
    fn test_reject_duplicate_exercise_id() {
        let mut lessons = catalog().lessons().to_vec();
        let ex = lessons[0].content.exercises[0].clone();
        lessons[1].content.exercises.push(ex);
        assert!(matches!(StaticCatalog::from_lessons(lessons), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_reject_bad_exercise_json() {
        let json = r#"{"lessons": [{
            "lesson_id": "L1", "title": "t", "description": "d", "difficulty": "beginner",
            "category": "food", "target_language": "french", "duration": 5, "vocabulary_count": 0,
            "content": {"exercises": [
                {"exercise_id": "E1", "type": "matching", "prompt": "p", "correct_answer": "x", "points": 5}
            ]}
        }]}"#;
        assert!(matches!(StaticCatalog::from_json(json), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lessons.json");
        std::fs::write(&path, BUNDLED_LESSONS).unwrap();
        assert_eq!(StaticCatalog::from_path(&path).unwrap().lessons().len(), 7);
        assert!(matches!(
            StaticCatalog::from_path(&dir.path().join("missing.json")),
            Err(CatalogError::Io(_))
        ));
    }

    #[test]
    fn test_query_defaults() {
        let c = catalog();
        let page = LessonQuery::default().run(&c);
        assert_eq!(page.total, 7);
        assert_eq!(page.lessons.len(), 7);
    }

    #[test]
    fn test_query_filters() {
        let c = catalog();
        let q = LessonQuery {
            language: Some(TargetLanguage::Kinyarwanda),
            difficulty: Some(Difficulty::Intermediate),
            ..Default::default()
        };
        let page = q.run(&c);
        let ids: Vec<&str> = page.lessons.iter().map(|l| l.lesson_id.as_str()).collect();
        assert_eq!(ids, ["L004", "L005"]);

        let q = LessonQuery { category: Some(Category::Emergency), ..Default::default() };
        assert_eq!(q.run(&c).total, 1);
    }

    #[test]
    fn test_query_search_ignores_case() {
        let c = catalog();
        let q = LessonQuery { search: Some("MARKETS".to_string()), ..Default::default() };
        let page = q.run(&c);
        assert_eq!(page.total, 1);
        assert_eq!(page.lessons[0].lesson_id, "L005");
    }

    #[test]
    fn test_query_paging() {
        let c = catalog();
        let q = LessonQuery { skip: 5, limit: Some(10), ..Default::default() };
        let page = q.run(&c);
        assert_eq!(page.total, 7);
        assert_eq!(page.lessons.len(), 2);

        assert_eq!(LessonQuery { limit: Some(0), ..Default::default() }.effective_limit(), 1);
        assert_eq!(LessonQuery { limit: Some(500), ..Default::default() }.effective_limit(), MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_category_counts() {
        let c = catalog();
        let counts = category_counts(&c, TargetLanguage::Kinyarwanda);
        assert_eq!(counts.len(), 6);
        assert!(counts.iter().all(|c| c.count == 1));
        assert_eq!(counts[0].category, Category::Greetings);

        let english = category_counts(&c, TargetLanguage::English);
        assert_eq!(english, vec![CategoryCount { category: Category::Greetings, count: 1 }]);
    }
}
