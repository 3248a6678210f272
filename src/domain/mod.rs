pub mod badge;
pub mod exercise;
pub mod lesson;
pub mod progress;
pub mod user;

pub use badge::Badge;
pub use exercise::{Answer, AnswerKey, Exercise, ExerciseError, ExerciseType, ExerciseView};
pub use lesson::{
  Category, Difficulty, Lesson, LessonContent, NativeLanguage, PhraseItem, TargetLanguage, UserType, VocabularyItem,
};
pub use progress::{round_score, Recommendation, UserProgress};
pub use user::User;
