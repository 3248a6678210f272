//! Learning core: lesson sessions, recommendations, badges and statistics.
//!
//! Everything here is pure. Callers pass in the clock, the catalog and the
//! learner's history; nothing in this module touches storage.

pub mod badges;
pub mod recommend;
pub mod session;
pub mod stats;

pub use badges::{evaluate_badges, QUICK_LEARNER_SECONDS};
pub use recommend::{recommend, RECOMMENDATION_LIMIT};
pub use session::{Advance, Feedback, LessonSession, SessionError, Stage, SubmitOutcome};
pub use stats::{category_breakdown, current_streak, CategoryProgress, UserStats};
