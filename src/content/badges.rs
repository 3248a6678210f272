//! Achievement catalog.

use crate::domain::Badge;

pub const FIRST_STEPS: &str = "B001";
pub const CONVERSATIONALIST: &str = "B002";
pub const LANGUAGE_ENTHUSIAST: &str = "B003";
pub const PERFECT_SCORE: &str = "B004";
pub const QUICK_LEARNER: &str = "B005";

struct BadgeDef {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
}

/// B006-B008 are listed for display but nothing awards them yet
const BADGES: [BadgeDef; 8] = [
    BadgeDef { id: FIRST_STEPS, name: "First Steps", description: "Complete your first lesson", icon: "🎯" },
    BadgeDef { id: CONVERSATIONALIST, name: "Conversationalist", description: "Complete 5 lessons", icon: "💬" },
    BadgeDef { id: LANGUAGE_ENTHUSIAST, name: "Language Enthusiast", description: "Complete 10 lessons", icon: "⭐" },
    BadgeDef { id: PERFECT_SCORE, name: "Perfect Score", description: "Score 100% on any lesson", icon: "🏆" },
    BadgeDef {
        id: QUICK_LEARNER,
        name: "Quick Learner",
        description: "Complete a lesson in under 10 minutes",
        icon: "⚡",
    },
    BadgeDef { id: "B006", name: "Culture Explorer", description: "Read all cultural notes", icon: "🌍" },
    BadgeDef { id: "B007", name: "Vocabulary Master", description: "Learn 100 new words", icon: "📚" },
    BadgeDef { id: "B008", name: "Week Streak", description: "Practice for 7 consecutive days", icon: "🔥" },
];

/// Every badge in catalog order, none earned
pub fn badge_catalog() -> Vec<Badge> {
    BADGES
        .iter()
        .map(|b| Badge {
            badge_id: b.id.to_string(),
            name: b.name.to_string(),
            description: b.description.to_string(),
            icon: b.icon.to_string(),
            earned_at: None,
        })
        .collect()
}
