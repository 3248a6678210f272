//! Static learning content: the lesson catalog and the badge catalog.
//!
//! Lessons ship with the binary (`data/lessons.json`) and can be replaced by a
//! file named in config. Either source is validated before the server starts.

pub mod badges;
pub mod catalog;

pub use badges::badge_catalog;
pub use catalog::{
    category_counts, CatalogError, CategoryCount, LessonCatalog, LessonPage, LessonQuery, StaticCatalog,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
