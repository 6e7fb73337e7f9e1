//! Local store: a key/value table in SQLite, with bookmarks and learning
//! progress layered on top of it.

mod bookmarks;
pub mod core;
pub mod progress;
mod schema;
mod storage;

pub use self::bookmarks::BOOKMARKS_KEY;
pub use self::core::Database;
pub use self::progress::PillarActivity;
