//! Services backing the engine: persistence and personalization.

pub mod personalization;
pub mod storage;

pub use personalization::{PersonalizationSnapshot, PersonalizationStore, RecentEntry};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
