//! MIB таблицы, которые умеет разбирать коллектор.

pub mod dm_history;

pub use dm_history::{DmHistoryEntry, DmHistoryShape, dm_history_shape};
