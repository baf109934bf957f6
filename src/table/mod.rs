//! Обход таблиц: объявленная форма строк, сборка по строкам и GETBULK обходчик.

pub mod result;
pub mod rows;
pub mod shape;
pub mod walker;

pub use result::{DropReason, DroppedRow, WalkResult};
pub use rows::RowSet;
pub use shape::{Column, RowIndex, Setter, TableShape};
pub use walker::{TableWalker, WalkSettings};
