use super::shape::RowIndex;
use crate::error::FieldError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Для строки не пришли обязательные колонки.
    Incomplete { missing: Vec<&'static str> },
    /// Значение колонки неверного типа.
    Garbled {
        column: &'static str,
        error: FieldError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    pub index: RowIndex,
    pub reason: DropReason,
}

/// Записи одного обхода в порядке обнаружения строк.
#[derive(Debug, Clone)]
pub struct WalkResult<R> {
    table: &'static str,
    rows: Vec<(RowIndex, R)>,
    dropped: Vec<DroppedRow>,
    truncated: bool,
}

impl<R> WalkResult<R> {
    pub(crate) fn new(
        table: &'static str,
        rows: Vec<(RowIndex, R)>,
        dropped: Vec<DroppedRow>,
        truncated: bool,
    ) -> Self {
        Self {
            table,
            rows,
            dropped,
            truncated,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: &RowIndex) -> Option<&R> {
        self.rows.iter().find(|(i, _)| i == index).map(|(_, r)| r)
    }

    pub fn indices(&self) -> impl Iterator<Item = &RowIndex> {
        self.rows.iter().map(|(i, _)| i)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowIndex, &R)> {
        self.rows.iter().map(|(i, r)| (i, r))
    }

    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.rows.iter().map(|(_, r)| r)
    }

    pub fn into_records(self) -> Vec<R> {
        self.rows.into_iter().map(|(_, r)| r).collect()
    }

    pub fn dropped(&self) -> &[DroppedRow] {
        &self.dropped
    }

    /// Часть строк отброшена, возвращённые полные.
    pub fn is_partial(&self) -> bool {
        !self.dropped.is_empty()
    }

    /// Обход обрезан лимитом строк.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}
