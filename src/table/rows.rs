use std::collections::HashMap;

use tracing::trace;

use super::result::{DropReason, DroppedRow, WalkResult};
use super::shape::{RowIndex, TableShape};
use crate::error::{FieldError, WalkError};
use crate::snmp::{ObjectId, SnmpValue};

struct PendingRow<B> {
    index: RowIndex,
    builder: B,
    seen: Vec<bool>,
    garbled: Option<(&'static str, FieldError)>,
}

/// Собирает varbind'ы одного обхода по строкам, в порядке их обнаружения.
pub struct RowSet<'s, B, R> {
    shape: &'s TableShape<B, R>,
    rows: Vec<PendingRow<B>>,
    positions: HashMap<RowIndex, usize>,
    max_rows: usize,
    truncated: bool,
}

impl<'s, B: Default, R> RowSet<'s, B, R> {
    pub fn new(shape: &'s TableShape<B, R>, max_rows: usize) -> Self {
        Self {
            shape,
            rows: Vec::new(),
            positions: HashMap::new(),
            max_rows,
            truncated: false,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Сохраняет один varbind из поддерева записи таблицы.
    pub fn accept(&mut self, oid: &ObjectId, value: &SnmpValue) -> Result<(), WalkError> {
        let shape = self.shape;
        let suffix = oid.suffix(shape.entry()).ok_or_else(|| {
            WalkError::Protocol(format!("{} is outside table {}", oid, shape.name()))
        })?;

        let Some((&column, index)) = suffix.split_first() else {
            return Err(WalkError::Protocol(format!(
                "{} has no column in table {}",
                oid,
                shape.name()
            )));
        };

        if index.len() != shape.index_len() {
            return Err(WalkError::Protocol(format!(
                "{} has a {}-part index, table {} expects {}",
                oid,
                index.len(),
                shape.name(),
                shape.index_len()
            )));
        }

        let Some(pos) = shape.position(column) else {
            trace!(%oid, "skipping undeclared column");
            return Ok(());
        };

        if value.is_missing() {
            return Ok(());
        }

        let Some(row) = self.row_mut(RowIndex::new(index.to_vec())) else {
            return Ok(());
        };

        if row.garbled.is_some() {
            return Ok(());
        }

        let column = &shape.columns()[pos];
        match (column.set)(&mut row.builder, value) {
            Ok(()) => row.seen[pos] = true,
            Err(err) => row.garbled = Some((column.name, err)),
        }
        Ok(())
    }

    fn row_mut(&mut self, index: RowIndex) -> Option<&mut PendingRow<B>> {
        if let Some(&pos) = self.positions.get(&index) {
            return Some(&mut self.rows[pos]);
        }

        if self.rows.len() >= self.max_rows {
            self.truncated = true;
            return None;
        }

        let pos = self.rows.len();
        self.positions.insert(index.clone(), pos);
        self.rows.push(PendingRow {
            index,
            builder: B::default(),
            seen: vec![false; self.shape.columns().len()],
            garbled: None,
        });
        Some(&mut self.rows[pos])
    }

    /// Строит все полные строки, остальные попадают в отброшенные.
    pub fn finish(self) -> WalkResult<R> {
        let shape = self.shape;
        let mut records = Vec::with_capacity(self.rows.len());
        let mut dropped = Vec::new();

        for row in self.rows {
            if let Some((column, error)) = row.garbled {
                dropped.push(DroppedRow {
                    index: row.index,
                    reason: DropReason::Garbled { column, error },
                });
                continue;
            }

            let missing: Vec<&'static str> = shape
                .columns()
                .iter()
                .zip(&row.seen)
                .filter(|(column, seen)| column.required && !**seen)
                .map(|(column, _)| column.name)
                .collect();

            if missing.is_empty() {
                let record = shape.finish(row.index.clone(), row.builder);
                records.push((row.index, record));
            } else {
                dropped.push(DroppedRow {
                    index: row.index,
                    reason: DropReason::Incomplete { missing },
                });
            }
        }

        WalkResult::new(shape.name(), records, dropped, self.truncated)
    }
}
