use std::collections::HashMap;
use std::fmt;

use crate::error::FieldError;
use crate::snmp::{ObjectId, SnmpValue};

/// Индекс строки из суффикса OID после номера колонки.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowIndex(Vec<u32>);

impl RowIndex {
    pub fn new(parts: Vec<u32>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }
}

impl From<u32> for RowIndex {
    fn from(index: u32) -> Self {
        Self(vec![index])
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

pub type Setter<B> = fn(&mut B, &SnmpValue) -> Result<(), FieldError>;

/// Одна колонка таблицы: её номер под OID записи и как сохранить значение.
pub struct Column<B> {
    pub id: u32,
    pub name: &'static str,
    pub required: bool,
    pub set: Setter<B>,
}

impl<B> Column<B> {
    pub fn required(id: u32, name: &'static str, set: Setter<B>) -> Self {
        Self {
            id,
            name,
            required: true,
            set,
        }
    }

    pub fn optional(id: u32, name: &'static str, set: Setter<B>) -> Self {
        Self {
            id,
            name,
            required: false,
            set,
        }
    }
}

/// Объявленная структура SNMP таблицы и как её строки становятся записями.
///
/// Строится один раз, поиск колонок фиксируется при создании, и обходу не
/// нужно определять поля на лету.
pub struct TableShape<B, R> {
    name: &'static str,
    entry: ObjectId,
    index_len: usize,
    columns: Vec<Column<B>>,
    by_id: HashMap<u32, usize>,
    finish: fn(RowIndex, B) -> R,
}

impl<B: Default, R> TableShape<B, R> {
    /// # Panics
    /// Если у двух колонок один номер или `index_len` равен нулю.
    pub fn new(
        name: &'static str,
        entry: ObjectId,
        index_len: usize,
        columns: Vec<Column<B>>,
        finish: fn(RowIndex, B) -> R,
    ) -> Self {
        assert!(index_len > 0, "table {} needs a non-empty index", name);
        let mut by_id = HashMap::with_capacity(columns.len());
        for (pos, column) in columns.iter().enumerate() {
            let previous = by_id.insert(column.id, pos);
            assert!(
                previous.is_none(),
                "table {} declares column {} twice",
                name,
                column.id
            );
        }

        Self {
            name,
            entry,
            index_len,
            columns,
            by_id,
            finish,
        }
    }

    /// Та же форма с другим OID записи.
    pub fn with_entry(mut self, entry: ObjectId) -> Self {
        self.entry = entry;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn entry(&self) -> &ObjectId {
        &self.entry
    }

    pub fn index_len(&self) -> usize {
        self.index_len
    }

    pub fn columns(&self) -> &[Column<B>] {
        &self.columns
    }

    /// Позиция колонки с номером `id`.
    pub fn position(&self, id: u32) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub(crate) fn finish(&self, index: RowIndex, builder: B) -> R {
        (self.finish)(index, builder)
    }
}
