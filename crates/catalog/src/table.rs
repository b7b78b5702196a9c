use common::{Item, SizeError, SizeResult, Sizeable};
use serde::{Deserialize, Serialize};
use types::{DataType, SizeRange};

use crate::engine::{Engine, RowFormat};

/// A table column, fully resolved: charset precedence applied and the data
/// type canonicalized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Resolved charset, never empty.
    pub charset: String,
    /// Declared size parameter, 0 if unspecified.
    pub data_size: u64,
    pub data_type: DataType,
    pub not_null: bool,
}

impl Sizeable for Column {
    fn size(&self) -> SizeRange {
        self.data_type.size(self.data_size, &self.charset)
    }

    fn kind(&self) -> String {
        if self.data_type.is_integer() {
            return self.data_type.to_string();
        }
        let mut parts = Vec::new();
        if self.data_size > 0 {
            parts.push(self.data_size.to_string());
        }
        if self.data_type.is_string() {
            parts.push(self.charset.clone());
        }
        if parts.is_empty() {
            return self.data_type.to_string();
        }
        format!("{}({})", self.data_type, parts.join(", "))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A table key. Holds copies of the columns it covers, never back-references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// May be empty for unnamed keys.
    pub name: String,
    pub columns: Vec<Column>,
    pub primary: bool,
}

impl Sizeable for Index {
    /// Raw column-sum size, before any engine-specific overhead.
    fn size(&self) -> SizeRange {
        self.columns.iter().map(Sizeable::size).sum()
    }

    fn kind(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        format!("key({})", names.join(", "))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A table under construction by the builder, then a read-only node of the
/// schema tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub engine: Engine,
    pub row_format: RowFormat,
    /// Insertion order; column order is semantically meaningful.
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

impl Table {
    /// Attaches a key, copying the referenced columns by value. Every name
    /// must resolve against the column list.
    pub fn add_key(
        &mut self,
        name: Option<String>,
        columns: &[String],
        primary: bool,
    ) -> SizeResult<()> {
        let Some(resolved) = self.columns_named(columns) else {
            return Err(SizeError::InvalidReference(format!(
                "key on table '{}' references unknown columns",
                self.name
            )));
        };
        self.indexes.push(Index {
            name: name.unwrap_or_default(),
            columns: resolved,
            primary,
        });
        Ok(())
    }

    /// Re-checks the table invariants and resolves the row format. Called
    /// once after construction, before the table joins its database.
    pub fn analyze(&mut self) -> SizeResult<()> {
        if self.name.is_empty() {
            return Err(SizeError::Missing("table name".into()));
        }
        if self.columns.is_empty() {
            return Err(SizeError::Missing(format!(
                "columns on table '{}'",
                self.name
            )));
        }
        self.row_format = self.engine.resolve_row_format(&self.columns, self.row_format);
        Ok(())
    }

    /// Columns with their stored byte ranges.
    pub fn fields(&self) -> Vec<Item> {
        self.engine.fields(&self.columns)
    }

    /// Keys with engine overhead applied.
    pub fn keys(&self) -> Vec<Item> {
        self.engine.keys(&self.indexes, self.primary_key_position())
    }

    fn primary_key_position(&self) -> Option<usize> {
        self.indexes.iter().position(|key| key.primary)
    }

    fn columns_named(&self, names: &[String]) -> Option<Vec<Column>> {
        if names.is_empty() {
            return None;
        }
        let mut found = Vec::with_capacity(names.len());
        for name in names {
            let column = self.columns.iter().find(|c| &c.name == name)?;
            found.push(column.clone());
        }
        Some(found)
    }
}

impl Sizeable for Table {
    /// Row size plus the overhead of every key.
    fn size(&self) -> SizeRange {
        self.keys().iter().map(Sizeable::size).fold(
            self.engine.row_size(&self.columns, self.row_format),
            SizeRange::saturating_add,
        )
    }

    fn kind(&self) -> String {
        let mut parts = Vec::new();
        let engine = self.engine.to_string();
        if !engine.is_empty() {
            parts.push(engine);
        }
        let format = self.row_format.to_string();
        if !format.is_empty() {
            parts.push(format);
        }
        format!("table({})", parts.join(", "))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
