mod builder;
mod engine;
mod table;

pub use builder::{Builder, DEFAULT_DATABASE};
pub use engine::{Engine, RowFormat};
pub use table::{Column, Index, Table};

use common::Sizeable;
use serde::{Deserialize, Serialize};
use types::SizeRange;

/// A named database and the tables built under it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    /// Default charset for columns that do not override it. May be empty,
    /// in which case the global default applies.
    pub charset: String,
    pub tables: Vec<Table>,
}

impl Sizeable for Database {
    fn size(&self) -> SizeRange {
        self.tables.iter().map(Sizeable::size).sum()
    }

    fn kind(&self) -> String {
        "database".into()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Root of the schema tree. It grows and shrinks only through the builder;
/// once the build pass finishes the tree is read-only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    databases: Vec<Database>,
}

impl Storage {
    pub fn new() -> Storage {
        Storage::default()
    }

    /// Read-only traversal root, in creation order.
    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Lookup by exact, case-sensitive name.
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.iter().find(|db| db.name == name)
    }

    pub(crate) fn database_mut(&mut self, name: &str) -> Option<&mut Database> {
        self.databases.iter_mut().find(|db| db.name == name)
    }

    /// Appends a database unless the name is already taken.
    pub(crate) fn add_database(&mut self, name: &str, charset: &str) {
        if self.database(name).is_none() {
            self.databases.push(Database {
                name: name.to_string(),
                charset: charset.to_string(),
                tables: Vec::new(),
            });
        }
    }

    /// Removes a database by exact name. Unknown names are a no-op.
    pub(crate) fn drop_database(&mut self, name: &str) {
        self.databases.retain(|db| db.name != name);
    }
}
