/// Parsed DDL statements, decoupled from any SQL grammar library.
///
/// The schema builder consumes these one at a time; embedders that already
/// have structured DDL can construct them directly instead of going through
/// [`crate::parse_sql`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    CreateDatabase {
        name: String,
        charset: Option<String>,
    },
    DropDatabase {
        name: String,
    },
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
        keys: Vec<KeyDef>,
        /// Free-form `key=value` table options, e.g.
        /// `engine=InnoDB row_format=Compressed`.
        options: String,
    },
    AlterTable {
        name: String,
    },
    DropTable {
        name: String,
    },
    RenameTable {
        from: String,
        to: String,
    },
}

/// One column definition from a CREATE TABLE statement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Canonical type name, e.g. "VARCHAR".
    pub type_name: String,
    /// Declared length literal: characters, precision, or member count
    /// depending on the type.
    pub length: Option<u64>,
    /// Column-level charset override.
    pub charset: Option<String>,
    pub not_null: bool,
}

/// One key definition from a CREATE TABLE statement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyDef {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub primary: bool,
}
