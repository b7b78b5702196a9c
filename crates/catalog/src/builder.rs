use common::{SizeError, SizeResult};
use parser::{ColumnDef, KeyDef, Statement};
use types::{DEFAULT_CHARSET, DataType, resolve_charset};

use crate::engine::{Engine, RowFormat};
use crate::table::{Column, Table};
use crate::{Database, Storage};

/// Name of the database that implicitly wraps tables created before any
/// CREATE DATABASE statement has been seen.
pub const DEFAULT_DATABASE: &str = "default";

/// Applies parsed DDL statements to a schema tree, one statement at a time.
///
/// The builder owns the only mutable reference to the tree for the duration
/// of the build pass; [`Builder::finish`] releases it read-only.
#[derive(Clone, Debug)]
pub struct Builder {
    storage: Storage,
    /// Name of the currently selected database.
    current: String,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            storage: Storage::new(),
            current: DEFAULT_DATABASE.to_string(),
        }
    }

    /// Consumes a whole statement stream and returns the finished tree.
    pub fn build(statements: impl IntoIterator<Item = Statement>) -> SizeResult<Storage> {
        let mut builder = Builder::new();
        for statement in statements {
            builder.apply(statement)?;
        }
        Ok(builder.finish())
    }

    /// Applies one statement. A failing CREATE TABLE aborts the build pass;
    /// no partial table is inserted.
    pub fn apply(&mut self, statement: Statement) -> SizeResult<()> {
        match statement {
            Statement::CreateDatabase { name, charset } => {
                let charset = charset.unwrap_or_default().to_ascii_lowercase();
                self.storage.add_database(&name, &charset);
                self.current = name;
                Ok(())
            }
            Statement::DropDatabase { name } => {
                self.storage.drop_database(&name);
                Ok(())
            }
            Statement::CreateTable {
                name,
                columns,
                keys,
                options,
            } => {
                self.ensure_default_database();
                self.create_table(name, columns, keys, &options)
            }
            // Existence validation only; no structural change is modeled for
            // these statements.
            Statement::AlterTable { .. }
            | Statement::DropTable { .. }
            | Statement::RenameTable { .. } => {
                self.ensure_default_database();
                self.current_database().map(|_| ())
            }
        }
    }

    /// Releases the finished schema tree.
    pub fn finish(self) -> Storage {
        self.storage
    }

    fn create_table(
        &mut self,
        name: String,
        columns: Vec<ColumnDef>,
        keys: Vec<KeyDef>,
        options: &str,
    ) -> SizeResult<()> {
        let database_charset = self.current_database()?.charset.clone();
        let mut table = Table {
            name,
            engine: Engine::from_name(option_value(options, "engine").unwrap_or_default()),
            row_format: RowFormat::from_name(
                option_value(options, "row_format").unwrap_or_default(),
            ),
            columns: columns
                .into_iter()
                .map(|def| resolve_column(def, &database_charset))
                .collect(),
            indexes: Vec::new(),
        };
        for key in keys {
            table.add_key(key.name, &key.columns, key.primary)?;
        }
        table.analyze()?;
        self.current_database()?.tables.push(table);
        Ok(())
    }

    /// Tables created before any CREATE DATABASE land in an implicitly
    /// created default database.
    fn ensure_default_database(&mut self) {
        if self.current == DEFAULT_DATABASE {
            self.storage.add_database(DEFAULT_DATABASE, DEFAULT_CHARSET);
        }
    }

    fn current_database(&mut self) -> SizeResult<&mut Database> {
        let current = self.current.clone();
        self.storage
            .database_mut(&current)
            .ok_or_else(|| SizeError::InvalidReference(format!("database '{current}'")))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a value from a free-form `key=value` options string: pairs are
/// whitespace-separated, keys compare case-insensitively, and the first
/// occurrence wins.
fn option_value<'a>(options: &'a str, key: &str) -> Option<&'a str> {
    options.split_whitespace().find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        k.eq_ignore_ascii_case(key).then_some(v)
    })
}

fn resolve_column(def: ColumnDef, database_charset: &str) -> Column {
    Column {
        name: def.name,
        charset: resolve_charset(def.charset.as_deref(), database_charset),
        data_size: def.length.unwrap_or(0),
        data_type: DataType::new(&def.type_name),
        not_null: def.not_null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Sizeable;
    use pretty_assertions::assert_eq;
    use types::SizeRange;

    fn column_def(name: &str, type_name: &str, length: Option<u64>) -> ColumnDef {
        ColumnDef {
            name: name.into(),
            type_name: type_name.into(),
            length,
            charset: None,
            not_null: false,
        }
    }

    fn create_users(options: &str) -> Statement {
        Statement::CreateTable {
            name: "users".into(),
            columns: vec![
                column_def("id", "INT", None),
                column_def("name", "VARCHAR", Some(100)),
            ],
            keys: Vec::new(),
            options: options.into(),
        }
    }

    #[test]
    fn tables_land_in_the_implicit_default_database() {
        let storage = Builder::build([create_users("engine=InnoDB")]).expect("build succeeds");
        let database = storage.database(DEFAULT_DATABASE).expect("default exists");
        assert_eq!(database.charset, DEFAULT_CHARSET);
        assert_eq!(database.tables.len(), 1);
        assert_eq!(database.tables[0].row_format, RowFormat::Dynamic);
    }

    #[test]
    fn create_database_selects_it_as_current() {
        let storage = Builder::build([
            Statement::CreateDatabase {
                name: "blog".into(),
                charset: Some("utf8".into()),
            },
            create_users(""),
        ])
        .expect("build succeeds");

        let database = storage.database("blog").expect("blog exists");
        assert_eq!(database.tables.len(), 1);
        // Columns inherit the database charset: VARCHAR(100) at 3 bytes/char.
        assert_eq!(database.tables[0].columns[1].charset, "utf8");
        assert_eq!(
            database.tables[0].columns[1].size(),
            SizeRange::new(2, 302)
        );
    }

    #[test]
    fn column_charset_overrides_the_database_default() {
        let statement = Statement::CreateTable {
            name: "t".into(),
            columns: vec![ColumnDef {
                name: "v".into(),
                type_name: "VARCHAR".into(),
                length: Some(10),
                charset: Some("UTF8MB4".into()),
                not_null: false,
            }],
            keys: Vec::new(),
            options: String::new(),
        };
        let storage = Builder::build([statement]).expect("build succeeds");
        let table = &storage.database(DEFAULT_DATABASE).unwrap().tables[0];
        assert_eq!(table.columns[0].charset, "utf8mb4");
        assert_eq!(table.columns[0].size(), SizeRange::new(1, 41));
    }

    #[test]
    fn duplicate_create_database_keeps_the_first_definition() {
        let storage = Builder::build([
            Statement::CreateDatabase {
                name: "blog".into(),
                charset: Some("latin1".into()),
            },
            Statement::CreateDatabase {
                name: "blog".into(),
                charset: Some("utf8".into()),
            },
        ])
        .expect("build succeeds");
        assert_eq!(storage.databases().len(), 1);
        assert_eq!(storage.database("blog").unwrap().charset, "latin1");
    }

    #[test]
    fn drop_database_removes_its_tables_from_traversal() {
        let storage = Builder::build([
            Statement::CreateDatabase {
                name: "blog".into(),
                charset: None,
            },
            create_users(""),
            Statement::DropDatabase {
                name: "blog".into(),
            },
        ])
        .expect("build succeeds");
        assert!(storage.is_empty());
    }

    #[test]
    fn dropping_an_unknown_database_is_not_an_error() {
        let storage = Builder::build([Statement::DropDatabase {
            name: "nowhere".into(),
        }])
        .expect("build succeeds");
        assert!(storage.is_empty());
    }

    #[test]
    fn table_statements_against_a_dropped_database_fail() {
        let err = Builder::build([
            Statement::CreateDatabase {
                name: "blog".into(),
                charset: None,
            },
            Statement::DropDatabase {
                name: "blog".into(),
            },
            Statement::DropTable {
                name: "users".into(),
            },
        ])
        .expect_err("current database is gone");
        assert!(matches!(err, SizeError::InvalidReference(_)));
    }

    #[test]
    fn maintenance_statements_only_validate_the_database() {
        let storage = Builder::build([
            create_users(""),
            Statement::AlterTable {
                name: "users".into(),
            },
            Statement::RenameTable {
                from: "users".into(),
                to: "members".into(),
            },
            Statement::DropTable {
                name: "users".into(),
            },
        ])
        .expect("build succeeds");
        // No structural change is modeled for these statements.
        let database = storage.database(DEFAULT_DATABASE).unwrap();
        assert_eq!(database.tables.len(), 1);
        assert_eq!(database.tables[0].name, "users");
    }

    #[test]
    fn a_key_referencing_unknown_columns_fails_the_build() {
        let statement = Statement::CreateTable {
            name: "users".into(),
            columns: vec![column_def("id", "INT", None)],
            keys: vec![KeyDef {
                name: Some("idx".into()),
                columns: vec!["missing".into()],
                primary: false,
            }],
            options: String::new(),
        };
        let err = Builder::build([statement]).expect_err("unknown key column");
        assert!(matches!(err, SizeError::InvalidReference(_)));
    }

    #[test]
    fn a_table_without_columns_fails_the_build() {
        let statement = Statement::CreateTable {
            name: "empty".into(),
            columns: Vec::new(),
            keys: Vec::new(),
            options: String::new(),
        };
        let err = Builder::build([statement]).expect_err("no columns");
        assert!(matches!(err, SizeError::Missing(_)));
    }

    #[test]
    fn the_first_option_occurrence_wins() {
        assert_eq!(
            option_value("engine=InnoDB engine=MyISAM", "engine"),
            Some("InnoDB")
        );
        assert_eq!(
            option_value("default charset=latin1 row_format=Dynamic", "row_format"),
            Some("Dynamic")
        );
        assert_eq!(option_value("engine=InnoDB", "ENGINE"), Some("InnoDB"));
        assert_eq!(option_value("", "engine"), None);
    }

    #[test]
    fn unknown_engines_build_zero_sized_tables() {
        let storage =
            Builder::build([create_users("engine=RocksDB")]).expect("build succeeds");
        let table = &storage.database(DEFAULT_DATABASE).unwrap().tables[0];
        assert_eq!(table.engine, Engine::Unknown);
        assert_eq!(table.row_format, RowFormat::Unresolved);
        assert_eq!(table.size(), SizeRange::ZERO);
    }

    #[test]
    fn building_the_same_stream_twice_is_deterministic() {
        let statements = || {
            [
                Statement::CreateDatabase {
                    name: "blog".into(),
                    charset: Some("latin1".into()),
                },
                create_users("engine=MyISAM"),
            ]
        };
        let first = Builder::build(statements()).expect("build succeeds");
        let second = Builder::build(statements()).expect("build succeeds");
        assert_eq!(first, second);
    }
}
