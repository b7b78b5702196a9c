use std::fmt;

use common::{Item, Sizeable};
use serde::{Deserialize, Serialize};
use types::SizeRange;

use crate::table::{Column, Index};

/// Storage engines with modeled size formulas.
///
/// The dispatch set is closed: anything else is the explicit `Unknown`
/// variant, which yields zero-sized results instead of failing the build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Engine {
    /// Clustered-index engine; secondary keys carry a copy of the primary.
    #[default]
    InnoDb,
    /// Index-file engine; keys live in a packed, compressible index file.
    MyIsam,
    Unknown,
}

/// Size of the hidden clustered index when no primary key is declared.
const DEFAULT_CLUSTERED_INDEX_SIZE: u64 = 6;

const STATIC_HEADER: u64 = 1;
const DYNAMIC_HEADER: u64 = 3;
const DELETE_FLAG: u64 = 1;

impl Engine {
    /// Maps an engine option value. The empty string selects the default
    /// MySQL engine; unrecognized names degrade to [`Engine::Unknown`].
    pub fn from_name(name: &str) -> Engine {
        if name.is_empty() || name.eq_ignore_ascii_case("innodb") {
            Engine::InnoDb
        } else if name.eq_ignore_ascii_case("myisam") {
            Engine::MyIsam
        } else {
            Engine::Unknown
        }
    }

    /// Columns with their stored ranges. Both modeled engines store fields
    /// at the sizer's reported range.
    pub fn fields(&self, columns: &[Column]) -> Vec<Item> {
        columns.iter().map(|column| Item::of(column)).collect()
    }

    /// Keys with engine overhead baked into their ranges.
    pub fn keys(&self, indexes: &[Index], primary: Option<usize>) -> Vec<Item> {
        match self {
            Engine::InnoDb => clustered_keys(indexes, primary),
            Engine::MyIsam => index_file_keys(indexes),
            Engine::Unknown => Vec::new(),
        }
    }

    /// Resolves the declared row format against the column shapes.
    /// Idempotent: feeding a resolved format back returns it unchanged.
    pub fn resolve_row_format(&self, columns: &[Column], current: RowFormat) -> RowFormat {
        match self {
            Engine::InnoDb => {
                if current == RowFormat::Unresolved {
                    RowFormat::Dynamic
                } else {
                    current
                }
            }
            Engine::MyIsam => {
                if current == RowFormat::Compressed {
                    RowFormat::Compressed
                } else if columns.iter().any(|c| c.data_type.is_variable()) {
                    RowFormat::Dynamic
                } else {
                    RowFormat::Static
                }
            }
            Engine::Unknown => RowFormat::Unresolved,
        }
    }

    /// Estimated row length under the resolved format.
    pub fn row_size(&self, columns: &[Column], format: RowFormat) -> SizeRange {
        match self {
            // Row format does not change this engine's row estimate.
            Engine::InnoDb => columns.iter().map(Sizeable::size).sum(),
            Engine::MyIsam => index_file_row_size(columns, format),
            Engine::Unknown => SizeRange::ZERO,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Engine::InnoDb => "InnoDB",
            Engine::MyIsam => "MyISAM",
            Engine::Unknown => "unknown",
        })
    }
}

/// Physical row layouts. `Unresolved` is the state before analysis; the
/// engine replaces it with a concrete layout while the table is analyzed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowFormat {
    #[default]
    Unresolved,
    Compact,
    Compressed,
    Dynamic,
    Redundant,
    Static,
}

impl RowFormat {
    /// Maps a row_format option value; unrecognized names stay unresolved.
    pub fn from_name(name: &str) -> RowFormat {
        match name.to_ascii_lowercase().as_str() {
            "compact" => RowFormat::Compact,
            "compressed" => RowFormat::Compressed,
            "dynamic" => RowFormat::Dynamic,
            "redundant" => RowFormat::Redundant,
            "static" => RowFormat::Static,
            _ => RowFormat::Unresolved,
        }
    }
}

impl fmt::Display for RowFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RowFormat::Unresolved => "",
            RowFormat::Compact => "compact",
            RowFormat::Compressed => "compressed",
            RowFormat::Dynamic => "dynamic",
            RowFormat::Redundant => "redundant",
            RowFormat::Static => "static",
        })
    }
}

// https://dev.mysql.com/doc/refman/8.0/en/innodb-index-types.html
fn clustered_keys(keys: &[Index], primary: Option<usize>) -> Vec<Item> {
    let primary_size = primary
        .and_then(|position| keys.get(position))
        .map(Sizeable::size)
        .unwrap_or(SizeRange::fixed(DEFAULT_CLUSTERED_INDEX_SIZE));
    keys.iter()
        .map(|key| {
            if key.primary {
                Item::of(key)
            } else {
                Item::resized(key, key.size().saturating_add(primary_size))
            }
        })
        .collect()
}

// https://dev.mysql.com/doc/refman/8.0/en/key-space.html
fn index_file_keys(keys: &[Index]) -> Vec<Item> {
    fn packed(bytes: u64) -> u64 {
        ((bytes as f64 + 4.0) / 0.67).ceil() as u64
    }
    keys.iter()
        .map(|key| {
            let raw = key.size();
            Item::resized(key, SizeRange::new(packed(raw.min), packed(raw.max)))
        })
        .collect()
}

fn index_file_row_size(columns: &[Column], format: RowFormat) -> SizeRange {
    let total: SizeRange = columns.iter().map(Sizeable::size).sum();
    let nullable = columns.iter().filter(|c| !c.not_null).count() as u64;
    let variable = columns
        .iter()
        .filter(|c| c.data_type.is_variable())
        .count() as u64;
    let strings = columns.iter().filter(|c| c.data_type.is_string()).count() as u64;
    let count = columns.len() as u64;
    match format {
        // Variable data is space-padded to full column width, so a single
        // max-derived total covers both bounds.
        RowFormat::Static => SizeRange::fixed(
            STATIC_HEADER
                .saturating_add(total.max)
                .saturating_add((nullable + DELETE_FLAG).div_ceil(8))
                .saturating_add(variable),
        ),
        RowFormat::Dynamic => {
            let overhead = DYNAMIC_HEADER + count.div_ceil(8) + strings + nullable.div_ceil(8);
            SizeRange::new(
                total.min.saturating_add(overhead),
                total.max.saturating_add(overhead),
            )
        }
        RowFormat::Compressed => SizeRange::new(
            total.min.saturating_add(STATIC_HEADER),
            total.max.saturating_add(DYNAMIC_HEADER),
        ),
        _ => SizeRange::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use types::DataType;

    fn column(name: &str, type_name: &str, size: u64, not_null: bool) -> Column {
        Column {
            name: name.into(),
            charset: "latin1".into(),
            data_size: size,
            data_type: DataType::new(type_name),
            not_null,
        }
    }

    fn key(name: &str, columns: Vec<Column>, primary: bool) -> Index {
        Index {
            name: name.into(),
            columns,
            primary,
        }
    }

    #[test]
    fn engine_names_map_case_insensitively() {
        assert_eq!(Engine::from_name(""), Engine::InnoDb);
        assert_eq!(Engine::from_name("innodb"), Engine::InnoDb);
        assert_eq!(Engine::from_name("InnoDB"), Engine::InnoDb);
        assert_eq!(Engine::from_name("MyISAM"), Engine::MyIsam);
        assert_eq!(Engine::from_name("RocksDB"), Engine::Unknown);
    }

    #[test]
    fn clustered_secondary_keys_carry_the_primary_key() {
        let id = column("id", "INT", 0, true);
        let name = column("name", "VARCHAR", 100, false);
        let keys = vec![
            key("pk", vec![id], true),
            key("idx_name", vec![name], false),
        ];

        let sized = Engine::InnoDb.keys(&keys, Some(0));
        assert_eq!(sized[0].size(), SizeRange::fixed(4));
        // Secondary key: own (1, 101) plus the primary key's (4, 4).
        assert_eq!(sized[1].size(), SizeRange::new(5, 105));
    }

    #[test]
    fn clustered_keys_without_a_primary_use_the_default_index_size() {
        let name = column("name", "VARCHAR", 100, false);
        let keys = vec![key("idx_name", vec![name], false)];

        let sized = Engine::InnoDb.keys(&keys, None);
        assert_eq!(sized[0].size(), SizeRange::new(7, 107));
    }

    #[test]
    fn index_file_keys_apply_the_packed_block_formula() {
        let id = column("id", "INT", 0, true);
        let name = column("name", "VARCHAR", 100, false);
        let keys = vec![
            key("pk", vec![id], true),
            key("idx_name", vec![name], false),
        ];

        let sized = Engine::MyIsam.keys(&keys, Some(0));
        // ceil((4 + 4) / 0.67) = 12, for both bounds.
        assert_eq!(sized[0].size(), SizeRange::fixed(12));
        // ceil((1 + 4) / 0.67) = 8, ceil((101 + 4) / 0.67) = 157.
        assert_eq!(sized[1].size(), SizeRange::new(8, 157));
    }

    #[test]
    fn unknown_engines_report_no_keys() {
        let id = column("id", "INT", 0, true);
        let keys = vec![key("pk", vec![id], true)];
        assert!(Engine::Unknown.keys(&keys, Some(0)).is_empty());
    }

    #[test]
    fn clustered_row_format_defaults_to_dynamic() {
        let columns = vec![column("id", "INT", 0, true)];
        assert_eq!(
            Engine::InnoDb.resolve_row_format(&columns, RowFormat::Unresolved),
            RowFormat::Dynamic
        );
        assert_eq!(
            Engine::InnoDb.resolve_row_format(&columns, RowFormat::Compressed),
            RowFormat::Compressed
        );
    }

    #[test]
    fn index_file_row_format_follows_the_column_shapes() {
        let fixed = vec![column("id", "INT", 0, true)];
        let variable = vec![column("name", "VARCHAR", 100, false)];
        assert_eq!(
            Engine::MyIsam.resolve_row_format(&fixed, RowFormat::Unresolved),
            RowFormat::Static
        );
        assert_eq!(
            Engine::MyIsam.resolve_row_format(&variable, RowFormat::Unresolved),
            RowFormat::Dynamic
        );
        assert_eq!(
            Engine::MyIsam.resolve_row_format(&variable, RowFormat::Compressed),
            RowFormat::Compressed
        );
    }

    #[test]
    fn row_format_resolution_is_idempotent() {
        let columns = vec![column("name", "VARCHAR", 100, false)];
        for engine in [Engine::InnoDb, Engine::MyIsam, Engine::Unknown] {
            let once = engine.resolve_row_format(&columns, RowFormat::Unresolved);
            let twice = engine.resolve_row_format(&columns, once);
            assert_eq!(once, twice, "{engine}");
        }
    }

    #[test]
    fn clustered_row_size_sums_columns_whatever_the_format() {
        let columns = vec![
            column("id", "INT", 0, true),
            column("name", "VARCHAR", 100, false),
        ];
        for format in [RowFormat::Dynamic, RowFormat::Compressed, RowFormat::Static] {
            assert_eq!(
                Engine::InnoDb.row_size(&columns, format),
                SizeRange::new(5, 105)
            );
        }
    }

    #[test]
    fn index_file_static_rows_use_the_padded_total() {
        let columns = vec![
            column("id", "INT", 0, true),
            column("age", "SMALLINT", 0, false),
        ];
        // 1 header + 6 bytes of columns + 1 null-bitmap byte + 0 variable.
        assert_eq!(
            Engine::MyIsam.row_size(&columns, RowFormat::Static),
            SizeRange::fixed(8)
        );
    }

    #[test]
    fn index_file_dynamic_rows_add_per_bound_overhead() {
        let columns = vec![
            column("id", "INT", 0, true),
            column("name", "VARCHAR", 100, false),
        ];
        // Overhead: 3 header + 1 column bitmap + 1 string column + 1 null
        // bitmap = 6, on top of (5, 105).
        assert_eq!(
            Engine::MyIsam.row_size(&columns, RowFormat::Dynamic),
            SizeRange::new(11, 111)
        );
    }

    #[test]
    fn index_file_compressed_rows_differ_by_header() {
        let columns = vec![
            column("id", "INT", 0, true),
            column("name", "VARCHAR", 100, false),
        ];
        assert_eq!(
            Engine::MyIsam.row_size(&columns, RowFormat::Compressed),
            SizeRange::new(6, 108)
        );
    }

    #[test]
    fn unmodeled_combinations_size_to_zero() {
        let columns = vec![column("id", "INT", 0, true)];
        assert_eq!(
            Engine::MyIsam.row_size(&columns, RowFormat::Compact),
            SizeRange::ZERO
        );
        assert_eq!(
            Engine::Unknown.row_size(&columns, RowFormat::Dynamic),
            SizeRange::ZERO
        );
    }
}
