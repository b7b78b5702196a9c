//! Human-readable size formatting and table rendering helpers.

use tabled::{Table, builder::Builder, settings};

const KILOBYTE: u64 = 1_000;
const MEGABYTE: u64 = KILOBYTE * KILOBYTE;
const GIGABYTE: u64 = MEGABYTE * KILOBYTE;
const TERABYTE: u64 = GIGABYTE * KILOBYTE;

/// Predefined output styles that map to `tabled` styles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableStyleKind {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl TableStyleKind {
    fn apply(self, table: &mut Table) {
        match self {
            Self::Modern => table.with(settings::Style::modern()),
            Self::Ascii => table.with(settings::Style::ascii()),
            Self::Plain => table.with(settings::Style::empty()),
        };
    }
}

/// Render string rows under the given headers with the provided style.
pub fn render_string_table(
    headers: &[&str],
    rows: Vec<Vec<String>>,
    style: TableStyleKind,
) -> String {
    if headers.is_empty() && rows.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();

    if !headers.is_empty() {
        builder.push_record(headers.iter().copied());
    }

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    style.apply(&mut table);
    table.to_string()
}

/// Format a byte count as a decimal human-readable size, e.g. "1.50 KB".
///
/// Units are 1000-based and the fractional part is truncated, not rounded.
pub fn human_size(bytes: u64, precision: u8) -> String {
    let (divisor, suffix, digits) = interval(bytes);
    let whole = bytes / divisor;
    if precision == 0 {
        return format!("{whole} {suffix}");
    }
    let mut frac = if digits == 0 {
        String::new()
    } else {
        format!("{:0digits$}", bytes % divisor)
    };
    frac.truncate(precision as usize);
    while frac.len() < precision as usize {
        frac.push('0');
    }
    format!("{whole}.{frac} {suffix}")
}

fn interval(bytes: u64) -> (u64, &'static str, usize) {
    match bytes {
        b if b > TERABYTE => (TERABYTE, "TB", 12),
        b if b > GIGABYTE => (GIGABYTE, "GB", 9),
        b if b > MEGABYTE => (MEGABYTE, "MB", 6),
        b if b > KILOBYTE => (KILOBYTE, "KB", 3),
        _ => (1, "B", 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bytes_below_a_kilobyte_keep_the_byte_suffix() {
        assert_eq!(human_size(12, 2), "12.00 B");
        assert_eq!(human_size(1_000, 2), "1000.00 B");
    }

    #[test]
    fn larger_sizes_pick_the_largest_exceeded_unit() {
        assert_eq!(human_size(1_500, 2), "1.50 KB");
        assert_eq!(human_size(1_050, 2), "1.05 KB");
        assert_eq!(human_size(1_500_000, 2), "1.50 MB");
        assert_eq!(human_size(2_000_000_001, 2), "2.00 GB");
        assert_eq!(human_size(3_500_000_000_000, 1), "3.5 TB");
    }

    #[test]
    fn zero_precision_drops_the_fraction() {
        assert_eq!(human_size(1_500, 0), "1 KB");
        assert_eq!(human_size(12, 0), "12 B");
    }

    #[test]
    fn precision_beyond_the_unit_is_zero_padded() {
        assert_eq!(human_size(1_500, 5), "1.50000 KB");
    }

    #[test]
    fn string_tables_include_headers_and_rows() {
        let rendered = render_string_table(
            &["Data", "Type"],
            vec![vec!["users".into(), "table(InnoDB, dynamic)".into()]],
            TableStyleKind::Ascii,
        );
        assert!(rendered.contains("Data"));
        assert!(rendered.contains("users"));
    }

    #[test]
    fn empty_tables_render_a_placeholder() {
        assert_eq!(render_string_table(&[], vec![], TableStyleKind::Plain), "<empty>");
    }
}
