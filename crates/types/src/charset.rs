/// Charset used when neither the column nor its database declares one.
pub const DEFAULT_CHARSET: &str = "latin1";

/// Bytes consumed per character under the named MySQL charset.
///
/// Unknown names yield 0, so columns keyed to a charset this table does not
/// know contribute no character width. That is an approximation, not an
/// error.
pub fn charset_width(name: &str) -> u64 {
    match name.to_ascii_lowercase().as_str() {
        "armscii8" => 1,
        "ascii" => 1,
        "big5" => 2,
        "binary" => 1,
        "cp1250" => 1,
        "cp1251" => 1,
        "cp1256" => 1,
        "cp1257" => 1,
        "cp850" => 1,
        "cp852" => 1,
        "cp866" => 1,
        "cp932" => 2,
        "dec8" => 1,
        "eucjpms" => 3,
        "euckr" => 2,
        "gb18030" => 4,
        "gb2312" => 2,
        "gbk" => 2,
        "geostd8" => 1,
        "greek" => 1,
        "hebrew" => 1,
        "hp8" => 1,
        "keybcs2" => 1,
        "koi8r" => 1,
        "koi8u" => 1,
        "latin1" => 1,
        "latin2" => 1,
        "latin5" => 1,
        "latin7" => 1,
        "macce" => 1,
        "macroman" => 1,
        "sjis" => 2,
        "swe7" => 1,
        "tis620" => 1,
        "ucs2" => 2,
        "ujis" => 3,
        "utf16" => 4,
        "utf16le" => 4,
        "utf32" => 4,
        "utf8" => 3,
        "utf8mb4" => 4,
        _ => 0,
    }
}

/// Applies the column charset precedence: the column-level override wins,
/// then the database default, then [`DEFAULT_CHARSET`]. The result is
/// normalized to lowercase and never empty.
pub fn resolve_charset(column: Option<&str>, database: &str) -> String {
    let chosen = match column {
        Some(charset) if !charset.is_empty() => charset,
        _ if !database.is_empty() => database,
        _ => DEFAULT_CHARSET,
    };
    chosen.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_match_documented_values() {
        assert_eq!(charset_width("latin1"), 1);
        assert_eq!(charset_width("utf8"), 3);
        assert_eq!(charset_width("utf8mb4"), 4);
        assert_eq!(charset_width("sjis"), 2);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(charset_width("Latin1"), 1);
        assert_eq!(charset_width("UTF8MB4"), 4);
    }

    #[test]
    fn unknown_charset_has_no_width() {
        assert_eq!(charset_width("klingon"), 0);
        assert_eq!(charset_width(""), 0);
    }

    #[test]
    fn resolution_prefers_column_then_database_then_default() {
        assert_eq!(resolve_charset(Some("UTF8"), "latin2"), "utf8");
        assert_eq!(resolve_charset(None, "latin2"), "latin2");
        assert_eq!(resolve_charset(Some(""), "latin2"), "latin2");
        assert_eq!(resolve_charset(None, ""), DEFAULT_CHARSET);
    }
}
