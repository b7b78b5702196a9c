mod ast;

pub use ast::*;

use common::{SizeError, SizeResult};
use sqlparser::ast as sqlast;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser as SqlParser;

/// Parse MySQL DDL text into the abstract statement stream.
///
/// Statements that carry no size information (DML, SET, USE, and friends)
/// are skipped. Identifier case is preserved; the schema model compares
/// names exactly.
pub fn parse_sql(sql: &str) -> SizeResult<Vec<Statement>> {
    let mut statements = Vec::new();
    for raw in split_statements(sql) {
        if let Some(statement) = parse_statement(&raw)? {
            statements.push(statement);
        }
    }
    Ok(statements)
}

fn parse_statement(raw: &str) -> SizeResult<Option<Statement>> {
    let mut tokens = tokenize(raw);
    if tokens.is_empty() {
        return Ok(None);
    }
    match (keyword(&tokens, 0).as_str(), keyword(&tokens, 1).as_str()) {
        ("CREATE", "DATABASE") | ("CREATE", "SCHEMA") => create_database(&tokens).map(Some),
        ("DROP", "DATABASE") | ("DROP", "SCHEMA") => drop_database(&tokens).map(Some),
        ("CREATE", "TABLE") | ("CREATE", "TEMPORARY") => create_table(&mut tokens).map(Some),
        ("DROP", "TABLE") => drop_table(&tokens).map(Some),
        ("ALTER", "TABLE") => alter_table(&tokens).map(Some),
        ("RENAME", "TABLE") => rename_table(&tokens).map(Some),
        ("CREATE", "INDEX") | ("CREATE", "UNIQUE") => Ok(create_index(&tokens)),
        _ => Ok(None),
    }
}

/// Table options captured by the pre-pass. The pinned grammar predates
/// `ROW_FORMAT` and the MySQL charset clauses, so they are read off the raw
/// token stream and re-attached to the mapped statement.
#[derive(Debug, Default)]
struct CapturedOptions {
    engine: Option<String>,
    row_format: Option<String>,
    charset: Option<String>,
}

fn create_database(tokens: &[String]) -> SizeResult<Statement> {
    // CREATE DATABASE [IF NOT EXISTS] name [DEFAULT CHARSET ...]
    let mut pos = 2;
    if keyword(tokens, pos) == "IF" {
        pos += 3;
    }
    let (name, next) = qualified_name(tokens, pos)
        .ok_or_else(|| SizeError::Parse("CREATE DATABASE without a database name".into()))?;
    let captured = capture_options(tokens, next);
    Ok(Statement::CreateDatabase {
        name,
        charset: captured.charset,
    })
}

fn drop_database(tokens: &[String]) -> SizeResult<Statement> {
    let mut pos = 2;
    if keyword(tokens, pos) == "IF" {
        pos += 2;
    }
    let (name, _) = qualified_name(tokens, pos)
        .ok_or_else(|| SizeError::Parse("DROP DATABASE without a database name".into()))?;
    Ok(Statement::DropDatabase { name })
}

fn drop_table(tokens: &[String]) -> SizeResult<Statement> {
    let mut pos = 2;
    if keyword(tokens, pos) == "IF" {
        pos += 2;
    }
    let (name, _) = qualified_name(tokens, pos)
        .ok_or_else(|| SizeError::Parse("DROP TABLE without a table name".into()))?;
    Ok(Statement::DropTable { name })
}

fn alter_table(tokens: &[String]) -> SizeResult<Statement> {
    let (name, _) = qualified_name(tokens, 2)
        .ok_or_else(|| SizeError::Parse("ALTER TABLE without a table name".into()))?;
    Ok(Statement::AlterTable { name })
}

fn rename_table(tokens: &[String]) -> SizeResult<Statement> {
    let malformed = || SizeError::Parse("RENAME TABLE expects `old TO new`".into());
    let (from, next) = qualified_name(tokens, 2).ok_or_else(malformed)?;
    if keyword(tokens, next) != "TO" {
        return Err(malformed());
    }
    let (to, _) = qualified_name(tokens, next + 1).ok_or_else(malformed)?;
    Ok(Statement::RenameTable { from, to })
}

/// CREATE INDEX touches an existing table, which for sizing purposes is the
/// same existence check ALTER TABLE performs.
fn create_index(tokens: &[String]) -> Option<Statement> {
    let on = tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case("on"))?;
    let (name, _) = qualified_name(tokens, on + 1)?;
    Some(Statement::AlterTable { name })
}

fn create_table(tokens: &mut Vec<String>) -> SizeResult<Statement> {
    // Everything after the column list is table options. The grammar only
    // understands a few of them, so the tail is captured here and dropped
    // from the text handed to the parser.
    let captured = match tokens.iter().rposition(|t| t.as_str() == ")") {
        Some(close) => {
            let captured = capture_options(tokens, close + 1);
            tokens.truncate(close + 1);
            captured
        }
        None => CapturedOptions::default(),
    };
    let sql = tokens.join(" ");
    let mut parsed = SqlParser::parse_sql(&MySqlDialect {}, &sql)
        .map_err(|err| SizeError::Parse(format!("SQL parse error: {err}")))?;
    if parsed.len() != 1 {
        return Err(SizeError::Parse(
            "expected a single CREATE TABLE statement".into(),
        ));
    }
    match parsed.remove(0) {
        sqlast::Statement::CreateTable {
            name,
            columns,
            constraints,
            ..
        } => map_create_table(&name, columns, &constraints, &captured),
        _ => Err(SizeError::Parse("expected a CREATE TABLE statement".into())),
    }
}

fn map_create_table(
    name: &sqlast::ObjectName,
    columns: Vec<sqlast::ColumnDef>,
    constraints: &[sqlast::TableConstraint],
    captured: &CapturedOptions,
) -> SizeResult<Statement> {
    let mut defs = Vec::with_capacity(columns.len());
    let mut inline_primary = Vec::new();
    for column in columns {
        let (type_name, length) = split_type(&column.data_type.to_string());
        let mut def = ColumnDef {
            name: column.name.value.clone(),
            type_name,
            length,
            charset: None,
            not_null: false,
        };
        for opt in &column.options {
            match &opt.option {
                sqlast::ColumnOption::NotNull => def.not_null = true,
                sqlast::ColumnOption::CharacterSet(charset) => {
                    def.charset = Some(charset.to_string());
                }
                sqlast::ColumnOption::Unique {
                    is_primary: true, ..
                } => inline_primary.push(column.name.value.clone()),
                _ => {}
            }
        }
        defs.push(def);
    }

    let mut keys = Vec::new();
    for constraint in constraints {
        match constraint {
            sqlast::TableConstraint::Unique {
                name,
                columns,
                is_primary,
                ..
            } => keys.push(KeyDef {
                name: name.as_ref().map(|n| n.value.clone()),
                columns: idents(columns),
                primary: *is_primary,
            }),
            sqlast::TableConstraint::Index { name, columns, .. } => keys.push(KeyDef {
                name: name.as_ref().map(|n| n.value.clone()),
                columns: idents(columns),
                primary: false,
            }),
            _ => {}
        }
    }
    if !inline_primary.is_empty() && !keys.iter().any(|k| k.primary) {
        keys.insert(
            0,
            KeyDef {
                name: None,
                columns: inline_primary,
                primary: true,
            },
        );
    }

    let mut options = Vec::new();
    if let Some(engine) = &captured.engine {
        options.push(format!("engine={engine}"));
    }
    if let Some(charset) = &captured.charset {
        options.push(format!("default charset={charset}"));
    }
    if let Some(row_format) = &captured.row_format {
        options.push(format!("row_format={row_format}"));
    }

    Ok(Statement::CreateTable {
        name: object_name(name)?,
        columns: defs,
        keys,
        options: options.join(" "),
    })
}

fn idents(idents: &[sqlast::Ident]) -> Vec<String> {
    idents.iter().map(|ident| ident.value.clone()).collect()
}

fn object_name(name: &sqlast::ObjectName) -> SizeResult<String> {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .ok_or_else(|| SizeError::Parse("invalid object name".into()))
}

/// Splits the grammar's rendered type ("VARCHAR(100)", "ENUM('a', 'b')",
/// "DOUBLE PRECISION") into a canonical name and declared size parameter.
/// For ENUM and SET the size parameter is the member count.
fn split_type(rendered: &str) -> (String, Option<u64>) {
    let (head, args) = match rendered.split_once('(') {
        Some((head, rest)) => (head, rest.rsplit_once(')').map_or(rest, |(inner, _)| inner)),
        None => (rendered, ""),
    };
    let name = head
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    let length = if name == "ENUM" || name == "SET" {
        Some(member_count(args))
    } else {
        args.split(',').next().and_then(|arg| arg.trim().parse().ok())
    };
    (name, length)
}

/// Counts comma-separated members, ignoring commas inside quoted values.
fn member_count(args: &str) -> u64 {
    if args.trim().is_empty() {
        return 0;
    }
    let mut count = 1;
    let mut quote: Option<char> = None;
    for ch in args.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(ch),
            (None, ',') => count += 1,
            (None, _) => {}
        }
    }
    count
}

/// Scans `key [=] value` options from `from` onward. First occurrence wins,
/// mirroring the options contract the schema builder applies.
fn capture_options(tokens: &[String], from: usize) -> CapturedOptions {
    let mut captured = CapturedOptions::default();
    let mut pos = from;
    while pos < tokens.len() {
        let (slot, value_at) = match keyword(tokens, pos).as_str() {
            "ENGINE" => (Slot::Engine, pos + 1),
            "ROW_FORMAT" => (Slot::RowFormat, pos + 1),
            "CHARSET" => (Slot::Charset, pos + 1),
            "CHARACTER" if keyword(tokens, pos + 1) == "SET" => (Slot::Charset, pos + 2),
            _ => {
                pos += 1;
                continue;
            }
        };
        let value_at = if tokens.get(value_at).is_some_and(|t| t.as_str() == "=") {
            value_at + 1
        } else {
            value_at
        };
        let value = tokens.get(value_at).map(|t| unquote(t));
        let target = match slot {
            Slot::Engine => &mut captured.engine,
            Slot::RowFormat => &mut captured.row_format,
            Slot::Charset => &mut captured.charset,
        };
        if target.is_none() {
            *target = value;
        }
        pos = value_at + 1;
    }
    captured
}

enum Slot {
    Engine,
    RowFormat,
    Charset,
}

fn keyword(tokens: &[String], pos: usize) -> String {
    tokens
        .get(pos)
        .map(|t| t.to_ascii_uppercase())
        .unwrap_or_default()
}

/// Reads a possibly qualified `db.table` name starting at `pos`, returning
/// the trailing identifier and the position after it.
fn qualified_name(tokens: &[String], pos: usize) -> Option<(String, usize)> {
    let mut raw = tokens.get(pos)?.clone();
    let mut next = pos + 1;
    while tokens.get(next).is_some_and(|t| t.as_str() == ".") {
        raw = tokens.get(next + 1)?.clone();
        next += 2;
    }
    // An unquoted qualified name arrives as one token.
    let name = if raw.starts_with('`') || raw.starts_with('"') {
        unquote(&raw)
    } else {
        match raw.rsplit_once('.') {
            Some((_, tail)) => unquote(tail),
            None => unquote(&raw),
        }
    };
    Some((name, next))
}

fn unquote(token: &str) -> String {
    let trimmed = token.trim();
    for quote in ['`', '\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            let inner = &trimmed[1..trimmed.len() - 1];
            let doubled = format!("{quote}{quote}");
            return inner.replace(&doubled, &quote.to_string());
        }
    }
    trimmed.to_string()
}

/// Splits raw SQL into statements on semicolons, ignoring separators inside
/// quoted strings and comments. Comments are blanked out, which also strips
/// MySQL `/*! ... */` version hints the grammar cannot digest.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;
    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == '\\' && (q == '\'' || q == '"') {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            } else if ch == q {
                if chars.peek() == Some(&q) {
                    if let Some(doubled) = chars.next() {
                        current.push(doubled);
                    }
                } else {
                    quote = None;
                }
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => {
                quote = Some(ch);
                current.push(ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
                current.push(' ');
            }
            '#' => {
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
                current.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                while let Some(inner) = chars.next() {
                    if inner == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        break;
                    }
                }
                current.push(' ');
            }
            ';' => statements.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        statements.push(current);
    }
    statements
}

/// Whitespace tokenization with quoted runs kept intact; parentheses, commas,
/// and `=` become their own tokens so options can be matched positionally.
fn tokenize(sql: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;
    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == '\\' && (q == '\'' || q == '"') {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            } else if ch == q {
                if chars.peek() == Some(&q) {
                    if let Some(doubled) = chars.next() {
                        current.push(doubled);
                    }
                } else {
                    quote = None;
                    tokens.push(std::mem::take(&mut current));
                }
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                quote = Some(ch);
                current.push(ch);
            }
            '(' | ')' | ',' | '=' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(ch.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
