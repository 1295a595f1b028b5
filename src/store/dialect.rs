//! SQL rendering for the statements the adapter issues.
//!
//! FileMaker reads and writes container fields through dedicated syntax
//! (`GetAs(field, 'code')`, `SET field = ? AS 'name'`, `CAST(field AS VARCHAR)`)
//! and refuses bound parameters in a few positions: the `AS` filename and the
//! `OFFSET`/`FETCH` bounds. Everything that ends up inlined in the SQL text is
//! either a validated integer or goes through [`sanitize_filename`] /
//! [`quote_literal`] first.
//!
//! SQLite and Postgres have no container type, so their dialects emulate one:
//! the payload lives in `<field>` (a BLOB / BYTEA column) and the stored
//! filename in a companion `<field>_ref` text column. `GetAs` becomes a
//! magic-number check on the payload, so asking for the wrong format yields
//! NULL exactly like FileMaker does.

use std::fmt::{self, Display};

use lazy_static::lazy_static;
use regex::Regex;

use crate::data_types::ContainerRef;
use crate::format::{Format, PROBE_ORDER};

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._\- ()]").unwrap();
}

/// Suffix of the companion column holding the filename in emulated stores.
pub const REFERENCE_COLUMN_SUFFIX: &str = "_ref";

/// Values bound as statement parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bind<'a> {
    Bytes(&'a [u8]),
    Integer(i64),
    Text(&'a str),
}

/// A rendered SQL statement and its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement<'a> {
    pub sql: String,
    pub binds: Vec<Bind<'a>>,
}

impl<'a> Statement<'a> {
    pub fn new(sql: String) -> Self {
        Self {
            sql,
            binds: Vec::new(),
        }
    }

    pub fn bind(mut self, value: Bind<'a>) -> Self {
        self.binds.push(value);
        self
    }
}

impl Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    FileMaker,
    Sqlite,
    Postgres,
}

impl Dialect {
    fn param(&self, position: usize) -> String {
        match self {
            Dialect::FileMaker | Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${position}"),
        }
    }

    fn reference_column(field: &str) -> String {
        format!("{field}{REFERENCE_COLUMN_SUFFIX}")
    }

    /// `UPDATE <table> SET <field> = ? AS '<filename>' WHERE id = ?`
    ///
    /// `filename` is expected to have been through [`sanitize_filename`].
    pub fn upload<'a>(
        &self,
        target: &ContainerRef,
        bytes: &'a [u8],
        filename: &'a str,
    ) -> Statement<'a> {
        match self {
            Dialect::FileMaker => Statement::new(format!(
                "UPDATE {} SET {} = ? AS {} WHERE id = ?",
                target.table,
                target.field,
                quote_literal(filename)
            ))
            .bind(Bind::Bytes(bytes))
            .bind(Bind::Integer(target.record_id)),
            Dialect::Sqlite | Dialect::Postgres => Statement::new(format!(
                "UPDATE {} SET {} = {}, {} = {} WHERE id = {}",
                target.table,
                target.field,
                self.param(1),
                Self::reference_column(&target.field),
                self.param(2),
                self.param(3)
            ))
            .bind(Bind::Bytes(bytes))
            .bind(Bind::Text(filename))
            .bind(Bind::Integer(target.record_id)),
        }
    }

    /// `SELECT GetAs(<field>, '<code>') FROM <table> WHERE id = ?`
    pub fn download(&self, target: &ContainerRef, format: &Format) -> Statement<'static> {
        let expression = match self {
            Dialect::FileMaker => format!(
                "GetAs({}, {})",
                target.field,
                quote_literal(format.dialect_code())
            ),
            Dialect::Sqlite | Dialect::Postgres => self.emulated_get_as(&target.field, format),
        };
        Statement::new(format!(
            "SELECT {expression} FROM {} WHERE id = {}",
            target.table,
            self.param(1)
        ))
        .bind(Bind::Integer(target.record_id))
    }

    /// `UPDATE <table> SET <field> = NULL WHERE id = ?`
    pub fn clear(&self, target: &ContainerRef) -> Statement<'static> {
        let assignments = match self {
            Dialect::FileMaker => format!("{} = NULL", target.field),
            Dialect::Sqlite | Dialect::Postgres => format!(
                "{} = NULL, {} = NULL",
                target.field,
                Self::reference_column(&target.field)
            ),
        };
        Statement::new(format!(
            "UPDATE {} SET {assignments} WHERE id = {}",
            target.table,
            self.param(1)
        ))
        .bind(Bind::Integer(target.record_id))
    }

    /// `SELECT CAST(<field> AS VARCHAR) FROM <table> WHERE id = ?`
    pub fn reference(&self, target: &ContainerRef) -> Statement<'static> {
        let expression = match self {
            Dialect::FileMaker => format!("CAST({} AS VARCHAR)", target.field),
            Dialect::Sqlite | Dialect::Postgres => format!(
                "CASE WHEN {} IS NULL THEN NULL ELSE {} END",
                target.field,
                Self::reference_column(&target.field)
            ),
        };
        Statement::new(format!(
            "SELECT {expression} FROM {} WHERE id = {}",
            target.table,
            self.param(1)
        ))
        .bind(Bind::Integer(target.record_id))
    }

    /// Write (or clear, with `None`) the MIME type kept next to a container.
    pub fn set_content_type<'a>(
        &self,
        target: &ContainerRef,
        column: &str,
        mime: Option<&'a str>,
    ) -> Statement<'a> {
        match mime {
            Some(mime) => Statement::new(format!(
                "UPDATE {} SET {column} = {} WHERE id = {}",
                target.table,
                self.param(1),
                self.param(2)
            ))
            .bind(Bind::Text(mime))
            .bind(Bind::Integer(target.record_id)),
            None => Statement::new(format!(
                "UPDATE {} SET {column} = NULL WHERE id = {}",
                target.table,
                self.param(1)
            ))
            .bind(Bind::Integer(target.record_id)),
        }
    }

    pub fn content_type(&self, target: &ContainerRef, column: &str) -> Statement<'static> {
        Statement::new(format!(
            "SELECT {column} FROM {} WHERE id = {}",
            target.table,
            self.param(1)
        ))
        .bind(Bind::Integer(target.record_id))
    }

    /// Page of rows with the bounds inlined as literals.
    pub fn select_page(
        &self,
        table: &str,
        sort_field: &str,
        direction: SortDirection,
        offset: u64,
        limit: u64,
    ) -> Statement<'static> {
        let order = format!("ORDER BY {sort_field} {}", direction.as_sql());
        let sql = match self {
            Dialect::FileMaker | Dialect::Postgres => format!(
                "SELECT * FROM {table} {order} OFFSET {offset} ROWS FETCH FIRST {limit} ROWS ONLY"
            ),
            Dialect::Sqlite => {
                format!("SELECT * FROM {table} {order} LIMIT {limit} OFFSET {offset}")
            }
        };
        Statement::new(sql)
    }

    pub fn count(&self, table: &str) -> Statement<'static> {
        Statement::new(format!("SELECT COUNT(*) FROM {table}"))
    }

    fn hex_prefix(&self, field: &str, length: usize) -> String {
        match self {
            Dialect::Postgres => {
                format!("upper(encode(substring({field} from 1 for {length}), 'hex'))")
            }
            _ => format!("hex(substr({field}, 1, {length}))"),
        }
    }

    fn signature_check(&self, field: &str, format: &Format) -> Option<String> {
        let signatures = magic_numbers(format);
        let length = signatures.first()?.len() / 2;
        let candidates = signatures
            .iter()
            .map(|s| format!("'{s}'"))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{} IN ({candidates})", self.hex_prefix(field, length)))
    }

    fn emulated_get_as(&self, field: &str, format: &Format) -> String {
        match format {
            // FILE only hands back content that isn't one of the typed formats
            Format::File => {
                let typed = PROBE_ORDER
                    .iter()
                    .filter_map(|f| self.signature_check(field, f))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                format!("CASE WHEN NOT ({typed}) THEN {field} END")
            }
            Format::Unrecognized(_) => match self {
                Dialect::Postgres => "CAST(NULL AS BYTEA)".to_string(),
                _ => "CAST(NULL AS BLOB)".to_string(),
            },
            typed => match self.signature_check(field, typed) {
                Some(check) => format!("CASE WHEN {check} THEN {field} END"),
                None => field.to_string(),
            },
        }
    }
}

/// Leading bytes identifying each typed format, as uppercase hex.
/// All signatures of one format have the same length.
fn magic_numbers(format: &Format) -> &'static [&'static str] {
    match format {
        Format::Png => &["89504E470D0A1A0A"],
        Format::Jpeg => &["FFD8FF"],
        // GIF87a / GIF89a
        Format::Gif => &["474946383761", "474946383961"],
        // Little / big endian
        Format::Tiff => &["49492A00", "4D4D002A"],
        // %PDF-
        Format::Pdf => &["255044462D"],
        Format::File | Format::Unrecognized(_) => &[],
    }
}

/// Wrap a value in single quotes, doubling any embedded quote.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Make a caller supplied filename safe to inline into SQL text.
///
/// Characters outside `[A-Za-z0-9._-]`, space and parentheses are replaced
/// with `_`. An empty name falls back to `default`.
pub fn sanitize_filename(filename: Option<&str>, default: &str) -> String {
    match filename.map(str::trim) {
        Some(name) if !name.is_empty() => {
            UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned()
        }
        _ => default.to_string(),
    }
}
