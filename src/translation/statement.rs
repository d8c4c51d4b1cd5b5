use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use super::scanner::{Word, clause_end, segments, words};
use super::translate_placeholders;
use crate::types::RowValues;

/// What a statement does, as far as translation and transaction routing care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    /// `INSERT INTO ...`; gets `RETURNING <id>` appended.
    Insert,
    /// `INSERT OR IGNORE INTO ...`; becomes `INSERT INTO ... ON CONFLICT DO NOTHING`.
    InsertOrIgnore,
    Update,
    Delete,
    /// `BEGIN`, `BEGIN TRANSACTION`, `START TRANSACTION`.
    Begin,
    /// `COMMIT`, `END`.
    Commit,
    /// `ROLLBACK` (but not `ROLLBACK TO SAVEPOINT`).
    Rollback,
    Other,
}

impl StatementKind {
    /// True for statements that open or close a transaction.
    #[must_use]
    pub fn is_transaction_control(self) -> bool {
        matches!(
            self,
            StatementKind::Begin | StatementKind::Commit | StatementKind::Rollback
        )
    }

    /// Classify `sql` by its leading keywords.
    ///
    /// Matching is case-insensitive and skips leading whitespace and comments, so
    /// `SELECT 'INSERT INTO ...'` stays a `Select`.
    ///
    /// ```rust
    /// use catalog_db::prelude::*;
    ///
    /// assert_eq!(StatementKind::classify("insert or ignore into t values (?)"), StatementKind::InsertOrIgnore);
    /// assert_eq!(StatementKind::classify("/* audit */ BEGIN TRANSACTION"), StatementKind::Begin);
    /// assert_eq!(StatementKind::classify("SELECT 'INSERT INTO x'"), StatementKind::Select);
    /// ```
    #[must_use]
    pub fn classify(sql: &str) -> StatementKind {
        let segs = segments(sql);
        let found = words(sql, &segs);
        classify_words(&found)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::InsertOrIgnore => "INSERT OR IGNORE",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Begin => "BEGIN",
            StatementKind::Commit => "COMMIT",
            StatementKind::Rollback => "ROLLBACK",
            StatementKind::Other => "statement",
        };
        f.write_str(label)
    }
}

fn classify_words(found: &[Word<'_>]) -> StatementKind {
    let keyword = |i: usize, kw: &str| found.get(i).is_some_and(|w| w.is(kw));

    let Some(first) = found.first() else {
        return StatementKind::Other;
    };

    if first.is("SELECT") || first.is("WITH") || first.is("VALUES") || first.is("TABLE") {
        StatementKind::Select
    } else if first.is("INSERT") {
        if keyword(1, "INTO") {
            StatementKind::Insert
        } else if keyword(1, "OR") && keyword(2, "IGNORE") && keyword(3, "INTO") {
            StatementKind::InsertOrIgnore
        } else {
            StatementKind::Other
        }
    } else if first.is("UPDATE") {
        StatementKind::Update
    } else if first.is("DELETE") {
        StatementKind::Delete
    } else if first.is("BEGIN") || (first.is("START") && keyword(1, "TRANSACTION")) {
        StatementKind::Begin
    } else if first.is("COMMIT") || first.is("END") {
        StatementKind::Commit
    } else if first.is("ROLLBACK") {
        if found.iter().skip(1).any(|w| w.is("TO")) {
            StatementKind::Other
        } else {
            StatementKind::Rollback
        }
    } else {
        StatementKind::Other
    }
}

/// A statement with an explicit kind, so callers need not rely on text inference.
///
/// ```rust
/// use catalog_db::prelude::*;
///
/// let stmt = Statement::with_kind(
///     StatementKind::InsertOrIgnore,
///     "INSERT INTO author_books (author_id, book_id, position) VALUES (?, ?, ?)",
///     vec![RowValues::Int(10), RowValues::Int(20), RowValues::Int(1)],
/// );
/// assert!(stmt.auto_returning);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub query: String,
    pub params: Vec<RowValues>,
    /// Whether an `Insert` may get `RETURNING <id>` appended.
    pub auto_returning: bool,
}

impl Statement {
    /// Build a statement, classifying it from its text.
    pub fn new(query: impl Into<String>, params: Vec<RowValues>) -> Self {
        let query = query.into();
        Self {
            kind: StatementKind::classify(&query),
            query,
            params,
            auto_returning: true,
        }
    }

    /// Build a statement with a caller-declared kind.
    pub fn with_kind(kind: StatementKind, query: impl Into<String>, params: Vec<RowValues>) -> Self {
        Self {
            kind,
            query: query.into(),
            params,
            auto_returning: true,
        }
    }

    /// Keep an `INSERT` as written; use for tables without an `id` column.
    #[must_use]
    pub fn without_returning(mut self) -> Self {
        self.auto_returning = false;
        self
    }
}

/// A statement rewritten for Postgres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedStatement<'a> {
    pub text: Cow<'a, str>,
    pub kind: StatementKind,
    /// Column holding the generated key when the statement returns one.
    pub returning: Option<String>,
}

impl TranslatedStatement<'_> {
    /// False for writes that only report a row count.
    #[must_use]
    pub fn returns_rows(&self) -> bool {
        match self.kind {
            StatementKind::Insert
            | StatementKind::InsertOrIgnore
            | StatementKind::Update
            | StatementKind::Delete => {
                self.returning.is_some() || has_keyword(&self.text, "RETURNING")
            }
            _ => true,
        }
    }
}

/// Rewrite one SQLite-flavored statement into Postgres SQL.
///
/// With `enabled` false, or for transaction control, the text passes through untouched.
/// Otherwise `?` placeholders are renumbered, `INSERT OR IGNORE` becomes
/// `INSERT ... ON CONFLICT DO NOTHING`, and a plain `INSERT` gets
/// `RETURNING <returning_column>` unless it already returns something.
///
/// ```rust
/// use catalog_db::prelude::*;
///
/// let out = translate_statement(
///     "INSERT INTO users (name, email, password) VALUES (?, ?, ?);",
///     StatementKind::Insert,
///     Some("id"),
///     true,
/// );
/// assert_eq!(out.text, "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING id;");
/// assert_eq!(out.returning.as_deref(), Some("id"));
/// ```
#[must_use]
pub fn translate_statement<'a>(
    sql: &'a str,
    kind: StatementKind,
    returning_column: Option<&str>,
    enabled: bool,
) -> TranslatedStatement<'a> {
    if !enabled || kind.is_transaction_control() {
        let returning = match (kind, returning_column) {
            (StatementKind::Insert, Some(col)) if has_keyword(sql, "RETURNING") => {
                Some(col.to_string())
            }
            _ => None,
        };
        return TranslatedStatement {
            text: Cow::Borrowed(sql),
            kind,
            returning,
        };
    }

    let text = translate_placeholders(sql, true);
    match kind {
        StatementKind::InsertOrIgnore => TranslatedStatement {
            text: Cow::Owned(rewrite_insert_or_ignore(&text)),
            kind,
            returning: None,
        },
        StatementKind::Insert => {
            let Some(col) = returning_column else {
                return TranslatedStatement {
                    text,
                    kind,
                    returning: None,
                };
            };
            if has_keyword(&text, "RETURNING") {
                return TranslatedStatement {
                    text,
                    kind,
                    returning: Some(col.to_string()),
                };
            }
            let appended = append_clause(&text, &format!(" RETURNING {col}"));
            TranslatedStatement {
                text: Cow::Owned(appended),
                kind,
                returning: Some(col.to_string()),
            }
        }
        _ => TranslatedStatement {
            text,
            kind,
            returning: None,
        },
    }
}

/// The text that opens a transaction for a `Begin` statement.
///
/// SQLite's `DEFERRED`, `IMMEDIATE` and `EXCLUSIVE` modes have no Postgres counterpart
/// and collapse to a plain `BEGIN`; anything else, such as `ISOLATION LEVEL` or
/// `READ ONLY`, is sent as written.
pub(crate) fn begin_statement(sql: &str) -> &str {
    let segs = segments(sql);
    let found = words(sql, &segs);
    let sqlite_mode = found
        .get(1)
        .is_some_and(|w| w.is("DEFERRED") || w.is("IMMEDIATE") || w.is("EXCLUSIVE"));
    if sqlite_mode { "BEGIN" } else { sql.trim() }
}

fn has_keyword(sql: &str, keyword: &str) -> bool {
    let segs = segments(sql);
    words(sql, &segs).iter().any(|w| w.is(keyword))
}

fn rewrite_insert_or_ignore(sql: &str) -> String {
    let segs = segments(sql);
    let found = words(sql, &segs);

    // drop `OR IGNORE` between INSERT and INTO, keeping the surrounding whitespace
    let stripped = match found.as_slice() {
        [insert, or, ignore, into, ..]
            if insert.is("INSERT") && or.is("OR") && ignore.is("IGNORE") && into.is("INTO") =>
        {
            format!("{}{}", &sql[..insert.end], &sql[ignore.end..])
        }
        _ => sql.to_string(),
    };

    let segs = segments(&stripped);
    let found = words(&stripped, &segs);
    let has_on_conflict = found
        .windows(2)
        .any(|pair| pair[0].is("ON") && pair[1].is("CONFLICT"));
    if has_on_conflict {
        stripped
    } else {
        append_clause(&stripped, " ON CONFLICT DO NOTHING")
    }
}

/// Insert `clause` after the last meaningful token, ahead of any trailing `;` or comment.
fn append_clause(sql: &str, clause: &str) -> String {
    let segs = segments(sql);
    let at = clause_end(sql, &segs);
    let mut out = String::with_capacity(sql.len() + clause.len());
    out.push_str(&sql[..at]);
    out.push_str(clause);
    out.push_str(&sql[at..]);
    out
}
