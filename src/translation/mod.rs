use std::borrow::Cow;

mod parsers;
mod scanner;
mod statement;

use scanner::{SegmentKind, scan_digits, segments};
pub(crate) use statement::begin_statement;
pub use statement::{Statement, StatementKind, TranslatedStatement, translate_statement};

/// How to resolve translation for a call relative to the database default.
///
/// # Examples
/// ```rust
/// use catalog_db::prelude::*;
///
/// let options = QueryOptions::default()
///     .with_translation(TranslationMode::ForceOff);
/// assert!(!options.translation.resolve(true));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    /// Follow the database's default setting.
    PoolDefault,
    /// Force translation on, regardless of the default.
    ForceOn,
    /// Force translation off, regardless of the default.
    ForceOff,
}

impl TranslationMode {
    #[must_use]
    pub fn resolve(self, pool_default: bool) -> bool {
        match self {
            TranslationMode::PoolDefault => pool_default,
            TranslationMode::ForceOn => true,
            TranslationMode::ForceOff => false,
        }
    }
}

/// Per-call options for `run`/`get`/`all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub translation: TranslationMode,
    /// Append `RETURNING <id>` to plain inserts.
    pub auto_returning: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            translation: TranslationMode::PoolDefault,
            auto_returning: true,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn with_translation(mut self, translation: TranslationMode) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub fn without_returning(mut self) -> Self {
        self.auto_returning = false;
        self
    }
}

/// Rewrite SQLite-style `?` placeholders as Postgres `$N`.
///
/// Bare `?` markers are numbered left to right, each one past the highest number emitted so
/// far; numbered `?NNN` markers keep their number. Markers inside string literals, quoted
/// identifiers, comments and dollar-quoted bodies are left alone. Existing `$N` markers are
/// not touched.
///
/// ```rust
/// use catalog_db::prelude::*;
///
/// let sql = translate_placeholders("SELECT * FROM books WHERE title = '?' AND id = ?", true);
/// assert_eq!(sql, "SELECT * FROM books WHERE title = '?' AND id = $1");
/// ```
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_placeholders(sql: &str, enabled: bool) -> Cow<'_, str> {
    if !enabled || !sql.contains('?') {
        return Cow::Borrowed(sql);
    }

    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut highest: u64 = 0;

    for segment in segments(sql) {
        if segment.kind != SegmentKind::Code {
            if let Some(buf) = out.as_mut() {
                buf.push_str(&sql[segment.range]);
            }
            continue;
        }

        let mut copied = segment.range.start;
        let mut idx = segment.range.start;
        while idx < segment.range.end {
            if bytes[idx] != b'?' {
                idx += 1;
                continue;
            }
            let buf = out.get_or_insert_with(|| {
                let mut buf = String::with_capacity(sql.len() + 8);
                buf.push_str(&sql[..segment.range.start]);
                buf
            });
            buf.push_str(&sql[copied..idx]);
            match scan_digits(bytes, idx + 1) {
                Some((digits_end, digits)) => {
                    if let Ok(n) = digits.parse::<u64>() {
                        highest = highest.max(n);
                    }
                    buf.push('$');
                    buf.push_str(digits);
                    idx = digits_end;
                }
                None => {
                    highest += 1;
                    buf.push('$');
                    buf.push_str(&highest.to_string());
                    idx += 1;
                }
            }
            copied = idx;
        }
        if let Some(buf) = out.as_mut() {
            buf.push_str(&sql[copied..segment.range.end]);
        }
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_bare_markers_in_order() {
        let sql = "INSERT INTO users (name, email, password) VALUES (?, ?, ?)";
        let res = translate_placeholders(sql, true);
        assert_eq!(res, "INSERT INTO users (name, email, password) VALUES ($1, $2, $3)");
    }

    #[test]
    fn keeps_numbered_markers() {
        let sql = "select * from t where a = ?2 and b = ?1";
        let res = translate_placeholders(sql, true);
        assert_eq!(res, "select * from t where a = $2 and b = $1");
    }

    #[test]
    fn bare_marker_follows_highest_numbered() {
        let res = translate_placeholders("select ?3, ?, ?1, ?", true);
        assert_eq!(res, "select $3, $4, $1, $5");
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '?', \"q?\" -- ?\n/* ? */ from t where a = ?";
        let res = translate_placeholders(sql, true);
        assert_eq!(res, "select '?', \"q?\" -- ?\n/* ? */ from t where a = $1");
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "$foo$ select ? from t $foo$ where a = ?";
        let res = translate_placeholders(sql, true);
        assert_eq!(res, "$foo$ select ? from t $foo$ where a = $1");
    }

    #[test]
    fn keeps_multibyte_text_intact() {
        let sql = "select 'café ?', ? as naïve";
        let res = translate_placeholders(sql, true);
        assert_eq!(res, "select 'café ?', $1 as naïve");
    }

    #[test]
    fn untouched_sql_is_borrowed() {
        let sql = "select * from t where a = $1";
        assert!(matches!(translate_placeholders(sql, true), Cow::Borrowed(_)));
        let sql = "select '?' from t";
        assert!(matches!(translate_placeholders(sql, true), Cow::Borrowed(_)));
    }

    #[test]
    fn respects_disabled_flag() {
        let sql = "select * from t where a = ?";
        let res = translate_placeholders(sql, false);
        assert!(matches!(res, Cow::Borrowed(_)));
        assert_eq!(res, sql);
    }

    #[test]
    fn translating_twice_changes_nothing() {
        let once = translate_placeholders("update t set a = ? where b = ?", true).into_owned();
        let twice = translate_placeholders(&once, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn translation_mode_resolution() {
        assert!(TranslationMode::ForceOn.resolve(false));
        assert!(!TranslationMode::ForceOff.resolve(true));
        assert!(TranslationMode::PoolDefault.resolve(true));
        assert!(!TranslationMode::PoolDefault.resolve(false));
    }
}
