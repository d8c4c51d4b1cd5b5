use catalog_db::prelude::*;

fn rewrite(sql: &str) -> TranslatedStatement<'_> {
    translate_statement(sql, StatementKind::classify(sql), Some("id"), true)
}

#[test]
fn select_placeholders_are_renumbered() {
    let out = rewrite("SELECT * FROM users WHERE id = ?");
    assert_eq!(out.text, "SELECT * FROM users WHERE id = $1");
    assert_eq!(out.kind, StatementKind::Select);
    assert_eq!(out.returning, None);
}

#[test]
fn insert_or_ignore_gets_conflict_clause_and_no_returning() {
    let out = rewrite("INSERT OR IGNORE INTO author_books (a,b,c) VALUES (?,?,?)");
    assert_eq!(
        out.text,
        "INSERT INTO author_books (a,b,c) VALUES ($1,$2,$3) ON CONFLICT DO NOTHING"
    );
    assert_eq!(out.returning, None);
}

#[test]
fn plain_insert_gets_returning_id() {
    let out = rewrite("INSERT INTO users (name,email,password) VALUES (?,?,?)");
    assert_eq!(
        out.text,
        "INSERT INTO users (name,email,password) VALUES ($1,$2,$3) RETURNING id"
    );
    assert_eq!(out.returning.as_deref(), Some("id"));
}

#[test]
fn literals_comments_and_dollar_quotes_keep_their_question_marks() {
    let sql = "UPDATE books SET description = 'Why? Because.' /* ? */ \
               WHERE title = $$Who?$$ AND id = ? -- ?";
    let out = rewrite(sql);
    assert_eq!(
        out.text,
        "UPDATE books SET description = 'Why? Because.' /* ? */ \
         WHERE title = $$Who?$$ AND id = $1 -- ?"
    );
}

#[test]
fn classification_ignores_case_and_leading_comments() {
    assert_eq!(
        StatementKind::classify("-- add a book\n  insert INTO books (title) values (?)"),
        StatementKind::Insert
    );
    assert_eq!(
        StatementKind::classify("/* tx */ begin transaction"),
        StatementKind::Begin
    );
    let out = rewrite("SELECT 'INSERT INTO users' AS note FROM books WHERE id = ?");
    assert_eq!(out.kind, StatementKind::Select);
    assert!(!out.text.contains("RETURNING"));
}

#[test]
fn structured_statement_overrides_inference() {
    let stmt = Statement::with_kind(
        StatementKind::InsertOrIgnore,
        "INSERT INTO tags (name) VALUES (?)",
        vec![RowValues::from("scifi")],
    );
    let out = translate_statement(&stmt.query, stmt.kind, Some("id"), true);
    assert_eq!(out.text, "INSERT INTO tags (name) VALUES ($1) ON CONFLICT DO NOTHING");
    assert_eq!(stmt.params, vec![RowValues::Text("scifi".into())]);
}
