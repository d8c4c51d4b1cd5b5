use catalog_db::prelude::*;
use catalog_db::test_utils::{RecordingPool, Scripted, Target};

fn id_rows(id: i64) -> Scripted {
    Scripted::Rows(ResultSet::from_rows(
        vec!["id".into()],
        vec![vec![RowValues::Int(id)]],
    ))
}

#[test]
fn insert_reports_last_id_and_changes() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let pool = RecordingPool::new();
        pool.on("RETURNING id", id_rows(123));
        let db = Database::with_source(pool.clone());

        let params = vec![
            RowValues::from("A"),
            RowValues::from("a@b.com"),
            RowValues::from("pw"),
        ];
        let result = db
            .run("INSERT INTO users (name,email,password) VALUES (?,?,?)", &params)
            .await?;

        assert_eq!(
            result,
            RunResult {
                last_id: Some(123),
                changes: 1
            }
        );
        let executed = pool.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0].sql,
            "INSERT INTO users (name,email,password) VALUES ($1,$2,$3) RETURNING id"
        );
        assert_eq!(executed[0].params, params);
        assert_eq!(executed[0].target, Target::Pool);
        Ok::<(), CatalogDbError>(())
    })?;
    Ok(())
}

#[tokio::test]
async fn insert_or_ignore_reports_changes_only() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    pool.on("ON CONFLICT DO NOTHING", Scripted::Affected(0));
    let db = Database::with_source(pool.clone());

    let params = [RowValues::Int(10), RowValues::Int(20), RowValues::Int(1)];
    let result = db
        .run(
            "INSERT OR IGNORE INTO author_books (a,b,c) VALUES (?,?,?)",
            &params,
        )
        .await?;

    assert_eq!(result, RunResult::default());
    assert_eq!(
        pool.statements(),
        vec!["INSERT INTO author_books (a,b,c) VALUES ($1,$2,$3) ON CONFLICT DO NOTHING"]
    );
    assert_eq!(pool.executed()[0].params, params.to_vec());
    Ok(())
}

#[tokio::test]
async fn update_reports_affected_rows() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    pool.on("UPDATE books", Scripted::Affected(2));
    let db = Database::with_source(pool.clone());

    let result = db
        .run(
            "UPDATE books SET title = ? WHERE id IN (?, ?)",
            &["New".into(), RowValues::Int(1), RowValues::Int(2)],
        )
        .await?;
    assert_eq!(result.changes, 2);
    assert_eq!(result.last_id, None);
    assert_eq!(pool.statements(), vec!["UPDATE books SET title = $1 WHERE id IN ($2, $3)"]);
    Ok(())
}

#[tokio::test]
async fn all_on_no_rows_is_empty() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    let db = Database::with_source(pool.clone());

    let params = [RowValues::from("Nobody")];
    let rows = db.all("SELECT * FROM authors WHERE name = ?", &params).await?;
    assert!(rows.is_empty());
    assert_eq!(pool.executed()[0].params, params.to_vec());

    let row = db.get("SELECT * FROM authors WHERE name = ?", &params).await?;
    assert!(row.is_none());
    Ok(())
}

#[tokio::test]
async fn get_returns_first_row() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    pool.on(
        "FROM books",
        Scripted::Rows(ResultSet::from_rows(
            vec!["id".into(), "title".into()],
            vec![
                vec![RowValues::Int(1), RowValues::from("Dune")],
                vec![RowValues::Int(2), RowValues::from("Emma")],
            ],
        )),
    );
    let db = Database::with_source(pool);

    let row = db.get("SELECT id, title FROM books ORDER BY id", &[]).await?;
    let title = row.as_ref().and_then(|r| r.get("title")).and_then(RowValues::as_text);
    assert_eq!(title, Some("Dune"));

    let rows = db.all("SELECT id, title FROM books ORDER BY id", &[]).await?;
    assert_eq!(rows.len(), 2);
    Ok(())
}

#[tokio::test]
async fn control_statements_are_refused_at_pool_level() {
    let pool = RecordingPool::new();
    let db = Database::with_source(pool.clone());

    for sql in ["BEGIN TRANSACTION", "COMMIT", "rollback"] {
        let err = db.run(sql, &[]).await.unwrap_err();
        assert!(matches!(err, CatalogDbError::TransactionError(_)), "{sql}");
    }
    assert!(pool.executed().is_empty());
    assert_eq!(pool.checkouts(), 0);
}

#[tokio::test]
async fn driver_errors_pass_through() {
    let pool = RecordingPool::new();
    pool.on("INSERT INTO users", Scripted::Error("duplicate key".into()));
    let db = Database::with_source(pool);

    let err = db
        .run("INSERT INTO users (email) VALUES (?)", &[RowValues::from("a@b.com")])
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogDbError::ExecutionError(ref m) if m == "duplicate key"));
    assert!(!err.is_unique_violation());
}

#[tokio::test]
async fn per_call_options() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    let db = Database::with_source(pool.clone()).with_dialect(DialectOptions {
        translate: false,
        ..DialectOptions::default()
    });

    db.run("SELECT ?", &[RowValues::Int(1)]).await?;
    db.query("SELECT ?")
        .params(&[RowValues::Int(1)])
        .translation(TranslationMode::ForceOn)
        .run()
        .await?;
    db.query("INSERT INTO author_books (author_id, book_id) VALUES (?, ?)")
        .params(&[RowValues::Int(1), RowValues::Int(2)])
        .options(QueryOptions::default().with_translation(TranslationMode::ForceOn))
        .without_returning()
        .run()
        .await?;

    assert_eq!(
        pool.statements(),
        vec![
            "SELECT ?",
            "SELECT $1",
            "INSERT INTO author_books (author_id, book_id) VALUES ($1, $2)",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn structured_statement_runs_through_execute() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    let db = Database::with_source(pool.clone());

    let stmt = Statement::new(
        "INSERT INTO author_books (author_id, book_id) VALUES (?, ?)",
        vec![RowValues::Int(3), RowValues::Int(4)],
    )
    .without_returning();
    db.execute(&stmt).await?;

    assert_eq!(
        pool.statements(),
        vec!["INSERT INTO author_books (author_id, book_id) VALUES ($1, $2)"]
    );
    Ok(())
}

#[tokio::test]
async fn execute_reports_driver_row_count_for_writes() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    pool.on("UPDATE books", Scripted::Affected(2));
    pool.on(
        "DELETE FROM books",
        Scripted::Rows(ResultSet::from_rows(
            vec!["id".into()],
            vec![vec![RowValues::Int(5)]],
        )),
    );
    let db = Database::with_source(pool.clone());

    let update = Statement::new(
        "UPDATE books SET title = ? WHERE id IN (?, ?)",
        vec![RowValues::from("New"), RowValues::Int(1), RowValues::Int(2)],
    );
    let result = db.execute(&update).await?;
    assert!(result.is_empty());
    assert_eq!(result.rows_affected, 2);

    let mut tx = db.begin_transaction().await?;
    assert_eq!(tx.execute(&update).await?.rows_affected, 2);
    tx.commit().await?;

    let delete = Statement::new(
        "DELETE FROM books WHERE id = ? RETURNING id",
        vec![RowValues::Int(5)],
    );
    let result = db.execute(&delete).await?;
    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.first().and_then(|r| r.get("id")), Some(&RowValues::Int(5)));
    Ok(())
}
