use catalog_db::bootstrap::BOOTSTRAP_SQL;
use catalog_db::prelude::*;
use catalog_db::test_utils::{RecordingPool, Scripted};
use tokio::sync::OnceCell;

#[tokio::test]
async fn connect_twice_bootstraps_once() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    let cell: OnceCell<Database<RecordingPool>> = OnceCell::new();

    for _ in 0..2 {
        let source = pool.clone();
        let db = connect_database_in(&cell, || async move { Ok(Database::with_source(source)) })
            .await?;
        db.ensure_bootstrapped().await?;
    }

    assert_eq!(pool.count_matching("CREATE TABLE IF NOT EXISTS users"), 1);
    assert_eq!(pool.statements(), vec![BOOTSTRAP_SQL.to_string()]);
    Ok(())
}

#[tokio::test]
async fn concurrent_first_connects_bootstrap_once() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    let cell: OnceCell<Database<RecordingPool>> = OnceCell::new();

    let make = |source: RecordingPool| move || async move { Ok(Database::with_source(source)) };
    let (a, b) = tokio::join!(
        connect_database_in(&cell, make(pool.clone())),
        connect_database_in(&cell, make(pool.clone())),
    );
    assert!(std::ptr::eq(a?, b?));
    assert_eq!(pool.count_matching("CREATE TABLE IF NOT EXISTS users"), 1);
    Ok(())
}

#[tokio::test]
async fn bootstrap_can_be_disabled() -> Result<(), CatalogDbError> {
    let pool = RecordingPool::new();
    let cell: OnceCell<Database<RecordingPool>> = OnceCell::new();
    let source = pool.clone();
    connect_database_in(&cell, || async move {
        Ok(Database::with_source(source).with_auto_bootstrap(false))
    })
    .await?;
    assert!(pool.statements().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_bootstrap_is_retried() {
    let pool = RecordingPool::new();
    pool.on("CREATE TABLE", Scripted::Error("permission denied".into()));
    let db = Database::with_source(pool.clone());

    assert!(db.ensure_bootstrapped().await.is_err());
    assert!(db.ensure_bootstrapped().await.is_err());
    assert_eq!(pool.statements().len(), 2);
}
