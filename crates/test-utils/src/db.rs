//! Throwaway PostgreSQL databases for docflow integration tests.
//!
//! Each test gets its own database, created from an admin connection, migrated
//! with the docflow schema, and dropped again when the test body succeeds.
//! Failed tests keep their database for inspection, as does any run with
//! `TEST_KEEP_DB` set.
//!
//! Requirements:
//! - env var `TEST_ADMIN_DATABASE_URL` (or a `.env` file defining it) pointing
//!   to a database whose user may `CREATE DATABASE` and `DROP DATABASE`.

use std::{future::Future, pin::Pin};

use anyhow::{Context, Result};
use sqlx::{Connection, Executor, PgConnection, PgPool, postgres::PgPoolOptions};
use url::Url;
use uuid::Uuid;

/// Postgres identifier length limit in bytes.
const MAX_IDENT_LEN: usize = 63;
const DB_PREFIX: &str = "docflow_";

/// Pool size per test database. Concurrency tests need at least two.
const POOL_SIZE: u32 = 5;

fn admin_url() -> Result<String> {
    dotenvy::from_filename(".env").ok();
    std::env::var("TEST_ADMIN_DATABASE_URL")
        .context("TEST_ADMIN_DATABASE_URL must be set for database tests")
}

/// Run `f` against a freshly migrated database named after `test_name`.
///
/// The database is dropped if `f` returns `Ok` and `TEST_KEEP_DB` is unset.
/// A panic inside `f` skips cleanup entirely.
pub async fn with_test_db<F, T>(test_name: &str, f: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a PgPool) -> Pin<Box<dyn Future<Output = Result<T>> + 'a>>,
{
    let admin_url = admin_url()?;
    let mut admin_conn = PgConnection::connect(&admin_url)
        .await
        .context("connecting to admin database")?;

    let db_name = make_db_name(test_name);
    admin_conn
        .execute(format!(r#"CREATE DATABASE "{db_name}""#).as_str())
        .await?;

    let mut db_url = Url::parse(&admin_url)?;
    db_url.set_path(&format!("/{db_name}"));

    let pool = PgPoolOptions::new()
        .max_connections(POOL_SIZE)
        .connect(db_url.as_str())
        .await?;

    // Path is relative to this crate's manifest directory.
    sqlx::migrate!("../docflow/migrations").run(&pool).await?;

    let result = f(&pool).await;
    let keep = std::env::var("TEST_KEEP_DB").is_ok();

    if result.is_ok() && !keep {
        pool.close().await;

        match admin_conn
            .execute(format!(r#"DROP DATABASE IF EXISTS "{db_name}" WITH (FORCE)"#).as_str())
            .await
        {
            Ok(_) => eprintln!("[with_test_db] Dropped database '{db_name}'"),
            Err(e) => eprintln!("[with_test_db] Failed to drop database '{db_name}': {e}"),
        }
    } else {
        eprintln!("[with_test_db] Keeping database '{db_name}' (error or TEST_KEEP_DB set)");
    }

    result
}

/// `docflow_<sanitized test name>_<uuid>`, kept within the identifier limit.
fn make_db_name(test_name: &str) -> String {
    let sanitized: String = test_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let mut safe = sanitized.trim_matches('_').to_owned();

    // "_" + 32-char simple uuid
    let suffix_len = 1 + 32;
    let max_safe_len = MAX_IDENT_LEN
        .saturating_sub(DB_PREFIX.len())
        .saturating_sub(suffix_len);
    safe.truncate(max_safe_len);

    format!("{DB_PREFIX}{safe}_{}", Uuid::now_v7().simple())
}

/// Define a database-backed async test.
///
/// ```ignore
/// use test_utils::db_test;
///
/// db_test!(creates_document, |pool| {
///     // `pool` is &PgPool with the docflow schema applied
///     let store = docflow::PgStore::new(pool.clone());
///     Ok(())
/// });
/// ```
///
/// Expands to a `#[tokio::test(flavor = "multi_thread")]` returning
/// `anyhow::Result<()>` that runs the body through [`with_test_db`].
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$pool:ident| $body:block) => {
        #[tokio::test(flavor = "multi_thread")]
        async fn $name() -> anyhow::Result<()> {
            use $crate::db::with_test_db;

            with_test_db(stringify!($name), |$pool| {
                let fut = async move { $body };
                Box::pin(fut)
            })
            .await
        }
    };
}
