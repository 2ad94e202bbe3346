use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

use crate::StorageError;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS himoku (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            code INTEGER NOT NULL,
            class_code INTEGER NOT NULL,
            is_income INTEGER NOT NULL DEFAULT 0,
            aggregate_flag INTEGER NOT NULL DEFAULT 1,
            alive INTEGER NOT NULL DEFAULT 1,
            is_default INTEGER NOT NULL DEFAULT 0,
            UNIQUE(name, class_code)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one fallback himoku system-wide.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_himoku_default ON himoku(is_default) WHERE is_default = 1",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS report_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            himoku_id INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            is_income INTEGER NOT NULL,
            calc_flg INTEGER NOT NULL DEFAULT 1,
            detail TEXT,
            memo TEXT,
            UNIQUE(date, himoku_id, is_income),
            FOREIGN KEY (himoku_id) REFERENCES himoku(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS passbook_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            amount INTEGER NOT NULL,
            counterpart TEXT NOT NULL,
            is_income INTEGER NOT NULL,
            is_netting INTEGER NOT NULL DEFAULT 0,
            needs_approval INTEGER NOT NULL DEFAULT 0,
            is_manualinput INTEGER NOT NULL DEFAULT 0,
            memo TEXT,
            UNIQUE(date, amount, counterpart)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS billing_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            name TEXT NOT NULL,
            amount INTEGER NOT NULL,
            UNIQUE(year, month, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS balance_sheets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            class_code INTEGER NOT NULL,
            bank_balance INTEGER NOT NULL,
            receivables INTEGER NOT NULL DEFAULT 0,
            prepaid INTEGER NOT NULL DEFAULT 0,
            payables INTEGER NOT NULL DEFAULT 0,
            unearned_revenue INTEGER NOT NULL DEFAULT 0,
            UNIQUE(year, month, class_code)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            payee TEXT NOT NULL,
            subject TEXT NOT NULL,
            amount INTEGER NOT NULL,
            UNIQUE(date, amount, payee)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS claims (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            claim_type TEXT NOT NULL,
            payer TEXT NOT NULL,
            detail TEXT,
            amount INTEGER NOT NULL,
            UNIQUE(year, month, claim_type, payer)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS frozen_periods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            UNIQUE(year, month)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_db_is_rerunnable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        let pool = create_db(&path).await.unwrap();
        drop(pool);
        // Migrations are IF NOT EXISTS; opening again must not fail.
        create_db(&path).await.unwrap();
    }
}
