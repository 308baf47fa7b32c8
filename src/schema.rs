use log::*;
use sqlx::SqlitePool;

/**
 * Table definitions, applied in order and safe to re-run against an existing database
 */
const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS questions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL CHECK (length(text) <= 200),
        pub_date TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS questions_pub_date ON questions (pub_date)",
    "CREATE TABLE IF NOT EXISTS choices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_id INTEGER NOT NULL REFERENCES questions (id) ON DELETE CASCADE,
        text TEXT NOT NULL CHECK (length(text) <= 200),
        votes INTEGER NOT NULL DEFAULT 0 CHECK (votes >= 0)
    )",
    "CREATE INDEX IF NOT EXISTS choices_question_id ON choices (question_id)",
];

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS.iter() {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    debug!("Schema applied ({} statements)", STATEMENTS.len());
    Ok(())
}
