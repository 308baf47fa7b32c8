use chrono::{DateTime, Utc};
use log::*;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::models::{Choice, NewQuestion, Question};

/**
 * How long a connection waits for another writer to release the database
 */
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/**
 * Ways a vote submission can fail
 */
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("No question matches the given query")]
    NotFound,
    #[error("No choice was selected")]
    MissingSelection,
    #[error("The selected choice does not belong to the question")]
    InvalidChoice,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/**
 * The Store owns the connection pool and every query the application runs
 */
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /**
     * Construct the SQLite connection pool and make sure the tables exist.
     *
     * Pooled connections share one database file, so writers wait on each other through the
     * busy timeout and readers never block them under WAL.
     */
    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        if config.database_url.contains(":memory:") {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /**
     * A private database that lives as long as the store.
     *
     * Every SQLite connection to `:memory:` opens a fresh database, so the pool is pinned to a
     * single connection that is never reaped.
     */
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        crate::schema::migrate(&pool).await?;
        Ok(Store { pool })
    }

    /**
     * Insert the question and all of its choices, or nothing at all
     */
    pub async fn create_question(
        &self,
        new: &NewQuestion,
    ) -> Result<(Question, Vec<Choice>), sqlx::Error> {
        let pub_date = new.pub_date.unwrap_or_else(Utc::now);
        let mut tx = self.pool.begin().await?;

        let question = sqlx::query_as::<_, Question>(
            "INSERT INTO questions (text, pub_date) VALUES ($1, $2) RETURNING id, text, pub_date",
        )
        .bind(&new.text)
        .bind(pub_date)
        .fetch_one(&mut *tx)
        .await?;

        let mut choices = Vec::with_capacity(new.choices.len());
        for text in new.choices.iter() {
            let choice = sqlx::query_as::<_, Choice>(
                "INSERT INTO choices (question_id, text) VALUES ($1, $2)
                 RETURNING id, question_id, text, votes",
            )
            .bind(question.id)
            .bind(text)
            .fetch_one(&mut *tx)
            .await?;
            choices.push(choice);
        }

        tx.commit().await?;
        debug!("inserted: {:?} with {} choices", question, choices.len());
        Ok((question, choices))
    }

    pub async fn question(&self, id: i64) -> Result<Option<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>("SELECT id, text, pub_date FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn choices(&self, question_id: i64) -> Result<Vec<Choice>, sqlx::Error> {
        sqlx::query_as::<_, Choice>(
            "SELECT id, question_id, text, votes FROM choices WHERE question_id = $1 ORDER BY id ASC",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
    }

    /**
     * Published questions, newest first
     */
    pub async fn latest_published(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            "SELECT id, text, pub_date FROM questions
             WHERE pub_date <= $1 ORDER BY pub_date DESC LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /**
     * Look up a question, hiding it until it has been published
     */
    pub async fn published_question(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            "SELECT id, text, pub_date FROM questions WHERE id = $1 AND pub_date <= $2",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    /**
     * Record a single vote for `choice` on a published question and return the new tally.
     *
     * The increment is one `UPDATE` so concurrent voters can never overwrite each other's
     * count, and the `question_id` predicate rejects choices owned by another question.
     */
    pub async fn vote(
        &self,
        question_id: i64,
        choice: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<i64, VoteError> {
        let question = self
            .published_question(question_id, now)
            .await?
            .ok_or(VoteError::NotFound)?;

        let choice = choice
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(VoteError::MissingSelection)?;
        let choice_id: i64 = choice.parse().map_err(|_| VoteError::InvalidChoice)?;

        let votes = sqlx::query_scalar::<_, i64>(
            "UPDATE choices SET votes = votes + 1
             WHERE id = $1 AND question_id = $2 RETURNING votes",
        )
        .bind(choice_id)
        .bind(question.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VoteError::InvalidChoice)?;

        debug!("Vote recorded for choice {} on question {}: {}", choice_id, question.id, votes);
        Ok(votes)
    }

    /**
     * Every question matching the optional text search and `[start, end)` date range, newest
     * first, regardless of publication
     */
    pub async fn search_questions(
        &self,
        search: Option<&str>,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Question>, sqlx::Error> {
        let (start, end) = match range {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };

        sqlx::query_as::<_, Question>(
            "SELECT id, text, pub_date FROM questions
             WHERE ($1 IS NULL OR instr(lower(text), lower($1)) > 0)
               AND ($2 IS NULL OR pub_date >= $2)
               AND ($3 IS NULL OR pub_date < $3)
             ORDER BY pub_date DESC",
        )
        .bind(search)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }

    /**
     * Delete a question along with its choices, returning whether anything was removed
     */
    pub async fn delete_question(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
