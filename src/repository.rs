use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::{models::Article, search::SearchQuery};

pub const USERNAME_TAKEN: &str = "Username already in use";
pub const AUTHOR_TAKEN: &str = "Author already registered";
pub const TITLE_TAKEN: &str = "News already posted";

/// RepositoryError
///
/// `Conflict` reports a unique-key collision detected by the store itself, which covers
/// the window between a caller's existence check and its write.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository Trait
///
/// The persistence contract behind the credential store, author registry and article
/// store. Every method is a single-document read or write; nothing here spans two
/// collections, so callers that need a cascade issue the writes themselves.
///
/// **Send + Sync + async_trait** are required to share `Arc<dyn Repository>` across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn user_exists(&self, username: &str) -> Result<bool, RepositoryError>;
    async fn password_hash(&self, username: &str) -> Result<Option<String>, RepositoryError>;
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), RepositoryError>;
    // Renames and/or re-hashes in one write. `None` keeps the stored hash.
    async fn update_user(
        &self,
        username: &str,
        new_username: &str,
        new_password_hash: Option<&str>,
    ) -> Result<bool, RepositoryError>;
    async fn delete_user(&self, username: &str) -> Result<bool, RepositoryError>;

    // --- Authors ---
    async fn author_exists(&self, authorname: &str) -> Result<bool, RepositoryError>;
    async fn insert_author(&self, authorname: &str) -> Result<(), RepositoryError>;
    async fn rename_author(&self, old: &str, new: &str) -> Result<bool, RepositoryError>;
    async fn delete_author(&self, authorname: &str) -> Result<bool, RepositoryError>;

    // --- Articles ---
    async fn article_exists(&self, title: &str) -> Result<bool, RepositoryError>;
    async fn get_article(&self, title: &str) -> Result<Option<Article>, RepositoryError>;
    async fn insert_article(
        &self,
        title: &str,
        content: &str,
        authorname: &str,
    ) -> Result<Article, RepositoryError>;
    // Replaces title, content and author of the article keyed by `title` in one write.
    async fn update_article(
        &self,
        title: &str,
        new_title: &str,
        new_content: &str,
        new_authorname: &str,
    ) -> Result<Option<Article>, RepositoryError>;
    // Points every article by `old` at `new`; returns how many were touched.
    async fn reassign_articles(&self, old: &str, new: &str) -> Result<u64, RepositoryError>;
    async fn delete_article(&self, title: &str) -> Result<bool, RepositoryError>;
    async fn search_articles(
        &self,
        query: &SearchQuery,
        limit: i64,
    ) -> Result<Vec<Article>, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by the tables created in
/// `migrations/`. Full-text search runs against the generated `search_vector` column.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations. Called once at startup.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

// Turns a unique-key violation into a `Conflict` carrying the user-facing message.
fn unique_violation(err: sqlx::Error, msg: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(msg.to_string());
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn user_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn password_hash(&self, username: &str) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hash)
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO users (username, password_hash) VALUES ($1, $2)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(e, USERNAME_TAKEN))?;
        Ok(())
    }

    /// update_user
    ///
    /// Uses `COALESCE` so a `None` hash leaves the stored one in place.
    async fn update_user(
        &self,
        username: &str,
        new_username: &str,
        new_password_hash: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2,
                password_hash = COALESCE($3, password_hash)
            WHERE username = $1
            "#,
        )
        .bind(username)
        .bind(new_username)
        .bind(new_password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, USERNAME_TAKEN))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn author_exists(&self, authorname: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM authors WHERE authorname = $1)",
        )
        .bind(authorname)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_author(&self, authorname: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO authors (authorname) VALUES ($1)")
            .bind(authorname)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(e, AUTHOR_TAKEN))?;
        Ok(())
    }

    async fn rename_author(&self, old: &str, new: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE authors SET authorname = $2 WHERE authorname = $1")
            .bind(old)
            .bind(new)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(e, AUTHOR_TAKEN))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_author(&self, authorname: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM authors WHERE authorname = $1")
            .bind(authorname)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn article_exists(&self, title: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM news WHERE title = $1)",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn get_article(&self, title: &str) -> Result<Option<Article>, RepositoryError> {
        let article = sqlx::query_as::<_, Article>(
            "SELECT title, content, authorname, posted_at FROM news WHERE title = $1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    async fn insert_article(
        &self,
        title: &str,
        content: &str,
        authorname: &str,
    ) -> Result<Article, RepositoryError> {
        sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO news (title, content, authorname, posted_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING title, content, authorname, posted_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(authorname)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, TITLE_TAKEN))
    }

    async fn update_article(
        &self,
        title: &str,
        new_title: &str,
        new_content: &str,
        new_authorname: &str,
    ) -> Result<Option<Article>, RepositoryError> {
        sqlx::query_as::<_, Article>(
            r#"
            UPDATE news
            SET title = $2, content = $3, authorname = $4
            WHERE title = $1
            RETURNING title, content, authorname, posted_at
            "#,
        )
        .bind(title)
        .bind(new_title)
        .bind(new_content)
        .bind(new_authorname)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, TITLE_TAKEN))
    }

    async fn reassign_articles(&self, old: &str, new: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE news SET authorname = $2 WHERE authorname = $1")
            .bind(old)
            .bind(new)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_article(&self, title: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM news WHERE title = $1")
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// search_articles
    ///
    /// `All` lists newest first. A term query ranks with `ts_rank` over the generated
    /// `search_vector` column (GIN indexed); ties break on title.
    async fn search_articles(
        &self,
        query: &SearchQuery,
        limit: i64,
    ) -> Result<Vec<Article>, RepositoryError> {
        let articles = match (query, query.to_tsquery()) {
            (SearchQuery::All, _) => {
                sqlx::query_as::<_, Article>(
                    r#"
                    SELECT title, content, authorname, posted_at
                    FROM news
                    ORDER BY posted_at DESC, title ASC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            (SearchQuery::Terms(_), None) => Vec::new(),
            (SearchQuery::Terms(_), Some(tsquery)) => {
                sqlx::query_as::<_, Article>(
                    r#"
                    SELECT title, content, authorname, posted_at
                    FROM news
                    WHERE search_vector @@ to_tsquery('simple', $1)
                    ORDER BY ts_rank(search_vector, to_tsquery('simple', $1)) DESC, title ASC
                    LIMIT $2
                    "#,
                )
                .bind(tsquery)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(articles)
    }
}
