use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    models::Article,
    repository::{AUTHOR_TAKEN, Repository, RepositoryError, TITLE_TAKEN, USERNAME_TAKEN},
    search::SearchQuery,
};

#[derive(Default)]
struct Tables {
    // username -> password hash
    users: HashMap<String, String>,
    authors: BTreeSet<String>,
    // title -> article
    news: HashMap<String, Article>,
}

/// InMemoryRepository
///
/// A process-local `Repository` used by `STORE_BACKEND=memory` and by the test suites.
/// Each method holds the table lock for its whole read-modify-write, matching the
/// single-document atomicity of the Postgres implementation.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn user_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.read().await.users.contains_key(username))
    }

    async fn password_hash(&self, username: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.tables.read().await.users.get(username).cloned())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(username) {
            return Err(RepositoryError::Conflict(USERNAME_TAKEN.to_string()));
        }
        tables
            .users
            .insert(username.to_string(), password_hash.to_string());
        Ok(())
    }

    async fn update_user(
        &self,
        username: &str,
        new_username: &str,
        new_password_hash: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if new_username != username && tables.users.contains_key(new_username) {
            return Err(RepositoryError::Conflict(USERNAME_TAKEN.to_string()));
        }
        let Some(stored_hash) = tables.users.remove(username) else {
            return Ok(false);
        };
        let hash = new_password_hash.map(str::to_string).unwrap_or(stored_hash);
        tables.users.insert(new_username.to_string(), hash);
        Ok(true)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.users.remove(username).is_some())
    }

    async fn author_exists(&self, authorname: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.read().await.authors.contains(authorname))
    }

    async fn insert_author(&self, authorname: &str) -> Result<(), RepositoryError> {
        if !self.tables.write().await.authors.insert(authorname.to_string()) {
            return Err(RepositoryError::Conflict(AUTHOR_TAKEN.to_string()));
        }
        Ok(())
    }

    async fn rename_author(&self, old: &str, new: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if old != new && tables.authors.contains(new) {
            return Err(RepositoryError::Conflict(AUTHOR_TAKEN.to_string()));
        }
        if !tables.authors.remove(old) {
            return Ok(false);
        }
        tables.authors.insert(new.to_string());
        Ok(true)
    }

    async fn delete_author(&self, authorname: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.authors.remove(authorname))
    }

    async fn article_exists(&self, title: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.read().await.news.contains_key(title))
    }

    async fn get_article(&self, title: &str) -> Result<Option<Article>, RepositoryError> {
        Ok(self.tables.read().await.news.get(title).cloned())
    }

    async fn insert_article(
        &self,
        title: &str,
        content: &str,
        authorname: &str,
    ) -> Result<Article, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.news.contains_key(title) {
            return Err(RepositoryError::Conflict(TITLE_TAKEN.to_string()));
        }
        let article = Article {
            title: title.to_string(),
            content: content.to_string(),
            authorname: authorname.to_string(),
            posted_at: Utc::now(),
        };
        tables.news.insert(article.title.clone(), article.clone());
        Ok(article)
    }

    async fn update_article(
        &self,
        title: &str,
        new_title: &str,
        new_content: &str,
        new_authorname: &str,
    ) -> Result<Option<Article>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if new_title != title && tables.news.contains_key(new_title) {
            return Err(RepositoryError::Conflict(TITLE_TAKEN.to_string()));
        }
        let Some(current) = tables.news.remove(title) else {
            return Ok(None);
        };
        let updated = Article {
            title: new_title.to_string(),
            content: new_content.to_string(),
            authorname: new_authorname.to_string(),
            posted_at: current.posted_at,
        };
        tables.news.insert(updated.title.clone(), updated.clone());
        Ok(Some(updated))
    }

    async fn reassign_articles(&self, old: &str, new: &str) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let mut touched = 0;
        for article in tables.news.values_mut().filter(|a| a.authorname == old) {
            article.authorname = new.to_string();
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete_article(&self, title: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.news.remove(title).is_some())
    }

    /// search_articles
    ///
    /// Mirrors the Postgres ordering: newest first for `All`, otherwise by descending
    /// term-occurrence score with ties broken on title.
    async fn search_articles(
        &self,
        query: &SearchQuery,
        limit: i64,
    ) -> Result<Vec<Article>, RepositoryError> {
        let tables = self.tables.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        let articles = match query {
            SearchQuery::All => {
                let mut all: Vec<Article> = tables.news.values().cloned().collect();
                all.sort_by(|a, b| {
                    b.posted_at
                        .cmp(&a.posted_at)
                        .then_with(|| a.title.cmp(&b.title))
                });
                all.truncate(limit);
                all
            }
            SearchQuery::Terms(_) => {
                let mut scored: Vec<(usize, &Article)> = tables
                    .news
                    .values()
                    .map(|article| (query.score(article), article))
                    .filter(|(score, _)| *score > 0)
                    .collect();
                scored.sort_by(|(score_a, a), (score_b, b)| {
                    score_b.cmp(score_a).then_with(|| a.title.cmp(&b.title))
                });
                scored
                    .into_iter()
                    .take(limit)
                    .map(|(_, article)| article.clone())
                    .collect()
            }
        };
        Ok(articles)
    }
}
