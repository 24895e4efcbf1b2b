use crate::{
    auth::Identity,
    config::DeletePolicy,
    error::ApiError,
    models::Article,
    password::{self, HashingConfig},
    repository::{AUTHOR_TAKEN, RepositoryState, TITLE_TAKEN, USERNAME_TAKEN},
    search::SearchQuery,
};

pub const AUTHOR_NOT_REGISTERED: &str = "Author is not registered";
pub const NEWS_NOT_FOUND: &str = "News do not exist";
pub const USER_NOT_FOUND: &str = "User does not exist";

/// Result of a partial update: either something was written or every field was unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Unchanged,
}

// Optional request fields count as unset when absent or blank.
fn provided(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(value: &str, msg: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(msg.to_string()));
    }
    Ok(())
}

/// CredentialStore
///
/// Username → password-hash records. The hash is only ever read inside `verify`.
/// Mutations that act on behalf of a caller take an `Identity`, which only the auth gate
/// can produce.
#[derive(Clone)]
pub struct CredentialStore {
    repo: RepositoryState,
    hashing: HashingConfig,
    delete_policy: DeletePolicy,
}

impl CredentialStore {
    pub fn new(repo: RepositoryState, hashing: HashingConfig, delete_policy: DeletePolicy) -> Self {
        Self {
            repo,
            hashing,
            delete_policy,
        }
    }

    pub async fn exists(&self, username: &str) -> Result<bool, ApiError> {
        Ok(self.repo.user_exists(username).await?)
    }

    /// Fails closed: an unknown username verifies as `false`.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, ApiError> {
        let Some(stored_hash) = self.repo.password_hash(username).await? else {
            return Ok(false);
        };
        Ok(password::verify_blocking(password.to_string(), stored_hash).await?)
    }

    pub async fn create(&self, username: &str, password: &str) -> Result<(), ApiError> {
        require(username, "Username field can not be empty")?;
        require(password, "Password field can not be empty")?;

        if self.exists(username).await? {
            return Err(ApiError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let hash = password::hash_blocking(password.to_string(), self.hashing).await?;
        self.repo.insert_user(username, &hash).await?;

        tracing::info!(username, "user registered");
        Ok(())
    }

    /// update
    ///
    /// Applies whichever of the new username / new password are non-empty, in one write.
    pub async fn update(
        &self,
        identity: &Identity,
        new_username: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<UpdateOutcome, ApiError> {
        let new_username = provided(new_username);
        let new_password = provided(new_password);
        if new_username.is_none() && new_password.is_none() {
            return Ok(UpdateOutcome::Unchanged);
        }

        let username = identity.username();
        let target_username = new_username.unwrap_or(username);
        if target_username != username && self.exists(target_username).await? {
            return Err(ApiError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let new_hash = match new_password {
            Some(password) => {
                Some(password::hash_blocking(password.to_string(), self.hashing).await?)
            }
            None => None,
        };

        if !self
            .repo
            .update_user(username, target_username, new_hash.as_deref())
            .await?
        {
            return Err(ApiError::NotFound(USER_NOT_FOUND.to_string()));
        }

        tracing::info!(
            actor = %identity,
            new_username = target_username,
            password_changed = new_hash.is_some(),
            "user updated"
        );
        Ok(UpdateOutcome::Updated)
    }

    /// delete
    ///
    /// Removes the account keyed by `target`, subject to the configured `DeletePolicy`.
    pub async fn delete(&self, identity: &Identity, target: &str) -> Result<(), ApiError> {
        if self.delete_policy == DeletePolicy::SelfOnly && identity.username() != target {
            return Err(ApiError::Forbidden(
                "Not allowed to delete another user".to_string(),
            ));
        }

        if !self.repo.delete_user(target).await? {
            return Err(ApiError::NotFound(USER_NOT_FOUND.to_string()));
        }

        tracing::info!(actor = %identity, target, "user deleted");
        Ok(())
    }
}

/// AuthorRegistry
///
/// Author-name records. Renames cascade into the article store as a second write.
#[derive(Clone)]
pub struct AuthorRegistry {
    repo: RepositoryState,
}

impl AuthorRegistry {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn exists(&self, authorname: &str) -> Result<bool, ApiError> {
        Ok(self.repo.author_exists(authorname).await?)
    }

    pub async fn create(&self, identity: &Identity, authorname: &str) -> Result<(), ApiError> {
        require(authorname, "Author name field can not be empty")?;

        if self.exists(authorname).await? {
            return Err(ApiError::Conflict(AUTHOR_TAKEN.to_string()));
        }
        self.repo.insert_author(authorname).await?;

        tracing::info!(actor = %identity, authorname, "author registered");
        Ok(())
    }

    /// rename
    ///
    /// Renames the author record, then points every article by `old` at `new`.
    /// The two writes are independent: an interruption between them leaves articles
    /// under the old name. Returns the number of articles reassigned.
    pub async fn rename(&self, identity: &Identity, old: &str, new: &str) -> Result<u64, ApiError> {
        require(new, "New author name field can not be empty")?;

        if !self.exists(old).await? {
            return Err(ApiError::NotFound(AUTHOR_NOT_REGISTERED.to_string()));
        }
        if old == new {
            return Ok(0);
        }
        if self.exists(new).await? {
            return Err(ApiError::Conflict("Author name already in use".to_string()));
        }

        if !self.repo.rename_author(old, new).await? {
            return Err(ApiError::NotFound(AUTHOR_NOT_REGISTERED.to_string()));
        }
        let reassigned = self.repo.reassign_articles(old, new).await?;

        tracing::info!(actor = %identity, old, new, reassigned, "author renamed");
        Ok(reassigned)
    }

    /// Removes the author record only; articles keep their `authorname`.
    pub async fn delete(&self, identity: &Identity, authorname: &str) -> Result<(), ApiError> {
        if !self.repo.delete_author(authorname).await? {
            return Err(ApiError::NotFound(AUTHOR_NOT_REGISTERED.to_string()));
        }

        tracing::info!(actor = %identity, authorname, "author deleted");
        Ok(())
    }
}

/// ArticleChanges
///
/// The optional fields of `/updatenews`. `None` or blank keeps the stored value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleChanges<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub authorname: Option<&'a str>,
}

/// ArticleStore
///
/// News articles keyed by title, plus full-text search.
#[derive(Clone)]
pub struct ArticleStore {
    repo: RepositoryState,
    search_limit: i64,
}

impl ArticleStore {
    pub fn new(repo: RepositoryState, search_limit: i64) -> Self {
        Self { repo, search_limit }
    }

    pub async fn exists(&self, title: &str) -> Result<bool, ApiError> {
        Ok(self.repo.article_exists(title).await?)
    }

    /// create
    ///
    /// Checks run in order and each one short-circuits: empty fields, unknown author,
    /// duplicate title. Nothing is inserted unless all pass.
    pub async fn create(
        &self,
        identity: &Identity,
        title: &str,
        content: &str,
        authorname: &str,
    ) -> Result<Article, ApiError> {
        require(title, "Title field can not be empty")?;
        require(content, "Content field can not be empty")?;

        if !self.repo.author_exists(authorname).await? {
            return Err(ApiError::NotFound(AUTHOR_NOT_REGISTERED.to_string()));
        }
        if self.exists(title).await? {
            return Err(ApiError::Conflict(TITLE_TAKEN.to_string()));
        }

        let article = self.repo.insert_article(title, content, authorname).await?;

        tracing::info!(actor = %identity, title, authorname, "news posted");
        Ok(article)
    }

    /// update
    ///
    /// Merges `changes` over the stored article and writes all three fields at once.
    pub async fn update(
        &self,
        identity: &Identity,
        title: &str,
        changes: ArticleChanges<'_>,
    ) -> Result<UpdateOutcome, ApiError> {
        let Some(current) = self.repo.get_article(title).await? else {
            return Err(ApiError::NotFound(NEWS_NOT_FOUND.to_string()));
        };

        let new_title = provided(changes.title);
        let new_content = provided(changes.content);
        let new_authorname = provided(changes.authorname);
        if new_title.is_none() && new_content.is_none() && new_authorname.is_none() {
            return Ok(UpdateOutcome::Unchanged);
        }

        let new_title = new_title.unwrap_or(&current.title);
        if new_title != current.title && self.exists(new_title).await? {
            return Err(ApiError::Conflict("Title already in use".to_string()));
        }

        let updated = self
            .repo
            .update_article(
                title,
                new_title,
                new_content.unwrap_or(&current.content),
                new_authorname.unwrap_or(&current.authorname),
            )
            .await?
            .ok_or_else(|| ApiError::NotFound(NEWS_NOT_FOUND.to_string()))?;

        tracing::info!(actor = %identity, title, new_title = %updated.title, "news updated");
        Ok(UpdateOutcome::Updated)
    }

    pub async fn delete(&self, identity: &Identity, title: &str) -> Result<(), ApiError> {
        if !self.repo.delete_article(title).await? {
            return Err(ApiError::NotFound(NEWS_NOT_FOUND.to_string()));
        }

        tracing::info!(actor = %identity, title, "news deleted");
        Ok(())
    }

    /// search
    ///
    /// Absent or blank `query` lists the newest articles; otherwise matches are ranked by
    /// relevance. Either way at most `search_limit` articles come back.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Article>, ApiError> {
        let query = SearchQuery::parse(query);
        Ok(self.repo.search_articles(&query, self.search_limit).await?)
    }
}
