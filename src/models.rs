use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

// --- Core Application Schemas (Mapped to Database) ---

/// Article
///
/// A news item from the `news` table. `title` is the unique key; `authorname` is a soft
/// reference into `authors` checked only when the article is first posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub authorname: String,
    #[ts(type = "string")]
    pub posted_at: DateTime<Utc>,
}

/// --- Request Payloads (Input Schemas) ---

/// Credentials
///
/// The username/password pair carried at the top level of every request body.
/// For `/registeruser` it describes the account being created; everywhere else it is
/// the identity checked by the auth gate.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validate
///
/// Field-level checks a request body must pass before any store is touched.
/// Serde already rejects missing and mistyped fields; this catches empty ones.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Authenticated
///
/// Request bodies that carry credentials for the auth gate.
pub trait Authenticated {
    fn credentials(&self) -> &Credentials;
}

fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{} field can not be empty", field)));
    }
    Ok(())
}

impl Validate for Credentials {
    fn validate(&self) -> Result<(), ApiError> {
        require(&self.username, "Username")?;
        require(&self.password, "Password")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
}

/// UpdateUserRequest
///
/// Partial update of the authenticated account. Absent or empty fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newuser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newpass: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeleteUserRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub deluser: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterAuthorRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub authorname: String,
}

/// UpdateAuthorRequest
///
/// Renames `authorname` to `newauthor`; the rename cascades to every article by that author.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateAuthorRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub authorname: String,
    pub newauthor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeleteAuthorRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub delauthor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterNewsRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub title: String,
    pub content: String,
    pub authorname: String,
}

/// UpdateNewsRequest
///
/// Partial update of the article keyed by `title`. Unset fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateNewsRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newcontent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newauthor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeleteNewsRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub delnews: String,
}

/// ShowNewsRequest
///
/// `search` is a free-text query; absent or blank lists the most recent articles.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ShowNewsRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Validate for RegisterUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()
    }
}

impl Validate for DeleteUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()?;
        require(&self.deluser, "User")
    }
}

impl Validate for RegisterAuthorRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()?;
        require(&self.authorname, "Author name")
    }
}

impl Validate for UpdateAuthorRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()?;
        require(&self.authorname, "Author name")?;
        require(&self.newauthor, "New author name")
    }
}

impl Validate for DeleteAuthorRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()?;
        require(&self.delauthor, "Author name")
    }
}

impl Validate for RegisterNewsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()?;
        require(&self.title, "Title")?;
        require(&self.content, "Content")?;
        require(&self.authorname, "Author name")
    }
}

impl Validate for UpdateNewsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()?;
        require(&self.title, "Title")
    }
}

impl Validate for DeleteNewsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()?;
        require(&self.delnews, "Title")
    }
}

impl Validate for ShowNewsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.credentials.validate()
    }
}

impl Authenticated for UpdateUserRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl Authenticated for DeleteUserRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl Authenticated for RegisterAuthorRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl Authenticated for UpdateAuthorRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl Authenticated for DeleteAuthorRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl Authenticated for RegisterNewsRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl Authenticated for UpdateNewsRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl Authenticated for DeleteNewsRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl Authenticated for ShowNewsRequest {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// --- Response Envelopes (Output Schemas) ---

/// MessageResponse
///
/// The `{msg}` envelope returned by every endpoint except `/shownews`, on success and failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// SearchResponse
///
/// The `{results}` envelope returned by `/shownews`, most relevant article first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SearchResponse {
    pub results: Vec<Article>,
}
