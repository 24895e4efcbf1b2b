use crate::{
    auth::{Authorized, Payload},
    error::ApiError,
    models::{
        DeleteAuthorRequest, DeleteNewsRequest, DeleteUserRequest, MessageResponse,
        RegisterAuthorRequest, RegisterNewsRequest, RegisterUserRequest, SearchResponse,
        ShowNewsRequest, UpdateAuthorRequest, UpdateNewsRequest, UpdateUserRequest,
    },
    stores::{ArticleChanges, ArticleStore, AuthorRegistry, CredentialStore, UpdateOutcome},
};
use axum::{Json, extract::State};

type MessageResult = Result<Json<MessageResponse>, ApiError>;

fn message(msg: &str) -> MessageResult {
    Ok(Json(MessageResponse::new(msg)))
}

fn update_message(outcome: UpdateOutcome) -> MessageResult {
    match outcome {
        UpdateOutcome::Updated => message("Updated successfully"),
        UpdateOutcome::Unchanged => message("No change has been made"),
    }
}

// --- Users ---

/// register_user
///
/// [Public Route] Creates an account. The only mutating endpoint without the auth gate.
#[utoipa::path(
    post,
    path = "/registeruser",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = MessageResponse),
        (status = 400, description = "Empty or missing field", body = MessageResponse),
        (status = 409, description = "Username already in use", body = MessageResponse)
    )
)]
pub async fn register_user(
    State(users): State<CredentialStore>,
    Payload(payload): Payload<RegisterUserRequest>,
) -> MessageResult {
    let RegisterUserRequest { credentials } = payload;
    users
        .create(&credentials.username, &credentials.password)
        .await?;
    message("Registration successful")
}

/// update_user
///
/// [Authenticated Route] Changes the caller's own username and/or password.
#[utoipa::path(
    post,
    path = "/updateuser",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated, or no change requested", body = MessageResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse),
        (status = 409, description = "New username already in use", body = MessageResponse)
    )
)]
pub async fn update_user(
    State(users): State<CredentialStore>,
    Authorized { identity, payload }: Authorized<UpdateUserRequest>,
) -> MessageResult {
    let outcome = users
        .update(
            &identity,
            payload.newuser.as_deref(),
            payload.newpass.as_deref(),
        )
        .await?;
    update_message(outcome)
}

/// delete_user
///
/// [Authenticated Route] Deletes the account named by `deluser`.
///
/// *Authorization*: subject to `USER_DELETE_POLICY`; by default callers may only delete
/// themselves.
#[utoipa::path(
    post,
    path = "/deleteuser",
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse),
        (status = 403, description = "Not allowed by delete policy", body = MessageResponse),
        (status = 404, description = "No such user", body = MessageResponse)
    )
)]
pub async fn delete_user(
    State(users): State<CredentialStore>,
    Authorized { identity, payload }: Authorized<DeleteUserRequest>,
) -> MessageResult {
    users.delete(&identity, &payload.deluser).await?;
    message("Deleted successfully")
}

// --- Authors ---

#[utoipa::path(
    post,
    path = "/registerauthor",
    request_body = RegisterAuthorRequest,
    responses(
        (status = 200, description = "Registered", body = MessageResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse),
        (status = 409, description = "Author already registered", body = MessageResponse)
    )
)]
pub async fn register_author(
    State(authors): State<AuthorRegistry>,
    Authorized { identity, payload }: Authorized<RegisterAuthorRequest>,
) -> MessageResult {
    authors.create(&identity, &payload.authorname).await?;
    message("Registration successful")
}

/// update_author
///
/// [Authenticated Route] Renames an author and cascades the new name to their articles.
#[utoipa::path(
    post,
    path = "/updateauthor",
    request_body = UpdateAuthorRequest,
    responses(
        (status = 200, description = "Renamed", body = MessageResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse),
        (status = 404, description = "Author is not registered", body = MessageResponse),
        (status = 409, description = "New name already registered", body = MessageResponse)
    )
)]
pub async fn update_author(
    State(authors): State<AuthorRegistry>,
    Authorized { identity, payload }: Authorized<UpdateAuthorRequest>,
) -> MessageResult {
    authors
        .rename(&identity, &payload.authorname, &payload.newauthor)
        .await?;
    message("Updated successfully")
}

#[utoipa::path(
    post,
    path = "/deleteauthor",
    request_body = DeleteAuthorRequest,
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse),
        (status = 404, description = "Author is not registered", body = MessageResponse)
    )
)]
pub async fn delete_author(
    State(authors): State<AuthorRegistry>,
    Authorized { identity, payload }: Authorized<DeleteAuthorRequest>,
) -> MessageResult {
    authors.delete(&identity, &payload.delauthor).await?;
    message("Deleted successfully")
}

// --- News ---

/// register_news
///
/// [Authenticated Route] Posts an article. The author must already be registered and
/// the title must be unused.
#[utoipa::path(
    post,
    path = "/registernews",
    request_body = RegisterNewsRequest,
    responses(
        (status = 200, description = "Posted", body = MessageResponse),
        (status = 400, description = "Empty content", body = MessageResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse),
        (status = 404, description = "Author is not registered", body = MessageResponse),
        (status = 409, description = "News already posted", body = MessageResponse)
    )
)]
pub async fn register_news(
    State(articles): State<ArticleStore>,
    Authorized { identity, payload }: Authorized<RegisterNewsRequest>,
) -> MessageResult {
    articles
        .create(
            &identity,
            &payload.title,
            &payload.content,
            &payload.authorname,
        )
        .await?;
    message("News have been posted successfully")
}

#[utoipa::path(
    post,
    path = "/updatenews",
    request_body = UpdateNewsRequest,
    responses(
        (status = 200, description = "Updated, or no change requested", body = MessageResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse),
        (status = 404, description = "News do not exist", body = MessageResponse),
        (status = 409, description = "New title already in use", body = MessageResponse)
    )
)]
pub async fn update_news(
    State(articles): State<ArticleStore>,
    Authorized { identity, payload }: Authorized<UpdateNewsRequest>,
) -> MessageResult {
    let changes = ArticleChanges {
        title: payload.newtitle.as_deref(),
        content: payload.newcontent.as_deref(),
        authorname: payload.newauthor.as_deref(),
    };
    let outcome = articles.update(&identity, &payload.title, changes).await?;
    update_message(outcome)
}

#[utoipa::path(
    post,
    path = "/deletenews",
    request_body = DeleteNewsRequest,
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse),
        (status = 404, description = "News do not exist", body = MessageResponse)
    )
)]
pub async fn delete_news(
    State(articles): State<ArticleStore>,
    Authorized { identity, payload }: Authorized<DeleteNewsRequest>,
) -> MessageResult {
    articles.delete(&identity, &payload.delnews).await?;
    message("Deleted successfully")
}

/// show_news
///
/// [Authenticated Route] Full-text search over title, content and author name.
/// Without `search`, lists the newest articles.
#[utoipa::path(
    post,
    path = "/shownews",
    request_body = ShowNewsRequest,
    responses(
        (status = 200, description = "Matching articles, most relevant first", body = SearchResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse)
    )
)]
pub async fn show_news(
    State(articles): State<ArticleStore>,
    Authorized { identity, payload }: Authorized<ShowNewsRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = articles.search(payload.search.as_deref()).await?;
    tracing::debug!(actor = %identity, hits = results.len(), "news searched");
    Ok(Json(SearchResponse { results }))
}
