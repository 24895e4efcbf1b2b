use std::fmt;

use axum::{
    Json,
    extract::{FromRef, FromRequest, Request},
};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    error::ApiError,
    models::{Authenticated, Validate},
    stores::CredentialStore,
};

/// AuthError
///
/// Why the auth gate refused a username/password pair. The display strings are the
/// `{msg}` sent back to the client.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid Username")]
    UnknownUser,

    #[error("Invalid password")]
    BadPassword,

    // The credential store could not be consulted at all.
    #[error("credential lookup failed: {0}")]
    Backend(String),
}

/// Identity
///
/// Proof that a username/password pair passed `authorize`. It can only be built inside
/// this module, so every store mutation that takes `&Identity` is unreachable without
/// passing the gate first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
}

impl Identity {
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// authorize
///
/// The auth gate: the username must exist and the password must verify against its
/// stored hash.
pub async fn authorize(
    credentials: &CredentialStore,
    username: &str,
    password: &str,
) -> Result<Identity, AuthError> {
    let backend = |e: ApiError| AuthError::Backend(e.to_string());

    if !credentials.exists(username).await.map_err(backend)? {
        return Err(AuthError::UnknownUser);
    }
    if !credentials.verify(username, password).await.map_err(backend)? {
        return Err(AuthError::BadPassword);
    }

    Ok(Identity {
        username: username.to_string(),
    })
}

/// Payload Extractor
///
/// A JSON body that has been deserialized and passed `Validate`. Any failure becomes an
/// `ApiError::InvalidInput` with the `{msg}` envelope instead of Axum's plain-text rejection.
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await?;
        payload.validate()?;
        Ok(Payload(payload))
    }
}

/// Authorized Extractor
///
/// Wraps every mutating endpoint. The body is parsed and validated like `Payload`, then
/// its credentials go through `authorize`. On failure the request is rejected here and
/// the handler never runs; on success the handler receives the `Identity` it needs to
/// call any store mutation.
///
/// Because it consumes the body, it must be the last extractor in a handler signature.
#[derive(Debug)]
pub struct Authorized<T> {
    pub identity: Identity,
    pub payload: T,
}

impl<S, T> FromRequest<S> for Authorized<T>
where
    S: Send + Sync,
    CredentialStore: FromRef<S>,
    T: DeserializeOwned + Validate + Authenticated + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Payload(payload) = Payload::<T>::from_request(req, state).await?;

        let credentials = CredentialStore::from_ref(state);
        let presented = payload.credentials();
        let identity = authorize(&credentials, &presented.username, &presented.password).await?;

        Ok(Authorized { identity, payload })
    }
}
