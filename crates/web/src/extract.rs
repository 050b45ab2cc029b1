//! Request extractors that reject with [`AppError`].
//!
//! Use these instead of the plain axum extractors so a malformed body,
//! path or query still gets a JSON `{ "message": ... }` response.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;
use crate::views::CandidateFile;

/// Fallback when a part declares no content type; never allow-listed.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// JSON request body.
#[derive(Debug, Clone, Copy)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Typed path parameters.
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Typed query string.
#[derive(Debug, Clone, Copy)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Every file part of a multipart body.
///
/// The declared content type of each part is kept as-is; the allow-list
/// check happens when a view stages them. Parts without a filename are
/// skipped.
#[derive(Debug)]
pub struct Files(pub Vec<CandidateFile>);

impl<S> FromRequest<S> for Files
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut candidates = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.file_name().map(str::to_owned) else {
                debug!(field = ?field.name(), "Skipping non-file multipart field");
                continue;
            };
            let mime = field.content_type().unwrap_or(UNKNOWN_MIME).to_owned();
            let content = field.bytes().await?;

            candidates.push(CandidateFile::new(name, mime, content));
        }

        Ok(Self(candidates))
    }
}
