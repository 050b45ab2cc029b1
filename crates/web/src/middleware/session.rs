//! Session provider layer and the `Tab` extractor.
//!
//! The [`SessionRegistry`] is installed once at the composition root with
//! [`session_provider`]. Handlers reach a tab's state only through [`Tab`],
//! which fails fast when the provider is missing.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::Deserialize;

use super::auth::RequireIdentity;
use crate::error::AppError;
use crate::session::{SessionError, SessionRegistry, TabId, TabSession};

/// Layer that makes `registry` available to every handler below it.
#[must_use]
pub fn session_provider(registry: SessionRegistry) -> Extension<SessionRegistry> {
    Extension(registry)
}

/// Extractor for the installed [`SessionRegistry`].
pub struct Sessions(pub SessionRegistry);

impl<S> FromRequestParts<S> for Sessions
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionRegistry>()
            .cloned()
            .map(Self)
            .ok_or_else(|| SessionError::MissingProvider.into())
    }
}

#[derive(Deserialize)]
struct TabPath {
    tab: String,
}

/// The caller's tab session named by the `{tab}` path segment.
pub struct Tab {
    pub id: TabId,
    pub session: Arc<TabSession>,
}

impl<S> FromRequestParts<S> for Tab
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Sessions(registry) = Sessions::from_request_parts(parts, state).await?;
        let RequireIdentity(identity) = RequireIdentity::from_request_parts(parts, state).await?;

        let Path(TabPath { tab }) = Path::<TabPath>::from_request_parts(parts, state).await?;
        // A malformed ID cannot name a live tab
        let Ok(id) = tab.parse::<TabId>() else {
            return Err(SessionError::NotFound(tab).into());
        };

        let session = registry.get(&id, &identity.user_id)?;
        Ok(Self { id, session })
    }
}
