//! Bearer-token identity resolution.
//!
//! A single middleware resolves the Authorization header into an
//! [`AuthContext`] carried in request extensions; handlers pick the
//! strictness they need through the extractors below. Resolution never
//! rejects a request by itself, it only records who the caller is.

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{self, HeaderMap};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use sqlx::PgPool;
use std::convert::Infallible;
use tracing::warn;

use crate::errors::AppError;
use crate::models::admin::{AdminPermissions, AdminRow};
use crate::models::user::UserRow;
use crate::state::AppState;

/// Resolved caller identity for one request. At most one side is set.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub user: Option<UserRow>,
    pub admin: Option<AdminRow>,
}

/// Resolves the bearer token (when present) and stores the result in the
/// request extensions for downstream extractors and the activity logger.
pub async fn auth_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = match bearer_token(request.headers()) {
        Some(token) => resolve_token(&state.db, token).await,
        None => AuthContext::default(),
    };
    request.extensions_mut().insert(context);
    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// A lookup failure leaves the request anonymous rather than failing it;
/// the protected handler downstream will 401 if identity was required.
async fn resolve_token(db: &PgPool, token: &str) -> AuthContext {
    match lookup_token(db, token).await {
        Ok(context) => context,
        Err(e) => {
            warn!("token lookup failed: {e}");
            AuthContext::default()
        }
    }
}

async fn lookup_token(db: &PgPool, token: &str) -> Result<AuthContext, sqlx::Error> {
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE api_token = $1")
        .bind(token)
        .fetch_optional(db)
        .await?;
    if let Some(user) = user {
        return Ok(AuthContext {
            user: Some(user),
            admin: None,
        });
    }

    let admin = sqlx::query_as::<_, AdminRow>(
        "SELECT * FROM admins WHERE api_token = $1 AND status = 'active'",
    )
    .bind(token)
    .fetch_optional(db)
    .await?;
    Ok(AuthContext { user: None, admin })
}

fn context_of(parts: &Parts) -> AuthContext {
    parts.extensions.get::<AuthContext>().cloned().unwrap_or_default()
}

// ────────────────────────────── extractors ──────────────────────────────

/// Requires an authenticated user; rejects with 401 otherwise.
pub struct CurrentUser(pub UserRow);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context_of(parts)
            .user
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Yields the caller's user identity when present, `None` otherwise.
pub struct OptionalUser(pub Option<UserRow>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(context_of(parts).user))
    }
}

/// Requires an active admin; rejects with 401 otherwise.
pub struct CurrentAdmin(pub AdminRow);

impl CurrentAdmin {
    /// Permission gate. Super admins pass every check.
    pub fn require_permission(
        &self,
        check: impl Fn(&AdminPermissions) -> bool,
    ) -> Result<(), AppError> {
        if self.0.is_super_admin() || check(&self.0.permissions.0) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }

    pub fn require_super_admin(&self) -> Result<(), AppError> {
        if self.0.is_super_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Super admin access required".to_string(),
            ))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context_of(parts)
            .admin
            .map(CurrentAdmin)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    use super::*;
    use crate::models::admin::{ROLE_ADMIN, ROLE_SUPER_ADMIN};

    fn header_map(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    fn admin_with(role: &str, permissions: AdminPermissions) -> AdminRow {
        AdminRow {
            id: Uuid::new_v4(),
            name: "Ops".to_string(),
            email: "ops@example.com".to_string(),
            role: role.to_string(),
            status: "active".to_string(),
            permissions: Json(permissions),
            api_token: None,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&header_map("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&header_map("Bearer   abc123  ")), Some("abc123"));
        assert_eq!(bearer_token(&header_map("Bearer ")), None);
        assert_eq!(bearer_token(&header_map("Basic abc123")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_permission_gate() {
        let admin = CurrentAdmin(admin_with(
            ROLE_ADMIN,
            AdminPermissions {
                view_logs: true,
                manage_logs: false,
                manage_admins: false,
                manage_users: false,
            },
        ));
        assert!(admin.require_permission(|p| p.view_logs).is_ok());
        assert!(admin.require_permission(|p| p.manage_logs).is_err());
        assert!(admin.require_super_admin().is_err());
    }

    #[test]
    fn test_super_admin_bypasses_permission_checks() {
        let admin = CurrentAdmin(admin_with(
            ROLE_SUPER_ADMIN,
            AdminPermissions {
                view_logs: false,
                manage_logs: false,
                manage_admins: false,
                manage_users: false,
            },
        ));
        assert!(admin.require_permission(|p| p.view_logs).is_ok());
        assert!(admin.require_super_admin().is_ok());
    }

    #[tokio::test]
    async fn test_extractors_read_the_request_context() {
        let (mut parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();

        // No context at all: optional yields None, strict rejects.
        let OptionalUser(user) = OptionalUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(user.is_none());
        assert!(CurrentUser::from_request_parts(&mut parts, &())
            .await
            .is_err());

        parts.extensions.insert(AuthContext {
            user: None,
            admin: Some(admin_with(ROLE_ADMIN, AdminPermissions::default())),
        });
        assert!(CurrentAdmin::from_request_parts(&mut parts, &())
            .await
            .is_ok());
        assert!(CurrentUser::from_request_parts(&mut parts, &())
            .await
            .is_err());
    }
}
