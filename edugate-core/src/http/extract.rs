// edugate-core/src/http/extract.rs

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use edugate_common::models::{Claims, Role};

use crate::auth::TokenCodec;
use crate::http::error::ApiError;
use crate::http::i18n::Lang;
use crate::http::AppState;
use crate::Error;

fn bearer_claims(parts: &Parts, tokens: &TokenCodec) -> Result<Claims, Error> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("missing bearer token".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("malformed authorization header".to_string()))?;
    tokens.verify(token)
}

fn claims_for(parts: &Parts, tokens: &TokenCodec, role: Role) -> Result<Claims, Error> {
    let claims = bearer_claims(parts, tokens)?;
    if claims.role != role {
        return Err(Error::Unauthorized(format!("{role} token required")));
    }
    Ok(claims)
}

/// An authenticated student.
#[derive(Debug, Clone, Copy)]
pub struct StudentAuth {
    pub student_id: Uuid,
}

impl FromRequestParts<AppState> for StudentAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let lang = Lang::from_headers(&parts.headers);
        let claims = claims_for(parts, &state.tokens, Role::Student).map_err(|e| ApiError::new(e, lang))?;
        Ok(StudentAuth {
            student_id: claims.sub,
        })
    }
}

/// An authenticated admin whose account still exists.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth {
    pub admin_id: Uuid,
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let lang = Lang::from_headers(&parts.headers);
        let claims = claims_for(parts, &state.tokens, Role::Admin).map_err(|e| ApiError::new(e, lang))?;
        let admin = state
            .accounts
            .get_admin(claims.sub)
            .await
            .map_err(|e| ApiError::new(e, lang))?;
        if admin.is_none() {
            return Err(ApiError::new(
                Error::Unauthorized("admin account not found".to_string()),
                lang,
            ));
        }
        Ok(AdminAuth {
            admin_id: claims.sub,
        })
    }
}
