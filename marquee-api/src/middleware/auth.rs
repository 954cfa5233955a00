use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::typed_header::TypedHeaderRejection;
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use marquee_core::identity::{Caller, Role};

use crate::error::AppError;
use crate::state::AppState;

pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims issued by the identity service. Only the signature and expiry are
/// checked here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Caller::new(claims.sub, claims.email, Role::from_claim(&claims.role))
    }
}

// ============================================================================
// Caller Authentication Middleware
// ============================================================================

pub async fn require_caller(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.map_err(|_| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    ).map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

    req.extensions_mut().insert(Caller::from(token_data.claims));

    Ok(next.run(req).await)
}

// ============================================================================
// Internal Service Middleware
// ============================================================================

/// Guards the maintenance routes the event service calls.
pub async fn require_internal_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = req.headers()
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    match presented {
        Some(token) if token == state.auth.internal_token => Ok(next.run(req).await),
        _ => Err(AppError::AuthenticationError("Invalid internal token".to_string())),
    }
}
