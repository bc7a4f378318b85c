use crate::AppState;
use crate::api::error::AppError;
use crate::utils::auth::validate_jwt;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Verify the bearer token and attach the decoded claims to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized(
            "Missing or invalid Authorization header".to_string(),
        ))?;

    let claims = validate_jwt(token, &state.config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Role gate layered after `auth_middleware`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<crate::utils::auth::Claims>()
        .ok_or(AppError::Unauthorized("Authentication required".to_string()))?;

    if !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Forbidden: insufficient permissions".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
