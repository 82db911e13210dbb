use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use std::net::{IpAddr, Ipv4Addr};

use crate::audit;
use crate::auth::{password, rate_limit::RateLimiter, session};
use crate::errors::AppError;
use crate::models::user;
use super::response::{ApiResponse, ok};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn invalid_credentials() -> AppError {
    AppError::BadRequest("Invalid username or password".to_string())
}

/// POST /auth/login
pub async fn login(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    limiter: web::Data<RateLimiter>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check BEFORE any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        log::warn!("login blocked for {ip}: too many failed attempts");
        return Err(AppError::TooManyRequests(
            "Too many failed login attempts. Please try again later.".to_string(),
        ));
    }

    let found = user::find_by_username(&pool, body.username.trim()).await?;
    let Some(u) = found.filter(|u| u.is_active) else {
        limiter.record_failure(ip);
        return Err(invalid_credentials());
    };

    if !password::verify_password(&body.password, &u.password_hash)? {
        limiter.record_failure(ip);
        return Err(invalid_credentials());
    }

    limiter.clear(ip);
    session::sign_in(&session, u.id, &u.username, u.role())?;
    audit::record(&pool, u.id, "user.login", "user", u.id, serde_json::json!({})).await;
    log::info!("user {} signed in", u.username);

    let signed_in = session::get_user(&session).ok_or(AppError::Unauthorized)?;
    Ok(ok(ApiResponse::data(signed_in).with_message("Signed in")))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Result<HttpResponse, AppError> {
    session.purge();
    Ok(ok(ApiResponse::message("Signed out")))
}

/// GET /auth/me
pub async fn me(session: Session) -> Result<HttpResponse, AppError> {
    let current = session::get_user(&session).ok_or(AppError::Unauthorized)?;
    Ok(ok(ApiResponse::data(current)))
}
