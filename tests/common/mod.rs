//! Shared test infrastructure.
//!
//! # HTTP tests
//! - `test_app!(pool)` - the full route table behind a cookie session store
//! - `lazy_pool()` - a pool that never connects, for paths that stop before the database
//! - `/test/login-as/{role}` - signs the client in with the given role
//!
//! # Database tests
//! Use `#[sqlx::test]`, which applies `migrations/` to a fresh database per test.
#![allow(dead_code)]

use actix_session::Session;
use actix_web::{HttpResponse, cookie::Cookie, dev::ServiceResponse, web};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use estate_workflow::auth::session;
use estate_workflow::models::status::{self, NewStatus, StatusDefinition};
use estate_workflow::models::user::Role;
use estate_workflow::models::workflow::{StatusCollection, StatusType};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const ADMIN_ID: i64 = 1;
pub const SESSION_KEY: [u8; 64] = [7u8; 64];

// ============================================================================
// HTTP SETUP
// ============================================================================

pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://postgres@127.0.0.1:1/estate_unused")
        .expect("lazy pool")
}

/// Test-only route that writes a session for the requested role.
pub async fn login_as(session: Session, path: web::Path<String>) -> HttpResponse {
    let role: Role = path.parse().unwrap_or(Role::Member);
    session::sign_in(&session, ADMIN_ID, "tester", role).expect("sign in");
    HttpResponse::Ok().finish()
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .next()
        .map(|c| c.into_owned())
        .expect("session cookie")
}

#[macro_export]
macro_rules! test_app {
    ($pool:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::from(&common::SESSION_KEY),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .app_data(actix_web::web::Data::new($pool))
                .app_data(actix_web::web::Data::new(
                    estate_workflow::auth::rate_limit::RateLimiter::default(),
                ))
                .route("/test/login-as/{role}", actix_web::web::get().to(common::login_as))
                .configure(estate_workflow::handlers::configure),
        )
        .await
    };
}

// ============================================================================
// DATABASE HELPERS
// ============================================================================

pub fn new_status(code: &str, name: &str, status_type: StatusType, sequence: i32) -> NewStatus {
    NewStatus {
        status_code: code.to_string(),
        status_name: name.to_string(),
        status_type,
        description: None,
        sequence: Some(sequence),
        is_active: true,
        is_default: false,
        allows_sale: false,
        requires_approval: false,
        color_code: None,
        notification_template: None,
    }
}

/// Insert a sales status and return it.
pub async fn create_sales(
    pool: &PgPool,
    code: &str,
    name: &str,
    status_type: StatusType,
    sequence: i32,
) -> StatusDefinition {
    status::create(pool, StatusCollection::Sales, &new_status(code, name, status_type, sequence), Some(ADMIN_ID))
        .await
        .expect("create status")
}

pub async fn create_default_sales(pool: &PgPool, code: &str, name: &str) -> StatusDefinition {
    let mut new = new_status(code, name, StatusType::Available, 1);
    new.is_default = true;
    status::create(pool, StatusCollection::Sales, &new, Some(ADMIN_ID))
        .await
        .expect("create default status")
}

/// Number of live rows flagged default in a collection.
pub async fn count_defaults(pool: &PgPool, collection: StatusCollection) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM status_definitions \
         WHERE collection = $1 AND is_default AND NOT is_deleted",
    )
    .bind(collection.as_db())
    .fetch_one(pool)
    .await
    .expect("count defaults")
}
