use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use estate_workflow::auth::rate_limit::{self, RateLimiter};
use estate_workflow::config::Config;
use estate_workflow::models::user;
use estate_workflow::{db, handlers};

/// Signing key for session cookies. Without a 64-byte SESSION_KEY a random
/// key is used and sessions do not survive a restart.
fn session_key(config: &Config) -> Key {
    match config.session_key.as_deref() {
        Some(val) if val.len() >= 64 => Key::from(val.as_bytes()),
        Some(val) => {
            log::warn!("SESSION_KEY is {} bytes, at least 64 needed; using a random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("SESSION_KEY not set; using a random key");
            Key::generate()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .map_err(std::io::Error::other)?;
    db::run_migrations(&pool).await.map_err(std::io::Error::other)?;

    if config.uses_default_admin_password() {
        log::warn!("ADMIN_PASSWORD not set, seeding admin with the default password");
    }
    db::seed_admin(&pool, &config.admin_username, &config.admin_password)
        .await
        .map_err(std::io::Error::other)?;

    if config.seed_statuses {
        let admin_id = user::find_by_username(&pool, &config.admin_username)
            .await
            .map_err(std::io::Error::other)?
            .map(|u| u.id);
        db::seed_statuses(&pool, admin_id)
            .await
            .map_err(std::io::Error::other)?;
    }

    let secret_key = session_key(&config);
    let cookie_secure = config.cookie_secure;
    let limiter = RateLimiter::default();
    rate_limit::spawn_sweeper(limiter.clone());
    let limiter = web::Data::new(limiter);
    let pool_data = web::Data::new(pool);

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(middleware::NormalizePath::trim())
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(pool_data.clone())
            .app_data(limiter.clone())
            .configure(handlers::configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
