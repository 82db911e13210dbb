use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use crate::auth::password;
use crate::errors::AppError;
use crate::models::status::{self, NewStatus};
use crate::models::user::{self, NewUser, Role};
use crate::models::workflow::{StatusCollection, StatusType};

pub static MIGRATOR: Migrator = sqlx::migrate!();

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the admin account if no active admin exists yet.
pub async fn seed_admin(pool: &PgPool, username: &str, plain_password: &str) -> Result<(), AppError> {
    if user::count_admins(pool).await? > 0 {
        log::info!("Admin user present, skipping admin seed");
        return Ok(());
    }
    let id = user::create(
        pool,
        &NewUser {
            username: username.to_string(),
            password_hash: password::hash_password(plain_password)?,
            display_name: "Administrator".to_string(),
            role: Role::Admin,
        },
    )
    .await?;
    log::info!("Seeded admin user '{}' (id {})", username, id);
    Ok(())
}

/// (code, name, type, sequence, default, allows_sale, requires_approval, color)
type SeedRow = (&'static str, &'static str, StatusType, i32, bool, bool, bool, &'static str);

const SALES_SEED: &[SeedRow] = &[
    ("AVL", "Available", StatusType::Available, 1, true, true, false, "#22C55E"),
    ("PND", "Pending", StatusType::Pending, 2, false, false, true, "#EAB308"),
    ("BKD", "Booked", StatusType::Booked, 3, false, false, false, "#3B82F6"),
    ("RSV", "Reserved", StatusType::Reserved, 4, false, false, false, "#6366F1"),
    ("ALT", "Allotted", StatusType::Allotted, 5, false, false, true, "#8B5CF6"),
    ("CTR", "Contracted", StatusType::Contracted, 6, false, false, true, "#0EA5E9"),
    ("SLD", "Sold", StatusType::Sold, 7, false, false, false, "#14B8A6"),
    ("HLD", "On Hold", StatusType::OnHold, 8, false, false, false, "#F97316"),
    ("CNL", "Cancelled", StatusType::Cancelled, 9, false, false, true, "#EF4444"),
    ("CLS", "Closed", StatusType::Closed, 10, false, false, false, "#6B7280"),
];

const DEVELOPMENT_SEED: &[SeedRow] = &[
    ("NST", "Not Started", StatusType::Pending, 1, true, false, false, "#9CA3AF"),
    ("RDY", "Ready for Works", StatusType::Available, 2, false, false, false, "#22C55E"),
    ("SUS", "Works Suspended", StatusType::OnHold, 3, false, false, true, "#F97316"),
    ("ABN", "Abandoned", StatusType::Cancelled, 4, false, false, true, "#EF4444"),
    ("CMP", "Completed", StatusType::Closed, 5, false, false, false, "#14B8A6"),
];

/// Insert the standard statuses into any collection that is still empty.
pub async fn seed_statuses(pool: &PgPool, admin_id: Option<i64>) -> Result<(), AppError> {
    for (collection, rows) in [
        (StatusCollection::Sales, SALES_SEED),
        (StatusCollection::Development, DEVELOPMENT_SEED),
    ] {
        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM status_definitions WHERE collection = $1",
        )
        .bind(collection.as_db())
        .fetch_one(pool)
        .await?;
        if existing > 0 {
            log::info!("{} already has {} statuses, skipping seed", collection.target_type(), existing);
            continue;
        }

        for &(code, name, status_type, sequence, is_default, allows_sale, requires_approval, color) in rows {
            let new = NewStatus {
                status_code: code.to_string(),
                status_name: name.to_string(),
                status_type,
                description: None,
                sequence: Some(sequence),
                is_active: true,
                is_default,
                allows_sale,
                requires_approval,
                color_code: Some(color.to_string()),
                notification_template: None,
            };
            status::create(pool, collection, &new, admin_id).await?;
        }
        log::info!("Seeded {} {} statuses", rows.len(), collection.target_type());
    }
    Ok(())
}
