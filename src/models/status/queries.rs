use sqlx::postgres::PgExecutor;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::errors::AppError;
use crate::models::workflow::{StatusCollection, StatusType};
use super::types::*;

const COLUMNS: &str = "id, collection, status_code, status_name, status_type, description, sequence, \
                       is_active, is_default, allows_sale, requires_approval, color_code, \
                       notification_template, created_by, updated_by, created_at, updated_at";

pub const DEFAULT_COLOR: &str = "#6B7280";

fn into_definitions(rows: Vec<StatusRow>) -> Result<Vec<StatusDefinition>, AppError> {
    rows.into_iter()
        .map(|r| StatusDefinition::try_from(r).map_err(AppError::from))
        .collect()
}

fn into_definition(row: Option<StatusRow>) -> Result<Option<StatusDefinition>, AppError> {
    row.map(StatusDefinition::try_from).transpose().map_err(AppError::from)
}

/// Escape LIKE wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, collection: StatusCollection, filter: &StatusFilter) {
    qb.push(" WHERE collection = ")
        .push_bind(collection.as_db())
        .push(" AND NOT is_deleted");
    if let Some(t) = filter.status_type {
        qb.push(" AND status_type = ").push_bind(t.as_db());
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
    if let Some(allows_sale) = filter.allows_sale {
        qb.push(" AND allows_sale = ").push_bind(allows_sale);
    }
    if let Some(requires_approval) = filter.requires_approval {
        qb.push(" AND requires_approval = ").push_bind(requires_approval);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (status_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR status_code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// List non-deleted statuses of a collection, filtered and paginated, ordered by sequence.
pub async fn find_paginated(
    pool: &PgPool,
    collection: StatusCollection,
    filter: &StatusFilter,
) -> Result<StatusPage, AppError> {
    let page = filter.page();
    let limit = filter.limit();

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM status_definitions");
    push_filters(&mut count_qb, collection, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM status_definitions"));
    push_filters(&mut qb, collection, filter);
    qb.push(" ORDER BY sequence, id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind((page - 1).saturating_mul(limit));
    let rows = qb.build_query_as::<StatusRow>().fetch_all(pool).await?;

    Ok(StatusPage {
        items: into_definitions(rows)?,
        page,
        limit,
        total,
    })
}

pub async fn find_by_id(
    pool: &PgPool,
    collection: StatusCollection,
    id: i64,
) -> Result<Option<StatusDefinition>, AppError> {
    let row = sqlx::query_as::<_, StatusRow>(&format!(
        "SELECT {COLUMNS} FROM status_definitions \
         WHERE id = $1 AND collection = $2 AND NOT is_deleted"
    ))
    .bind(id)
    .bind(collection.as_db())
    .fetch_optional(pool)
    .await?;
    into_definition(row)
}

/// Active statuses of the given types, in display order.
pub async fn find_active_by_types(
    pool: &PgPool,
    collection: StatusCollection,
    types: &[StatusType],
) -> Result<Vec<StatusDefinition>, AppError> {
    if types.is_empty() {
        return Ok(Vec::new());
    }
    let type_names: Vec<String> = types.iter().map(|t| t.as_db().to_string()).collect();
    let rows = sqlx::query_as::<_, StatusRow>(&format!(
        "SELECT {COLUMNS} FROM status_definitions \
         WHERE collection = $1 AND NOT is_deleted AND is_active AND status_type = ANY($2) \
         ORDER BY sequence, id"
    ))
    .bind(collection.as_db())
    .bind(type_names)
    .fetch_all(pool)
    .await?;
    into_definitions(rows)
}

pub async fn find_active(pool: &PgPool, collection: StatusCollection) -> Result<Vec<StatusDefinition>, AppError> {
    let rows = sqlx::query_as::<_, StatusRow>(&format!(
        "SELECT {COLUMNS} FROM status_definitions \
         WHERE collection = $1 AND NOT is_deleted AND is_active \
         ORDER BY sequence, id"
    ))
    .bind(collection.as_db())
    .fetch_all(pool)
    .await?;
    into_definitions(rows)
}

pub async fn find_default(pool: &PgPool, collection: StatusCollection) -> Result<Option<StatusDefinition>, AppError> {
    let row = sqlx::query_as::<_, StatusRow>(&format!(
        "SELECT {COLUMNS} FROM status_definitions \
         WHERE collection = $1 AND NOT is_deleted AND is_default \
         ORDER BY id LIMIT 1"
    ))
    .bind(collection.as_db())
    .fetch_optional(pool)
    .await?;
    into_definition(row)
}

/// One past the highest sequence in use (1 for an empty collection).
/// Fails when the highest sequence is already `i32::MAX`.
pub async fn next_sequence<'e, E: PgExecutor<'e>>(
    executor: E,
    collection: StatusCollection,
) -> Result<i32, AppError> {
    let next: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(sequence), 0)::BIGINT + 1 FROM status_definitions \
         WHERE collection = $1 AND NOT is_deleted",
    )
    .bind(collection.as_db())
    .fetch_one(executor)
    .await?;
    i32::try_from(next).map_err(|_| {
        AppError::BadRequest("No sequence left after the last status; give an explicit sequence".to_string())
    })
}

/// Case-insensitive code/name collision check among non-deleted statuses.
/// Returns the conflict message, if any.
pub async fn find_conflict<'e, E: PgExecutor<'e>>(
    executor: E,
    collection: StatusCollection,
    status_code: &str,
    status_name: &str,
    exclude_id: Option<i64>,
) -> Result<Option<&'static str>, AppError> {
    let hit: Option<(bool, bool)> = sqlx::query_as(
        "SELECT LOWER(status_code) = LOWER($2), LOWER(status_name) = LOWER($3) \
         FROM status_definitions \
         WHERE collection = $1 AND NOT is_deleted \
           AND (LOWER(status_code) = LOWER($2) OR LOWER(status_name) = LOWER($3)) \
           AND ($4::BIGINT IS NULL OR id <> $4) \
         LIMIT 1",
    )
    .bind(collection.as_db())
    .bind(status_code)
    .bind(status_name)
    .bind(exclude_id)
    .fetch_optional(executor)
    .await?;

    Ok(hit.map(|(code_taken, _)| {
        if code_taken {
            "Status code already exists"
        } else {
            "Status name already exists"
        }
    }))
}

/// Serialize default-flag changes for a collection until the transaction ends.
async fn lock_defaults(conn: &mut PgConnection, collection: StatusCollection) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(collection.lock_key())
        .execute(conn)
        .await?;
    Ok(())
}

async fn unset_other_defaults(
    conn: &mut PgConnection,
    collection: StatusCollection,
    except_id: Option<i64>,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE status_definitions SET is_default = FALSE, updated_at = NOW() \
         WHERE collection = $1 AND is_default AND NOT is_deleted \
           AND ($2::BIGINT IS NULL OR id <> $2)",
    )
    .bind(collection.as_db())
    .bind(except_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

async fn find_for_update(
    conn: &mut PgConnection,
    collection: StatusCollection,
    id: i64,
) -> Result<StatusRow, AppError> {
    sqlx::query_as::<_, StatusRow>(&format!(
        "SELECT {COLUMNS} FROM status_definitions \
         WHERE id = $1 AND collection = $2 AND NOT is_deleted FOR UPDATE"
    ))
    .bind(id)
    .bind(collection.as_db())
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Status not found".to_string()))
}

/// Insert a status. A default status clears the flag on every other status
/// of the collection in the same transaction, and is always active.
pub async fn create(
    pool: &PgPool,
    collection: StatusCollection,
    new: &NewStatus,
    created_by: Option<i64>,
) -> Result<StatusDefinition, AppError> {
    let mut tx = pool.begin().await?;

    if let Some(msg) = find_conflict(&mut *tx, collection, &new.status_code, &new.status_name, None).await? {
        return Err(AppError::Conflict(msg.to_string()));
    }

    if new.is_default {
        lock_defaults(&mut tx, collection).await?;
        unset_other_defaults(&mut tx, collection, None).await?;
    }

    let sequence = match new.sequence {
        Some(s) => s,
        None => next_sequence(&mut *tx, collection).await?,
    };

    let row = sqlx::query_as::<_, StatusRow>(&format!(
        "INSERT INTO status_definitions \
         (collection, status_code, status_name, status_type, description, sequence, \
          is_active, is_default, allows_sale, requires_approval, color_code, \
          notification_template, created_by, updated_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13) \
         RETURNING {COLUMNS}"
    ))
    .bind(collection.as_db())
    .bind(&new.status_code)
    .bind(&new.status_name)
    .bind(new.status_type.as_db())
    .bind(&new.description)
    .bind(sequence)
    .bind(new.is_active || new.is_default)
    .bind(new.is_default)
    .bind(new.allows_sale)
    .bind(new.requires_approval)
    .bind(new.color_code.as_deref().unwrap_or(DEFAULT_COLOR))
    .bind(&new.notification_template)
    .bind(created_by)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(StatusDefinition::try_from(row)?)
}

/// Write the supplied fields of `update` onto a status.
pub async fn update(
    pool: &PgPool,
    collection: StatusCollection,
    id: i64,
    update: &StatusUpdate,
    user_id: i64,
) -> Result<StatusDefinition, AppError> {
    let mut tx = pool.begin().await?;
    let becomes_default = update.is_default == Some(true);

    if becomes_default {
        lock_defaults(&mut tx, collection).await?;
    }
    let existing = find_for_update(&mut tx, collection, id).await?;

    if existing.is_default && update.is_active == Some(false) && update.is_default != Some(false) {
        return Err(AppError::BadRequest("Cannot deactivate default status".to_string()));
    }

    if update.status_code.is_some() || update.status_name.is_some() {
        let code = update.status_code.as_deref().unwrap_or(&existing.status_code);
        let name = update.status_name.as_deref().unwrap_or(&existing.status_name);
        if let Some(msg) = find_conflict(&mut *tx, collection, code, name, Some(id)).await? {
            return Err(AppError::Conflict(msg.to_string()));
        }
    }

    if becomes_default {
        unset_other_defaults(&mut tx, collection, Some(id)).await?;
    }
    let is_active = if becomes_default { Some(true) } else { update.is_active };

    let row = sqlx::query_as::<_, StatusRow>(&format!(
        "UPDATE status_definitions SET \
           status_code = COALESCE($3, status_code), \
           status_name = COALESCE($4, status_name), \
           status_type = COALESCE($5, status_type), \
           description = COALESCE($6, description), \
           sequence = COALESCE($7, sequence), \
           is_active = COALESCE($8, is_active), \
           is_default = COALESCE($9, is_default), \
           allows_sale = COALESCE($10, allows_sale), \
           requires_approval = COALESCE($11, requires_approval), \
           color_code = COALESCE($12, color_code), \
           notification_template = COALESCE($13, notification_template), \
           updated_by = $14, updated_at = NOW() \
         WHERE id = $1 AND collection = $2 AND NOT is_deleted \
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(collection.as_db())
    .bind(&update.status_code)
    .bind(&update.status_name)
    .bind(update.status_type.map(StatusType::as_db))
    .bind(&update.description)
    .bind(update.sequence)
    .bind(is_active)
    .bind(update.is_default)
    .bind(update.allows_sale)
    .bind(update.requires_approval)
    .bind(&update.color_code)
    .bind(&update.notification_template)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(StatusDefinition::try_from(row)?)
}

pub async fn update_sequence(
    pool: &PgPool,
    collection: StatusCollection,
    id: i64,
    sequence: i32,
    user_id: i64,
) -> Result<StatusDefinition, AppError> {
    if sequence < 1 {
        return Err(AppError::BadRequest("Sequence must be a positive integer".to_string()));
    }
    let row = sqlx::query_as::<_, StatusRow>(&format!(
        "UPDATE status_definitions SET sequence = $3, updated_by = $4, updated_at = NOW() \
         WHERE id = $1 AND collection = $2 AND NOT is_deleted \
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(collection.as_db())
    .bind(sequence)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    into_definition(row)?.ok_or_else(|| AppError::NotFound("Status not found".to_string()))
}

/// Apply each `{id, sequence}` independently. Duplicate or gapped sequences
/// are accepted. Returns the ids that were actually updated; unknown or
/// deleted ids are skipped.
pub async fn reorder(
    pool: &PgPool,
    collection: StatusCollection,
    orders: &[SequenceOrder],
    user_id: i64,
) -> Result<Vec<i64>, AppError> {
    if orders.is_empty() {
        return Err(AppError::BadRequest("orders must not be empty".to_string()));
    }
    if let Some(bad) = orders.iter().find(|o| o.sequence < 1) {
        return Err(AppError::BadRequest(format!(
            "Sequence for status {} must be a positive integer",
            bad.id
        )));
    }

    let mut updated = Vec::with_capacity(orders.len());
    for order in orders {
        let result = sqlx::query(
            "UPDATE status_definitions SET sequence = $3, updated_by = $4, updated_at = NOW() \
             WHERE id = $1 AND collection = $2 AND NOT is_deleted",
        )
        .bind(order.id)
        .bind(collection.as_db())
        .bind(order.sequence)
        .bind(user_id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 1 {
            updated.push(order.id);
        }
    }
    Ok(updated)
}

/// Flip `is_active`. The default status cannot be deactivated.
pub async fn toggle_active(
    pool: &PgPool,
    collection: StatusCollection,
    id: i64,
    user_id: i64,
) -> Result<StatusDefinition, AppError> {
    let mut tx = pool.begin().await?;
    let existing = find_for_update(&mut tx, collection, id).await?;
    if existing.is_active && existing.is_default {
        return Err(AppError::BadRequest("Cannot deactivate default status".to_string()));
    }

    let row = sqlx::query_as::<_, StatusRow>(&format!(
        "UPDATE status_definitions SET is_active = NOT is_active, updated_by = $3, updated_at = NOW() \
         WHERE id = $1 AND collection = $2 \
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(collection.as_db())
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(StatusDefinition::try_from(row)?)
}

/// Make `id` the single default status of its collection (and active).
pub async fn set_default(
    pool: &PgPool,
    collection: StatusCollection,
    id: i64,
    user_id: i64,
) -> Result<StatusDefinition, AppError> {
    let mut tx = pool.begin().await?;
    lock_defaults(&mut tx, collection).await?;
    find_for_update(&mut tx, collection, id).await?;
    let cleared = unset_other_defaults(&mut tx, collection, Some(id)).await?;

    let row = sqlx::query_as::<_, StatusRow>(&format!(
        "UPDATE status_definitions SET is_default = TRUE, is_active = TRUE, updated_by = $3, updated_at = NOW() \
         WHERE id = $1 AND collection = $2 \
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(collection.as_db())
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    log::debug!("{} {} set as default ({} cleared)", collection.target_type(), id, cleared);
    Ok(StatusDefinition::try_from(row)?)
}

/// Set one boolean column on many statuses and return the ids that changed.
/// Deactivating never touches the default status.
pub async fn bulk_update(
    pool: &PgPool,
    collection: StatusCollection,
    ids: &[i64],
    field: BulkField,
    value: bool,
    user_id: i64,
) -> Result<Vec<i64>, AppError> {
    if ids.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".to_string()));
    }
    let guard = if field == BulkField::IsActive && !value {
        " AND NOT is_default"
    } else {
        ""
    };
    let sql = format!(
        "UPDATE status_definitions SET {} = $1, updated_by = $2, updated_at = NOW() \
         WHERE collection = $3 AND NOT is_deleted AND id = ANY($4){guard} \
         RETURNING id",
        field.column()
    );
    let updated: Vec<i64> = sqlx::query_scalar(&sql)
        .bind(value)
        .bind(user_id)
        .bind(collection.as_db())
        .bind(ids)
        .fetch_all(pool)
        .await?;
    Ok(updated)
}

/// Mark a status deleted. The row stays in the table; the default status cannot be deleted.
pub async fn soft_delete(
    pool: &PgPool,
    collection: StatusCollection,
    id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let existing = find_for_update(&mut tx, collection, id).await?;
    if existing.is_default {
        return Err(AppError::BadRequest("Cannot delete default status".to_string()));
    }

    sqlx::query(
        "UPDATE status_definitions \
         SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $3, updated_by = $3, updated_at = NOW() \
         WHERE id = $1 AND collection = $2",
    )
    .bind(id)
    .bind(collection.as_db())
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
