use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::audit;
use crate::auth::session::require_admin;
use crate::auth::validate;
use crate::errors::AppError;
use crate::models::status::{self, BulkField, NewStatus, SequenceOrder, StatusFilter, StatusUpdate};
use crate::models::workflow::{self, StatusCollection};
use super::response::{ApiResponse, Pagination, created, ok};

const HISTORY_LIMIT: i64 = 50;

/// Path ids that are not numbers are reported as missing statuses.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::NotFound("Status not found".to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound("Status not found".to_string())
}

fn reject_invalid(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(errors.join("; ")))
    }
}

/// A status id in a request body. Anything that is not an integer or a
/// numeric string is kept and treated as an id that matches nothing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Number(i64),
    Text(String),
    Other(Value),
}

impl IdInput {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            IdInput::Number(n) => Some(*n),
            IdInput::Text(s) => s.trim().parse().ok(),
            IdInput::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub current_status_id: Option<IdInput>,
    pub target_status_id: Option<IdInput>,
    /// Fields of the record being moved, checked against the target's rules.
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct SequenceRequest {
    pub sequence: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub orders: Vec<SequenceOrder>,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    pub ids: Vec<i64>,
    pub field: BulkField,
    pub value: bool,
}

/// GET / - paginated list
pub async fn list(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    query: web::Query<StatusFilter>,
) -> Result<HttpResponse, AppError> {
    let page = status::find_paginated(&pool, **collection, &query).await?;
    let pagination = Pagination::new(page.page, page.limit, page.total);
    Ok(ok(ApiResponse::data(page.items).with_pagination(pagination)))
}

/// GET /active
pub async fn active(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
) -> Result<HttpResponse, AppError> {
    let items = status::find_active(&pool, **collection).await?;
    Ok(ok(ApiResponse::data(items)))
}

/// GET /default
pub async fn default_status(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
) -> Result<HttpResponse, AppError> {
    let found = status::find_default(&pool, **collection)
        .await?
        .ok_or_else(|| AppError::NotFound("No default status configured".to_string()))?;
    Ok(ok(ApiResponse::data(found)))
}

/// GET /types - transition table and validation rules per status type
pub async fn types() -> Result<HttpResponse, AppError> {
    Ok(ok(ApiResponse::data(workflow::status_type_catalog())))
}

/// GET /{id}
pub async fn read(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path)?;
    let found = status::find_by_id(&pool, **collection, id).await?.ok_or_else(not_found)?;
    Ok(ok(ApiResponse::data(found)))
}

/// GET /{id}/workflow
pub async fn workflow(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path)?;
    let view = workflow::workflow_for(&pool, **collection, id).await?.ok_or_else(not_found)?;
    Ok(ok(ApiResponse::data(view)))
}

/// POST /validate-transition
pub async fn validate_transition(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    body: web::Json<TransitionRequest>,
) -> Result<HttpResponse, AppError> {
    let (Some(current), Some(target)) = (&body.current_status_id, &body.target_status_id) else {
        return Err(AppError::BadRequest(
            "currentStatusId and targetStatusId are required".to_string(),
        ));
    };

    let check = workflow::validate_transition(
        &pool,
        **collection,
        current.as_id(),
        target.as_id(),
        body.fields.as_ref(),
    )
    .await?;
    Ok(ok(ApiResponse::data(check)))
}

/// GET /{id}/history - audit trail (admin)
pub async fn history(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let id = parse_id(&path)?;
    let entries = audit::find_for_target(&pool, collection.target_type(), id, HISTORY_LIMIT).await?;
    Ok(ok(ApiResponse::data(entries)))
}

/// POST / - create (admin)
pub async fn create(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    body: web::Json<NewStatus>,
) -> Result<HttpResponse, AppError> {
    let user = require_admin(&session)?;
    let mut new = body.into_inner();
    validate::normalize_new_status(&mut new);
    reject_invalid(validate::validate_new_status(&new))?;

    let created_status = status::create(&pool, **collection, &new, Some(user.user_id)).await?;

    log::info!(
        "{} {} ({}) created by user {}",
        collection.target_type(),
        created_status.id,
        created_status.status_code,
        user.user_id
    );
    let details = serde_json::json!({
        "statusCode": created_status.status_code,
        "statusName": created_status.status_name,
        "statusType": created_status.status_type,
        "isDefault": created_status.is_default,
    });
    audit::record(&pool, user.user_id, "status.created", collection.target_type(), created_status.id, details).await;

    Ok(created(ApiResponse::data(created_status).with_message("Status created")))
}

/// PUT /{id} - update (admin)
pub async fn update(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    path: web::Path<String>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, AppError> {
    let user = require_admin(&session)?;
    let id = parse_id(&path)?;
    let mut changes = body.into_inner();
    validate::normalize_status_update(&mut changes);
    reject_invalid(validate::validate_status_update(&changes))?;

    let updated = status::update(&pool, **collection, id, &changes, user.user_id).await?;

    let details = serde_json::json!({
        "statusCode": updated.status_code,
        "statusName": updated.status_name,
        "isActive": updated.is_active,
        "isDefault": updated.is_default,
    });
    audit::record(&pool, user.user_id, "status.updated", collection.target_type(), id, details).await;

    Ok(ok(ApiResponse::data(updated).with_message("Status updated")))
}

/// PATCH /{id}/sequence (admin)
pub async fn update_sequence(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    path: web::Path<String>,
    body: web::Json<SequenceRequest>,
) -> Result<HttpResponse, AppError> {
    let user = require_admin(&session)?;
    let id = parse_id(&path)?;
    reject_invalid(validate::validate_sequence(body.sequence).into_iter().collect())?;

    let updated = status::update_sequence(&pool, **collection, id, body.sequence, user.user_id).await?;

    let details = serde_json::json!({ "sequence": body.sequence });
    audit::record(&pool, user.user_id, "status.sequence_changed", collection.target_type(), id, details).await;

    Ok(ok(ApiResponse::data(updated).with_message("Sequence updated")))
}

/// POST /reorder (admin)
pub async fn reorder(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    body: web::Json<ReorderRequest>,
) -> Result<HttpResponse, AppError> {
    let user = require_admin(&session)?;
    let updated = status::reorder(&pool, **collection, &body.orders, user.user_id).await?;

    for order in body.orders.iter().filter(|o| updated.contains(&o.id)) {
        let details = serde_json::json!({ "sequence": order.sequence, "summary": "Bulk reorder" });
        audit::record(&pool, user.user_id, "status.sequence_changed", collection.target_type(), order.id, details).await;
    }

    let modified = updated.len();
    let data = serde_json::json!({ "modifiedCount": modified });
    Ok(ok(ApiResponse::data(data).with_message(format!("{modified} statuses reordered"))))
}

/// POST /bulk-update (admin)
pub async fn bulk_update(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    body: web::Json<BulkUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let user = require_admin(&session)?;
    let updated = status::bulk_update(&pool, **collection, &body.ids, body.field, body.value, user.user_id).await?;

    if updated.len() < body.ids.len() {
        log::warn!(
            "bulk update of {} {} statuses changed {}; default, deleted or unknown ids were skipped",
            body.ids.len(),
            collection.target_type(),
            updated.len()
        );
    }
    for id in &updated {
        let details = serde_json::json!({ "field": body.field.column(), "value": body.value, "summary": "Bulk update" });
        audit::record(&pool, user.user_id, "status.bulk_updated", collection.target_type(), *id, details).await;
    }

    let modified = updated.len();
    let data = serde_json::json!({ "modifiedCount": modified });
    Ok(ok(ApiResponse::data(data).with_message(format!("{modified} statuses updated"))))
}

/// PATCH /{id}/toggle-active (admin)
pub async fn toggle_active(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = require_admin(&session)?;
    let id = parse_id(&path)?;
    let updated = status::toggle_active(&pool, **collection, id, user.user_id)
        .await
        .inspect_err(|e| log::warn!("toggle of {} {} rejected: {}", collection.target_type(), id, e))?;

    let details = serde_json::json!({ "isActive": updated.is_active });
    audit::record(&pool, user.user_id, "status.toggled", collection.target_type(), id, details).await;

    let message = if updated.is_active { "Status activated" } else { "Status deactivated" };
    Ok(ok(ApiResponse::data(updated).with_message(message)))
}

/// PATCH /{id}/set-default (admin)
pub async fn set_default(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = require_admin(&session)?;
    let id = parse_id(&path)?;
    let updated = status::set_default(&pool, **collection, id, user.user_id).await?;

    log::info!("{} {} is now the default", collection.target_type(), id);
    audit::record(&pool, user.user_id, "status.default_set", collection.target_type(), id, serde_json::json!({})).await;

    Ok(ok(ApiResponse::data(updated).with_message("Default status updated")))
}

/// DELETE /{id} - soft delete (admin)
pub async fn delete(
    pool: web::Data<PgPool>,
    collection: web::Data<StatusCollection>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = require_admin(&session)?;
    let id = parse_id(&path)?;
    status::soft_delete(&pool, **collection, id, user.user_id)
        .await
        .inspect_err(|e| log::warn!("delete of {} {} rejected: {}", collection.target_type(), id, e))?;

    log::info!("{} {} deleted by user {}", collection.target_type(), id, user.user_id);
    audit::record(&pool, user.user_id, "status.deleted", collection.target_type(), id, serde_json::json!({})).await;

    Ok(ok(ApiResponse::message("Status deleted")))
}
