use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::status::{self, StatusDefinition};
use super::rules::{missing_required_fields, validation_rules};
use super::transitions::{allowed_transitions, can_transition, is_terminal};
use super::types::*;

/// A status together with where it can go next.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusWorkflow {
    pub current_status: StatusDefinition,
    pub allowed_transitions: &'static [StatusType],
    /// Active statuses of the collection whose type is an allowed next step.
    pub next_statuses: Vec<StatusDefinition>,
    pub validation_rules: &'static [ValidationRule],
    pub is_terminal: bool,
}

/// Workflow view of one status, or `None` if it does not exist.
pub async fn workflow_for(
    pool: &PgPool,
    collection: StatusCollection,
    id: i64,
) -> Result<Option<StatusWorkflow>, AppError> {
    let Some(current) = status::find_by_id(pool, collection, id).await? else {
        return Ok(None);
    };
    let allowed = allowed_transitions(current.status_type);
    let next_statuses = status::find_active_by_types(pool, collection, allowed).await?;

    Ok(Some(StatusWorkflow {
        validation_rules: validation_rules(current.status_type),
        is_terminal: is_terminal(current.status_type),
        allowed_transitions: allowed,
        next_statuses,
        current_status: current,
    }))
}

/// Decide whether a record may move from `current` to `target`.
///
/// Unknown statuses are reported as invalid rather than as errors. When
/// `fields` is given, the target type's required fields must be present too.
pub fn check_transition(
    current: Option<&StatusDefinition>,
    target: Option<&StatusDefinition>,
    fields: Option<&Map<String, Value>>,
) -> TransitionCheck {
    let Some(current) = current else {
        return TransitionCheck {
            is_valid: false,
            message: "Current status not found".to_string(),
            allowed_transitions: Vec::new(),
            missing_fields: Vec::new(),
        };
    };
    let allowed = allowed_transitions(current.status_type).to_vec();

    let Some(target) = target else {
        return TransitionCheck {
            is_valid: false,
            message: "Target status not found".to_string(),
            allowed_transitions: allowed,
            missing_fields: Vec::new(),
        };
    };

    if !can_transition(current.status_type, target.status_type) {
        return TransitionCheck {
            is_valid: false,
            message: format!(
                "Cannot transition from {} to {}",
                current.status_name, target.status_name
            ),
            allowed_transitions: allowed,
            missing_fields: Vec::new(),
        };
    }

    let missing_fields = fields
        .map(|f| missing_required_fields(target.status_type, f))
        .unwrap_or_default();
    if !missing_fields.is_empty() {
        return TransitionCheck {
            is_valid: false,
            message: format!(
                "{} requires {} missing field(s)",
                target.status_name,
                missing_fields.len()
            ),
            allowed_transitions: allowed,
            missing_fields,
        };
    }

    TransitionCheck {
        is_valid: true,
        message: format!(
            "Transition from {} to {} is valid",
            current.status_name, target.status_name
        ),
        allowed_transitions: allowed,
        missing_fields,
    }
}

/// Load both statuses and check the move between them. Ids that failed to
/// parse arrive as `None` and count as lookup misses.
pub async fn validate_transition(
    pool: &PgPool,
    collection: StatusCollection,
    current_id: Option<i64>,
    target_id: Option<i64>,
    fields: Option<&Map<String, Value>>,
) -> Result<TransitionCheck, AppError> {
    let current = match current_id {
        Some(id) => status::find_by_id(pool, collection, id).await?,
        None => None,
    };
    let target = match (&current, target_id) {
        (Some(_), Some(id)) => status::find_by_id(pool, collection, id).await?,
        _ => None,
    };
    Ok(check_transition(current.as_ref(), target.as_ref(), fields))
}

/// Transition and rule tables for every status type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTypeInfo {
    pub status_type: StatusType,
    pub label: &'static str,
    pub allowed_transitions: &'static [StatusType],
    pub validation_rules: &'static [ValidationRule],
    pub is_terminal: bool,
}

pub fn status_type_catalog() -> Vec<StatusTypeInfo> {
    StatusType::ALL
        .into_iter()
        .map(|t| StatusTypeInfo {
            status_type: t,
            label: t.label(),
            allowed_transitions: allowed_transitions(t),
            validation_rules: validation_rules(t),
            is_terminal: is_terminal(t),
        })
        .collect()
}
