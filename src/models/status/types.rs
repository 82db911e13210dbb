use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::workflow::{StatusType, allowed_transitions};

/// Raw `status_definitions` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusRow {
    pub id: i64,
    pub collection: String,
    pub status_code: String,
    pub status_name: String,
    pub status_type: String,
    pub description: Option<String>,
    pub sequence: i32,
    pub is_active: bool,
    pub is_default: bool,
    pub allows_sale: bool,
    pub requires_approval: bool,
    pub color_code: String,
    pub notification_template: Option<String>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sales or development status definition as served by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDefinition {
    pub id: i64,
    pub status_code: String,
    pub status_name: String,
    pub status_type: StatusType,
    pub description: Option<String>,
    pub sequence: i32,
    pub is_active: bool,
    pub is_default: bool,
    pub allows_sale: bool,
    pub requires_approval: bool,
    pub color_code: String,
    pub notification_template: Option<String>,
    /// Derived from the transition table, never stored.
    pub allowed_transitions: &'static [StatusType],
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StatusRow> for StatusDefinition {
    type Error = sqlx::Error;

    fn try_from(row: StatusRow) -> Result<Self, Self::Error> {
        let status_type: StatusType = row
            .status_type
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(StatusDefinition {
            id: row.id,
            status_code: row.status_code,
            status_name: row.status_name,
            status_type,
            description: row.description,
            sequence: row.sequence,
            is_active: row.is_active,
            is_default: row.is_default,
            allows_sale: row.allows_sale,
            requires_approval: row.requires_approval,
            color_code: row.color_code,
            notification_template: row.notification_template,
            allowed_transitions: allowed_transitions(status_type),
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStatus {
    pub status_code: String,
    pub status_name: String,
    pub status_type: StatusType,
    #[serde(default)]
    pub description: Option<String>,
    /// Appended after the current last status when omitted.
    #[serde(default)]
    pub sequence: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub allows_sale: bool,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub notification_template: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Update request: only supplied fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status_code: Option<String>,
    pub status_name: Option<String>,
    pub status_type: Option<StatusType>,
    pub description: Option<String>,
    pub sequence: Option<i32>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
    pub allows_sale: Option<bool>,
    pub requires_approval: Option<bool>,
    pub color_code: Option<String>,
    pub notification_template: Option<String>,
}

/// List filters, taken from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFilter {
    pub status_type: Option<StatusType>,
    pub is_active: Option<bool>,
    pub allows_sale: Option<bool>,
    pub requires_approval: Option<bool>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl StatusFilter {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// 1-based page, capped so the row offset always fits in an `i64`.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, i64::MAX / Self::MAX_LIMIT)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// One page of statuses plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct StatusPage {
    pub items: Vec<StatusDefinition>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SequenceOrder {
    pub id: i64,
    pub sequence: i32,
}

/// Boolean columns that may be set across many statuses at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkField {
    IsActive,
    AllowsSale,
    RequiresApproval,
}

impl BulkField {
    pub fn column(self) -> &'static str {
        match self {
            BulkField::IsActive => "is_active",
            BulkField::AllowsSale => "allows_sale",
            BulkField::RequiresApproval => "requires_approval",
        }
    }
}
