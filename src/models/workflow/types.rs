use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic stage of a plot or file in its sales or development lifecycle.
///
/// On the wire the type is written in upper case (`ON_HOLD`) but parsed
/// case-insensitively, so `"booked"`, `"Booked"` and `"BOOKED"` are all accepted.
/// In the database it is stored lower case (`on_hold`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum StatusType {
    Available,
    Booked,
    Reserved,
    Allotted,
    Contracted,
    Cancelled,
    OnHold,
    Sold,
    Pending,
    Closed,
}

impl StatusType {
    pub const ALL: [StatusType; 10] = [
        StatusType::Available,
        StatusType::Booked,
        StatusType::Reserved,
        StatusType::Allotted,
        StatusType::Contracted,
        StatusType::Cancelled,
        StatusType::OnHold,
        StatusType::Sold,
        StatusType::Pending,
        StatusType::Closed,
    ];

    /// Upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusType::Available => "AVAILABLE",
            StatusType::Booked => "BOOKED",
            StatusType::Reserved => "RESERVED",
            StatusType::Allotted => "ALLOTTED",
            StatusType::Contracted => "CONTRACTED",
            StatusType::Cancelled => "CANCELLED",
            StatusType::OnHold => "ON_HOLD",
            StatusType::Sold => "SOLD",
            StatusType::Pending => "PENDING",
            StatusType::Closed => "CLOSED",
        }
    }

    /// Lower-case value stored in `status_definitions.status_type`.
    pub fn as_db(self) -> &'static str {
        match self {
            StatusType::Available => "available",
            StatusType::Booked => "booked",
            StatusType::Reserved => "reserved",
            StatusType::Allotted => "allotted",
            StatusType::Contracted => "contracted",
            StatusType::Cancelled => "cancelled",
            StatusType::OnHold => "on_hold",
            StatusType::Sold => "sold",
            StatusType::Pending => "pending",
            StatusType::Closed => "closed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusType::Available => "Available",
            StatusType::Booked => "Booked",
            StatusType::Reserved => "Reserved",
            StatusType::Allotted => "Allotted",
            StatusType::Contracted => "Contracted",
            StatusType::Cancelled => "Cancelled",
            StatusType::OnHold => "On Hold",
            StatusType::Sold => "Sold",
            StatusType::Pending => "Pending",
            StatusType::Closed => "Closed",
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatusType(pub String);

impl fmt::Display for UnknownStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown status type '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatusType {}

impl FromStr for StatusType {
    type Err = UnknownStatusType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        StatusType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownStatusType(s.to_string()))
    }
}

impl TryFrom<String> for StatusType {
    type Error = UnknownStatusType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which status list a definition belongs to: plot sales or site development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCollection {
    Sales,
    Development,
}

impl StatusCollection {
    pub fn as_db(self) -> &'static str {
        match self {
            StatusCollection::Sales => "sales",
            StatusCollection::Development => "development",
        }
    }

    /// Key for `pg_advisory_xact_lock`, serializing default-flag changes per collection.
    pub fn lock_key(self) -> i64 {
        match self {
            StatusCollection::Sales => 0x5354_4154_0001,
            StatusCollection::Development => 0x5354_4154_0002,
        }
    }

    /// Noun used in audit records and log lines.
    pub fn target_type(self) -> &'static str {
        match self {
            StatusCollection::Sales => "sales_status",
            StatusCollection::Development => "dev_status",
        }
    }
}

/// A field a record should carry before it may occupy a status type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationRule {
    pub field: &'static str,
    pub required: bool,
    pub message: &'static str,
}

/// Result of checking a move between two status records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCheck {
    pub is_valid: bool,
    pub message: String,
    pub allowed_transitions: Vec<StatusType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<MissingField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingField {
    pub field: String,
    pub message: String,
}
