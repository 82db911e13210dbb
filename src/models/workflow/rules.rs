use serde_json::{Map, Value};

use super::types::{MissingField, StatusType, ValidationRule};

const fn rule(field: &'static str, required: bool, message: &'static str) -> ValidationRule {
    ValidationRule { field, required, message }
}

const BOOKED: &[ValidationRule] = &[
    rule("customerId", true, "A customer must be linked before booking"),
    rule("bookingDate", true, "Booking date is required"),
    rule("depositPaid", true, "Booking deposit must be recorded"),
    rule("bookingReference", false, "Booking reference is recommended"),
];

const RESERVED: &[ValidationRule] = &[
    rule("customerId", true, "A customer must be linked before reservation"),
    rule("reservationDate", true, "Reservation date is required"),
    rule("reservationExpiry", true, "Reservation expiry date is required"),
];

const ALLOTTED: &[ValidationRule] = &[
    rule("customerId", true, "A customer must be linked before allotment"),
    rule("allotmentDate", true, "Allotment date is required"),
    rule("allotmentLetterNumber", true, "Allotment letter number is required"),
    rule("depositPaid", true, "Deposit must be recorded before allotment"),
];

const CONTRACTED: &[ValidationRule] = &[
    rule("contractNumber", true, "Contract number is required"),
    rule("contractDate", true, "Contract date is required"),
    rule("depositPaid", true, "Deposit must be recorded before contract"),
    rule("installmentPlanId", false, "An installment plan is usually attached to a contract"),
];

const CANCELLED: &[ValidationRule] = &[
    rule("cancellationReason", true, "Cancellation reason is required"),
    rule("cancellationDate", true, "Cancellation date is required"),
    rule("refundAmount", false, "Refund amount should be recorded if applicable"),
];

const ON_HOLD: &[ValidationRule] = &[
    rule("holdReason", true, "Reason for hold is required"),
    rule("holdUntil", false, "Expected release date is recommended"),
];

const SOLD: &[ValidationRule] = &[
    rule("saleDate", true, "Sale date is required"),
    rule("salePrice", true, "Sale price is required"),
    rule("contractNumber", true, "Contract number is required before sale"),
];

const CLOSED: &[ValidationRule] = &[
    rule("closingDate", true, "Closing date is required"),
    rule("closingRemarks", false, "Closing remarks are recommended"),
];

/// Fields a record should carry before it may occupy `status_type`.
pub fn validation_rules(status_type: StatusType) -> &'static [ValidationRule] {
    match status_type {
        StatusType::Available | StatusType::Pending => &[],
        StatusType::Booked => BOOKED,
        StatusType::Reserved => RESERVED,
        StatusType::Allotted => ALLOTTED,
        StatusType::Contracted => CONTRACTED,
        StatusType::Cancelled => CANCELLED,
        StatusType::OnHold => ON_HOLD,
        StatusType::Sold => SOLD,
        StatusType::Closed => CLOSED,
    }
}

/// Required rules of `status_type` whose field is absent, null or blank in `fields`.
pub fn missing_required_fields(status_type: StatusType, fields: &Map<String, Value>) -> Vec<MissingField> {
    validation_rules(status_type)
        .iter()
        .filter(|r| r.required && !is_present(fields.get(r.field)))
        .map(|r| MissingField {
            field: r.field.to_string(),
            message: r.message.to_string(),
        })
        .collect()
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        // `depositPaid: false` means the deposit was explicitly not paid.
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    }
}
