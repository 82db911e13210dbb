use crate::models::status::{NewStatus, StatusUpdate};

fn too_long(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    (value.trim().chars().count() > max_len)
        .then(|| format!("{field_name} must be at most {max_len} characters"))
}

/// Non-blank text of at most `max_len` characters.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{field_name} is required"));
    }
    too_long(value, field_name, max_len)
}

/// Blank is fine; only the length is checked.
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    too_long(value, field_name, max_len)
}

/// Status codes: up to 20 chars of letters, digits, `_` or `-`.
pub fn validate_status_code(code: &str) -> Option<String> {
    if let Some(err) = validate_required(code, "Status code", 20) {
        return Some(err);
    }
    if !code.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Some("Status code may only contain letters, numbers, '_' and '-'".to_string());
    }
    None
}

/// `#RGB` or `#RRGGBB`.
pub fn validate_color_code(color: &str) -> Option<String> {
    let hex = color.trim().strip_prefix('#').unwrap_or("");
    let ok = matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if ok {
        None
    } else {
        Some("Color code must be a hex color like #1A2B3C".to_string())
    }
}

pub fn validate_sequence(sequence: i32) -> Option<String> {
    if sequence < 1 {
        Some("Sequence must be a positive integer".to_string())
    } else {
        None
    }
}

/// Check a create request, collecting every problem.
pub fn validate_new_status(new: &NewStatus) -> Vec<String> {
    let mut errors = Vec::new();
    errors.extend(validate_status_code(&new.status_code));
    errors.extend(validate_required(&new.status_name, "Status name", 100));
    errors.extend(new.sequence.and_then(validate_sequence));
    errors.extend(new.color_code.as_deref().and_then(validate_color_code));
    errors.extend(new.description.as_deref().and_then(|d| validate_optional(d, "Description", 500)));
    errors.extend(
        new.notification_template
            .as_deref()
            .and_then(|t| validate_optional(t, "Notification template", 1000)),
    );
    errors
}

/// Check the fields present in an update request.
pub fn validate_status_update(update: &StatusUpdate) -> Vec<String> {
    let mut errors = Vec::new();
    errors.extend(update.status_code.as_deref().and_then(validate_status_code));
    errors.extend(
        update.status_name
            .as_deref()
            .and_then(|n| validate_required(n, "Status name", 100)),
    );
    errors.extend(update.sequence.and_then(validate_sequence));
    errors.extend(update.color_code.as_deref().and_then(validate_color_code));
    errors.extend(update.description.as_deref().and_then(|d| validate_optional(d, "Description", 500)));
    errors.extend(
        update.notification_template
            .as_deref()
            .and_then(|t| validate_optional(t, "Notification template", 1000)),
    );
    errors
}

/// Trim names, upper-case the code and the color.
pub fn normalize_new_status(new: &mut NewStatus) {
    new.status_code = new.status_code.trim().to_ascii_uppercase();
    new.status_name = new.status_name.trim().to_string();
    if let Some(color) = new.color_code.as_mut() {
        *color = color.trim().to_ascii_uppercase();
    }
}

pub fn normalize_status_update(update: &mut StatusUpdate) {
    if let Some(code) = update.status_code.as_mut() {
        *code = code.trim().to_ascii_uppercase();
    }
    if let Some(name) = update.status_name.as_mut() {
        *name = name.trim().to_string();
    }
    if let Some(color) = update.color_code.as_mut() {
        *color = color.trim().to_ascii_uppercase();
    }
}
