use actix_session::Session;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::user::Role;

/// The authenticated caller, as stored in the session at login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

pub fn get_role(session: &Session) -> Option<Role> {
    session
        .get::<String>("role")
        .unwrap_or(None)
        .and_then(|r| r.parse().ok())
}

pub fn get_user(session: &Session) -> Option<SessionUser> {
    let user_id = get_user_id(session)?;
    let username = session.get::<String>("username").unwrap_or(None).unwrap_or_default();
    let role = get_role(session).unwrap_or(Role::Member);
    Some(SessionUser { user_id, username, role })
}

pub fn sign_in(session: &Session, user_id: i64, username: &str, role: Role) -> Result<(), AppError> {
    session.renew();
    session
        .insert("user_id", user_id)
        .and_then(|_| session.insert("username", username))
        .and_then(|_| session.insert("role", role.as_str()))
        .map_err(|e| AppError::Session(format!("Failed to write session: {e}")))
}

/// Require a signed-in user holding one of `allowed`.
/// 401 when nobody is signed in, 403 when the role is insufficient.
pub fn require_role(session: &Session, allowed: &[Role]) -> Result<SessionUser, AppError> {
    let user = get_user(session).ok_or(AppError::Unauthorized)?;
    if allowed.contains(&user.role) {
        Ok(user)
    } else {
        Err(AppError::PermissionDenied(format!(
            "role '{}' may not perform this action",
            user.role
        )))
    }
}

pub fn require_admin(session: &Session) -> Result<SessionUser, AppError> {
    require_role(session, &[Role::Admin])
}
