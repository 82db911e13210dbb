use actix_session::SessionExt;
use actix_web::{
    Error, ResponseError,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use crate::auth::session;
use crate::errors::AppError;

/// Short-circuits with the 401 envelope unless the session carries a user.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if session::get_user_id(&req.get_session()).is_none() {
        let response = AppError::Unauthorized.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
