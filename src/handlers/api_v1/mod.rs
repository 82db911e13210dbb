pub mod auth;
pub mod response;
pub mod statuses;

use actix_web::{
    web, Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header},
    middleware::{Next, from_fn},
};

use crate::auth::middleware::require_auth;
use crate::errors::ErrorBody;
use crate::models::workflow::StatusCollection;

fn is_mutation(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// Mutations must declare a JSON body. Cross-site form posts cannot, so this
/// doubles as the CSRF guard for cookie sessions. Reads pass through.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let declares_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_mutation(req.method()) && !declares_json {
        log::debug!("rejected {} {} without a JSON content type", req.method(), req.path());
        let response = HttpResponse::BadRequest().json(ErrorBody {
            success: false,
            error: "Content-Type must be application/json for mutation requests".to_string(),
        });
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Routes shared by every status collection. Literal segments are
/// registered before `/{id}` so they are not captured as ids.
fn status_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(statuses::list))
        .route("", web::post().to(statuses::create))
        .route("/active", web::get().to(statuses::active))
        .route("/default", web::get().to(statuses::default_status))
        .route("/types", web::get().to(statuses::types))
        .route("/validate-transition", web::post().to(statuses::validate_transition))
        .route("/reorder", web::post().to(statuses::reorder))
        .route("/bulk-update", web::post().to(statuses::bulk_update))
        .route("/{id}", web::get().to(statuses::read))
        .route("/{id}", web::put().to(statuses::update))
        .route("/{id}", web::delete().to(statuses::delete))
        .route("/{id}/workflow", web::get().to(statuses::workflow))
        .route("/{id}/history", web::get().to(statuses::history))
        .route("/{id}/sequence", web::patch().to(statuses::update_sequence))
        .route("/{id}/toggle-active", web::patch().to(statuses::toggle_active))
        .route("/{id}/set-default", web::patch().to(statuses::set_default));
}

/// Configure API v1 routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .wrap(from_fn(require_json_content_type))
            .route("/login", web::post().to(auth::login))
            .service(
                web::scope("")
                    .wrap(from_fn(require_auth))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/me", web::get().to(auth::me)),
            ),
    );
    cfg.service(
        web::scope("/sales-status")
            .app_data(web::Data::new(StatusCollection::Sales))
            .wrap(from_fn(require_json_content_type))
            .configure(status_routes),
    );
    cfg.service(
        web::scope("/dev-status")
            .app_data(web::Data::new(StatusCollection::Development))
            .wrap(from_fn(require_json_content_type))
            .configure(status_routes),
    );
}
