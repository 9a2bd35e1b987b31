use actix_web::http::header::ContentType;
use actix_web::{get, web, HttpResponse, Responder};

use crate::error::{ApiError, GatewayError};
use crate::gateway::{Gateway, RowResult};
use crate::user::{NewUser, User};

const GREETING: &str = "Hello from the users service!";
const HEALTHY: &str = "Service is healthy and connected to DB!";

/// Registers every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home).service(health).service(
        web::resource("/users")
            .route(web::get().to(list_users))
            .route(web::post().to(create_user))
            .default_service(web::to(method_not_allowed)),
    );
}

#[get("/")]
async fn home() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(GREETING)
}

#[get("/health")]
async fn health(gateway: web::Data<dyn Gateway>) -> Result<HttpResponse, ApiError> {
    gateway.ping().await.map_err(ApiError::Unhealthy)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(HEALTHY))
}

async fn list_users(gateway: web::Data<dyn Gateway>) -> Result<HttpResponse, ApiError> {
    let rows = gateway.list_users().await.map_err(ApiError::ListUsers)?;
    Ok(HttpResponse::Ok().json(decoded_users(rows)))
}

// A row that fails to decode is logged and left out of the listing.
fn decoded_users(rows: Vec<RowResult>) -> Vec<User> {
    rows.into_iter()
        .filter_map(|row| match row {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("Error scanning user row: {e}");
                None
            }
        })
        .collect()
}

async fn create_user(
    gateway: web::Data<dyn Gateway>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let new: NewUser = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidBody)?;
    new.validate().map_err(|_| ApiError::MissingFields)?;

    let id = gateway.insert_user(&new).await.map_err(|e| match e {
        GatewayError::Conflict { constraint, .. } => {
            log::info!(
                "rejected duplicate user (constraint {})",
                constraint.as_deref().unwrap_or("unknown")
            );
            ApiError::Conflict
        }
        other => ApiError::CreateUser(other),
    })?;
    log::info!("created user {id}");

    Ok(HttpResponse::Created().json(new.into_user(id)))
}

async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}
