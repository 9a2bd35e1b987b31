use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::config::ConfigError;

/// Failure reported by a [`Gateway`](crate::gateway::Gateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A unique constraint rejected the write.
    #[error("{message}")]
    Conflict {
        constraint: Option<String>,
        message: String,
    },
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Conflict {
                    constraint: db.constraint().map(str::to_owned),
                    message: db.message().to_owned(),
                };
            }
        }
        Self::Database(err)
    }
}

/// Errors surfaced to HTTP clients. Bodies are plain text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body")]
    InvalidBody,
    #[error("Name and Email are required")]
    MissingFields,
    #[error("User with this email already exists")]
    Conflict,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Error querying users: {0}")]
    ListUsers(#[source] GatewayError),
    #[error("Error inserting new user: {0}")]
    CreateUser(#[source] GatewayError),
    #[error("Database connection failed: {0}")]
    Unhealthy(#[source] GatewayError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidBody | Self::MissingFields => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::ListUsers(_) | Self::CreateUser(_) | Self::Unhealthy(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }
        HttpResponse::build(status)
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}

/// Failures that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("error connecting to the database (ping failed): {0}")]
    Connect(#[source] GatewayError),
    #[error("error creating users table: {0}")]
    Schema(#[source] GatewayError),
    #[error("http server error: {0}")]
    Server(#[from] std::io::Error),
}
