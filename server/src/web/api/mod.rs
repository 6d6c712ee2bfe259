use std::fmt::Display;

mod endpoints_auth;
mod endpoints_event;
#[cfg(test)]
mod tests;
mod validation;

use crate::auth_session::SessionToken;
use crate::data_store::access::Permission;
use crate::data_store::StoreError;
use actix_web::error::JsonPayloadError;
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    web, HttpResponse,
};
use serde_json::json;
use validation::FieldError;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(get_api_service());
}

fn get_api_service() -> actix_web::Scope {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| APIError::InvalidJson(err).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| APIError::InvalidQuery(err.to_string()).into());
    web::scope("/api/v1")
        .app_data(json_config)
        .app_data(query_config)
        .service(endpoints_auth::login)
        .service(endpoints_auth::get_current_session)
        .service(endpoints_event::list_events)
        .service(endpoints_event::create_event)
        // Registered before the {event_id} routes so "check-name" is not matched as an id.
        .service(endpoints_event::check_name)
        .service(endpoints_event::get_event_info)
        .service(endpoints_event::update_event_info)
        .service(endpoints_event::update_event_field)
        .service(endpoints_event::delete_event)
}

#[derive(Debug)]
pub enum APIError {
    NotExisting,
    AlreadyExisting,
    Validation(Vec<FieldError>),
    PermissionDenied {
        required_privilege: Permission,
    },
    NoSessionToken,
    InvalidSessionToken,
    AuthenticationFailed,
    Throttled,
    InvalidJson(actix_web::error::JsonPayloadError),
    InvalidQuery(String),
    InvalidData(String),
    InternalError(String),
}

impl Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExisting => f.write_str("Element does not exist")?,
            Self::AlreadyExisting => {
                f.write_str("An event with this name exists already")?;
            }
            Self::Validation(errors) => {
                write!(
                    f,
                    "Invalid request data: {}",
                    errors
                        .iter()
                        .map(|e| format!("{}: {}", e.field, e.message))
                        .collect::<Vec<String>>()
                        .join("; ")
                )?;
            }
            Self::PermissionDenied { required_privilege } => {
                write!(f, "Client is not authorized to perform this action. Authentication as {} is required.",
                       required_privilege
                           .qualifying_roles()
                           .iter()
                           .map(|role| role.name().to_owned())
                           .collect::<Vec<String>>()
                           .join(" or "))?;
            }
            Self::NoSessionToken => {
                f.write_str("This action requires authentication, but client did not send authentication session token.")?
            }
            Self::InvalidSessionToken => {
                f.write_str("This action requires authentication, but the authentication session given by the client is not valid.")?
            }
            Self::AuthenticationFailed => {
                f.write_str("Authentication with the given credentials failed.")?;
            }
            Self::Throttled => {
                f.write_str("Request limit for this action exceeded. Please wait before retrying.")?;
            }
            Self::InternalError(s) => {
                f.write_str("Internal error: ")?;
                f.write_str(s)?;
            }
            Self::InvalidJson(e) => {
                write!(f, "Invalid JSON request data: {}", e)?;
            }
            Self::InvalidQuery(e) => {
                write!(f, "Invalid query parameters: {}", e)?;
            }
            Self::InvalidData(e) => {
                write!(f, "Invalid request data: {}", e)?;
            }
        };
        Ok(())
    }
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse {
        let message = format!("{}", self);

        let mut body = json!({
            "httpCode": self.status_code().as_u16(),
            "message": message
        });
        if let Self::Validation(errors) = self {
            body["errors"] = json!(errors);
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotExisting => StatusCode::NOT_FOUND,
            Self::AlreadyExisting => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NoSessionToken => StatusCode::FORBIDDEN,
            Self::InvalidSessionToken => StatusCode::FORBIDDEN,
            Self::AuthenticationFailed => StatusCode::FORBIDDEN,
            Self::Throttled => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidJson(e) => match e {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::InvalidData(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => {
                Self::InternalError(format!("Could not connect to database: {}", error))
            }
            StoreError::QueryError(diesel_error) => Self::InternalError(format!(
                "Error while executing database query: {}",
                diesel_error
            )),
            StoreError::NotExisting => Self::NotExisting,
            StoreError::NameAlreadyExists => Self::AlreadyExisting,
            StoreError::PermissionDenied { required_privilege } => {
                Self::PermissionDenied { required_privilege }
            }
            StoreError::InvalidCredentials => Self::AuthenticationFailed,
            StoreError::Throttled => Self::Throttled,
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<actix_web::error::BlockingError> for APIError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        APIError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<crate::auth_session::SessionError> for APIError {
    fn from(_e: crate::auth_session::SessionError) -> Self {
        APIError::InvalidSessionToken
    }
}

struct SessionTokenHeader(String);
const SESSION_TOKEN_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(30 * 86400);

impl SessionTokenHeader {
    fn session_token(&self, secret: &str) -> Result<SessionToken, crate::auth_session::SessionError> {
        SessionToken::from_string(&self.0, secret, SESSION_TOKEN_MAX_AGE)
    }
}

impl actix_web::http::header::TryIntoHeaderValue for SessionTokenHeader {
    type Error = actix_web::http::header::InvalidHeaderValue;

    fn try_into_value(self) -> Result<actix_web::http::header::HeaderValue, Self::Error> {
        self.0.parse()
    }
}

impl actix_web::http::header::Header for SessionTokenHeader {
    fn name() -> actix_web::http::header::HeaderName {
        "X-SESSION-TOKEN"
            .try_into()
            .expect("Session Token Header name should be a valid header name")
    }

    fn parse<M: actix_web::HttpMessage>(msg: &M) -> Result<Self, actix_web::error::ParseError> {
        Ok(Self(
            msg.headers()
                .get(Self::name())
                .ok_or(actix_web::error::ParseError::Header)?
                .to_str()
                .unwrap_or("")
                .to_owned(),
        ))
    }
}
