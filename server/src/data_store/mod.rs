//! The backend part of the backend: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [EventStore] trait. This object can be shared between threads in a
//! global application state and be used to create [EventStoreFacade] instances for interaction
//! with the database. These provide a CRUD-like interface, using the data models from the [models]
//! module.
//!
//! The primary implementation of [EventStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [EventStoreFacade] objects
//! ([postgres::PgDataStoreFacade]) hold a reference to one pooled connection each, using the
//! Diesel query DSL for implementing the database interaction.
//!
//! There is also a mock implementation for unittests. Other [EventStore] implementations may be
//! added later and selected via the "DATABASE_URL" environment variable.

use crate::auth_session::SessionToken;
use crate::cli_error::CliError;
use crate::cli_error::CliError::UnexpectedStoreError;
use crate::data_store::access::Permission;
use crate::setup;
use access::{AuthToken, GlobalAuthToken};

pub mod access;
pub mod list_query;
pub mod models;
mod postgres;
mod schema;

/// Get an [EventStore] instance, according to the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PostgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl EventStore, CliError> {
    postgres::PgDataStore::new(&setup::get_database_url_from_env()?)
        .map_err(|err| UnexpectedStoreError(err.to_string()))
}

pub type EventId = i32;
pub type UserId = i32;

/// Window and limit of the name-check throttle: at most [THROTTLE_MAX_REQUESTS] requests per
/// client address within [THROTTLE_WINDOW_SECONDS].
pub const THROTTLE_WINDOW_SECONDS: i64 = 30;
pub const THROTTLE_MAX_REQUESTS: i64 = 5;

/// One page of the event listing: the rows plus the unfiltered and filtered totals, which the
/// client needs for rendering pagination controls.
#[derive(Debug)]
pub struct EventPage {
    pub count: i64,
    pub count_filtered: i64,
    pub rows: Vec<models::Event>,
}

pub trait EventStoreFacade {
    /// Get a filtered, sorted and paginated list of the active (non-deleted) events.
    fn list_events(
        &mut self,
        auth_token: &AuthToken,
        params: &list_query::EventListParams,
    ) -> Result<EventPage, StoreError>;

    /// Get a single active event record.
    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::Event, StoreError>;

    /// Check if an event name is taken. Soft-deleted events still reserve their name, so they are
    /// included in the check.
    fn event_name_exists(
        &mut self,
        auth_token: &AuthToken,
        name: &str,
    ) -> Result<bool, StoreError>;

    /// Create a new event record and the corresponding audit log entry, in one transaction.
    ///
    /// Fails with [StoreError::NameAlreadyExists] if the name is taken (including by a
    /// soft-deleted event).
    fn create_event(
        &mut self,
        auth_token: &AuthToken,
        event: models::NewEvent,
    ) -> Result<models::Event, StoreError>;

    /// Apply a partial update to the informational fields of an event, writing the audit log entry
    /// in the same transaction. An empty changeset is a no-op and returns the unchanged record.
    fn update_event_info(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        changes: models::EventInfoChangeset,
    ) -> Result<models::Event, StoreError>;

    /// Update a single field of an event, writing the audit log entry in the same transaction.
    fn update_event_field(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        value: models::EventFieldValue,
    ) -> Result<models::Event, StoreError>;

    /// Soft-delete an event. The record stays in the database with its `deleted_at` timestamp set
    /// and its name stays reserved.
    fn delete_event(&mut self, auth_token: &AuthToken, event_id: EventId)
        -> Result<(), StoreError>;

    /// Permanently remove an event record together with the audit log entries referring to it.
    /// Also finds soft-deleted events.
    fn purge_event(
        &mut self,
        auth_token: &GlobalAuthToken,
        event_id: EventId,
    ) -> Result<(), StoreError>;

    fn create_user(
        &mut self,
        auth_token: &GlobalAuthToken,
        user: models::NewUser,
    ) -> Result<models::User, StoreError>;

    fn list_users(&mut self, auth_token: &GlobalAuthToken)
        -> Result<Vec<models::User>, StoreError>;

    /// Check a login attempt. Returns the matching user on success.
    fn verify_credentials(
        &mut self,
        user_name: &str,
        password: &str,
    ) -> Result<models::User, StoreError>;

    /// Get an [AuthToken] instance for a client, representing the role of the session's user.
    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError>;

    /// Get the full user record of the session's user.
    fn get_session_user(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<models::User, StoreError>;

    /// Record a name-check request of the given client address and check it against the throttle
    /// limit. Returns [StoreError::Throttled] when the limit is exceeded.
    fn check_name_check_throttle(&mut self, ip_address: &str) -> Result<(), StoreError>;
}

pub trait EventStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn EventStoreFacade + 'a>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection to the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members
    QueryError(diesel::result::Error),
    /// The requested entity does not exist
    NotExisting,
    /// The event could not be created or renamed because another event (possibly soft-deleted)
    /// already holds the name.
    NameAlreadyExists,
    /// The client is not authorized for this action. It would need a user role qualifying for the
    /// `required_privilege`, and for owner-bound actions it must be the creator of the record.
    PermissionDenied { required_privilege: Permission },
    /// Login attempt with an unknown user name or a wrong password
    InvalidCredentials,
    /// The client exceeded the request limit for this action
    Throttled,
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::NameAlreadyExists,
            diesel::result::Error::DatabaseError(
                e @ diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | e @ diesel::result::DatabaseErrorKind::CheckViolation,
                _,
            ) => Self::InvalidInputData(format!("{:?}", e)),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::NameAlreadyExists => {
                f.write_str("An event with this name exists already (possibly deleted).")
            }
            Self::PermissionDenied { required_privilege } => {
                write!(
                    f,
                    "Client is not authorized to perform this action. {:?} permission required.",
                    required_privilege
                )
            }
            Self::InvalidCredentials => f.write_str("Invalid user name or password."),
            Self::Throttled => f.write_str("Request limit for this action exceeded."),
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            StoreError::InvalidDataInDatabase(e) => {
                write!(
                    f,
                    "Data queried from database could not be deserialized: {}",
                    e
                )
            }
        }
    }
}

impl std::error::Error for StoreError {}
