use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full projection of an event record, as returned by the read endpoints.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(rename = "allDay")]
    pub all_day: bool,
    pub url: String,
    pub notes: String,
    #[serde(rename = "flagEnabled")]
    pub flag_enabled: bool,
    #[serde(rename = "creatorId")]
    pub creator_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Response envelope of the event listing endpoint.
///
/// `count` is the number of active events before filtering, `count_filtered` the
/// number matching the requested filters before pagination.
#[derive(Serialize, Deserialize, Debug)]
pub struct EventPage {
    pub count: i64,
    #[serde(rename = "countFiltered")]
    pub count_filtered: i64,
    pub rows: Vec<Event>,
}

/// Request body for creating a new event.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, rename = "allDay")]
    pub all_day: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
}

/// Request body for the bulk info-update endpoint. All fields are optional;
/// absent fields are left unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EventInfoUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "allDay")]
    pub all_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "flagEnabled")]
    pub flag_enabled: Option<bool>,
}

/// Response of the name-availability check endpoint.
#[derive(Serialize, Deserialize, Debug)]
pub struct NameAvailability {
    pub name: String,
    pub available: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    #[serde(rename = "sessionToken")]
    pub session_token: String,
    pub user: UserInfo,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserInfo {
    pub id: i32,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub role: UserRole,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Contributor,
    Admin,
}
